//! Enumerates the network interfaces the OS knows about.
//!
//! Nothing here is cached. Every lookup takes a fresh snapshot, so interfaces that
//! were hot-plugged between two calls are picked up, and ones that were removed
//! disappear.

use crate::Error;
use std::{fmt, net::IpAddr, str::FromStr};

#[cfg(target_os = "linux")]
#[path = "interface/linux.rs"]
mod platform;

#[cfg(target_os = "windows")]
#[path = "interface/windows.rs"]
mod platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
#[path = "interface/unsupported.rs"]
mod platform;

pub use platform::SystemInterfaces;

/// A snapshot of one network interface.
///
/// Mirrors OS state at the time it was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Stable and unique per adapter, e.g. the adapter GUID on Windows.
    pub id: String,
    /// Human-readable name, e.g. `Ethernet`. The user can change it.
    pub name: String,
    pub description: String,
    pub up: bool,
    pub loopback: bool,
}

pub trait InterfaceDirectory {
    /// Lists all interfaces in OS order.
    ///
    /// The order is not guaranteed to be stable across calls.
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, Error>;

    /// The DNS servers the OS has recorded for `interface`, in OS order.
    fn dns_servers(&self, interface: &NetworkInterface) -> Result<Vec<IpAddr>, Error>;

    fn find_by_id(&self, id: &str) -> Result<NetworkInterface, Error> {
        self.list_interfaces()?
            .into_iter()
            .find(|interface| interface.id == id)
            .ok_or_else(|| Error::NotFound(format!("id `{id}`")))
    }

    /// If several interfaces share a name, the first one in OS order wins.
    fn find_by_name(&self, name: &str) -> Result<NetworkInterface, Error> {
        self.list_interfaces()?
            .into_iter()
            .find(|interface| interface.name == name)
            .ok_or_else(|| Error::NotFound(format!("name `{name}`")))
    }
}

/// How to pick the interface whose DNS we control.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum InterfaceSelector {
    /// `id:<id>`
    Id(String),
    /// `name:<name>` or just `<name>`
    Name(String),
    /// `auto`, the first interface that is up and isn't a loopback.
    FirstUp,
}

impl Default for InterfaceSelector {
    fn default() -> Self {
        Self::Name("Ethernet".to_owned())
    }
}

impl InterfaceSelector {
    pub fn select(&self, directory: &impl InterfaceDirectory) -> Result<NetworkInterface, Error> {
        match self {
            Self::Id(id) => directory.find_by_id(id),
            Self::Name(name) => directory.find_by_name(name),
            Self::FirstUp => directory
                .list_interfaces()?
                .into_iter()
                .find(|interface| interface.up && !interface.loopback)
                .ok_or_else(|| Error::NotFound("`auto`, none is up and non-loopback".to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Interface selector `{0}` has no value after the prefix")]
pub struct SelectorError(String);

impl FromStr for InterfaceSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = if s == "auto" {
            Self::FirstUp
        } else if let Some(id) = s.strip_prefix("id:") {
            Self::Id(id.to_owned())
        } else if let Some(name) = s.strip_prefix("name:") {
            Self::Name(name.to_owned())
        } else {
            Self::Name(s.to_owned())
        };

        match &selector {
            Self::Id(value) | Self::Name(value) if value.is_empty() => {
                Err(SelectorError(s.to_owned()))
            }
            Self::Id(_) | Self::Name(_) | Self::FirstUp => Ok(selector),
        }
    }
}

impl TryFrom<String> for InterfaceSelector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for InterfaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Name(name)
                if name == "auto" || name.starts_with("id:") || name.starts_with("name:") =>
            {
                write!(f, "name:{name}")
            }
            Self::Name(name) => write!(f, "{name}"),
            Self::FirstUp => write!(f, "auto"),
        }
    }
}
