//! Changes the DNS servers of one interface
//!
//! On Linux, we talk to `systemd-resolved` through `resolvectl`.
//!
//! On Windows, we use `netsh` and `ipconfig`.

use crate::{Error, InterfaceDirectory, NetworkInterface};
use itertools::Itertools as _;
use std::net::IpAddr;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use windows as platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod unsupported;
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
use unsupported as platform;

#[cfg(target_os = "linux")]
pub(crate) use platform::parse_resolvectl_output;

pub use platform::SystemBackend;

/// One change we ask the OS to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Use static DNS with `0` as the only server, replacing whatever was there.
    SetPrimary(IpAddr),
    /// Add another server at priority `index`, which starts at 2.
    AddSecondary { address: IpAddr, index: usize },
    /// Go back to whatever DHCP hands out.
    SetAutomatic,
    /// Drop everything in the OS resolver cache.
    FlushCache,
}

/// Something that can carry out an [`Intent`].
///
/// Each call is a separate, blocking invocation of an OS utility.
pub trait DnsBackend {
    /// Whether `address` can be set at all. Checked for every address before the first change.
    fn supports(&self, _address: &IpAddr) -> bool {
        true
    }

    fn apply(&mut self, interface: &NetworkInterface, intent: Intent) -> Result<(), Error>;
}

pub struct DnsController<D, B> {
    directory: D,
    backend: B,
}

impl<D, B> DnsController<D, B>
where
    D: InterfaceDirectory,
    B: DnsBackend,
{
    pub fn new(directory: D, backend: B) -> Self {
        Self { directory, backend }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The IPv4 DNS servers of interface `id`, in the order the OS reports them.
    ///
    /// Never touches the backend.
    pub fn get_current_dns(&self, id: &str) -> Result<Vec<IpAddr>, Error> {
        let interface = self.directory.find_by_id(id)?;

        let servers = self
            .directory
            .dns_servers(&interface)?
            .into_iter()
            .filter(IpAddr::is_ipv4)
            .collect();

        Ok(servers)
    }

    /// Replace the DNS servers of interface `id` with `addresses`, then flush the cache.
    ///
    /// Stops at the first failing step. Steps that already succeeded are not rolled back,
    /// and the cache is only flushed if every step succeeded.
    /// Addresses the backend can't set are rejected before the first step.
    ///
    /// The `mut` in `&mut self` is not needed by Rust's rules, but
    /// it would be bad if this was called from 2 threads at once.
    pub fn set_dns(&mut self, id: &str, addresses: &[IpAddr]) -> Result<(), Error> {
        let interface = self.directory.find_by_id(id)?;

        let intents = set_dns_intents(addresses)?;
        if let Some(address) = addresses.iter().find(|a| !self.backend.supports(a)) {
            return Err(Error::UnsupportedAddress(*address));
        }
        let total = intents.len();

        for (applied, intent) in intents.into_iter().enumerate() {
            if let Err(error) = self.backend.apply(&interface, intent) {
                if applied > 0 {
                    tracing::warn!(
                        interface = %interface.name,
                        "Applied {applied} of {total} DNS changes before failing, the rest were skipped"
                    );
                }

                return Err(error);
            }
        }

        tracing::info!(
            interface = %interface.name,
            "Set DNS servers to {}",
            addresses.iter().join(", ")
        );

        Ok(())
    }

    /// Switch interface `id` back to DHCP-provided DNS.
    ///
    /// Unlike [`DnsController::set_dns`], this does not flush the cache. Call [`DnsController::flush`] for that.
    pub fn reset_dns(&mut self, id: &str) -> Result<(), Error> {
        let interface = self.directory.find_by_id(id)?;

        self.backend.apply(&interface, Intent::SetAutomatic)?;

        tracing::info!(interface = %interface.name, "Reset DNS to automatic");

        Ok(())
    }

    /// Flush the system-wide DNS cache
    pub fn flush(&mut self, id: &str) -> Result<(), Error> {
        let interface = self.directory.find_by_id(id)?;

        self.backend.apply(&interface, Intent::FlushCache)?;

        tracing::debug!("Flushed DNS.");

        Ok(())
    }
}

/// e.g. `[A, B, C]` -> `[SetPrimary(A), AddSecondary(B, 2), AddSecondary(C, 3), FlushCache]`
fn set_dns_intents(addresses: &[IpAddr]) -> Result<Vec<Intent>, Error> {
    let (primary, rest) = addresses.split_first().ok_or(Error::EmptyAddressList)?;

    let intents = std::iter::once(Intent::SetPrimary(*primary))
        .chain(
            rest.iter()
                .enumerate()
                .map(|(i, address)| Intent::AddSecondary {
                    address: *address,
                    index: i + 2,
                }),
        )
        .chain(std::iter::once(Intent::FlushCache))
        .collect();

    Ok(intents)
}
