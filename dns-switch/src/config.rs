//! TOML configuration.
//!
//! Every top-level key and table is optional. Anything left out falls back to the built-in
//! defaults, which switch the `Ethernet` adapter between the Shecan resolvers and `192.168.1.1`.
//! A table that is present must be complete, e.g. `[alternate]` needs both `name` and `servers`.

use crate::{DnsBackend as _, InterfaceSelector, SystemBackend, known_dirs};
use itertools::Itertools as _;
use serde::Deserialize;
use std::{
    fmt, io,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which interface to control.
    pub interface: InterfaceSelector,
    /// What `--set` applies.
    pub alternate: Profile,
    /// What `--reset` applies.
    pub reset: ResetTarget,
}

/// A named, ordered list of DNS servers. The first one is the primary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    pub servers: Vec<IpAddr>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Shecan".to_owned(),
            servers: vec![
                IpAddr::V4(Ipv4Addr::new(178, 22, 122, 100)),
                IpAddr::V4(Ipv4Addr::new(185, 51, 200, 2)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ResetTarget {
    /// Let DHCP decide.
    Automatic,
    /// A fixed fallback, usually the home router.
    Static { servers: Vec<IpAddr> },
}

impl Default for ResetTarget {
    fn default() -> Self {
        Self::Static {
            servers: vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))],
        }
    }
}

impl fmt::Display for ResetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Static { servers } => write!(f, "{}", servers.iter().join(", ")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("`alternate.servers` must list at least one DNS server")]
    EmptyAlternate,

    #[error("`reset.servers` must list at least one DNS server when `reset.mode` is `static`")]
    EmptyReset,

    #[error("`{field}` contains `{address}`, which cannot be set on this platform")]
    UnsupportedAddress { field: &'static str, address: IpAddr },
}

impl Config {
    /// Loads the config file at `path`, or from the per-user config dir if `path` is `None`.
    ///
    /// An explicit path must exist. The per-user file is optional.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match known_dirs::config_file() {
            Some(path) if path.exists() => Self::load(&path),
            Some(_) | None => {
                tracing::debug!("No config file found, using defaults");

                Ok(Self::default())
            }
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = toml::from_str::<Self>(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), ?config, "Loaded config");

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.alternate.servers.is_empty() {
            return Err(ConfigError::EmptyAlternate);
        }
        check_supported("alternate.servers", &self.alternate.servers)?;

        match &self.reset {
            ResetTarget::Static { servers } if servers.is_empty() => Err(ConfigError::EmptyReset),
            ResetTarget::Static { servers } => check_supported("reset.servers", servers),
            ResetTarget::Automatic => Ok(()),
        }
    }
}

/// Catches e.g. IPv6 servers on Windows before anything is changed.
fn check_supported(field: &'static str, servers: &[IpAddr]) -> Result<(), ConfigError> {
    match servers
        .iter()
        .find(|address| !SystemBackend.supports(address))
    {
        Some(address) => Err(ConfigError::UnsupportedAddress {
            field,
            address: *address,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
interface = "name:Wi-Fi"

[alternate]
name = "Cloudflare"
servers = ["1.1.1.1", "1.0.0.1", "1.1.1.2"]

[reset]
mode = "automatic"
"#;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::with_prefix("dns-switch-config-").unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();

        (dir, path)
    }

    #[test]
    fn defaults_are_ethernet_shecan_and_router() {
        let config = Config::default();

        assert_eq!(config.interface, InterfaceSelector::Name("Ethernet".to_owned()));
        assert_eq!(config.alternate.name, "Shecan");
        assert_eq!(
            config.alternate.servers,
            vec![
                IpAddr::from([178, 22, 122, 100]),
                IpAddr::from([185, 51, 200, 2])
            ]
        );
        assert_eq!(config.reset.to_string(), "192.168.1.1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_example() {
        let (_dir, path) = write_config(EXAMPLE);

        let config = Config::load(&path).unwrap();

        assert_eq!(config.interface, InterfaceSelector::Name("Wi-Fi".to_owned()));
        assert_eq!(config.alternate.name, "Cloudflare");
        assert_eq!(config.alternate.servers.len(), 3);
        assert_eq!(config.reset, ResetTarget::Automatic);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let (_dir, path) = write_config("");

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn static_reset_with_servers() {
        let (_dir, path) = write_config(
            r#"
interface = "auto"

[reset]
mode = "static"
servers = ["10.0.0.1", "10.0.0.2"]
"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.interface, InterfaceSelector::FirstUp);
        assert_eq!(config.reset.to_string(), "10.0.0.1, 10.0.0.2");
    }

    #[test]
    fn rejects_empty_alternate() {
        let (_dir, path) = write_config(
            r#"
[alternate]
name = "Nothing"
servers = []
"#,
        );

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::EmptyAlternate)
        ));
    }

    #[test]
    fn rejects_empty_static_reset() {
        let (_dir, path) = write_config(
            r#"
[reset]
mode = "static"
servers = []
"#,
        );

        assert!(matches!(Config::load(&path), Err(ConfigError::EmptyReset)));
    }

    #[test]
    fn rejects_invalid_address() {
        let (_dir, path) = write_config(
            r#"
[alternate]
name = "Typo"
servers = ["178.22.122"]
"#,
        );

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_unknown_keys() {
        let (_dir, path) = write_config(r#"interfaces = "Ethernet""#);

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_empty_selector() {
        let (_dir, path) = write_config(r#"interface = "id:""#);

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn alternate_without_name_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[alternate]
servers = ["1.1.1.1"]
"#,
        );

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    const IPV6_ALTERNATE: &str = r#"
[alternate]
name = "Cloudflare"
servers = ["1.1.1.1", "2606:4700:4700::1111"]
"#;

    #[cfg(target_os = "windows")]
    #[test]
    fn ipv6_server_is_rejected_on_windows() {
        let (_dir, path) = write_config(IPV6_ALTERNATE);

        let result = Config::load(&path);

        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedAddress {
                field: "alternate.servers",
                ..
            })
        ));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn ipv6_reset_server_is_rejected_on_windows() {
        let (_dir, path) = write_config(
            r#"
[reset]
mode = "static"
servers = ["fe80::1"]
"#,
        );

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::UnsupportedAddress {
                field: "reset.servers",
                ..
            })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn ipv6_server_is_accepted_on_linux() {
        let (_dir, path) = write_config(IPV6_ALTERNATE);

        let config = Config::load(&path).unwrap();

        assert_eq!(config.alternate.servers.len(), 2);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::with_prefix("dns-switch-config-").unwrap();

        let result = Config::discover(Some(&dir.path().join("missing.toml")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
