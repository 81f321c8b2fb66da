//! Switches the DNS servers of a single network interface.
//!
//! The [`interface`] module finds interfaces, the [`dns_control`] module changes
//! their DNS configuration by handing [`Intent`]s to a [`DnsBackend`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod dns_control;
mod error;
pub mod interface;
pub mod known_dirs;
#[cfg_attr(not(any(target_os = "linux", target_os = "windows")), allow(dead_code))]
mod process;

pub use dns_control::{DnsBackend, DnsController, Intent, SystemBackend};
pub use error::Error;
pub use interface::{InterfaceDirectory, InterfaceSelector, NetworkInterface, SystemInterfaces};

/// Used to name our subdirectory in the per-user config dir.
pub const BUNDLE_ID: &str = "dns-switch";
