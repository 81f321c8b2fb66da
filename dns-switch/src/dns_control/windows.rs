//! Changes the DNS servers of an adapter with `netsh`
//!
//! `netsh` addresses adapters by their friendly name, e.g. `Ethernet`, not by GUID.
//! We resolve the GUID to a name right before every change so renames are picked up.
//!
//! Only the IPv4 context (`netsh interface ip`) is used, so IPv6 servers are rejected.
//! `netsh interface ipv6` keeps a separate list with its own indices.
//!
//! <https://learn.microsoft.com/en-us/windows-server/networking/technologies/netsh/netsh-interface-ip>

use super::{DnsBackend, Intent};
use crate::{Error, NetworkInterface, process};
use std::net::IpAddr;

#[derive(Debug, Default)]
pub struct SystemBackend;

impl DnsBackend for SystemBackend {
    fn supports(&self, address: &IpAddr) -> bool {
        address.is_ipv4()
    }

    fn apply(&mut self, interface: &NetworkInterface, intent: Intent) -> Result<(), Error> {
        let (program, args) = command_line(&interface.name, intent)?;

        let mut command = process::command(program);
        command.args(args);

        process::run(command)
    }
}

fn command_line(
    interface_name: &str,
    intent: Intent,
) -> Result<(&'static str, Vec<String>), Error> {
    let name = format!("name={interface_name}");

    let command = match intent {
        Intent::SetPrimary(address @ IpAddr::V6(_))
        | Intent::AddSecondary {
            address: address @ IpAddr::V6(_),
            ..
        } => return Err(Error::UnsupportedAddress(address)),
        // `static` clears every other server on the adapter
        Intent::SetPrimary(address) => netsh(&[
            "set",
            "dns",
            &name,
            "static",
            &address.to_string(),
        ]),
        Intent::AddSecondary { address, index } => netsh(&[
            "add",
            "dns",
            &name,
            &address.to_string(),
            &format!("index={index}"),
        ]),
        Intent::SetAutomatic => netsh(&["set", "dns", &name, "dhcp"]),
        Intent::FlushCache => {
            tracing::debug!("Flushing Windows DNS cache...");

            ("ipconfig", vec!["/flushdns".to_owned()])
        }
    };

    Ok(command)
}

fn netsh(args: &[&str]) -> (&'static str, Vec<String>) {
    let args = ["interface", "ip"]
        .iter()
        .chain(args)
        .map(|arg| (*arg).to_owned())
        .collect();

    ("netsh", args)
}
