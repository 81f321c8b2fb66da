use super::{InterfaceDirectory, NetworkInterface};
use crate::{Error, dns_control::parse_resolvectl_output, process};
use itertools::Itertools as _;
use nix::{
    ifaddrs::getifaddrs,
    net::if_::{InterfaceFlags, if_nametoindex},
};
use std::{io, net::IpAddr, path::Path};

const ETC_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Interfaces from `getifaddrs`, DNS servers from `systemd-resolved`.
///
/// The interface id is the kernel's interface index.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceDirectory for SystemInterfaces {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        // `getifaddrs` yields one entry per address, so each interface shows up several times.
        getifaddrs()
            .map_err(|errno| Error::Enumerate(io::Error::from(errno)))?
            .unique_by(|ifaddr| ifaddr.interface_name.clone())
            .map(|ifaddr| {
                let index = if_nametoindex(ifaddr.interface_name.as_str())
                    .map_err(|errno| Error::Enumerate(io::Error::from(errno)))?;

                Ok(NetworkInterface {
                    id: index.to_string(),
                    description: describe(&ifaddr.interface_name, ifaddr.flags),
                    name: ifaddr.interface_name,
                    up: ifaddr
                        .flags
                        .contains(InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING),
                    loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                })
            })
            .collect()
    }

    fn dns_servers(&self, interface: &NetworkInterface) -> Result<Vec<IpAddr>, Error> {
        match link_dns_servers(&interface.name) {
            Ok(servers) => Ok(servers),
            Err(error) => {
                // No `systemd-resolved`, so there are no per-link servers. Everything uses the global ones.
                tracing::debug!(
                    "Falling back to `{ETC_RESOLV_CONF}` for `{}`: {error}",
                    interface.name
                );

                resolv_conf_nameservers(Path::new(ETC_RESOLV_CONF)).map_err(|source| {
                    Error::ReadDns {
                        interface: interface.name.clone(),
                        source,
                    }
                })
            }
        }
    }
}

/// Returns the DNS servers `systemd-resolved` has for one link
fn link_dns_servers(interface_name: &str) -> Result<Vec<IpAddr>, Error> {
    let mut command = process::command("resolvectl");
    command.args(["dns", interface_name]);

    let output = process::read(command)?;

    Ok(parse_resolvectl_output(&output))
}

fn resolv_conf_nameservers(path: &Path) -> io::Result<Vec<IpAddr>> {
    let text = std::fs::read_to_string(path)?;
    let parsed = resolv_conf::Config::parse(text)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    // Drop the scoping info for IPv6, we only report addresses
    Ok(parsed
        .nameservers
        .into_iter()
        .map(|addr| addr.into())
        .collect())
}

fn describe(name: &str, flags: InterfaceFlags) -> String {
    if flags.contains(InterfaceFlags::IFF_LOOPBACK) {
        return "Loopback".to_owned();
    }
    if flags.contains(InterfaceFlags::IFF_POINTOPOINT) {
        return "Point-to-point".to_owned();
    }
    if Path::new("/sys/class/net").join(name).join("wireless").exists() {
        return "Wireless".to_owned();
    }
    if Path::new("/sys/class/net").join(name).join("device").exists() {
        return "Ethernet".to_owned();
    }

    "Virtual".to_owned()
}
