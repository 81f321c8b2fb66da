use super::{InterfaceDirectory, NetworkInterface};
use crate::Error;
use std::{io, net::IpAddr};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceDirectory for SystemInterfaces {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        Err(Error::Enumerate(unsupported()))
    }

    fn dns_servers(&self, interface: &NetworkInterface) -> Result<Vec<IpAddr>, Error> {
        Err(Error::ReadDns {
            interface: interface.name.clone(),
            source: unsupported(),
        })
    }
}

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "Only Linux and Windows are supported",
    )
}
