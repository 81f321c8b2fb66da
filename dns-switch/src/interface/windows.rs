use super::{InterfaceDirectory, NetworkInterface};
use crate::Error;
use std::{io, net::IpAddr};

/// Adapters from `GetAdaptersAddresses`, via the `ipconfig` crate.
///
/// The interface id is the adapter GUID, e.g. `{6C0507CB-C884-4A78-BC55-0ACEE21227F6}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceDirectory for SystemInterfaces {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        let interfaces = adapters()?
            .iter()
            .map(|adapter| NetworkInterface {
                id: adapter.adapter_name().to_owned(),
                name: adapter.friendly_name().to_owned(),
                description: adapter.description().to_owned(),
                up: matches!(adapter.oper_status(), ipconfig::OperStatus::IfOperStatusUp),
                loopback: matches!(adapter.if_type(), ipconfig::IfType::SoftwareLoopback),
            })
            .collect();

        Ok(interfaces)
    }

    fn dns_servers(&self, interface: &NetworkInterface) -> Result<Vec<IpAddr>, Error> {
        let adapter = adapters()?
            .into_iter()
            .find(|adapter| adapter.adapter_name() == interface.id)
            .ok_or_else(|| Error::NotFound(format!("id `{}`", interface.id)))?;

        let resolvers = adapter.dns_servers().to_vec();
        // This is private, so keep it at `debug` or `trace`
        tracing::debug!(interface = %interface.name, ?resolvers);

        Ok(resolvers)
    }
}

fn adapters() -> Result<Vec<ipconfig::Adapter>, Error> {
    ipconfig::get_adapters().map_err(|e| Error::Enumerate(io::Error::other(e.to_string())))
}
