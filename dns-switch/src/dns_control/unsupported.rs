use super::{DnsBackend, Intent};
use crate::{Error, NetworkInterface};
use std::io;

#[derive(Debug, Default)]
pub struct SystemBackend;

impl DnsBackend for SystemBackend {
    fn apply(&mut self, _: &NetworkInterface, intent: Intent) -> Result<(), Error> {
        Err(Error::BackendLaunch {
            command: format!("{intent:?}"),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "Only Linux and Windows are supported",
            ),
        })
    }
}
