use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No network interface matches {0}")]
    NotFound(String),
    #[error("Failed to launch `{command}`")]
    BackendLaunch {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with {}: {stderr}", describe_exit_code(*.code))]
    BackendCommand {
        command: String,
        /// `None` if the process was killed by a signal.
        code: Option<i32>,
        stderr: String,
    },
    #[error("Cannot apply an empty list of DNS servers")]
    EmptyAddressList,
    #[error("Cannot set `{0}`, only IPv4 DNS servers are supported on this platform")]
    UnsupportedAddress(std::net::IpAddr),
    #[error("Failed to enumerate network interfaces")]
    Enumerate(#[source] io::Error),
    #[error("Failed to read the DNS servers of `{interface}`")]
    ReadDns {
        interface: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_owned(),
    }
}
