use super::{DnsBackend, Intent};
use crate::{Error, NetworkInterface, process};
use std::{net::IpAddr, str::FromStr};

/// Cooperates with `systemd-resolved` through `resolvectl`
///
/// `resolvectl dns` always replaces the whole server list of a link, so adding a
/// secondary server re-reads the current list and writes it back with the new server inserted.
#[derive(Debug, Default)]
pub struct SystemBackend;

impl DnsBackend for SystemBackend {
    fn apply(&mut self, interface: &NetworkInterface, intent: Intent) -> Result<(), Error> {
        let args = resolvectl_args(&interface.name, intent, || {
            link_server_words(&interface.name)
        })?;

        if intent == Intent::FlushCache {
            tracing::debug!("Flushing systemd-resolved DNS cache...");
        }

        let mut command = process::command("resolvectl");
        command.args(args);

        process::run(command)
    }
}

/// The `resolvectl` arguments that carry out `intent`.
///
/// `current` returns the link's servers as `resolvectl` prints them. Only `AddSecondary` calls it.
fn resolvectl_args(
    interface_name: &str,
    intent: Intent,
    current: impl FnOnce() -> Result<Vec<String>, Error>,
) -> Result<Vec<String>, Error> {
    let args = match intent {
        Intent::SetPrimary(address) => {
            vec!["dns".to_owned(), interface_name.to_owned(), address.to_string()]
        }
        Intent::AddSecondary { address, index } => {
            let mut servers = current()?;
            insert_at_priority(&mut servers, address, index);

            ["dns".to_owned(), interface_name.to_owned()]
                .into_iter()
                .chain(servers)
                .collect()
        }
        Intent::SetAutomatic => vec!["revert".to_owned(), interface_name.to_owned()],
        Intent::FlushCache => vec!["flush-caches".to_owned()],
    };

    Ok(args)
}

/// Reads the servers of one link, keeping DNS-over-TLS server names.
fn link_server_words(interface_name: &str) -> Result<Vec<String>, Error> {
    let mut command = process::command("resolvectl");
    command.args(["dns", interface_name]);

    let output = process::read(command)?;

    Ok(server_words(&output)
        .map(|(_, word)| word.to_owned())
        .collect())
}

/// Puts `address` at 1-based priority `index`, or at the end if the list is shorter.
///
/// If the link already has `address`, that entry is moved, server name and all.
fn insert_at_priority(servers: &mut Vec<String>, address: IpAddr, index: usize) {
    let word = servers
        .iter()
        .position(|server| word_address(server) == Some(address))
        .map(|existing| servers.remove(existing))
        .unwrap_or_else(|| address.to_string());

    let position = index.saturating_sub(1).min(servers.len());
    servers.insert(position, word);
}

/// Parses the text output of `resolvectl dns`
///
/// Cannot fail. If the parsing code is wrong, the IP address vec will just be incomplete.
pub(crate) fn parse_resolvectl_output(s: &str) -> Vec<IpAddr> {
    server_words(s).map(|(address, _)| address).collect()
}

/// Every server in `resolvectl dns` output, next to the word it was printed as.
fn server_words(s: &str) -> impl Iterator<Item = (IpAddr, &str)> {
    s.lines()
        .flat_map(|line| line.split(' '))
        .filter_map(|word| Some((word_address(word)?, word)))
}

fn word_address(word: &str) -> Option<IpAddr> {
    // DNS-over-TLS servers are printed as `1.1.1.1#cloudflare-dns.com`
    let address = word.split_once('#').map_or(word, |(address, _)| address);

    IpAddr::from_str(address).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(178, 22, 122, 100));
    const SECONDARY: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(185, 51, 200, 2));

    fn words(servers: &[&str]) -> Vec<String> {
        servers.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn parse_resolvectl_output() {
        let cases = [
            // WSL
            (
                r"Global: 172.24.80.1
Link 2 (eth0):
Link 3 (docker0):
Link 24 (br-fc0b71997a3c):
Link 25 (br-0c129dafb204):
Link 26 (br-e67e83b19dce):
",
                vec![IpAddr::from([172, 24, 80, 1])],
            ),
            // Ubuntu 20.04
            (
                r"Global:
Link 2 (enp0s3): 192.168.1.1",
                vec![IpAddr::from([192, 168, 1, 1])],
            ),
            // `resolvectl dns enp0s3` after switching to the alternate servers
            (
                r"Link 2 (enp0s3): 178.22.122.100 185.51.200.2",
                vec![
                    IpAddr::from([178, 22, 122, 100]),
                    IpAddr::from([185, 51, 200, 2]),
                ],
            ),
            // DNS-over-TLS
            (
                r"Link 3 (wlp2s0): 1.1.1.1#cloudflare-dns.com 2606:4700:4700::1111",
                vec![
                    IpAddr::from([1, 1, 1, 1]),
                    "2606:4700:4700::1111".parse().unwrap(),
                ],
            ),
        ];

        for (i, (input, expected)) in cases.iter().enumerate() {
            let actual = super::parse_resolvectl_output(input);
            assert_eq!(&actual, expected, "Case {i} failed");
        }
    }

    #[test]
    fn server_words_keep_tls_names() {
        let words = server_words("Link 3 (wlp2s0): 1.1.1.1#cloudflare-dns.com 9.9.9.9")
            .map(|(_, word)| word)
            .collect::<Vec<_>>();

        assert_eq!(words, ["1.1.1.1#cloudflare-dns.com", "9.9.9.9"]);
    }

    #[test]
    fn set_primary_replaces_link_servers() {
        let args = resolvectl_args("eth0", Intent::SetPrimary(PRIMARY), || {
            unreachable!("Setting the primary doesn't read the link")
        })
        .unwrap();

        assert_eq!(args, ["dns", "eth0", "178.22.122.100"]);
    }

    #[test]
    fn add_secondary_rewrites_the_whole_list() {
        let args = resolvectl_args(
            "eth0",
            Intent::AddSecondary {
                address: SECONDARY,
                index: 2,
            },
            || Ok(words(&["178.22.122.100"])),
        )
        .unwrap();

        assert_eq!(args, ["dns", "eth0", "178.22.122.100", "185.51.200.2"]);
    }

    #[test]
    fn add_secondary_keeps_tls_server_names() {
        let args = resolvectl_args(
            "wlp2s0",
            Intent::AddSecondary {
                address: IpAddr::from([9, 9, 9, 9]),
                index: 2,
            },
            || Ok(words(&["1.1.1.1#cloudflare-dns.com", "8.8.8.8#dns.google"])),
        )
        .unwrap();

        assert_eq!(
            args,
            [
                "dns",
                "wlp2s0",
                "1.1.1.1#cloudflare-dns.com",
                "9.9.9.9",
                "8.8.8.8#dns.google"
            ]
        );
    }

    #[test]
    fn add_secondary_fails_if_link_cannot_be_read() {
        let result = resolvectl_args(
            "eth0",
            Intent::AddSecondary {
                address: SECONDARY,
                index: 2,
            },
            || {
                Err(Error::BackendCommand {
                    command: "resolvectl dns eth0".to_owned(),
                    code: Some(1),
                    stderr: "Failed to get global data: Unit dbus-org.freedesktop.resolve1.service not found.".to_owned(),
                })
            },
        );

        assert!(matches!(result, Err(Error::BackendCommand { .. })));
    }

    #[test]
    fn automatic_reverts_link() {
        let args = resolvectl_args("eth0", Intent::SetAutomatic, || unreachable!()).unwrap();

        assert_eq!(args, ["revert", "eth0"]);
    }

    #[test]
    fn flush_is_global() {
        let args = resolvectl_args("eth0", Intent::FlushCache, || unreachable!()).unwrap();

        assert_eq!(args, ["flush-caches"]);
    }

    /// Feeds each `dns` command back as the link state, the way `systemd-resolved` would.
    #[test]
    fn set_dns_sequence_builds_full_list() {
        let tertiary = "2606:4700:4700::1111".parse::<IpAddr>().unwrap();
        let mut link = words(&["192.168.1.1"]);
        let mut issued = Vec::new();

        for intent in [
            Intent::SetPrimary(PRIMARY),
            Intent::AddSecondary {
                address: SECONDARY,
                index: 2,
            },
            Intent::AddSecondary {
                address: tertiary,
                index: 3,
            },
            Intent::FlushCache,
        ] {
            let args = resolvectl_args("eth0", intent, || Ok(link.clone())).unwrap();
            if args[0] == "dns" {
                link = args[2..].to_vec();
            }
            issued.push(args.join(" "));
        }

        assert_eq!(
            issued,
            [
                "dns eth0 178.22.122.100",
                "dns eth0 178.22.122.100 185.51.200.2",
                "dns eth0 178.22.122.100 185.51.200.2 2606:4700:4700::1111",
                "flush-caches",
            ]
        );
    }

    #[test]
    fn insert_at_priority_two_follows_primary() {
        let mut servers = words(&["178.22.122.100"]);

        insert_at_priority(&mut servers, SECONDARY, 2);

        assert_eq!(servers, ["178.22.122.100", "185.51.200.2"]);
    }

    #[test]
    fn insert_past_the_end_appends() {
        let mut servers = words(&["1.1.1.1"]);

        insert_at_priority(&mut servers, IpAddr::from([9, 9, 9, 9]), 7);

        assert_eq!(servers, ["1.1.1.1", "9.9.9.9"]);
    }

    #[test]
    fn insert_moves_existing_server() {
        let mut servers = words(&["1.1.1.1", "8.8.8.8", "9.9.9.9#dns.quad9.net"]);

        insert_at_priority(&mut servers, IpAddr::from([9, 9, 9, 9]), 2);

        assert_eq!(servers, ["1.1.1.1", "9.9.9.9#dns.quad9.net", "8.8.8.8"]);
    }
}
