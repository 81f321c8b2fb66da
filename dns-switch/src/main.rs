//! One-key DNS switcher for a single network interface.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![expect(clippy::print_stdout, reason = "We are a CLI.")]
#![expect(clippy::print_stderr, reason = "We are a CLI.")]

use anyhow::{Context as _, Result};
use clap::{CommandFactory as _, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal,
};
use dns_switch::{
    DnsBackend, DnsController, InterfaceDirectory, InterfaceSelector, NetworkInterface,
    SystemBackend, SystemInterfaces,
    config::{Config, ResetTarget},
};
use std::{
    io::{self, Write},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(
    name = "dns-switch",
    bin_name = "dns-switch",
    version,
    about,
    long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    /// Without a command, an interactive menu is shown.
    #[command(subcommand)]
    command: Option<Cmd>,

    /// Interface to change: `<name>`, `name:<name>`, `id:<id>` or `auto`.
    ///
    /// Overrides `interface` in the config file.
    #[arg(long, global = true, env = "DNS_SWITCH_INTERFACE")]
    interface: Option<InterfaceSelector>,

    /// Config file to use instead of the per-user one.
    #[arg(long, global = true, env = "DNS_SWITCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `dns_switch=trace`. Logs go to stderr.
    #[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Cmd {
    /// Show current DNS
    #[command(short_flag = 'i', long_flag = "info", visible_alias = "i")]
    Info,
    /// Set DNS to the alternate servers
    #[command(short_flag = 's', long_flag = "set", visible_alias = "s")]
    Set,
    /// Reset DNS to default
    #[command(short_flag = 'r', long_flag = "reset", visible_alias = "r")]
    Reset,
    /// List network interfaces, to help pick `--interface`
    #[command(short_flag = 'l', long_flag = "list", visible_alias = "l")]
    List,
    /// Print help
    #[command(visible_alias = "h")]
    Help,
}

fn main() {
    let cli = Cli::parse();

    match try_main(cli) {
        Ok(()) => {}
        Err(e) => {
            // Print chain of errors manually to avoid it looking like a crash with stacktrace.
            eprintln!("Error: {e:#}");

            std::process::exit(1);
        }
    }
}

fn try_main(cli: Cli) -> Result<()> {
    logging::setup_global_subscriber(&cli.log_level).context("Failed to set up logging")?;

    let mut config = Config::discover(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(interface) = cli.interface {
        config.interface = interface;
    }

    let command = match cli.command {
        Some(command) => command,
        None => match menu(&config)? {
            Some(command) => command,
            None => return Ok(()),
        },
    };

    let mut controller = DnsController::new(SystemInterfaces, SystemBackend::default());

    run(command, &config, &mut controller, &mut io::stdout().lock())
}

fn run<D, B>(
    command: Cmd,
    config: &Config,
    controller: &mut DnsController<D, B>,
    out: &mut impl Write,
) -> Result<()>
where
    D: InterfaceDirectory,
    B: DnsBackend,
{
    match command {
        Cmd::Info => {
            let interface = select(config, controller)?;

            let servers = controller
                .get_current_dns(&interface.id)
                .with_context(|| format!("Failed to read DNS servers of `{}`", interface.name))?;

            for server in servers {
                writeln!(out, "{server}")?;
            }
        }
        Cmd::Set => {
            warn_unless_root();
            let interface = select(config, controller)?;
            let profile = &config.alternate;

            controller
                .set_dns(&interface.id, &profile.servers)
                .with_context(|| {
                    format!("Failed to set DNS of `{}` to {}", interface.name, profile.name)
                })?;

            writeln!(out, "Changed to {}.", profile.name)?;
        }
        Cmd::Reset => {
            warn_unless_root();
            let interface = select(config, controller)?;

            match &config.reset {
                ResetTarget::Static { servers } => controller.set_dns(&interface.id, servers),
                ResetTarget::Automatic => controller
                    .reset_dns(&interface.id)
                    .and_then(|()| controller.flush(&interface.id)),
            }
            .with_context(|| format!("Failed to reset DNS of `{}`", interface.name))?;

            writeln!(out, "Reset.")?;
        }
        Cmd::List => {
            let interfaces = controller
                .directory()
                .list_interfaces()
                .context("Failed to list network interfaces")?;

            for interface in interfaces {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    interface.id,
                    interface.name,
                    interface.description,
                    if interface.up { "up" } else { "down" }
                )?;
            }
        }
        Cmd::Help => {
            write!(out, "{}", Cli::command().render_help())?;
        }
    }

    Ok(())
}

fn select<D, B>(config: &Config, controller: &DnsController<D, B>) -> Result<NetworkInterface>
where
    D: InterfaceDirectory,
    B: DnsBackend,
{
    let interface = config
        .interface
        .select(controller.directory())
        .context("Failed to select network interface")?;

    tracing::debug!(id = %interface.id, name = %interface.name, "Selected interface");

    Ok(interface)
}

/// Shows the menu and waits for a single key press.
///
/// Returns `None` if the user chose to exit.
fn menu(config: &Config) -> Result<Option<Cmd>> {
    println!("Switch the DNS servers of `{}`.", config.interface);
    println!();
    println!("  (1): Show current DNS.");
    println!("  (2): Set to {}.", config.alternate.name);
    println!("  (3): Reset to default DNS ({}).", config.reset);
    println!("  (?): Show help.");
    println!("  Other keys: Exit.");
    print!("Choose an item: ");
    io::stdout().flush()?;

    let key = read_key().context("Failed to read key press")?;
    println!();

    Ok(menu_choice(key))
}

fn menu_choice(key: KeyCode) -> Option<Cmd> {
    let KeyCode::Char(key) = key else {
        return None;
    };

    match key {
        '1' => Some(Cmd::Info),
        '2' => Some(Cmd::Set),
        '3' => Some(Cmd::Reset),
        // `/` shares a key with `?` on US layouts
        '?' | '/' | 'h' | 'H' => Some(Cmd::Help),
        _ => None,
    }
}

fn read_key() -> io::Result<KeyCode> {
    let _raw = RawMode::enable()?;

    loop {
        // Windows also reports key releases
        if let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            return Ok(code);
        }
    }
}

/// Keeps the terminal in raw mode until dropped.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("Failed to leave raw mode: {e}");
        }
    }
}

/// Changing DNS needs elevation. We don't ask for it, we only say so up front.
fn warn_unless_root() {
    if !is_root() {
        tracing::warn!("Not running as root, changing DNS will probably fail");
    }
}

#[cfg(target_os = "linux")]
fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

// `netsh` reports its own, clearer error if we are not elevated
#[cfg(not(target_os = "linux"))]
fn is_root() -> bool {
    true
}
