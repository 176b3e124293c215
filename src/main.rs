// SPDX-License-Identifier: Apache-2.0

//! ringbus broker binary: resolve settings, initialize logging, and run the
//! lifecycle supervisor until a termination signal.

use clap::{Arg, ArgMatches, Command};
use ringbus_config::Settings;
use ringbus_server::Supervisor;
use tracing_subscriber::EnvFilter;

fn base_command() -> Command {
    Command::new("ringbus")
        .about("In-memory pub/sub broker over a lock-free ring buffer")
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .num_args(1)
                .help("Path to a JSON settings file (defaults apply when omitted)"),
        )
        .arg(
            Arg::new("rpc-addr")
                .long("rpc-addr")
                .num_args(1)
                .help("Override the RPC listener address (host:port)"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .num_args(1)
                .help("Override the HTTP gateway address (host:port)"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .num_args(1)
                .value_parser(clap::value_parser!(usize))
                .help("Override the ring capacity"),
        )
        .arg(
            Arg::new("consumer-groups")
                .long("consumer-groups")
                .num_args(1)
                .value_parser(clap::value_parser!(usize))
                .help("Override the consumer-group cursor count"),
        )
        .after_help(
            "Examples:\n  ringbus --rpc-addr 127.0.0.1:50051 --http-addr 127.0.0.1:8080\n  ringbus --settings ringbus.json --capacity 1024",
        )
}

fn resolve_settings(matches: &ArgMatches) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match matches.get_one::<String>("settings") {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    if let Some(addr) = matches.get_one::<String>("rpc-addr") {
        settings.transport.rpc_addr = addr.parse()?;
    }
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        settings.transport.http_addr = addr.parse()?;
    }
    if let Some(capacity) = matches.get_one::<usize>("capacity") {
        settings.broker.capacity = *capacity;
    }
    if let Some(groups) = matches.get_one::<usize>("consumer-groups") {
        settings.broker.consumer_groups = *groups;
    }

    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = base_command().get_matches();
    let settings = resolve_settings(&matches)?;

    Supervisor::new(settings).run().await?;
    Ok(())
}
