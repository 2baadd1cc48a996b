//! # AAS Discovery CLI
//!
//! Command-line access to a local discovery index: register, fetch, delete,
//! and search asset links, plus identifier encoding helpers.

use aas_discovery_core::{
    decode_id_base64url, encode_id_base64url, AssetLink, DiscoveryService, SearchRequest,
};
use aas_discovery_sqlite::SqliteStore;
use anyhow::{bail, Context, Result};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;

use config::DiscoveryConfig;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Encode(String),
    Decode(String),
    Register {
        aas_id: String,
        links: Vec<AssetLink>,
    },
    Get(String),
    Delete(String),
    Search {
        links: Vec<AssetLink>,
        limit: Option<i64>,
        cursor: Option<String>,
    },
    Help,
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            return Ok(ExitCode::FAILURE);
        }
    };

    run(command)
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Encode(id) => println!("{}", encode_id_base64url(&id)),
        Command::Decode(encoded) => {
            let decoded = decode_id_base64url(&encoded).context("Failed to decode")?;
            println!("{decoded}");
        }
        Command::Help => print_help(),
        Command::Register { aas_id, links } => {
            let service = open_service()?;
            let outcome = service.register(&aas_id, links)?;
            println!("{outcome}");
        }
        Command::Get(aas_id) => {
            let service = open_service()?;
            match service.fetch(&aas_id) {
                Ok(links) => println!("{}", serde_json::to_string_pretty(&links)?),
                Err(err) if err.is_not_found() => {
                    eprintln!("No asset links registered for '{aas_id}'");
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Delete(aas_id) => {
            let service = open_service()?;
            let outcome = service.delete(&aas_id)?;
            println!("{outcome}");
        }
        Command::Search {
            links,
            limit,
            cursor,
        } => {
            let service = open_service()?;
            let page = service.search_request(&SearchRequest {
                asset_links: links,
                limit,
                cursor,
            })?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_service() -> Result<DiscoveryService<SqliteStore>> {
    let config = DiscoveryConfig::from_env()?;
    let store = SqliteStore::open(&config.persistence.db_path).with_context(|| {
        format!(
            "Failed to open SQLite database {}",
            config.persistence.db_path.display()
        )
    })?;

    tracing::debug!(
        db_path = %config.persistence.db_path.display(),
        default_limit = config.search.default_limit,
        "Discovery store ready"
    );

    Ok(DiscoveryService::new(store).with_default_limit(config.search.default_limit))
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((cmd, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "encode" => Ok(Command::Encode(single_arg(rest, "encode <identifier>")?)),
        "decode" => Ok(Command::Decode(single_arg(rest, "decode <encoded>")?)),
        "get" => Ok(Command::Get(single_arg(rest, "get <aas-id>")?)),
        "delete" => Ok(Command::Delete(single_arg(rest, "delete <aas-id>")?)),
        "register" => {
            let Some((aas_id, pairs)) = rest.split_first() else {
                bail!("Usage: aas-discovery register <aas-id> <name=value>...");
            };
            Ok(Command::Register {
                aas_id: aas_id.clone(),
                links: pairs.iter().map(|p| parse_link(p)).collect::<Result<_>>()?,
            })
        }
        "search" => parse_search(rest),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("Unknown command: {other}"),
    }
}

fn parse_search(args: &[String]) -> Result<Command> {
    let mut links = Vec::new();
    let mut limit = None;
    let mut cursor = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--limit" => {
                let value = iter.next().context("--limit needs a value")?;
                limit = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid --limit '{value}'"))?,
                );
            }
            "--cursor" => {
                cursor = Some(iter.next().context("--cursor needs a value")?.clone());
            }
            pair => links.push(parse_link(pair)?),
        }
    }

    Ok(Command::Search {
        links,
        limit,
        cursor,
    })
}

fn single_arg(args: &[String], usage: &str) -> Result<String> {
    match args {
        [value] => Ok(value.clone()),
        _ => bail!("Usage: aas-discovery {usage}"),
    }
}

/// Parse `name=value`; the value may itself contain `=`.
fn parse_link(arg: &str) -> Result<AssetLink> {
    let Some((name, value)) = arg.split_once('=') else {
        bail!("Expected name=value, got '{arg}'");
    };
    Ok(AssetLink::new(name, value))
}

fn print_help() {
    println!(
        r#"AAS Discovery CLI

USAGE:
    aas-discovery <COMMAND> [OPTIONS]

COMMANDS:
    register <aas-id> <name=value>...    Register (replace) the asset links of an AAS
    get <aas-id>                         Print the asset links of an AAS
    delete <aas-id>                      Remove an AAS and its asset links
    search [--limit N] [--cursor C] <name=value>...
                                         Find AAS ids holding every given link
    encode <id>                          Encode an AAS identifier to base64url (no padding)
    decode <encoded>                     Decode a base64url-encoded identifier
    help                                 Show this help message

ENVIRONMENT:
    DISCOVERY_DB_PATH         SQLite database path (default ./discovery.db)
    DISCOVERY_DEFAULT_LIMIT   Page size when --limit is absent (default 100)
    RUST_LOG                  Log filter (default warn)

EXAMPLES:
    aas-discovery register "urn:example:aas:asset1" serialNumber=SN-1234 plant=P1
    aas-discovery search --limit 10 plant=P1
"#
    );
}
