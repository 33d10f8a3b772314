//! platelight - Main entry point
//!
//! Command-line front end over the platelight library: request CSV
//! validation, binary well-map export, serial port listing, and the
//! interactive plate-guidance loop.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use platelight::cli::{Cli, Commands};
use platelight::{
    DeploymentSettings, NavigationEngine, PanelConnection, PortsFile, RequestStore, SearchOutcome,
    SerialLink, TransitionOutcome,
};

/// Initialize the tracing subscriber; RUST_LOG overrides the default.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { requests } => cmd_validate(&requests),
        Commands::Export {
            requests,
            out,
            settings,
        } => cmd_export(&requests, &out, settings.as_deref()),
        Commands::Ports => cmd_ports(),
        Commands::Guide {
            requests,
            ports,
            settings,
        } => cmd_guide(
            &requests,
            ports.as_deref(),
            settings.as_deref(),
            cli.dry_run,
        ),
    }
}

/// Read a request CSV (skipping the header line) into a sorted store.
fn load_store(path: &Path) -> Result<RequestStore> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request CSV {path:?}"))?;
    let store = RequestStore::load(text.lines().skip(1))
        .with_context(|| format!("Failed to load request CSV {path:?}"))?;
    Ok(store)
}

fn load_settings(path: Option<&Path>) -> Result<DeploymentSettings> {
    match path {
        Some(path) => DeploymentSettings::load_from_file(path),
        None => Ok(DeploymentSettings::default()),
    }
}

fn cmd_validate(requests: &Path) -> Result<()> {
    match load_store(requests) {
        Ok(store) => {
            let plates = count_plate_groups(&store);
            println!(
                "✓ {:?} is valid: {} requests across {} plates",
                requests,
                store.len(),
                plates
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Validation failed: {e:#}");
            std::process::exit(1);
        }
    }
}

fn count_plate_groups(store: &RequestStore) -> usize {
    let requests = store.as_slice();
    let mut plates = 0;
    let mut index = 0;
    while index < requests.len() {
        plates += 1;
        let representative = &requests[index].location;
        index += 1;
        while index < requests.len() && requests[index].location.same_plate(representative) {
            index += 1;
        }
    }
    plates
}

fn cmd_export(requests: &Path, out: &Path, settings: Option<&Path>) -> Result<()> {
    let store = load_store(requests)?;
    let settings = load_settings(settings)?;
    let written = platelight::export_file(store.as_slice(), settings.columns_per_plate, out)
        .with_context(|| format!("Failed to write well map {out:?}"))?;
    println!("✓ wrote {written} records to {out:?}");
    Ok(())
}

fn cmd_ports() -> Result<()> {
    let ports = platelight::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        for port in ports {
            println!("{port}");
        }
    }
    Ok(())
}

fn cmd_guide(
    requests: &Path,
    ports: Option<&Path>,
    settings: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let store = load_store(requests)?;
    let settings = load_settings(settings)?;

    let panel = match (dry_run, ports) {
        (true, _) => {
            info!("dry-run: frames will be logged, not transmitted");
            PanelConnection::offline()
        }
        (false, Some(ports_path)) => {
            let ports = PortsFile::load_from_file(ports_path)?;
            let link = SerialLink::open(
                ports.primary(),
                settings.baud_rate,
                settings.read_timeout(),
            )?;
            PanelConnection::with_link(Box::new(link))
        }
        (false, None) => {
            info!("no ports file given, running offline");
            PanelConnection::offline()
        }
    };

    let mut engine = NavigationEngine::new(store, panel)?;
    if !engine.set_brightness(settings.default_brightness) {
        eprintln!("⚠ panel did not acknowledge the brightness command");
    }
    let outcome = engine.refresh();
    print_group(&engine, &outcome);

    println!("Commands: n(ext), p(revious), g <index>, f <barcode>, b <level>, l(ist), q(uit)");
    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.trim().split_whitespace();
        let outcome = match (words.next(), words.next()) {
            (Some("n") | Some("next"), _) => Some(engine.advance_plate()),
            (Some("p") | Some("prev") | Some("previous"), _) => Some(engine.retreat_plate()),
            (Some("g") | Some("goto"), Some(arg)) => match arg.parse() {
                Ok(index) => Some(engine.seek_to_index(index)),
                Err(_) => {
                    eprintln!("✗ '{arg}' is not an index");
                    None
                }
            },
            (Some("f") | Some("find"), Some(barcode)) => {
                match engine.find_by_barcode(barcode) {
                    SearchOutcome::Found { transition, .. } => Some(transition),
                    SearchOutcome::NotFound => {
                        eprintln!("✗ no plate with barcode '{barcode}'");
                        None
                    }
                }
            }
            (Some("b") | Some("brightness"), Some(arg)) => {
                match arg.parse::<u8>() {
                    Ok(level) => {
                        if engine.set_brightness(level) {
                            println!("✓ brightness set to {level}");
                        } else {
                            eprintln!("⚠ panel did not acknowledge the brightness command");
                        }
                    }
                    Err(_) => eprintln!("✗ brightness must be 0-255"),
                }
                None
            }
            (Some("l") | Some("list"), _) => Some(engine.refresh()),
            (Some("q") | Some("quit") | Some("exit"), _) => break,
            (Some("g") | Some("goto"), None) => {
                eprintln!("✗ usage: g <index>");
                None
            }
            (Some("f") | Some("find"), None) => {
                eprintln!("✗ usage: f <barcode>");
                None
            }
            (Some("b") | Some("brightness"), None) => {
                eprintln!("✗ usage: b <level>");
                None
            }
            (None, _) => None,
            (Some(other), _) => {
                eprintln!("✗ unknown command '{other}'");
                None
            }
        };
        if let Some(outcome) = outcome {
            print_group(&engine, &outcome);
        }
        prompt()?;
    }

    engine.shutdown();
    info!("panel connection closed");
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

/// Print the current plate group as a small table.
fn print_group(engine: &NavigationEngine, outcome: &TransitionOutcome) {
    let current = engine.current_request();
    println!(
        "\nPlate {} ({} of {} requests, cursor {})",
        current
            .location
            .barcode
            .as_deref()
            .unwrap_or("<no barcode>"),
        outcome.group.len(),
        engine.len(),
        outcome.cursor,
    );
    for (offset, request) in engine.current_plate_group().iter().enumerate() {
        println!(
            "  [{}] {}  {}  well {}  {}",
            outcome.group.start + offset,
            request.request_id,
            request.barcode,
            request.location.well.as_deref().unwrap_or("--"),
            request.location,
        );
    }
    if !outcome.panel_ok {
        eprintln!("⚠ panel refresh incomplete; some wells may be unlit");
    }
}
