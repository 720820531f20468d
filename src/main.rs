//! saptune CLI - SAP workload tuning for Linux hosts

use clap::Parser;
use saptune::config::{CliArgs, Commands, LogFormat, OutputFormat, Settings};
use saptune::core::{NoteRunner, RunReport, SnapshotStore};
use saptune::error::Result;
use saptune::note::registry;
use saptune::system::Host;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();
    let settings = Settings::from_cli(&args);

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match settings.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match run(&args, &settings) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &CliArgs, settings: &Settings) -> Result<bool> {
    let Some((action, ids)) = args.command.action() else {
        return handle_command(&args.command, settings).map(|_| true);
    };

    let notes = registry::select(ids)?;
    let host = Host::local(&settings.root);
    tracing::debug!("Host: {:?}", host);

    let runner = NoteRunner::new(&host).with_store(SnapshotStore::new(&settings.state_dir));
    let report = runner.run(action, &notes);
    print_report(&report, settings)?;

    Ok(report.is_success())
}

fn handle_command(command: &Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::List => cmd_list(settings),
        // Runner actions are dispatched in run()
        _ => Ok(()),
    }
}

fn cmd_list(settings: &Settings) -> Result<()> {
    let notes = registry::all_notes();
    let store = SnapshotStore::new(&settings.state_dir);

    match settings.output_format {
        OutputFormat::Json => {
            let list: Vec<_> = notes
                .values()
                .map(|note| {
                    serde_json::json!({
                        "id": note.id(),
                        "name": note.name(),
                        "applied": store.contains(note.id()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Text => {
            println!("=== Supported Notes ===");
            for note in notes.values() {
                let marker = if store.contains(note.id()) { "*" } else { " " };
                println!("{} {:<9} {}", marker, note.id(), note.name());
            }
            println!("\n* applied (saved state present)");
        }
    }
    Ok(())
}

fn print_report(report: &RunReport, settings: &Settings) -> Result<()> {
    if settings.quiet {
        return Ok(());
    }
    match settings.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => report.print_summary(),
    }
    Ok(())
}
