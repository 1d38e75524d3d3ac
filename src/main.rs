//! # Field Trial Indexer Main Driver
//!
//! ## Purpose
//! Command-line entry point for the field trial indexing service. Parses one
//! maintenance request from the arguments, wires the service against the
//! configured filesystem store, runs the request, and prints the per-section
//! report.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging
//! 3. Build the reindex coordinator, cache manager, and artifact generator
//! 4. Dispatch the request and print the report as JSON
//! 5. Exit non-zero when any requested section failed

use clap::{Arg, ArgAction, Command};
use tracing::{info, warn};

use field_trial_indexing::{
    Config, EntityKind, IndexingService, OperationStatus, ReindexRequest, Result, ServiceRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("field-trial-indexer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Field Trial Data Team")
        .about("Reindexing and cache maintenance for field trial records")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("reindex-all")
                .long("reindex-all")
                .help("Reindex every record collection")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reindex")
                .long("reindex")
                .value_name("KIND")
                .help(
                    "Reindex one collection (trials, studies, locations, \
                     measured-variables, programmes, treatments); repeatable",
                )
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("replace")
                .long("replace")
                .help("Wipe and replace index entries instead of updating them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-cache")
                .long("list-cache")
                .help("List the cached study files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("full-paths")
                .long("full-paths")
                .help("List cache entries with full paths")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("clear-cache")
                .long("clear-cache")
                .value_name("SPEC")
                .help("Clear cached studies by name, or * to clear all of them"),
        )
        .arg(
            Arg::new("generate-packages")
                .long("generate-packages")
                .help("Regenerate the data package for every study")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-default-config")
                .long("print-default-config")
                .help("Print the default configuration as TOML and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("print-default-config") {
        println!("{}", Config::default().to_toml()?);
        return Ok(());
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let config = Config::from_file(config_path)?;

    init_logging(&config);

    info!("Field trial indexer starting");
    info!("Configuration loaded from: {}", config_path);

    let request = build_request(&matches)?;
    if request.is_empty() {
        warn!("Nothing requested; use --reindex-all, --reindex, --list-cache, --clear-cache or --generate-packages");
        return Ok(());
    }

    let service = IndexingService::from_config(&config);
    let report = service.run(&request).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).map_err(field_trial_indexing::IndexingError::from)?
    );

    if report_failed(&report) {
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize logging from the configuration; `RUST_LOG` wins when set.
fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Translate the parsed arguments into one service request.
fn build_request(matches: &clap::ArgMatches) -> Result<ServiceRequest> {
    let mut reindex = ReindexRequest {
        all: matches.get_flag("reindex-all"),
        update_existing: !matches.get_flag("replace"),
        ..ReindexRequest::default()
    };

    if let Some(kinds) = matches.get_many::<String>("reindex") {
        for raw in kinds {
            let kind: EntityKind = raw.parse()?;
            reindex.set_requested(kind, true);
        }
    }

    Ok(ServiceRequest {
        reindex,
        list_cache: matches.get_flag("list-cache"),
        list_full_paths: matches.get_flag("full-paths"),
        clear_cache: matches.get_one::<String>("clear-cache").cloned(),
        generate_packages: matches.get_flag("generate-packages"),
    })
}

/// Whether any requested section ended in a failure state.
fn report_failed(report: &field_trial_indexing::ServiceReport) -> bool {
    let failed = |status: OperationStatus| {
        matches!(
            status,
            OperationStatus::Failed | OperationStatus::FailedToStart
        )
    };

    report
        .reindex
        .as_ref()
        .map(|section| failed(section.status))
        .unwrap_or(false)
        || report
            .cache_list
            .as_ref()
            .map(|section| failed(section.status))
            .unwrap_or(false)
        || report
            .cache_clear
            .as_ref()
            .map(|section| failed(section.status))
            .unwrap_or(false)
        || report
            .packages
            .as_ref()
            .map(|section| failed(section.status))
            .unwrap_or(false)
}
