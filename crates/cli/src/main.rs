//! Vigil CLI: edit and watch the shared violation store.
//!
//! `vigil [--store PATH] [--config FILE] [--json] [-v] COMMAND`
//!
//! Every command opens the store, does one thing and exits. `watch` keeps
//! running and prints change events until interrupted.

mod commands;
mod format;
mod parse;

use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vigil_core::{Error, RecordDraft, Result, ViolationTimestamp};
use vigil_engine::{VigilConfig, ViolationStore, CONFIG_FILE_NAME};

use commands::build_cli;
use format::{format_error, format_event, format_listing, format_record, format_stats, OutputMode};
use parse::{matches_to_action, CliAction, Target};

/// Exit status for failures worth retrying (lock contention), as EX_TEMPFAIL
const EXIT_RETRY: i32 = 75;

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };

    let store_override = matches.get_one::<String>("store").is_some();
    let result = load_config(&matches).and_then(|(config, config_path)| {
        execute(action, config, &config_path, store_override, mode)
    });
    if let Err(e) = result {
        eprintln!("{}", format_error(&e, mode));
        process::exit(if e.is_retryable() { EXIT_RETRY } else { 1 });
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "vigil=debug,vigil_engine=debug,vigil_concurrency=debug,vigil_durability=debug,info",
            _ => "trace",
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolve the config and the path it came from (or would be written to).
///
/// `--config` must exist; otherwise `./vigil.toml` is used when present and
/// defaults apply when not. Relative store paths resolve against the
/// config file's directory; `--store` wins over both.
fn load_config(matches: &clap::ArgMatches) -> Result<(VigilConfig, PathBuf)> {
    let (mut config, config_path) = match matches.get_one::<String>("config") {
        Some(path) => {
            let path = PathBuf::from(path);
            (VigilConfig::from_file(&path)?, path)
        }
        None => {
            let path = PathBuf::from(CONFIG_FILE_NAME);
            if path.exists() {
                (VigilConfig::from_file(&path)?, path)
            } else {
                (VigilConfig::default(), path)
            }
        }
    };

    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.store.path = match matches.get_one::<String>("store") {
        Some(store) => PathBuf::from(store),
        None => config.store_path_in(base),
    };
    debug!(config = %config_path.display(), store = %config.store.path.display(), "Configuration resolved");
    Ok((config, config_path))
}

fn demo_draft() -> RecordDraft {
    RecordDraft::new(
        ViolationTimestamp::now().to_string(),
        "KP2, Jabar, Indonesia",
        "Fumigasi Barang Shower Kandang",
        "Shoes are not on the shoe rack",
    )
    .with_image_url("https://files.catbox.moe/vvx882.mp4")
}

fn execute(
    action: CliAction,
    config: VigilConfig,
    config_path: &Path,
    store_override: bool,
    mode: OutputMode,
) -> Result<()> {
    if let CliAction::Init = action {
        // A new config records an explicit --store so later runs find it
        let wrote_config = if store_override && !config_path.exists() {
            config.write_to_file(config_path)?;
            true
        } else {
            VigilConfig::write_default_if_missing(config_path)?
        };
        let store = ViolationStore::open(config)?;
        let created = store.initialize()?;
        match mode {
            OutputMode::Json => println!(
                "{}",
                serde_json::json!({
                    "config": config_path.display().to_string(),
                    "config_created": wrote_config,
                    "store": store.path().display().to_string(),
                    "store_created": created,
                })
            ),
            OutputMode::Human => {
                if wrote_config {
                    println!("Wrote default config to {}", config_path.display());
                }
                if created {
                    println!("Created store at {}", store.path().display());
                } else {
                    println!("Store already exists at {}", store.path().display());
                }
            }
        }
        return Ok(());
    }

    let store = ViolationStore::open(config)?;
    match action {
        CliAction::Init => {}
        CliAction::List { filter, order } => {
            let listing = store.list_sorted(&filter, order)?;
            println!("{}", format_listing(&listing, mode));
        }
        CliAction::Add(draft) => {
            let created = store.create(&draft)?;
            println!("{}", format_record("created", created.position, &created.record, mode));
        }
        CliAction::Update { position, patch } => {
            let updated = store.update(position, &patch)?;
            println!("{}", format_record("updated", position, &updated, mode));
        }
        CliAction::Delete { position } => {
            let removed = store.delete(position)?;
            println!("{}", format_record("deleted", position, &removed, mode));
        }
        CliAction::Resolve(target) => {
            let id = match target {
                Target::Id(id) => id,
                Target::Position(position) => {
                    let records = store.records()?;
                    records
                        .get(position)
                        .map(|r| r.id())
                        .ok_or(Error::PositionOutOfRange {
                            position,
                            len: records.len(),
                        })?
                }
            };
            // Resolve by id so a concurrent delete cannot redirect it
            let resolved = store.resolve(id)?;
            println!(
                "{}",
                format_record("resolved", resolved.position, &resolved.record, mode)
            );
        }
        CliAction::Status => {
            println!("{}", format_stats(&store.stats()?, mode));
        }
        CliAction::Demo => {
            let created = store.create(&demo_draft())?;
            println!("{}", format_record("created", created.position, &created.record, mode));
        }
        CliAction::Watch { alerts_only } => {
            let monitor = store.monitor()?;
            info!(
                path = %store.path().display(),
                tracking = monitor.records().len(),
                "Watching for changes"
            );
            if mode == OutputMode::Human {
                eprintln!(
                    "Watching {} ({} existing records). Ctrl-C to stop.",
                    store.path().display(),
                    monitor.records().len()
                );
            }
            let events = monitor.subscribe();
            let handle = monitor.spawn()?;
            for event in events.iter() {
                if alerts_only && !event.is_new_alert() {
                    continue;
                }
                println!("{}", format_event(&event, mode));
            }
            handle.stop();
        }
    }
    Ok(())
}
