//! munger CLI: run the insight pipeline on a schedule or once.

mod file_config;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand};
use munger_core::catalog::DimensionCatalog;
use munger_core::config::MungerConfig;
use munger_core::key::{record_key, ResultKey};
use munger_core::types::CustomerId;
use munger_exec::{CycleScheduler, Driver, ShutdownSignal};
use tracing_subscriber::EnvFilter;

use crate::file_config::{apply_file_config, parse_config_file};

#[derive(Parser)]
#[command(name = "munger")]
#[command(about = "Recompute per-customer inventory insights and publish them as keyed objects", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cycles forever with a fixed delay between them
    Run {
        #[command(flatten)]
        opts: ConfigArgs,

        /// Delay between cycles in seconds (overrides config)
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Run a single cycle and print its report as JSON
    Once {
        #[command(flatten)]
        opts: ConfigArgs,
    },

    /// Validate configuration and catalog without touching storage
    Validate {
        #[command(flatten)]
        opts: ConfigArgs,
    },

    /// Show the catalog and the keys a cycle would read and write
    Explain {
        #[command(flatten)]
        opts: ConfigArgs,

        /// Example customer id used to render keys
        #[arg(long, default_value = "<customer>")]
        customer: String,
    },
}

#[derive(Args, Clone, Default)]
struct ConfigArgs {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source store URI (e.g., s3://bucket/prefix, file:///dir)
    #[arg(long)]
    source_uri: Option<String>,

    /// Custom endpoint for an S3-compatible source store
    #[arg(long)]
    source_endpoint: Option<String>,

    /// Sink store URI (e.g., s3://bucket/prefix, file:///dir)
    #[arg(long)]
    sink_uri: Option<String>,

    /// Custom endpoint for an S3-compatible sink store
    #[arg(long)]
    sink_endpoint: Option<String>,

    /// Munger version segment of result keys (overrides config)
    #[arg(long)]
    munger_version: Option<String>,

    /// Customers processed concurrently per dimension value (overrides config)
    #[arg(long)]
    max_parallel: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            opts,
            interval_secs,
        } => run_forever(&opts, interval_secs),
        Commands::Once { opts } => run_once(&opts),
        Commands::Validate { opts } => load(&opts).map(|(cfg, catalog)| {
            println!(
                "✓ Configuration is valid ({} dimension values, munger version {})",
                catalog.len(),
                cfg.munger_version
            );
        }),
        Commands::Explain { opts, customer } => load(&opts).map(|(cfg, catalog)| {
            explain(&cfg, &catalog, &customer);
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Defaults → env → config file → CLI flags, then fatal validation.
fn load(opts: &ConfigArgs) -> Result<(MungerConfig, DimensionCatalog), Box<dyn std::error::Error>> {
    let mut cfg = MungerConfig::from_env();
    let mut catalog = DimensionCatalog::default();

    if let Some(path) = &opts.config {
        let doc = parse_config_file(&read_config(path)?)?;
        apply_file_config(&mut cfg, &doc);
        if let Some(c) = doc.catalog {
            catalog = c;
        }
    }
    apply_cli_overrides(&mut cfg, opts);

    cfg.validate()?;
    Ok((cfg, catalog))
}

fn read_config(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()).into())
}

fn apply_cli_overrides(cfg: &mut MungerConfig, opts: &ConfigArgs) {
    if let Some(uri) = &opts.source_uri {
        cfg.source.uri = Some(uri.clone());
    }
    if let Some(endpoint) = &opts.source_endpoint {
        cfg.source.endpoint = Some(endpoint.clone());
    }
    if let Some(uri) = &opts.sink_uri {
        cfg.sink.uri = Some(uri.clone());
    }
    if let Some(endpoint) = &opts.sink_endpoint {
        cfg.sink.endpoint = Some(endpoint.clone());
    }
    if let Some(version) = &opts.munger_version {
        cfg.munger_version = version.clone();
    }
    if let Some(parallel) = opts.max_parallel {
        cfg.max_parallel_customers = parallel;
    }
}

fn run_forever(
    opts: &ConfigArgs,
    interval_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut cfg, catalog) = load(opts)?;
    if let Some(secs) = interval_secs {
        cfg.cycle_interval_secs = secs;
        cfg.validate()?;
    }

    let scheduler = CycleScheduler::from_driver(Driver::from_config(cfg, catalog)?);
    let shutdown = ShutdownSignal::new();
    spawn_ctrl_c_watcher(shutdown.clone())?;

    let exit = scheduler.run(&shutdown);
    println!(
        "✓ Stopped after {} cycles ({} failed)",
        exit.cycles_completed, exit.cycles_failed
    );
    Ok(())
}

fn run_once(opts: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (cfg, catalog) = load(opts)?;
    let driver = Driver::from_config(cfg, catalog)?;
    let shutdown = ShutdownSignal::new();
    spawn_ctrl_c_watcher(shutdown.clone())?;

    let report = driver.run_cycle(&shutdown)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Ctrl-C triggers shutdown; the driver stops between items and the
/// scheduler leaves its wait immediately.
fn spawn_ctrl_c_watcher(shutdown: ShutdownSignal) -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("munger-signal".into())
        .spawn(move || {
            rt.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, shutting down");
                    shutdown.trigger();
                }
            })
        })?;
    Ok(())
}

fn explain(cfg: &MungerConfig, catalog: &DimensionCatalog, customer: &str) {
    let customer = CustomerId::new(customer);
    println!("Munger Cycle Plan");
    println!("=================");
    println!();
    println!("Source: {}", cfg.source.uri.as_deref().unwrap_or("<unset>"));
    println!("Sink:   {}", cfg.sink.uri.as_deref().unwrap_or("<unset>"));
    println!("Master list key: {}", cfg.master_list_key);
    println!("Record key:      {}", record_key(&customer, &cfg.record_key_suffix));
    println!("Dimension field: {}", cfg.dimension_field);
    println!(
        "Interval: {}s (end of one cycle to start of the next)",
        cfg.cycle_interval_secs
    );
    println!("Parallel customers: {}", cfg.max_parallel_customers);
    println!();
    println!("Dimension values ({}):", catalog.len());
    for (i, dim) in catalog.list().iter().enumerate() {
        println!(
            "  {}. {} (code {}) -> {}",
            i + 1,
            dim.display_name,
            dim.external_code,
            ResultKey::for_dimension(&customer, dim, &cfg.munger_version)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_cli_overrides, ConfigArgs};
    use crate::file_config::{apply_file_config, parse_config_file};
    use munger_core::config::MungerConfig;

    #[test]
    fn cli_overrides_higher_priority_than_config() {
        let mut cfg = MungerConfig::default();
        let doc = parse_config_file("munger_version: \"5\"\nsink: { uri: \"/tmp/file\" }\n").unwrap();
        apply_file_config(&mut cfg, &doc);
        assert_eq!(cfg.munger_version, "5");

        let opts = ConfigArgs {
            munger_version: Some("6".into()),
            sink_uri: Some("memory://".into()),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &opts);
        assert_eq!(cfg.munger_version, "6");
        assert_eq!(cfg.sink.uri.as_deref(), Some("memory://"));
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut cfg = MungerConfig::default();
        apply_cli_overrides(&mut cfg, &ConfigArgs::default());
        assert_eq!(cfg.munger_version, "4");
        assert_eq!(cfg.max_parallel_customers, 1);
    }
}
