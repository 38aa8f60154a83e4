use clap::{Parser, Subcommand};
use folio::{catalogue::Store, check, config, output, pipeline, staging};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Filesystem content catalogue with capacity-bounded, linked pages")]
#[command(long_about = "\
Filesystem content catalogue with capacity-bounded, linked pages

Content is dropped into a staging directory and listed in stage.json. An
update moves each staged item into its category's last page, then splits any
page that grew past items_per_page so every category stays a chain of pages
1 → 2 → … → N.

Layout:

  staging/
  ├── stage.json                   # Queue: filename, thumbnail, topic, category
  ├── template.stage.json          # Example queue entry, written on init
  └── sample1.html
  published/
  ├── server.json                  # Base URL and page capacity
  ├── page.json                    # Category index
  └── posts/
      ├── page.json                # Chain: start_page, end_page, total_pages
      ├── 1/page.json              # Page: current_page, next_page, posts
      └── 2/page.json

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full run: bootstrap or repair, ingest staging, settle
    Update,
    /// Create the staging and published roots
    Init,
    /// Split overflowing pages without ingesting
    Repair,
    /// Ingest the staging queue without splitting
    Ingest,
    /// Audit the published tree without changing it
    Check,
    /// Queue every staged HTML file not yet in stage.json
    FillStage {
        /// Category given to newly queued files
        #[arg(long, default_value = "posts")]
        category: String,
    },
    /// Write sample HTML posts into the staging directory
    GenSamples {
        #[arg(long, default_value_t = 7)]
        count: usize,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Update => {
            let config = config::load_config(&cli.config)?;
            println!("==> Updating {}", config.server.published_dir.display());
            let report = pipeline::update(&config)?;
            output::print_update_report(&report);
        }
        Command::Init => {
            let config = config::load_config(&cli.config)?;
            if pipeline::init(&config)? {
                println!("==> Initialized {}", config.server.published_dir.display());
            } else {
                println!("==> Already initialized");
            }
        }
        Command::Repair => {
            let config = config::load_config(&cli.config)?;
            let report = pipeline::repair(&config)?;
            output::print_repair_report(&report);
        }
        Command::Ingest => {
            let config = config::load_config(&cli.config)?;
            let report = pipeline::ingest(&config)?;
            output::print_ingest_report(&report);
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let store = pipeline::open(&config)?;
            println!("==> Checking {}", store.published_root().display());
            let audits = check::audit(&store, config.items_per_page())?;
            output::print_audit(&audits);
            if audits.iter().all(|a| a.is_consistent()) {
                println!("==> Catalogue is consistent");
            } else {
                return Err("catalogue has inconsistencies".into());
            }
        }
        Command::FillStage { category } => {
            let config = config::load_config(&cli.config)?;
            let store = Store::from_config(&config);
            let added = staging::fill_queue(&store, &category)?;
            for item in &added {
                println!("{} → {}", item.filename, item.topic);
            }
            println!("Queued {} files", added.len());
        }
        Command::GenSamples { count } => {
            let config = config::load_config(&cli.config)?;
            let written = staging::generate_samples(&config.server.staging_dir, count)?;
            println!("Wrote {} samples to {}", written.len(), config.server.staging_dir.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}
