//! Busschedule CLI - bus schedules from the bundled dataset

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use busschedule::config::{self, BusScheduleConfig};
use busschedule::ui::{self, Icons};
use busschedule::{AppDatabase, BusScheduleViewModel, BusScheduleViewModelFactory, Schedule, ScheduleFlow, ViewModelStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "busschedule")]
#[command(version)]
#[command(about = "Bus schedules from a bundled, read-only dataset")]
#[command(long_about = r#"
Busschedule reads bus arrivals from the bundled bus_schedule.db asset.

Example usage:
  busschedule list
  busschedule stop --name "Main Street"
  busschedule watch --name "Main Street"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "busschedule.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the full schedule
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show arrivals at one stop
    Stop {
        /// Stop name (exact, case-sensitive)
        #[arg(short, long)]
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the distinct stop names
    Stops,

    /// Follow the schedule and print it again whenever the dataset changes
    Watch {
        /// Only follow this stop
        #[arg(short, long)]
        name: Option<String>,

        /// Change polling interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Show statistics about the dataset
    Stats,

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Errors are reported once, styled, instead of through anyhow's default printer.
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { force } = cli.command {
        config::write_config(&cli.config, &BusScheduleConfig::default(), force)?;
        ui::success(&format!("Wrote {}", cli.config.display()));
        return Ok(());
    }

    let settings = config::load_config(Some(&cli.config))?.unwrap_or_default();
    let base = config_base(&cli.config);
    let ctx = settings.context(&base);
    tracing::debug!("Using asset {:?}, database {:?}", ctx.asset_path(), ctx.database_path());

    let db = AppDatabase::get_instance(&ctx)?;

    let factory = BusScheduleViewModelFactory::new(db.schedule_dao());
    let mut view_models = ViewModelStore::new();
    let view_model = view_models.get::<BusScheduleViewModel, _>(&factory)?;

    match cli.command {
        Commands::List { format } => {
            let schedules = view_model.full_schedule().first().await?;
            print_schedules("Full schedule", &schedules, format)?;
        }

        Commands::Stop { name, format } => {
            let schedules = view_model.schedule_for_stop_name(&name).first().await?;
            print_schedules(&ui::stop_label(&name), &schedules, format)?;
        }

        Commands::Stops => {
            let dao = db.schedule_dao();
            let names = dao.stop_names().await?;
            if names.is_empty() {
                ui::empty("No stops in dataset.");
            }
            for name in names {
                println!("{}", ui::stop_label(&name));
            }
        }

        Commands::Watch { name, interval_ms } => {
            let interval = interval_ms
                .map(std::time::Duration::from_millis)
                .unwrap_or_else(|| settings.poll_interval());
            let monitor = db.spawn_change_monitor(interval);

            let flow = match &name {
                Some(name) => view_model.schedule_for_stop_name(name),
                None => view_model.full_schedule(),
            };

            ui::header(&format!("Watching {} (Ctrl-C to stop)", name.as_deref().unwrap_or("all stops")));
            follow(flow).await?;
            monitor.abort();
        }

        Commands::Stats => {
            let dao = db.schedule_dao();
            let schedules = dao.count().await?.to_string();
            let stops = dao.stop_names().await?.len().to_string();
            let path = db.path().display().to_string();

            println!("{} Busschedule Statistics", Icons::STATS);
            println!(
                "{}",
                ui::stats_table(&[
                    ("Schedules", schedules.as_str()),
                    ("Stops", stops.as_str()),
                    ("Database", path.as_str()),
                ])
            );
        }

        Commands::Init { .. } => unreachable!("handled before opening the database"),
    }

    view_models.clear();
    Ok(())
}

/// Directory that relative config paths are resolved against
fn config_base(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn print_schedules(title: &str, schedules: &[Schedule], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(schedules)?),
        OutputFormat::Text => {
            ui::header(title);
            if schedules.is_empty() {
                ui::empty("No arrivals found.");
            } else {
                println!("{}", ui::schedule_table(schedules));
            }
        }
    }
    Ok(())
}

async fn follow(mut flow: ScheduleFlow) -> anyhow::Result<()> {
    let mut index = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::success("Stopped watching.");
                return Ok(());
            }
            emission = flow.next() => {
                let schedules = emission?;
                index += 1;
                ui::emission(index, schedules.len());
                if schedules.is_empty() {
                    ui::empty("No arrivals found.");
                } else {
                    println!("{}", ui::schedule_table(&schedules));
                }
            }
        }
    }
}
