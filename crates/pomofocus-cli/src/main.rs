use clap::{Parser, Subcommand};
use pomofocus_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod gateways;

use app::App;

#[derive(Parser)]
#[command(name = "pomofocus", version, about = "Pomodoro timer with task and focus tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Focus statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// User settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Premium entitlement
    Premium {
        #[command(subcommand)]
        action: commands::premium::PremiumAction,
    },
}

/// Log filter from `POMOFOCUS_LOG`, else the configured level. Logs go to
/// stderr so stdout stays machine-readable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("POMOFOCUS_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&config.logging.level);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "ignoring unreadable config.toml");
    }

    let result = App::open(&config).and_then(|app| match cli.command {
        Commands::Timer { action } => commands::timer::run(&app, action),
        Commands::Task { action } => commands::task::run(&app, action),
        Commands::Stats { action } => commands::stats::run(&app, action),
        Commands::Settings { action } => commands::settings::run(&app, action),
        Commands::Premium { action } => commands::premium::run(&app, action),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
