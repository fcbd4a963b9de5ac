//! UniLoad CLI - command-line interface
//!
//! Submits URLs to a UniLoad conversion service and follows each download
//! to completion.

mod commands;
mod error;
mod runner;
mod ui;

use clap::{Parser, Subcommand};
use console::style;

use commands::common::{FormatArg, QualityArg};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "uniload")]
#[command(version = uniload::VERSION)]
#[command(about = "Convert and download videos through a UniLoad service", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a URL on the service and print where to fetch the result
    Download {
        /// Source page URL
        url: String,

        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Video resolution, ignored for mp3 (default from config)
        #[arg(short, long, value_enum)]
        quality: Option<QualityArg>,

        /// Service root URL (default from config)
        #[arg(long)]
        service_base: Option<String>,
    },

    /// Fetch and print metadata for a URL
    Info {
        /// Source page URL
        url: String,

        /// Service root URL (default from config)
        #[arg(long)]
        service_base: Option<String>,
    },

    /// Print the platform a URL belongs to
    Detect {
        /// Source page URL
        url: String,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Download {
            url,
            format,
            quality,
            service_base,
        } => commands::download::run(commands::download::DownloadArgs {
            url,
            format,
            quality,
            service_base,
            verbose,
        }),
        Commands::Info { url, service_base } => commands::info::run(commands::info::InfoArgs {
            url,
            service_base,
            verbose,
        }),
        Commands::Detect { url } => commands::detect::run(&url),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

fn exit_with(error: CliError) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), error);
    std::process::exit(error.exit_code());
}
