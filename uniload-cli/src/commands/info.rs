//! Info command - fetch and print metadata without downloading.

use console::style;
use uniload::client::RemoteService;
use uniload::platform;

use super::common::resolve_service_base;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the info command.
pub struct InfoArgs {
    pub url: String,
    pub service_base: Option<String>,
    pub verbose: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> Result<(), CliError> {
    let url = args.url.trim();
    if url.is_empty() {
        return Err(CliError::Config("URL must not be empty".to_string()));
    }

    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("info");
    let base = resolve_service_base(args.service_base, runner.config())?;
    let service = runner.create_service(&base)?;

    let metadata = runner
        .runtime()
        .block_on(service.fetch_metadata(url))?;

    let platform_label = if metadata.platform_label.trim().is_empty() {
        platform::detect(url).to_string()
    } else {
        metadata.platform_label.clone()
    };

    println!("{} {}", style("Title:    ").bold(), metadata.display_title());
    println!("{} {}", style("Duration: ").bold(), metadata.display_duration());
    println!("{} {}", style("Platform: ").bold(), platform_label);
    if let Some(thumbnail) = &metadata.thumbnail_url {
        println!("{} {}", style("Thumbnail:").bold(), thumbnail);
    }

    Ok(())
}
