//! Detect command - print the platform a URL belongs to.

use console::style;
use uniload::platform::{self, Platform};

use crate::error::CliError;

/// Run the detect command.
pub fn run(url: &str) -> Result<(), CliError> {
    let platform = platform::detect(url);
    println!("{}", platform);
    if let Some(note) = unrecognised_note(platform) {
        eprintln!("{}", style(note).dim());
    }
    Ok(())
}

/// Hint printed when no platform marker matched.
fn unrecognised_note(platform: Platform) -> Option<&'static str> {
    if platform.is_known() {
        None
    } else {
        Some("No known platform matched; the service may still accept this URL.")
    }
}
