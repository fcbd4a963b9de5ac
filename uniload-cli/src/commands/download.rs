//! Download command - run one orchestration cycle for a URL.

use console::style;
use tokio_util::sync::CancellationToken;
use uniload::model::DownloadRequest;
use uniload::orchestrator::{
    ControllerConfig, ControllerError, DownloadController, OrchestrationState, SubmitOutcome,
};

use super::common::{
    resolve_format, resolve_quality, resolve_service_base, FormatArg, QualityArg,
};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::ProgressRenderer;

/// Arguments for the download command.
pub struct DownloadArgs {
    pub url: String,
    pub format: Option<FormatArg>,
    pub quality: Option<QualityArg>,
    pub service_base: Option<String>,
    pub verbose: bool,
}

/// Run the download command.
pub fn run(args: DownloadArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("download");
    let config = runner.config();

    let format = resolve_format(args.format, config);
    let quality = resolve_quality(args.quality, config);
    let base = resolve_service_base(args.service_base, config)?;
    let request = DownloadRequest::new(args.url, format, quality);

    let service = runner.create_service(&base)?;
    let controller_config = ControllerConfig {
        progress: config.to_progress_config(),
        ..Default::default()
    };

    match request.effective_quality() {
        Some(quality) => println!("Format: {} ({})", format, quality.description()),
        None => println!("Format: {} (audio only)", format),
    }
    println!("Service: {}", base);
    println!();

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        signal_shutdown.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    runner.runtime().block_on(async {
        let (controller, handle) = DownloadController::new(service, controller_config);
        let controller_task = tokio::spawn(controller.run(shutdown.clone()));

        let epoch = match handle.submit(request).await? {
            SubmitOutcome::Accepted { epoch } => epoch,
            SubmitOutcome::Ignored => {
                shutdown.cancel();
                return Err(CliError::Config("URL must not be empty".to_string()));
            }
        };

        let mut renderer = ProgressRenderer::new();
        let result = handle.follow_cycle(epoch, |s| renderer.render(s)).await;

        shutdown.cancel();
        if let Err(e) = controller_task.await {
            tracing::warn!(error = %e, "Controller task ended abnormally");
        }

        let last = match result {
            Ok(last) => last,
            Err(ControllerError::Shutdown) => {
                renderer.finish(&handle.snapshot());
                return Err(CliError::Interrupted);
            }
        };
        renderer.finish(&last);

        match last.state {
            OrchestrationState::Completed => {
                let target = last.retrieval_target.unwrap_or_default();
                println!();
                println!("{} {}", style("Download:").bold(), style(&target).cyan());
                Ok(())
            }
            _ => {
                let message = last
                    .error
                    .as_ref()
                    .map(|e| e.display_message().to_string())
                    .unwrap_or_else(|| last.state.caption().to_string());
                Err(CliError::DownloadFailed(message))
            }
        }
    })
}
