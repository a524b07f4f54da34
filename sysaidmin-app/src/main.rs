use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use sysaidmin_app::cli::Args;
use sysaidmin_core::{Interrupt, Operator, SessionEngine, TerminationReason};
use sysaidmin_executor::ShellExecutor;
use sysaidmin_interfaces::TerminalOperator;
use sysaidmin_providers::OpenAICompatiblePlanner;
use sysaidmin_transcript::FileTranscript;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so the sectioned conversation stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.api_key.is_empty() {
        eprintln!(
            "Error: API key not found. Please set the `SYSAIDMIN_API_KEY` environment \
             variable or use the --api-key argument."
        );
        return ExitCode::FAILURE;
    }

    // Configuration failures above never produce a transcript file.
    let transcript = match FileTranscript::create_in_temp() {
        Ok(transcript) => Arc::new(transcript),
        Err(e) => {
            eprintln!("Error: failed to create the session transcript: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // One long-lived Ctrl-C watcher feeds the shared interrupt signal, so a
    // press lands whether the session is at the gate, waiting on the planner,
    // or running a command.
    let interrupt = Interrupt::new();
    {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupt.trigger();
            }
        });
    }

    let operator = Arc::new(TerminalOperator::new(interrupt.clone()));
    operator
        .show_notice(&format!("Writing log to {}...", transcript.path().display()))
        .await;

    let planner = Arc::new(OpenAICompatiblePlanner::new(
        args.base_url,
        args.api_key,
        args.model,
    ));

    let engine = SessionEngine::new(
        planner,
        Arc::new(ShellExecutor::new()),
        operator.clone(),
        transcript,
        interrupt,
    );

    match engine.run(&args.problem).await {
        TerminationReason::Completed => {
            operator.show_notice("This session has completed.").await;
            ExitCode::SUCCESS
        }
        TerminationReason::UserAborted => {
            operator.show_notice("Session aborted.").await;
            ExitCode::SUCCESS
        }
        TerminationReason::Failed { cause } => {
            eprintln!("Error: {}", cause);
            ExitCode::FAILURE
        }
    }
}
