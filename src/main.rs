//! `sherwood` - research-desk drafting from the terminal
//!
//! Renders a product prompt, fans it out to the selected interns, and has
//! the selected reviewers compare what came back.

use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Input;
use std::sync::Arc;

use crate::cli::{Cli, Commands, RunArgs, SubjectArgs};
use crate::clipboard::CopyOutcome;
use crate::observer::TerminalObserver;
use sherwood_core::config::get_data_dir;
use sherwood_core::llm::GenerationOptions;
use sherwood_core::logger::get_recent_logs;
use sherwood_core::notify::{NoopNotifier, Notifier, TelegramNotifier};
use sherwood_core::output::OutputFormatter;
use sherwood_core::{
    Aggregator, BackendRegistry, Config, Pipeline, ProductKind, PromptRequest, RunRequest,
    Secrets, Selection,
};

mod cli;
mod clipboard;
mod observer;

const RECENT_LOG_LINES: usize = 8;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sherwood_core::logger::init(get_data_dir());

    let formatter = OutputFormatter::new();

    match &cli.command {
        Commands::Run(args) => handle_run(&cli, args, &formatter).await,
        Commands::Prompt { subject } => {
            let request = prompt_request(subject).await?;
            println!("{}", request.render());
            Ok(())
        }
        Commands::Backends => {
            formatter.print_backends();
            Ok(())
        }
    }
}

async fn handle_run(cli: &Cli, args: &RunArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = Config::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    let notify = config.notify && !args.no_notify;
    let secrets = Secrets::from_env(notify).context("Failed to read secrets from the environment")?;

    let request = prompt_request(&args.subject).await?;
    let run = RunRequest {
        product: request.kind(),
        subject: request.subject().to_string(),
        interns: Selection::new(args.interns()),
        reviewers: Selection::new(args.reviewers()),
    };

    let registry = BackendRegistry::from_config(&config, &secrets)?;
    let aggregator = Aggregator::new(Arc::new(registry))
        .with_timeout(config.timeout())
        .with_mode(config.fan_out_mode())
        .with_intern_options(GenerationOptions::default().with_temperature(config.temperature));

    let notifier: Arc<dyn Notifier> = match &secrets.bot {
        Some(bot) if notify => Arc::new(TelegramNotifier::new(bot)?),
        _ => Arc::new(NoopNotifier),
    };
    let pipeline = Pipeline::new(aggregator, notifier);
    let observer = TerminalObserver::new(formatter, run.product);

    let report = tokio::select! {
        result = pipeline.run(&run, &observer) => match result {
            Ok(report) => report,
            Err(e) => {
                log::error!("Run failed: {}", e);
                if !e.requires_user_action() {
                    print_recent_logs(formatter);
                }
                bail!(e.user_message());
            }
        },
        _ = tokio::signal::ctrl_c() => {
            formatter.print_warning("Interrupted; remaining requests cancelled.");
            return Ok(());
        }
    };

    formatter.print_summary(&report);

    if args.copy {
        match clipboard::copy_text(&report.bundle.tagged())? {
            CopyOutcome::Clipboard => formatter.print_success("All answers copied to clipboard"),
            CopyOutcome::File(path) => formatter.print_warning(&format!(
                "Clipboard unavailable; answers written to {}",
                path.display()
            )),
        }
    }

    Ok(())
}

/// Show the tail of the debug log so transient failures can be diagnosed.
fn print_recent_logs(formatter: &OutputFormatter) {
    let recent = get_recent_logs(RECENT_LOG_LINES);
    if recent.is_empty() {
        return;
    }
    formatter.print_warning(&format!("Last {} log entries:", recent.len()));
    for line in recent.iter().rev() {
        eprintln!("  {}", line);
    }
}

/// Build the prompt request from flags, a file, or an interactive question.
async fn prompt_request(args: &SubjectArgs) -> Result<PromptRequest> {
    let subject = match (&args.subject, &args.file) {
        (Some(subject), _) => subject.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read subject from {}", path.display()))?,
        (None, None) => ask_subject(args.product)?,
    };
    Ok(PromptRequest::new(args.product, subject)?)
}

fn ask_subject(product: ProductKind) -> Result<String> {
    let subject: String = Input::new()
        .with_prompt(product.subject_hint())
        .interact_text()?;
    Ok(subject)
}
