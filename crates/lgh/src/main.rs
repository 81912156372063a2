//! lgh: release-note material from a branch's history
//!
//! This binary reads the commits a branch added on top of its base and asks a
//! chat model to turn them into per-commit summaries and branch release notes.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::info;

use lgh::chat::OpenAiClient;
use lgh::config::{Command, Config, Settings};
use lgh::run::{self, BranchSummaryOptions};
use lgh::summary::PromptSet;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate()?;

    let settings_path = config.settings_path();
    let settings = Settings::load(&settings_path)?;

    match &config.command {
        Some(Command::BranchSummary {
            target,
            base,
            repo,
            model,
            api_url,
            dry_run,
        }) => {
            let options = BranchSummaryOptions {
                repo: repo.clone().unwrap_or_else(|| ".".into()),
                target: target.clone(),
                base: base.clone(),
                workdir_root: config.workdir_root(&settings),
                lang: config.language(&settings),
            };
            let prompts = PromptSet::default();

            let report = if *dry_run {
                info!(target_ref = %target, base_ref = %base, "Preparing branch prompts");
                run::prepare_branch(&options, &prompts)
            } else {
                let client = OpenAiClient::new(config.api_key(&settings)?, model.clone())?
                    .with_endpoint(api_url.clone());
                info!(target_ref = %target, base_ref = %base, model = %model, "Summarizing branch");
                run::summarize_branch(&options, &prompts, &client)
            }
            .with_context(|| format!("branch-summary failed for {target}"))?;
            println!("{}", report.output_dir.display());
        }
        Some(Command::Config) => {
            let updated = Settings {
                lang: config.lang.or(settings.lang),
                workdir: config.workdir.clone().or(settings.workdir),
                openai_api_key: config.openai_api_key.clone().or(settings.openai_api_key),
            };
            run::save_settings(&updated, &settings_path)?;
        }
        None => {
            Config::command().print_help()?;
        }
    }

    Ok(())
}
