//! # CLI Layer
//!
//! This module is **one possible UI client** for iconsmith. It is the only
//! place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Reads environment variables
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: shell arguments into [`Commands`] via clap
//! 2. **Context Setup**: env snapshot, config dir, working directory
//! 3. **API Dispatch**: build an `IconApi` per command and call it
//! 4. **Output Formatting**: `CmdResult` into colored terminal output
//!
//! The credential is resolved before the provider is built, so a missing key
//! fails with `config-error` before any network activity.

use super::print::{print_artifacts, print_messages, print_outcomes};
use super::repl;
use super::setup::{Cli, Commands, init_tracing};
use clap::Parser;
use colored::Colorize;
use iconsmith::api::IconApi;
use iconsmith::commands::RenderSettings;
use iconsmith::config::{self, EnvOverrides, IconConfig};
use iconsmith::error::Result;
use iconsmith::provider::openai::OpenAiImageProvider;
use iconsmith::store::fs::FileStore;
use std::path::PathBuf;

type Api = IconApi<FileStore, OpenAiImageProvider>;

pub(super) struct AppContext {
    env: EnvOverrides,
    config_dir: PathBuf,
    cwd: PathBuf,
}

impl AppContext {
    fn load_config(&self) -> Result<IconConfig> {
        IconConfig::load(&self.config_dir)
    }

    fn api(&self, config: &IconConfig) -> Result<Api> {
        let output_dir = config.resolve_output_dir(&self.env, &self.cwd)?;
        tracing::debug!(output_dir = %output_dir.display(), "using output directory");
        let settings = RenderSettings {
            quality: config.quality.clone(),
            background: config.background,
        };
        Ok(IconApi::new(
            FileStore::new(output_dir),
            settings,
            self.config_dir.clone(),
        ))
    }

    fn api_with_provider(&self, config: &IconConfig) -> Result<Api> {
        let key = config.resolve_api_key(&self.env)?;
        let provider = OpenAiImageProvider::new(key, config.base_url.clone());
        Ok(self.api(config)?.with_provider(provider))
    }
}

/// Returns `Ok(false)` when the command ran but something in it failed.
pub async fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = init_context()?;
    match cli.command {
        Some(command) => dispatch(&ctx, command).await,
        None => repl::run(&ctx).await,
    }
}

fn init_context() -> Result<AppContext> {
    let env = EnvOverrides::from_env();
    let config_dir = config::config_dir(&env)?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(AppContext {
        env,
        config_dir,
        cwd,
    })
}

pub(super) async fn dispatch(ctx: &AppContext, command: Commands) -> Result<bool> {
    match command {
        Commands::Generate {
            description,
            variants,
            model,
        } => handle_generate(ctx, description.join(" "), variants, model).await,
        Commands::Edit { change, on, model } => {
            handle_edit(ctx, change.join(" "), on, model).await
        }
        Commands::List => handle_list(ctx),
        Commands::SetKey { key } => handle_set_key(ctx, &key),
    }
}

async fn handle_generate(
    ctx: &AppContext,
    description: String,
    variants: u32,
    model: Option<String>,
) -> Result<bool> {
    let config = ctx.load_config()?;
    let mut api = ctx.api_with_provider(&config)?;
    let model = config.resolve_model(model.as_deref(), &ctx.env);

    println!(
        "{}",
        format!("Generating {variants} variant(s) of \"{description}\" with {model}...").dimmed()
    );
    let result = api.generate(&description, variants, &model).await?;
    print_outcomes(&result.outcomes);
    print_messages(&result.messages);
    Ok(!result.any_failed())
}

async fn handle_edit(
    ctx: &AppContext,
    change: String,
    on: Option<PathBuf>,
    model: Option<String>,
) -> Result<bool> {
    let config = ctx.load_config()?;
    let mut api = ctx.api_with_provider(&config)?;
    let model = config.resolve_model(model.as_deref(), &ctx.env);

    println!("{}", format!("Editing: \"{change}\" with {model}...").dimmed());
    let result = api.edit(&change, on, &model).await?;
    print_outcomes(&result.outcomes);
    print_messages(&result.messages);
    Ok(!result.any_failed())
}

fn handle_list(ctx: &AppContext) -> Result<bool> {
    let config = ctx.load_config()?;
    let result = ctx.api(&config)?.list()?;
    print_artifacts(&result.listed_artifacts);
    print_messages(&result.messages);
    Ok(true)
}

fn handle_set_key(ctx: &AppContext, key: &str) -> Result<bool> {
    let result = iconsmith::commands::set_key::run(&ctx.config_dir, key)?;
    print_messages(&result.messages);
    Ok(true)
}
