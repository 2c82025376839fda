use clap::{Parser, Subcommand};
use iconsmith::model::DEFAULT_VARIANTS;
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "iconsmith", bin_name = "iconsmith", version = get_version())]
#[command(
    about = "Generate flat single-color icon layers from a description",
    long_about = None
)]
pub struct Cli {
    /// Without a command, start the interactive prompt
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Generate icon variants from a description
    #[command(alias = "g")]
    Generate {
        /// What the icon should show
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Number of variants to generate
        #[arg(
            short = 'n',
            long,
            default_value_t = DEFAULT_VARIANTS,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        variants: u32,

        /// Image model (overrides OPENAI_IMAGE_MODEL and the config file)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Edit the most recent icon, or the one given with --on
    #[command(alias = "e")]
    Edit {
        /// The change to make
        #[arg(required = true, num_args = 1..)]
        change: Vec<String>,

        /// Image to edit instead of the most recent icon
        #[arg(long)]
        on: Option<PathBuf>,

        /// Image model (overrides OPENAI_IMAGE_MODEL and the config file)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List generated icons, most recent first
    #[command(alias = "ls")]
    List,

    /// Store the OpenAI API key in the config file
    SetKey {
        /// The API key
        key: String,
    },
}

pub const LOG_ENV: &str = "ICONSMITH_LOG";

/// Logs go to stderr so stdout stays the report.
///
/// `ICONSMITH_LOG`, then `RUST_LOG`, override the level chosen by `--verbose`.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "warn,iconsmith=debug" } else { "warn" };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
