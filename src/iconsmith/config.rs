use crate::error::{IconError, Result};
use crate::model::BackgroundMode;
use crate::provider::{DEFAULT_MODEL, DEFAULT_QUALITY};
use directories::{BaseDirs, ProjectDirs};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
pub const OUTPUT_DIR_NAME: &str = "Icon Composer Layers";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "OPENAI_IMAGE_MODEL";
pub const CONFIG_DIR_ENV: &str = "ICONSMITH_CONFIG_DIR";
pub const OUTPUT_DIR_ENV: &str = "ICONSMITH_OUTPUT_DIR";

/// Configuration for iconsmith, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IconConfig {
    /// Stored credential, used when `OPENAI_API_KEY` is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Image model used when neither `--model` nor `OPENAI_IMAGE_MODEL` is given
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_quality")]
    pub quality: String,

    /// What the icon background must be
    #[serde(default)]
    pub background: BackgroundMode,

    /// Images API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Where artifacts are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_quality() -> String {
    DEFAULT_QUALITY.to_string()
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            quality: default_quality(),
            background: BackgroundMode::default(),
            base_url: None,
            output_dir: None,
        }
    }
}

/// The environment variables iconsmith reads, captured once so resolution
/// stays a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var(API_KEY_ENV),
            model: var(MODEL_ENV),
            config_dir: var(CONFIG_DIR_ENV).map(PathBuf::from),
            output_dir: var(OUTPUT_DIR_ENV).map(PathBuf::from),
        }
    }
}

/// Platform config directory, unless overridden.
pub fn config_dir(env: &EnvOverrides) -> Result<PathBuf> {
    if let Some(dir) = &env.config_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("dev", "iconsmith", "iconsmith")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| IconError::Config("Could not determine a config directory".to_string()))
}

impl IconConfig {
    pub fn path<P: AsRef<Path>>(config_dir: P) -> PathBuf {
        config_dir.as_ref().join(CONFIG_FILENAME)
    }

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = Self::path(config_dir);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(IconError::Io)?;
        serde_json::from_str(&content).map_err(|e| {
            IconError::Config(format!("{} is not valid: {e}", config_path.display()))
        })
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(IconError::Io)?;
        }

        let config_path = Self::path(config_dir);
        let content = serde_json::to_string_pretty(self).map_err(IconError::Serialization)?;
        fs::write(config_path, content).map_err(IconError::Io)?;
        Ok(())
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(IconError::Config("API key cannot be empty".to_string()));
        }
        self.api_key = Some(key.to_string());
        Ok(())
    }

    /// `--model` flag, then `OPENAI_IMAGE_MODEL`, then the configured model.
    pub fn resolve_model(&self, flag: Option<&str>, env: &EnvOverrides) -> String {
        flag.map(str::to_string)
            .or_else(|| env.model.clone())
            .unwrap_or_else(|| self.model.clone())
    }

    /// `OPENAI_API_KEY`, then the stored key. Missing is a configuration error.
    pub fn resolve_api_key(&self, env: &EnvOverrides) -> Result<SecretString> {
        env.api_key
            .clone()
            .or_else(|| self.api_key.clone())
            .map(SecretString::from)
            .ok_or_else(|| {
                IconError::Config(format!(
                    "No OpenAI API key found. Set {API_KEY_ENV} or run: iconsmith set-key <KEY>"
                ))
            })
    }

    /// Resolve and create the output directory.
    ///
    /// Explicit settings must be usable. The default `./Icon Composer Layers`
    /// falls back to the home directory when the working directory is not
    /// writable.
    pub fn resolve_output_dir(&self, env: &EnvOverrides, cwd: &Path) -> Result<PathBuf> {
        if let Some(dir) = env.output_dir.as_ref().or(self.output_dir.as_ref()) {
            fs::create_dir_all(dir).map_err(IconError::Io)?;
            return Ok(dir.clone());
        }

        let local = cwd.join(OUTPUT_DIR_NAME);
        match fs::create_dir_all(&local) {
            Ok(()) => Ok(local),
            Err(local_err) => {
                let home = BaseDirs::new()
                    .map(|dirs| dirs.home_dir().join(OUTPUT_DIR_NAME))
                    .ok_or(IconError::Io(local_err))?;
                tracing::debug!(fallback = %home.display(), "working directory not writable");
                fs::create_dir_all(&home).map_err(IconError::Io)?;
                Ok(home)
            }
        }
    }
}
