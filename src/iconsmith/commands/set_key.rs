use crate::commands::{CmdMessage, CmdResult};
use crate::config::IconConfig;
use crate::error::Result;
use std::path::Path;

/// Store the credential in the config file. The key itself is never echoed.
pub fn run(config_dir: &Path, key: &str) -> Result<CmdResult> {
    let mut config = IconConfig::load(config_dir)?;
    config.set_api_key(key)?;
    config.save(config_dir)?;

    let path = IconConfig::path(config_dir);
    let mut result = CmdResult::default().with_config_path(path.clone());
    result.add_message(CmdMessage::success(format!(
        "API key saved to {}",
        path.display()
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::model::BackgroundMode;

    #[test]
    fn saves_key_and_keeps_other_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = IconConfig::default();
        config.background = BackgroundMode::Transparent;
        config.save(temp_dir.path()).unwrap();

        let result = run(temp_dir.path(), "sk-test-123").unwrap();

        let saved = IconConfig::load(temp_dir.path()).unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("sk-test-123"));
        assert_eq!(saved.background, BackgroundMode::Transparent);
        assert_eq!(result.config_path, Some(temp_dir.path().join("config.json")));
        assert!(!result.messages[0].content.contains("sk-test-123"));
    }

    #[test]
    fn blank_key_is_rejected_and_nothing_written() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = run(temp_dir.path(), "  ").unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigError);
        assert!(!temp_dir.path().join("config.json").exists());
    }
}
