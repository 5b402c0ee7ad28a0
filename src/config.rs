//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! upload_root = "/srv/ebooks"
//! listen = "0.0.0.0:8000"
//!
//! [typography.fonts]
//! body = "Georgia"
//!
//! [ai]
//! command = "llm"
//! args = ["--model", "gemini-2.5-flash-lite"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ai::CommandGenerator;
use crate::error::{Error, Result};
use crate::export::ExportConfig;
use crate::render::Typography;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that `/uploads/...` cover paths are resolved against.
    pub upload_root: PathBuf,
    /// Address the HTTP server binds to.
    pub listen: String,
    pub typography: Typography,
    pub ai: AiConfig,
}

/// External command used as the text generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("."),
            listen: "127.0.0.1:8000".to_string(),
            typography: Typography::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            typography: self.typography.clone(),
            upload_root: self.upload_root.clone(),
        }
    }

    /// The configured generator, if any.
    pub fn generator(&self) -> Option<CommandGenerator> {
        let command = self.ai.command.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        Some(CommandGenerator::new(command).with_args(self.ai.args.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            upload_root = "/srv/books"

            [typography.sizes]
            body = 11.0

            [ai]
            command = "llm"
            args = ["-m", "small"]
            "#,
        )
        .unwrap();
        assert_eq!(config.upload_root, PathBuf::from("/srv/books"));
        assert_eq!(config.listen, "127.0.0.1:8000");
        assert_eq!(config.typography.sizes.body, 11.0);
        assert_eq!(config.typography.sizes.title, 32.0);
        assert_eq!(
            config.generator(),
            Some(CommandGenerator::new("llm").with_args(["-m", "small"]))
        );
        assert_eq!(config.export_config().upload_root, PathBuf::from("/srv/books"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Config::load(dir.path().join("missing.toml")), Err(Error::Config(_))));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "listen = [").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(&err, Error::Config(m) if m.contains("bad.toml")));
    }

    #[test]
    fn test_blank_command_means_no_generator() {
        let config = Config::from_toml("[ai]\ncommand = \"  \"\n").unwrap();
        assert_eq!(config.generator(), None);
    }
}
