//! Configuration for the lgh command line tool
//!
//! This module provides the command line interface and the persisted
//! settings file (`~/.lgh/config.toml`). Values given on the command line or
//! through the environment take precedence over the settings file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::{ApiKey, DEFAULT_MODEL, OPENAI_CHAT_URL};

/// Name of the per-user directory holding settings and output
pub const WORK_DIR_NAME: &str = ".lgh";

/// File name of the settings file inside [`WORK_DIR_NAME`]
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// lgh - turn a branch's history into release-note material
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lgh")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the settings file
    ///
    /// Defaults to ~/.lgh/config.toml.
    #[arg(long, global = true, env = "LGH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output language for generated summaries
    #[arg(short, long, global = true, env = "LGH_LANG")]
    pub lang: Option<Language>,

    /// Root directory for generated files
    ///
    /// Output for each repository goes to a subdirectory named after it.
    /// Defaults to ~/.lgh.
    #[arg(short, long, global = true, env = "LGH_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// OpenAI API key used for summaries
    ///
    /// Falls back to the key saved in the settings file.
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<ApiKey>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summarize the commits on a branch into release notes
    ///
    /// Only first-parent commits made since the branch left BASE are read.
    /// Each commit gets a change log and a summary, and the branch gets
    /// summary.txt.
    ///
    /// Example:
    ///   lgh branch-summary feature/login --base main
    BranchSummary {
        /// Branch or commit to summarize
        target: String,

        /// Branch the target was created from
        #[arg(short, long, default_value = "main")]
        base: String,

        /// Path inside the repository (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Chat model to request summaries from
        #[arg(short, long, env = "LGH_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Chat completions endpoint
        #[arg(long, env = "LGH_API_URL", default_value = OPENAI_CHAT_URL)]
        api_url: String,

        /// Write change logs and prompts without calling the chat API
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Save the given --lang, --workdir and --openai-api-key as defaults
    Config,
}

/// Language summaries are requested in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Japanese
    Ja,
}

impl Language {
    /// Full language name used inside prompts
    #[must_use]
    pub fn full_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ja => "Japanese",
        }
    }
}

impl Config {
    /// Get the settings file path, using a default if not specified
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| default_work_dir().join(SETTINGS_FILE_NAME))
    }

    /// Output language: command line, then settings file, then English
    #[must_use]
    pub fn language(&self, settings: &Settings) -> Language {
        self.lang.or(settings.lang).unwrap_or_default()
    }

    /// Output root: command line, then settings file, then ~/.lgh
    #[must_use]
    pub fn workdir_root(&self, settings: &Settings) -> PathBuf {
        self.workdir
            .clone()
            .or_else(|| settings.workdir.clone())
            .unwrap_or_else(default_work_dir)
    }

    /// API key: command line or environment, then settings file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingApiKey` if neither provides one.
    pub fn api_key(&self, settings: &Settings) -> Result<ApiKey, ConfigError> {
        self.openai_api_key
            .clone()
            .or_else(|| settings.openai_api_key.clone())
            .filter(|key| !key.revealed().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a repository path is given but does not exist or
    /// is not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(Command::BranchSummary {
            repo: Some(repo), ..
        }) = &self.command
        {
            if !repo.exists() {
                return Err(ConfigError::RepoPathNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoPathNotDirectory(repo.clone()));
            }
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// `~/.lgh`, or `./.lgh` when no home directory is known
fn default_work_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(WORK_DIR_NAME)
}

/// Defaults persisted in the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default output language
    pub lang: Option<Language>,
    /// Default output root
    pub workdir: Option<PathBuf>,
    /// Saved OpenAI API key
    pub openai_api_key: Option<ApiKey>,
}

impl Settings {
    /// Load settings, treating a missing file as empty settings
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::SettingsReadFailed(path.to_path_buf(), e))?;
        let settings = toml::from_str(&text)
            .map_err(|e| ConfigError::SettingsParseFailed(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "Using settings file");
        Ok(settings)
    }

    /// Write settings, replacing any existing file
    ///
    /// The parent directory is created owner-only on Unix, and the file is
    /// readable by its owner only since it may hold an API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)
                .map_err(|e| ConfigError::SettingsWriteFailed(parent.to_path_buf(), e))?;
        }

        let text = toml::to_string(self)?;
        fs::write(path, text)
            .and_then(|()| restrict_to_owner(path))
            .map_err(|e| ConfigError::SettingsWriteFailed(path.to_path_buf(), e))
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn restrict_to_owner(file: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(file, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoPathNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoPathNotDirectory(PathBuf),

    /// No API key on the command line, in the environment or in settings
    #[error(
        "No OpenAI API key: pass --openai-api-key, set OPENAI_API_KEY, \
         or save one with `lgh config --openai-api-key <KEY>`"
    )]
    MissingApiKey,

    /// Settings file could not be read
    #[error("Failed to read settings file {0}: {1}")]
    SettingsReadFailed(PathBuf, std::io::Error),

    /// Settings file is not valid TOML for [`Settings`]
    #[error("Failed to parse settings file {0}: {1}")]
    SettingsParseFailed(PathBuf, toml::de::Error),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    SettingsSerializeFailed(#[from] toml::ser::Error),

    /// Settings file or its directory could not be written
    #[error("Failed to write settings to {0}: {1}")]
    SettingsWriteFailed(PathBuf, std::io::Error),
}
