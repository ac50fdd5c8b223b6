//! Review workspace configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TEXTREVIEW_USER)
//! 2. Config file (explicit path, or .textreview/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .textreview/config.yaml
//! - Falls back to ~/.textreview/config.yaml
//! - The corpus path is relative to the config file's parent directory
//!
//! The review core never reads this module directly: callers pass the
//! highlight rules, mark colours and reviewer identity in explicitly.

pub mod paths;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compositor::palette;
use crate::domain::HighlightRule;
use crate::scan::WindowConfig;

/// Environment variable overriding the reviewer identity
pub const USER_ENV: &str = "TEXTREVIEW_USER";

/// Identity used when none is configured
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("No config file found (looked for {dir}/{file} in current directory, parents and home)", dir = paths::CONFIG_DIR, file = paths::CONFIG_FILE)]
    NotDiscovered,

    #[error("Unknown colour: {0}")]
    UnknownColor(String),

    #[error("Canned response is empty")]
    EmptyResponse,

    #[error("Invalid highlight regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Config file schema (matches YAML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_title")]
    pub title: String,

    /// Last row the reviewer was on
    #[serde(default)]
    pub offset: usize,

    /// Match corpus, relative to the config file's directory
    #[serde(default = "default_corpus")]
    pub corpus: String,

    #[serde(default)]
    pub highlights: Vec<HighlightRule>,

    #[serde(default)]
    pub instructions: Vec<String>,

    /// Response labels offered to the reviewer
    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Reusable comment texts
    #[serde(default)]
    pub canned_responses: Vec<String>,

    /// Mark kind -> colour name
    #[serde(default = "default_mark_colors")]
    pub mark_colors: BTreeMap<String, String>,

    #[serde(flatten)]
    pub window: WindowConfig,
}

fn default_title() -> String {
    "Review App".to_string()
}

fn default_corpus() -> String {
    "review.jsonl".to_string()
}

fn default_mark_colors() -> BTreeMap<String, String> {
    [("mark", "green"), ("negated", "red")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            title: default_title(),
            offset: 0,
            corpus: default_corpus(),
            highlights: Vec::new(),
            instructions: Vec::new(),
            options: Vec::new(),
            user: None,
            canned_responses: Vec::new(),
            mark_colors: default_mark_colors(),
            window: WindowConfig::default(),
        }
    }
}

/// A loaded config file bound to its location
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    path: PathBuf,
    pub data: ConfigFile,
}

impl ReviewConfig {
    /// Load a config file; it must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let data: ConfigFile = serde_yaml::from_str(&content)?;
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Write a default config file (creating the parent directory)
    pub fn init(path: &Path) -> Result<Self, ConfigError> {
        let config = Self {
            path: path.to_path_buf(),
            data: ConfigFile::default(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save()?;
        Ok(config)
    }

    /// Rewrite the config file with the current values
    pub fn save(&self) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(&self.data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Workspace directory (the config file's parent)
    pub fn workspace_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Absolute location of the match corpus
    pub fn corpus_path(&self) -> PathBuf {
        self.workspace_dir().join(&self.data.corpus)
    }

    /// Annotation database for this workspace
    pub fn annotations_db_path(&self) -> PathBuf {
        paths::annotations_db_path(&self.corpus_path())
    }

    pub fn title(&self) -> &str {
        &self.data.title
    }

    pub fn options(&self) -> &[String] {
        &self.data.options
    }

    pub fn instructions(&self) -> &[String] {
        &self.data.instructions
    }

    pub fn highlights(&self) -> &[HighlightRule] {
        &self.data.highlights
    }

    pub fn mark_colors(&self) -> &BTreeMap<String, String> {
        &self.data.mark_colors
    }

    pub fn window(&self) -> WindowConfig {
        self.data.window
    }

    pub fn offset(&self) -> usize {
        self.data.offset
    }

    pub fn canned_responses(&self) -> &[String] {
        &self.data.canned_responses
    }

    /// Reviewer identity: $TEXTREVIEW_USER, then the file, then "anonymous"
    pub fn reviewer(&self) -> String {
        resolve_reviewer(std::env::var(USER_ENV).ok().as_deref(), self.data.user.as_deref())
    }

    /// Store the reviewer identity; a blank name clears it
    pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
        let name = name.trim();
        self.data.user = (!name.is_empty()).then(|| name.to_string());
        self.save()
    }

    /// Add a canned response unless already present, then persist.
    ///
    /// Returns the trimmed text.
    pub fn add_canned_response(&mut self, text: &str) -> Result<String, ConfigError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConfigError::EmptyResponse);
        }
        if !self.data.canned_responses.iter().any(|r| r == text) {
            self.data.canned_responses.push(text.to_string());
            self.save()?;
        }
        Ok(text.to_string())
    }

    /// Remember the current row and persist it
    pub fn set_offset(&mut self, offset: usize) -> Result<(), ConfigError> {
        if self.data.offset != offset {
            self.data.offset = offset;
            self.save()?;
        }
        Ok(())
    }

    /// Validate and append a highlight rule, then persist
    pub fn add_highlight(&mut self, regex: &str, color: &str) -> Result<(), ConfigError> {
        let rule = HighlightRule::new(regex, color.to_lowercase());
        rule.compile()?;
        if !palette::is_known(&rule.color) {
            return Err(ConfigError::UnknownColor(color.to_string()));
        }
        self.data.highlights.push(rule);
        self.save()
    }
}

/// Pick the reviewer identity from an override and the configured user.
///
/// Blank values count as unset.
pub fn resolve_reviewer(env: Option<&str>, configured: Option<&str>) -> String {
    env.into_iter()
        .chain(configured)
        .map(str::trim)
        .find(|u| !u.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}

/// Find config file by searching current directory and parents, then home
pub fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(paths::CONFIG_DIR).join(paths::CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::home_dir()
        .map(|home| home.join(paths::CONFIG_DIR).join(paths::CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Use an explicit path if given, otherwise discover one
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path),
        None => find_config_file().ok_or(ConfigError::NotDiscovered),
    }
}
