//! Per-task model configuration
//!
//! Each kind of model call gets its own model and generation settings.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/munger/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! There is no retry or fallback-model logic: a failed call is reported once
//! and the caller decides what to do with it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Kinds of model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Buy / Don't Buy verdict
    Recommendation,
    /// Item identification from an image
    Vision,
    /// Cheaper alternative lookup with the search tool
    Search,
    /// Free-form chat (proxy)
    Chat,
    /// Short "Item:/Fact:" identification (proxy)
    QuickIdentify,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recommendation => "recommendation",
            Self::Vision => "vision",
            Self::Search => "search",
            Self::Chat => "chat",
            Self::QuickIdentify => "quick_identify",
        }
    }

    /// Get all task types
    pub fn all() -> &'static [TaskType] {
        &[
            Self::Recommendation,
            Self::Vision,
            Self::Search,
            Self::Chat,
            Self::QuickIdentify,
        ]
    }

    fn from_key(key: &str) -> Option<TaskType> {
        Self::all().iter().copied().find(|t| t.as_str() == key)
    }
}

/// Model and generation settings for one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: Option<f32>,
    /// Attach the Google Search grounding tool
    pub google_search: bool,
    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            temperature: 0.2,
            max_output_tokens: 800,
            top_p: None,
            google_search: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for every task
#[derive(Debug, Clone)]
pub struct ModelConfig {
    defaults: TaskConfig,
    tasks: HashMap<TaskType, TaskConfig>,
    config_path: Option<PathBuf>,
}

impl ModelConfig {
    /// Load configuration from the default override location or embedded defaults
    pub fn load() -> Result<Self> {
        let path = default_config_path();
        let mut config = load_config(path.as_deref())?;
        config.config_path = path;
        Ok(config)
    }

    /// Load configuration from a specific override file
    ///
    /// A missing file falls back to the embedded defaults.
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let mut config = load_config(Some(&path))?;
        config.config_path = Some(path);
        Ok(config)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Settings for a task (falls back to [defaults] for unconfigured tasks)
    pub fn task(&self, task: TaskType) -> TaskConfig {
        self.tasks
            .get(&task)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    /// The default model
    pub fn default_model(&self) -> &str {
        &self.defaults.model
    }

    /// Get the config path (if file-based config was requested)
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("munger").join("config").join("models.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<ModelConfig> {
    match override_path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
            tracing::debug!(path = %path.display(), "Using model config override");
            parse_config(&content)
        }
        _ => parse_config(DEFAULT_CONFIG),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawTaskConfig>,
    tasks: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    top_p: Option<f32>,
    google_search: Option<bool>,
    timeout_secs: Option<u64>,
}

impl RawTaskConfig {
    fn apply(self, base: &TaskConfig) -> TaskConfig {
        TaskConfig {
            model: self.model.unwrap_or_else(|| base.model.clone()),
            temperature: self.temperature.unwrap_or(base.temperature),
            max_output_tokens: self.max_output_tokens.unwrap_or(base.max_output_tokens),
            top_p: self.top_p.or(base.top_p),
            google_search: self.google_search.unwrap_or(base.google_search),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.timeout),
        }
    }
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<ModelConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let defaults = match raw.defaults {
        Some(d) => d.apply(&TaskConfig::default()),
        None => TaskConfig::default(),
    };

    let mut tasks = HashMap::new();
    for (key, task_config) in raw.tasks.unwrap_or_default() {
        let Some(task) = TaskType::from_key(&key) else {
            tracing::warn!(task = %key, "Ignoring unknown task in model config");
            continue;
        };
        tasks.insert(task, task_config.apply(&defaults));
    }

    Ok(ModelConfig {
        defaults,
        tasks,
        config_path: None,
    })
}
