use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Rect;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window must have positive size, got {width}x{height}")]
    EmptyRect { width: i32, height: i32 },

    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid YAML in {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { left: 0, top: 0, width: 765, height: 503 }
    }
}

impl WindowConfig {
    pub fn rect(&self) -> Result<Rect, ConfigError> {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `ollama`, `open_api`, anything else selects the dummy backend
    pub backend: String,
    pub url: String,
    pub model_name: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: "ollama".into(),
            url: "http://localhost:11434/api/generate".into(),
            model_name: None,
            headers: HashMap::new(),
            timeout_secs: 30,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Observation edge length; frames are resized to size×size
    pub size: u32,
    /// Fraction of the frame height blanked at the bottom (chat box)
    pub mask_bottom: Option<f32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { size: 224, mask_bottom: Some(0.2) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub steps: usize,
    /// Total pointer travel time in seconds
    pub duration: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { steps: 15, duration: 0.15 }
    }
}

impl MotionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration.max(0.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub fps: f64,
    pub tick_interval: f64,
    pub model: ModelConfig,
    pub capture: CaptureConfig,
    pub motion: MotionConfig,
    pub prompt_path: Option<PathBuf>,
    pub demo_dir: PathBuf,
    pub demo_limit: usize,
    pub plugin_enabled: bool,
    pub rag_enabled: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            fps: 2.0,
            tick_interval: 0.6,
            model: ModelConfig::default(),
            capture: CaptureConfig::default(),
            motion: MotionConfig::default(),
            prompt_path: None,
            demo_dir: PathBuf::from("demo_frames"),
            demo_limit: 10,
            plugin_enabled: false,
            rag_enabled: false,
            log_dir: None,
        }
    }
}

const DEFAULT_PROMPT: &str = include_str!("../prompts/system.md");

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
            .and_then(|cfg| cfg.validated())
    }

    /// Parse without touching the filesystem. An empty document yields defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.window.rect()?;
        Ok(self)
    }

    pub fn rect(&self) -> Result<Rect, ConfigError> {
        self.window.rect()
    }

    /// Pause between demo frames, derived from `fps`.
    pub fn demo_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1e-3))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval.max(0.0))
    }

    /// System prompt from `prompt_path`, or the bundled one.
    pub fn system_prompt(&self) -> anyhow::Result<String> {
        match &self.prompt_path {
            Some(p) => Ok(std::fs::read_to_string(p)?.trim().to_string()),
            None => Ok(DEFAULT_PROMPT.trim().to_string()),
        }
    }
}
