use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use memchat_core::{MemoryChatOptions, ModelSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub enable_thinking: bool,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    pub file: PathBuf,
    pub context_window: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LogConfig {
    /// Call log location; empty disables the call log
    #[serde(default)]
    pub file: String,
}

impl LogConfig {
    pub fn path(&self) -> Option<&Path> {
        let trimmed = self.file.trim();
        (!trimmed.is_empty()).then(|| Path::new(trimmed))
    }
}

/// Values given on the command line, applied over every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub memory_file: Option<PathBuf>,
    pub model: Option<String>,
}

impl Settings {
    pub fn new(overrides: &Overrides) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "default".into());

        let mut builder = Self::defaults()?
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = &overrides.config_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("MEMCHAT").separator("__"));
        Self::from_builder(Self::apply_overrides(builder, overrides)?)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", memchat_core::DEFAULT_MODEL)?
            .set_default("llm.enable_thinking", false)?
            .set_default("llm.timeout_seconds", 120)?
            .set_default("memory.file", "memories.json")?
            .set_default("memory.context_window", memchat_core::DEFAULT_CONTEXT_WINDOW as i64)?
            .set_default("log.file", "chat_with_memory.log")
    }

    fn apply_overrides(
        mut builder: ConfigBuilder<DefaultState>,
        overrides: &Overrides,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if let Some(path) = &overrides.memory_file {
            builder = builder.set_override("memory.file", path.to_string_lossy().into_owned())?;
        }
        if let Some(model) = &overrides.model {
            builder = builder.set_override("llm.model", model.as_str())?;
        }
        Ok(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "llm.api_key is required (set MEMCHAT__LLM__API_KEY)".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Message("llm.base_url must not be empty".into()));
        }
        if self.memory.context_window == 0 {
            return Err(ConfigError::Message(
                "memory.context_window must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn chat_options(&self) -> MemoryChatOptions {
        MemoryChatOptions {
            model: ModelSettings {
                model: self.llm.model.clone(),
                enable_thinking: self.llm.enable_thinking,
            },
            context_window: self.memory.context_window,
        }
    }
}
