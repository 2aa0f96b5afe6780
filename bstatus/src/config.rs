//! Configuration for bstatus.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;

use bstatus_framework::{LoggingConfig, StatusConfig, StatusError, Width};
use bstatus_sources::{clock, command, cpu, disk, memory, network};

/// Complete configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BstatusConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Window in which refresh requests are merged into one render
    /// (default: 0, render once the current burst has been queued).
    #[serde(default)]
    pub defer_timeout_ms: u64,

    /// Lifetime of cached OS snapshots (default: 100).
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Where the status line goes.
    #[serde(default)]
    pub output: OutputConfig,

    /// Sources in display order.
    pub sources: Vec<SourceConfig>,
}

fn default_cache_ttl_ms() -> u64 {
    100
}

impl BstatusConfig {
    /// Parse JSON5 text and validate it.
    pub fn parse(content: &str) -> Result<Self, StatusError> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn defer_timeout(&self) -> Duration {
        Duration::from_millis(self.defer_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl StatusConfig for BstatusConfig {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn validate(&self) -> Result<(), StatusError> {
        if self.sources.is_empty() {
            return Err(StatusError::validation("At least one source is required"));
        }
        for (index, source) in self.sources.iter().enumerate() {
            source
                .validate()
                .map_err(|e| StatusError::validation(format!("sources[{index}]: {e}")))?;
        }
        Ok(())
    }
}

/// Output selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    /// Terminal or plain text on standard output.
    #[default]
    Standard,
    /// i3bar JSON protocol on standard output, clicks on standard input.
    I3bar {
        /// `separator_block_width` in pixels.
        #[serde(default)]
        separator_width: Option<u32>,
    },
}

/// One display slot.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(flatten)]
    pub kind: SourceKindConfig,

    /// Display width: a column count or markup whose width is used.
    #[serde(default)]
    pub width: Option<Width>,

    /// Shell command per mouse button, e.g. `{ "1": "pavucontrol" }`.
    #[serde(default)]
    pub on_click: HashMap<String, String>,
}

/// What fills a display slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKindConfig {
    Clock {
        #[serde(default = "default_clock_format")]
        format: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    Cpu {
        format: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    Memory {
        format: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    Network {
        format: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    Disk {
        format: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    Command {
        command: String,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    /// Fixed markup, never updated.
    Text { text: String },
}

fn default_clock_format() -> String {
    clock::DEFAULT_FORMAT.to_string()
}

impl SourceKindConfig {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clock { .. } => "clock",
            Self::Cpu { .. } => "cpu",
            Self::Memory { .. } => "memory",
            Self::Network { .. } => "network",
            Self::Disk { .. } => "disk",
            Self::Command { .. } => "command",
            Self::Text { .. } => "text",
        }
    }

    /// Update period, `None` for static text.
    pub fn interval(&self) -> Option<Duration> {
        let (configured, default) = match self {
            Self::Clock { interval_ms, .. } => (interval_ms, clock::DEFAULT_INTERVAL),
            Self::Cpu { interval_ms, .. } => (interval_ms, cpu::DEFAULT_INTERVAL),
            Self::Memory { interval_ms, .. } => (interval_ms, memory::DEFAULT_INTERVAL),
            Self::Network { interval_ms, .. } => (interval_ms, network::DEFAULT_INTERVAL),
            Self::Disk { interval_ms, .. } => (interval_ms, disk::DEFAULT_INTERVAL),
            Self::Command { interval_ms, .. } => (interval_ms, command::DEFAULT_INTERVAL),
            Self::Text { .. } => return None,
        };
        Some(configured.map_or(default, Duration::from_millis))
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        let interval_ms = match &self.kind {
            SourceKindConfig::Cpu { format, interval_ms }
            | SourceKindConfig::Memory { format, interval_ms }
            | SourceKindConfig::Network { format, interval_ms }
            | SourceKindConfig::Disk { format, interval_ms } => {
                if format.is_empty() {
                    return Err(format!("{} format must not be empty", self.kind.name()));
                }
                interval_ms
            }
            SourceKindConfig::Clock { interval_ms, .. } => interval_ms,
            SourceKindConfig::Command {
                command,
                interval_ms,
            } => {
                if command.trim().is_empty() {
                    return Err("command must not be empty".to_string());
                }
                interval_ms
            }
            SourceKindConfig::Text { .. } => &None,
        };
        if *interval_ms == Some(0) {
            return Err("interval_ms must be greater than 0".to_string());
        }
        self.click_commands()?;
        Ok(())
    }

    /// `on_click` keyed by button number.
    pub fn click_commands(&self) -> Result<BTreeMap<u8, String>, String> {
        self.on_click
            .iter()
            .map(|(button, command)| {
                button
                    .trim()
                    .parse::<u8>()
                    .map(|button| (button, command.clone()))
                    .map_err(|_| format!("on_click button {button:?} is not a number"))
            })
            .collect()
    }
}
