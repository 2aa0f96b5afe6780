//! Building sources and drivers from the configuration.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use bstatus_framework::{Program, Repeat, Sampler, Source, StatusError};
use bstatus_sources::{Clock, Command, Cpu, Disk, Memory, Network, SharedCache, shared_cache};

use crate::config::{BstatusConfig, SourceConfig, SourceKindConfig};

/// A program with its sources attached and their drivers running.
pub struct StatusLine {
    pub program: Program,
    /// One task per periodically updated source.
    pub drivers: Vec<JoinHandle<()>>,
}

/// Create every configured source, attach it to a new [`Program`] and
/// start its driver. Must be called inside a Tokio runtime.
pub fn build(config: &BstatusConfig) -> Result<StatusLine, StatusError> {
    let cache = shared_cache(config.cache_ttl());
    let mut program = Program::new().with_defer_timeout(config.defer_timeout());
    let mut drivers = Vec::new();

    for (index, source_config) in config.sources.iter().enumerate() {
        let name = format!("{}#{}", source_config.kind.name(), index);
        let source = Arc::new(Source::new(name));
        program.add_source(source.clone());

        if let Some(width) = &source_config.width {
            source.set_width(width)?;
        }
        attach_click_commands(&source, source_config)?;

        if let Some(driver) = start(&source, &source_config.kind, &cache)? {
            drivers.push(driver);
        }
    }

    tracing::info!(
        sources = config.sources.len(),
        drivers = drivers.len(),
        "Sources configured"
    );
    Ok(StatusLine { program, drivers })
}

fn start(
    source: &Arc<Source>,
    kind: &SourceKindConfig,
    cache: &SharedCache,
) -> Result<Option<JoinHandle<()>>, StatusError> {
    let interval = kind.interval().unwrap_or_default();
    let driver = match kind {
        SourceKindConfig::Clock { format, .. } => repeat(source, Clock::new(format), interval),
        SourceKindConfig::Cpu { format, .. } => {
            repeat(source, Cpu::new(format, cache.clone()), interval)
        }
        SourceKindConfig::Memory { format, .. } => {
            repeat(source, Memory::new(format, cache.clone()), interval)
        }
        SourceKindConfig::Network { format, .. } => {
            repeat(source, Network::new(format, cache.clone()), interval)
        }
        SourceKindConfig::Disk { format, .. } => {
            repeat(source, Disk::new(format, cache.clone()), interval)
        }
        SourceKindConfig::Command { command, .. } => {
            repeat(source, Command::new(command), interval)
        }
        SourceKindConfig::Text { text } => {
            source.set_text(text)?;
            return Ok(None);
        }
    };
    Ok(Some(driver))
}

fn repeat<S: Sampler>(source: &Arc<Source>, sampler: S, interval: Duration) -> JoinHandle<()> {
    Repeat::new(source.clone(), sampler, interval).spawn()
}

fn attach_click_commands(source: &Source, config: &SourceConfig) -> Result<(), StatusError> {
    let commands = config.click_commands().map_err(StatusError::validation)?;
    if commands.is_empty() {
        return Ok(());
    }
    source.on_click(move |button| {
        if let Some(command) = commands.get(&button) {
            spawn_detached(command);
        }
    });
    Ok(())
}

/// Start `sh -c command` without waiting for it. Failures are logged.
pub fn spawn_detached(command: &str) {
    let result = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match result {
        Ok(_) => tracing::debug!(command, "Started click command"),
        Err(e) => tracing::warn!(command, error = %e, "Failed to start click command"),
    }
}
