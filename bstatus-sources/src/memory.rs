//! Memory and swap usage.
//!
//! `%<scope><field>` where scope is `m` (memory), `s` (swap) or `t` (both)
//! and field is `u` (used), `a` (available), `f` (free) or `t` (total).
//! Lower-case fields render a formatted size, upper-case ones raw bytes.
//! `%?<scope><field><clause>` compares against bytes.

use std::sync::Arc;
use std::time::Duration;

use bstatus_format::{Expansion, Rule, Template, compile, conditional, format_size};
use bstatus_framework::{SampleError, Sampler};
use once_cell::sync::Lazy;

use crate::grammar::{condition_pattern, pattern, percent};
use crate::kernel;
use crate::snapshot::{SharedCache, Snapshot, SourceKind};

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

static RULES: Lazy<Vec<Rule<MemoryStats>>> = Lazy::new(|| {
    vec![
        percent(),
        Rule::evaluator(condition_pattern(r"(?P<scope>[mst])(?P<field>[uaftUAFT])"), |caps| {
            let (scope, field) = scope_field(caps);
            conditional(caps, move |stats: &MemoryStats| stats.value(scope, field) as f64)
        }),
        Rule::evaluator(pattern(r"%(?P<scope>[mst])(?P<field>[uaftUAFT])"), |caps| {
            let (scope, field) = scope_field(caps);
            if caps["field"].chars().all(|c| c.is_ascii_uppercase()) {
                Expansion::evaluator(move |stats: &MemoryStats| stats.value(scope, field).to_string())
            } else {
                Expansion::evaluator(move |stats: &MemoryStats| format_size(stats.value(scope, field)))
            }
        }),
    ]
});

fn scope_field(caps: &regex::Captures<'_>) -> (Scope, Field) {
    let scope = match &caps["scope"] {
        "m" => Scope::Memory,
        "s" => Scope::Swap,
        _ => Scope::Total,
    };
    let field = match caps["field"].to_ascii_lowercase().as_str() {
        "u" => Field::Used,
        "a" => Field::Available,
        "f" => Field::Free,
        _ => Field::Total,
    };
    (scope, field)
}

/// Which pool a memory token reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Memory,
    Swap,
    Total,
}

/// Which quantity a memory token reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Used,
    Available,
    Free,
    Total,
}

/// Memory and swap counters in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub swap_cached: u64,
}

impl MemoryStats {
    /// Bytes for a scope and field.
    pub fn value(&self, scope: Scope, field: Field) -> u64 {
        match (scope, field) {
            (Scope::Memory, Field::Used) => self.mem_total.saturating_sub(self.mem_free),
            (Scope::Memory, Field::Available) => self.mem_available,
            (Scope::Memory, Field::Free) => self.mem_free,
            (Scope::Memory, Field::Total) => self.mem_total,
            (Scope::Swap, Field::Used) => self.swap_total.saturating_sub(self.swap_free),
            (Scope::Swap, Field::Available) => self.swap_free + self.swap_cached,
            (Scope::Swap, Field::Free) => self.swap_free,
            (Scope::Swap, Field::Total) => self.swap_total,
            (Scope::Total, field) => {
                self.value(Scope::Memory, field) + self.value(Scope::Swap, field)
            }
        }
    }
}

/// Memory sampler.
pub struct Memory {
    format: String,
    template: Option<Template<MemoryStats>>,
    cache: SharedCache,
}

impl Memory {
    pub fn new(format: impl Into<String>, cache: SharedCache) -> Self {
        Self {
            format: format.into(),
            template: None,
            cache,
        }
    }
}

async fn read_stats() -> Result<Snapshot, SampleError> {
    kernel::memory_stats()
        .await
        .map(|stats| Snapshot::Memory(Arc::new(stats)))
}

impl Sampler for Memory {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        let stats = match self.cache.get_or_sample(SourceKind::Memory, read_stats).await? {
            Snapshot::Memory(stats) => stats,
            other => return Err(other.mismatch(SourceKind::Memory)),
        };

        let template = self
            .template
            .get_or_insert_with(|| compile(&RULES, &self.format));
        Ok(Some(template.render(&stats)))
    }
}
