//! CPU usage from the kernel's busy tick counters.
//!
//! Grammar:
//!
//! | token                       | renders                                      |
//! |-----------------------------|----------------------------------------------|
//! | `%[denom][.acc]p`           | total usage                                  |
//! | `%N[-denom][.acc]c`         | core `N - 1` (`N = 0` is the total)          |
//! | `%[denom][.acc][(sep)]C`    | every core, joined by `sep` (default `, `)   |
//! | `%?p<clause>`, `%?Nc<clause>` | clause text against usage in percent       |
//! | `%%`                        | `%`                                          |

use std::sync::Arc;
use std::time::Duration;

use bstatus_format::{Expansion, Rule, Template, compile, conditional, format_portion};
use bstatus_framework::{SampleError, Sampler};
use once_cell::sync::Lazy;
use tokio::time::Instant;

use crate::grammar::{ARGUMENT, condition_pattern, group, pattern, percent, portion_params};
use crate::kernel;
use crate::snapshot::{SharedCache, Snapshot, SourceKind};

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

static RULES: Lazy<Vec<Rule<CpuUsage>>> = Lazy::new(|| {
    vec![
        percent(),
        Rule::evaluator(condition_pattern(r"(?:(?P<core>\d+)c|p)"), |caps| {
            let core = caps.name("core").and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            conditional(caps, move |usage: &CpuUsage| usage.core(core) * 100.0)
        }),
        Rule::evaluator(pattern(r"%(?P<denom>\d+)?(?:\.(?P<acc>\d+))?p"), |caps| {
            let (denom, acc) = portion_params(caps, "denom", "acc");
            Expansion::evaluator(move |usage: &CpuUsage| format_portion(usage.total, denom, acc))
        }),
        Rule::evaluator(
            pattern(r"%(?P<core>\d+)(?:-(?P<denom>\d+))?(?:\.(?P<acc>\d+))?c"),
            |caps| {
                let Ok(core) = group(caps, "core").parse::<usize>() else {
                    return Expansion::Literal(caps.get(0).map_or("", |m| m.as_str()).to_string());
                };
                let (denom, acc) = portion_params(caps, "denom", "acc");
                Expansion::evaluator(move |usage: &CpuUsage| {
                    format_portion(usage.core(core), denom, acc)
                })
            },
        ),
        Rule::evaluator(
            pattern(&format!(r"%(?P<denom>\d+)?(?:\.(?P<acc>\d+))?{}C", ARGUMENT)),
            |caps| {
                let (denom, acc) = portion_params(caps, "denom", "acc");
                let separator = caps.name("arg").map_or(", ", |m| m.as_str()).to_string();
                Expansion::evaluator(move |usage: &CpuUsage| {
                    usage
                        .cores
                        .iter()
                        .map(|core| format_portion(*core, denom, acc))
                        .collect::<Vec<_>>()
                        .join(&separator)
                })
            },
        ),
    ]
});

/// Busy ticks (user + system) at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuStats {
    pub taken: Instant,
    /// Aggregate over all cores.
    pub total: u64,
    /// Per core, in core order.
    pub cores: Vec<u64>,
}

/// Usage fractions in `0.0..=1.0` derived from two [`CpuStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUsage {
    /// Aggregate usage averaged over the cores.
    pub total: f64,
    pub cores: Vec<f64>,
}

impl CpuUsage {
    /// Usage between `previous` and `current`.
    ///
    /// Without a previous snapshot every value is zero.
    pub fn derive(current: &CpuStats, previous: Option<&CpuStats>, clk_tck: f64) -> Self {
        let Some(previous) = previous else {
            return Self {
                total: 0.0,
                cores: vec![0.0; current.cores.len()],
            };
        };

        let elapsed = match current.taken.duration_since(previous.taken).as_secs_f64() {
            secs if secs > 0.0 => secs,
            _ => 0.001,
        };
        let usage = |ticks: f64| (ticks / clk_tck / elapsed).clamp(0.0, 1.0);

        let count = current.cores.len().max(1) as f64;
        let total = usage(current.total.saturating_sub(previous.total) as f64 / count);
        let cores = current
            .cores
            .iter()
            .enumerate()
            .map(|(i, now)| match previous.cores.get(i) {
                Some(before) => usage(now.saturating_sub(*before) as f64),
                None => 0.0,
            })
            .collect();

        Self { total, cores }
    }

    /// `0` is the total, `n` is core `n - 1`. Unknown cores read as zero.
    pub fn core(&self, index: usize) -> f64 {
        match index {
            0 => self.total,
            n => self.cores.get(n - 1).copied().unwrap_or(0.0),
        }
    }
}

/// CPU usage sampler.
pub struct Cpu {
    format: String,
    template: Option<Template<CpuUsage>>,
    cache: SharedCache,
    last: Option<Arc<CpuStats>>,
}

impl Cpu {
    pub fn new(format: impl Into<String>, cache: SharedCache) -> Self {
        Self {
            format: format.into(),
            template: None,
            cache,
            last: None,
        }
    }
}

async fn read_stats() -> Result<Snapshot, SampleError> {
    kernel::cpu_stats().await.map(|stats| Snapshot::Cpu(Arc::new(stats)))
}

impl Sampler for Cpu {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        let clk_tck = kernel::ticks_per_second();
        let stats = match self.cache.get_or_sample(SourceKind::Cpu, read_stats).await? {
            Snapshot::Cpu(stats) => stats,
            other => return Err(other.mismatch(SourceKind::Cpu)),
        };

        let usage = CpuUsage::derive(&stats, self.last.as_deref(), clk_tck);
        tracing::trace!(total = usage.total, cores = usage.cores.len(), "CPU usage");
        self.last = Some(stats);

        let template = self
            .template
            .get_or_insert_with(|| compile(&RULES, &self.format));
        Ok(Some(template.render(&usage)))
    }
}
