//! Disk usage from `df`.
//!
//! `%[(path)]<field>`: `t`/`u`/`a` render total/used/available as formatted
//! sizes, `T`/`U`/`A` as raw bytes, `p`/`P` as used/available portions.
//! The path defaults to `/` and resolves to the mount point that is its
//! longest ancestor. `%?[(path)]<t|u|a|p|P><clause>` compares bytes, or
//! percent for `p`/`P`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bstatus_format::{
    DEFAULT_DENOMINATOR, Expansion, Rule, Template, compile, conditional, format_portion,
    format_size, unescape,
};
use bstatus_framework::{SampleError, Sampler};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::exec::run;
use crate::grammar::{ARGUMENT, condition_pattern, pattern, percent};
use crate::snapshot::{SharedCache, Snapshot, SourceKind};

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

static DF_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(?P<total>\d+)\s+(?P<used>\d+)\s+(?P<available>\d+)\s+\d+%\s+(?P<path>/\S*)")
        .unwrap()
});

static RULES: Lazy<Vec<Rule<DiskStats>>> = Lazy::new(|| {
    vec![
        percent(),
        Rule::evaluator(
            condition_pattern(&format!(r"{}(?P<field>[tuapP])", ARGUMENT)),
            |caps| {
                let (location, field) = location_field(caps);
                conditional(caps, move |stats: &DiskStats| {
                    let usage = stats.lookup(&location);
                    match field {
                        'p' | 'P' => usage.portion(field) * 100.0,
                        _ => usage.bytes(field) as f64,
                    }
                })
            },
        ),
        Rule::evaluator(
            pattern(&format!(r"%{}(?P<field>[tuaTUApP])", ARGUMENT)),
            |caps| {
                let (location, field) = location_field(caps);
                match field {
                    'p' | 'P' => Expansion::evaluator(move |stats: &DiskStats| {
                        let portion = stats.lookup(&location).portion(field);
                        format_portion(portion, DEFAULT_DENOMINATOR, 0)
                    }),
                    't' | 'u' | 'a' => Expansion::evaluator(move |stats: &DiskStats| {
                        format_size(stats.lookup(&location).bytes(field))
                    }),
                    _ => Expansion::evaluator(move |stats: &DiskStats| {
                        stats.lookup(&location).bytes(field).to_string()
                    }),
                }
            },
        ),
    ]
});

fn location_field(caps: &Captures<'_>) -> (String, char) {
    let location = caps
        .name("arg")
        .map_or_else(|| "/".to_string(), |m| unescape(m.as_str()));
    let field = caps["field"].chars().next().unwrap_or('t');
    (location, field)
}

/// Sizes of one mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl DiskUsage {
    fn bytes(&self, field: char) -> u64 {
        match field.to_ascii_lowercase() {
            'u' => self.used,
            'a' => self.available,
            _ => self.total,
        }
    }

    // Zero-sized filesystems render as 0.
    fn portion(&self, field: char) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let part = if field == 'p' { self.used } else { self.available };
        part as f64 / self.total as f64
    }
}

/// Usage per mount point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskStats {
    mounts: HashMap<String, DiskUsage>,
}

impl DiskStats {
    /// Parse `df -kP` output (1K blocks).
    pub fn parse(output: &str) -> Self {
        let mounts = output
            .lines()
            .filter_map(|line| DF_LINE.captures(line))
            .filter_map(|caps| {
                let blocks = |name: &str| caps[name].parse::<u64>().ok().map(|b| b.saturating_mul(1024));
                let usage = DiskUsage {
                    total: blocks("total")?,
                    used: blocks("used")?,
                    available: blocks("available")?,
                };
                Some((caps["path"].to_string(), usage))
            })
            .collect();
        Self { mounts }
    }

    /// Usage of the mount point holding `location`.
    ///
    /// Tries `location` and then each ancestor, ending with `/`. Unknown
    /// locations read as all zeros.
    pub fn lookup(&self, location: &str) -> DiskUsage {
        let mut path = location.trim_end_matches('/');
        loop {
            let key = if path.is_empty() { "/" } else { path };
            if let Some(usage) = self.mounts.get(key) {
                return *usage;
            }
            if path.is_empty() {
                return DiskUsage::default();
            }
            path = path.rfind('/').map_or("", |i| &path[..i]);
        }
    }

    pub fn mount_count(&self) -> usize {
        self.mounts.len()
    }
}

/// Disk usage sampler.
pub struct Disk {
    format: String,
    template: Option<Template<DiskStats>>,
    cache: SharedCache,
}

impl Disk {
    pub fn new(format: impl Into<String>, cache: SharedCache) -> Self {
        Self {
            format: format.into(),
            template: None,
            cache,
        }
    }
}

async fn read_stats() -> Result<Snapshot, SampleError> {
    let output = run("df", &["-kP"]).await?;
    Ok(Snapshot::Disk(Arc::new(DiskStats::parse(&output))))
}

impl Sampler for Disk {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        let stats = match self.cache.get_or_sample(SourceKind::Disk, read_stats).await? {
            Snapshot::Disk(stats) => stats,
            other => return Err(other.mismatch(SourceKind::Disk)),
        };
        tracing::trace!(mounts = stats.mount_count(), "Disk usage");

        let template = self
            .template
            .get_or_insert_with(|| compile(&RULES, &self.format));
        Ok(Some(template.render(&stats)))
    }
}
