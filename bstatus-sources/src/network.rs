//! Network throughput from the kernel's interface counters.
//!
//! `%[(prefix)]<dir><metric>` where dir is `r` (receive) or `t` (transmit):
//!
//! | metric | renders                      |
//! |--------|------------------------------|
//! | `s`    | formatted bytes per second   |
//! | `S`    | raw bytes per second         |
//! | `p`    | packets per second           |
//! | `b`    | formatted cumulative bytes   |
//! | `B`    | raw cumulative bytes         |
//!
//! Values are summed over interfaces whose name starts with `prefix`
//! (all interfaces when omitted). `%?[(prefix)]<dir><s|p|b><clause>`
//! compares against the raw value.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bstatus_format::{
    Expansion, Rule, Template, compile, conditional, format_size, format_speed, unescape,
};
use bstatus_framework::{SampleError, Sampler};
use once_cell::sync::Lazy;
use regex::Captures;
use tokio::time::Instant;

use crate::grammar::{ARGUMENT, condition_pattern, pattern, percent};
use crate::kernel;
use crate::snapshot::{SharedCache, Snapshot, SourceKind};

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

static RULES: Lazy<Vec<Rule<NetworkUsage>>> = Lazy::new(|| {
    vec![
        percent(),
        Rule::evaluator(
            condition_pattern(&format!(r"{}(?P<dir>[rt])(?P<metric>[spb])", ARGUMENT)),
            |caps| {
                let (prefix, metric) = prefix_metric(caps);
                conditional(caps, move |usage: &NetworkUsage| usage.sum(&prefix, metric))
            },
        ),
        Rule::evaluator(
            pattern(&format!(r"%{}(?P<dir>[rt])(?P<metric>[sSpbB])", ARGUMENT)),
            |caps| {
                let (prefix, metric) = prefix_metric(caps);
                match &caps["metric"] {
                    "s" => Expansion::evaluator(move |usage: &NetworkUsage| {
                        format_speed(usage.sum(&prefix, metric))
                    }),
                    "b" => Expansion::evaluator(move |usage: &NetworkUsage| {
                        format_size(usage.sum(&prefix, metric) as u64)
                    }),
                    _ => Expansion::evaluator(move |usage: &NetworkUsage| {
                        format!("{}", usage.sum(&prefix, metric).round() as u64)
                    }),
                }
            },
        ),
    ]
});

fn prefix_metric(caps: &Captures<'_>) -> (String, Metric) {
    let prefix = caps.name("arg").map_or_else(String::new, |m| unescape(m.as_str()));
    let receive = &caps["dir"] == "r";
    let metric = match caps["metric"].to_ascii_lowercase().as_str() {
        "s" if receive => Metric::ReceiveSpeed,
        "s" => Metric::TransmitSpeed,
        "p" if receive => Metric::ReceivePackets,
        "p" => Metric::TransmitPackets,
        _ if receive => Metric::ReceiveBytes,
        _ => Metric::TransmitBytes,
    };
    (prefix, metric)
}

/// Which interface quantity a token sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    ReceiveSpeed,
    TransmitSpeed,
    ReceivePackets,
    TransmitPackets,
    ReceiveBytes,
    TransmitBytes,
}

/// Cumulative counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// Counters of every interface at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    pub taken: Instant,
    /// Interfaces sorted by name.
    pub interfaces: Vec<(String, Counters)>,
}

/// Per-interface rates and totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceUsage {
    pub name: String,
    pub rx_rate: f64,
    pub rx_packet_rate: f64,
    pub tx_rate: f64,
    pub tx_packet_rate: f64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl InterfaceUsage {
    fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ReceiveSpeed => self.rx_rate,
            Metric::TransmitSpeed => self.tx_rate,
            Metric::ReceivePackets => self.rx_packet_rate,
            Metric::TransmitPackets => self.tx_packet_rate,
            Metric::ReceiveBytes => self.rx_bytes as f64,
            Metric::TransmitBytes => self.tx_bytes as f64,
        }
    }
}

/// Rates derived from two [`NetworkStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkUsage {
    pub interfaces: Vec<InterfaceUsage>,
}

impl NetworkUsage {
    /// Rates between `previous` and `current`, rounded to whole units.
    ///
    /// Interfaces missing from `previous` (including every interface of a
    /// first snapshot) report zero rates. Counter resets also read as zero.
    pub fn derive(current: &NetworkStats, previous: Option<&NetworkStats>) -> Self {
        let before: HashMap<&str, &Counters> = previous
            .map(|p| p.interfaces.iter().map(|(n, c)| (n.as_str(), c)).collect())
            .unwrap_or_default();
        let elapsed = previous
            .map(|p| current.taken.duration_since(p.taken).as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .unwrap_or(0.001);
        let rate = |now: u64, then: u64| (now.saturating_sub(then) as f64 / elapsed).round();

        let interfaces = current
            .interfaces
            .iter()
            .map(|(name, now)| {
                let mut usage = InterfaceUsage {
                    name: name.clone(),
                    rx_bytes: now.rx_bytes,
                    tx_bytes: now.tx_bytes,
                    ..Default::default()
                };
                if let Some(then) = before.get(name.as_str()) {
                    usage.rx_rate = rate(now.rx_bytes, then.rx_bytes);
                    usage.rx_packet_rate = rate(now.rx_packets, then.rx_packets);
                    usage.tx_rate = rate(now.tx_bytes, then.tx_bytes);
                    usage.tx_packet_rate = rate(now.tx_packets, then.tx_packets);
                }
                usage
            })
            .collect();

        Self { interfaces }
    }

    /// Sum of `metric` over interfaces whose name starts with `prefix`.
    pub fn sum(&self, prefix: &str, metric: Metric) -> f64 {
        self.interfaces
            .iter()
            .filter(|i| i.name.starts_with(prefix))
            .map(|i| i.get(metric))
            .sum()
    }
}

/// Network sampler.
pub struct Network {
    format: String,
    template: Option<Template<NetworkUsage>>,
    cache: SharedCache,
    last: Option<Arc<NetworkStats>>,
}

impl Network {
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
    kernel::network_stats()
        .await
        .map(|stats| Snapshot::Network(Arc::new(stats)))
}

impl Sampler for Network {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        let stats = match self.cache.get_or_sample(SourceKind::Network, read_stats).await? {
            Snapshot::Network(stats) => stats,
            other => return Err(other.mismatch(SourceKind::Network)),
        };

        let usage = NetworkUsage::derive(&stats, self.last.as_deref());
        self.last = Some(stats);

        let template = self
            .template
            .get_or_insert_with(|| compile(&RULES, &self.format));
        Ok(Some(template.render(&usage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(taken: Instant, eth0: (u64, u64)) -> NetworkStats {
        NetworkStats {
            taken,
            interfaces: vec![
                (
                    "eth0".to_string(),
                    Counters {
                        rx_bytes: eth0.0,
                        rx_packets: 10,
                        tx_bytes: eth0.1,
                        tx_packets: 20,
                    },
                ),
                ("lo".to_string(), Counters::default()),
            ],
        }
    }

    #[test]
    fn test_first_snapshot_has_zero_rates() {
        let usage = NetworkUsage::derive(&stats(Instant::now(), (1000, 2000)), None);
        assert_eq!(usage.sum("", Metric::ReceiveSpeed), 0.0);
        assert_eq!(usage.sum("", Metric::TransmitPackets), 0.0);
        assert_eq!(usage.sum("eth", Metric::ReceiveBytes), 1000.0);
    }

    #[test]
    fn test_rate_over_one_second() {
        let start = Instant::now();
        let previous = stats(start, (1000, 2000));
        let current = stats(start + Duration::from_millis(1000), (3000, 2500));

        let usage = NetworkUsage::derive(&current, Some(&previous));
        assert_eq!(usage.sum("eth0", Metric::ReceiveSpeed), 2000.0);
        assert_eq!(usage.sum("eth0", Metric::TransmitSpeed), 500.0);
        assert_eq!(usage.sum("wlan", Metric::ReceiveSpeed), 0.0);
    }

    #[test]
    fn test_counter_reset_reads_zero() {
        let start = Instant::now();
        let previous = stats(start, (5000, 0));
        let current = stats(start + Duration::from_millis(500), (100, 0));

        let usage = NetworkUsage::derive(&current, Some(&previous));
        assert_eq!(usage.sum("", Metric::ReceiveSpeed), 0.0);
    }

    #[test]
    fn test_render() {
        let start = Instant::now();
        let previous = stats(start, (1000, 2000));
        let current = stats(start + Duration::from_millis(1000), (3000, 2000));
        let usage = NetworkUsage::derive(&current, Some(&previous));

        let render = |format: &str| compile(&RULES, format).render(&usage);
        assert_eq!(render("%(eth)rS"), "2000");
        assert_eq!(render("%(eth)rs"), format_speed(2000.0));
        assert_eq!(render("%rB %tB"), "3000 2000");
        assert_eq!(render("%rb"), format_size(3000));
        assert_eq!(render("%(e\\th)rS|%(lo)rS"), "2000|0");
        assert_eq!(render("%?(eth0)rs>1K(busy)%?ts>0(tx)"), "busy");
    }
}
