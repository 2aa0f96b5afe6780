//! Kernel counters read through `procfs`.
//!
//! The `procfs` readers are synchronous, so each one runs on the blocking
//! pool. Other platforms report every read as unsupported.

use bstatus_framework::SampleError;

use crate::cpu::CpuStats;
use crate::memory::MemoryStats;
use crate::network::NetworkStats;

/// Used when the tick rate is unknown.
#[cfg(not(target_os = "linux"))]
const DEFAULT_TICKS_PER_SECOND: f64 = 100.0;

#[cfg(target_os = "linux")]
mod linux {
    use procfs::{CpuTime, Current, CurrentSI, KernelStats, Meminfo, ProcResult};
    use tokio::time::Instant;

    use super::*;
    use crate::network::Counters;

    async fn blocking<T, F>(path: &'static str, read: F) -> Result<T, SampleError>
    where
        T: Send + 'static,
        F: FnOnce() -> ProcResult<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(read)
            .await
            .map_err(|e| SampleError::Internal(format!("{path} reader failed: {e}")))?
            .map_err(|e| SampleError::io(path, e))
    }

    fn busy(cpu: &CpuTime) -> u64 {
        cpu.user + cpu.system
    }

    pub fn ticks_per_second() -> f64 {
        procfs::ticks_per_second() as f64
    }

    pub async fn cpu_stats() -> Result<CpuStats, SampleError> {
        let stat = blocking("/proc/stat", || KernelStats::current()).await?;
        Ok(CpuStats {
            taken: Instant::now(),
            total: busy(&stat.total),
            cores: stat.cpu_time.iter().map(busy).collect(),
        })
    }

    pub async fn memory_stats() -> Result<MemoryStats, SampleError> {
        let meminfo = blocking("/proc/meminfo", || Meminfo::current()).await?;
        Ok(MemoryStats {
            mem_total: meminfo.mem_total,
            mem_free: meminfo.mem_free,
            mem_available: meminfo.mem_available.unwrap_or(meminfo.mem_free),
            swap_total: meminfo.swap_total,
            swap_free: meminfo.swap_free,
            swap_cached: meminfo.swap_cached,
        })
    }

    pub async fn network_stats() -> Result<NetworkStats, SampleError> {
        let devices = blocking("/proc/net/dev", procfs::net::dev_status).await?;
        let mut interfaces: Vec<(String, Counters)> = devices
            .into_iter()
            .map(|(name, device)| {
                let counters = Counters {
                    rx_bytes: device.recv_bytes,
                    rx_packets: device.recv_packets,
                    tx_bytes: device.sent_bytes,
                    tx_packets: device.sent_packets,
                };
                (name, counters)
            })
            .collect();
        interfaces.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(NetworkStats {
            taken: Instant::now(),
            interfaces,
        })
    }
}

#[cfg(target_os = "linux")]
pub(crate) use linux::{cpu_stats, memory_stats, network_stats, ticks_per_second};

#[cfg(not(target_os = "linux"))]
fn unsupported(path: &str) -> SampleError {
    SampleError::io(path, "not available on this platform")
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn ticks_per_second() -> f64 {
    DEFAULT_TICKS_PER_SECOND
}

#[cfg(not(target_os = "linux"))]
pub(crate) async fn cpu_stats() -> Result<CpuStats, SampleError> {
    Err(unsupported("/proc/stat"))
}

#[cfg(not(target_os = "linux"))]
pub(crate) async fn memory_stats() -> Result<MemoryStats, SampleError> {
    Err(unsupported("/proc/meminfo"))
}

#[cfg(not(target_os = "linux"))]
pub(crate) async fn network_stats() -> Result<NetworkStats, SampleError> {
    Err(unsupported("/proc/net/dev"))
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_second() {
        assert!(ticks_per_second() > 0.0);
    }

    #[tokio::test]
    async fn test_cpu_stats() {
        let stats = cpu_stats().await.unwrap();
        assert!(!stats.cores.is_empty());
        assert!(stats.total >= stats.cores.iter().copied().max().unwrap_or(0));
    }

    #[tokio::test]
    async fn test_memory_stats() {
        let stats = memory_stats().await.unwrap();
        assert!(stats.mem_total > 0);
        assert!(stats.mem_free <= stats.mem_total);
    }

    #[tokio::test]
    async fn test_network_stats_sorted() {
        let stats = network_stats().await.unwrap();
        let names: Vec<&str> = stats.interfaces.iter().map(|(n, _)| n.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
