//! Cached OS snapshots.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bstatus_framework::{SampleError, SnapshotCache};

use crate::cpu::CpuStats;
use crate::disk::DiskStats;
use crate::memory::MemoryStats;
use crate::network::NetworkStats;

/// Cache key: which OS query a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Cpu,
    Memory,
    Network,
    Disk,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Cpu => "cpu",
            SourceKind::Memory => "memory",
            SourceKind::Network => "network",
            SourceKind::Disk => "disk",
        };
        f.write_str(name)
    }
}

/// One parsed OS snapshot.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Cpu(Arc<CpuStats>),
    Memory(Arc<MemoryStats>),
    Network(Arc<NetworkStats>),
    Disk(Arc<DiskStats>),
}

impl Snapshot {
    pub fn kind(&self) -> SourceKind {
        match self {
            Snapshot::Cpu(_) => SourceKind::Cpu,
            Snapshot::Memory(_) => SourceKind::Memory,
            Snapshot::Network(_) => SourceKind::Network,
            Snapshot::Disk(_) => SourceKind::Disk,
        }
    }

    pub(crate) fn mismatch(&self, expected: SourceKind) -> SampleError {
        SampleError::Internal(format!(
            "expected {} snapshot, cache returned {}",
            expected,
            self.kind()
        ))
    }
}

/// Snapshot cache shared by every sampler. Failed samples are cached too,
/// so a failing query is not retried within the TTL.
pub type SharedCache = Arc<SnapshotCache<SourceKind, Result<Snapshot, SampleError>>>;

/// Create a [`SharedCache`] with the given TTL.
pub fn shared_cache(ttl: Duration) -> SharedCache {
    Arc::new(SnapshotCache::with_ttl(ttl))
}
