use crate::error::StatError;
use crate::host::{FsStats, Host};
use crate::util::human::fmt_bytes;

/// Free space of one mount, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceInfo {
    pub free:         String,
    pub free_percent: u8,
    pub total:        String,
}

pub fn space_info(host: &dyn Host, path: &str) -> Result<SpaceInfo, StatError> {
    host.fs_stats(path).map(from_stats)
}

pub fn from_stats(stats: FsStats) -> SpaceInfo {
    let free_bytes  = stats.blocks_available.saturating_mul(stats.fragment_size);
    let total_bytes = stats.blocks.saturating_mul(stats.fragment_size);

    SpaceInfo {
        free:         fmt_bytes(free_bytes),
        free_percent: free_percent(free_bytes, total_bytes),
        total:        fmt_bytes(total_bytes),
    }
}

/// `free / total * 100`, truncated. An empty filesystem reports 0.
fn free_percent(free: u64, total: u64) -> u8 {
    if total == 0 { return 0; }
    let pct = free as f64 / total as f64 * 100.0;
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fixture::stats;
    use crate::host::FixtureHost;

    #[test]
    fn percentage_truncates() {
        // 2/3 free → 66.66…% → 66
        let s = from_stats(FsStats { fragment_size: 4096, blocks: 3, blocks_available: 2 });
        assert_eq!(s.free_percent, 66);
        assert_eq!(s.free, "8192 bytes");
        assert_eq!(s.total, "12288 bytes");
    }

    #[test]
    fn binary_units() {
        let s = from_stats(stats(10 << 30, 5 << 29));
        assert_eq!(s.free, "2.50 GB");
        assert_eq!(s.total, "10.00 GB");
        assert_eq!(s.free_percent, 25);
    }

    #[test]
    fn zero_sized_filesystem() {
        let s = from_stats(FsStats { fragment_size: 0, blocks: 0, blocks_available: 0 });
        assert_eq!(s.free_percent, 0);
    }

    #[test]
    fn stat_failure_propagates() {
        let err = space_info(&FixtureHost::new(), "/mnt/gone").unwrap_err();
        assert_eq!(err.path, "/mnt/gone");
    }
}
