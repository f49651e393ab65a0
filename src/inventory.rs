//! Time-bounded cache of the mount inventory.
//!
//! A single mutex guards the cached value and is held across the whole
//! read-or-rebuild section, external commands included. Concurrent callers
//! queue on the lock, so at most one rebuild is ever in flight and a caller
//! that waited finds the value the previous holder just built.

use crate::collectors::mount_table::{self, MountPoint};
use crate::collectors::{open_files, space};
use crate::config::{Config, MountsConfig};
use crate::error::InventoryError;
use crate::host::Host;
use crate::models::Mount;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct CacheEntry {
    mounts:       Option<Vec<Mount>>,
    last_refresh: Option<Instant>,
}

impl CacheEntry {
    fn fresh(&self, ttl: Duration) -> Option<&Vec<Mount>> {
        match (&self.mounts, self.last_refresh) {
            (Some(m), Some(at)) if at.elapsed() < ttl => Some(m),
            _ => None,
        }
    }
}

pub struct Inventory {
    host:          Arc<dyn Host>,
    rules:         MountsConfig,
    ttl:           Duration,
    space_enabled: bool,
    entry:         Mutex<CacheEntry>,
}

impl Inventory {
    pub fn new(host: Arc<dyn Host>, config: &Config) -> Self {
        Self {
            host,
            rules:         config.mounts.clone(),
            ttl:           config.general.cache_ttl(),
            space_enabled: config.general.space_enabled,
            entry:         Mutex::new(CacheEntry::default()),
        }
    }

    /// Current inventory, rebuilt when older than the TTL.
    ///
    /// If a rebuild fails and a previous inventory exists, that inventory is
    /// returned unchanged and the next call tries again.
    pub fn get_mounts(&self) -> Result<Vec<Mount>, InventoryError> {
        let mut entry = self.lock();
        if let Some(mounts) = entry.fresh(self.ttl) {
            tracing::debug!(mounts = mounts.len(), "inventory cache hit");
            return Ok(mounts.clone());
        }

        match self.rebuild(&mut entry) {
            Ok(mounts) => Ok(mounts),
            Err(e) => match &entry.mounts {
                Some(stale) => {
                    tracing::warn!(error = %e, "inventory refresh failed, serving previous inventory");
                    Ok(stale.clone())
                }
                None => Err(e),
            },
        }
    }

    /// Rebuild regardless of age. Unlike [`get_mounts`](Self::get_mounts) a
    /// failure is never masked by an older value.
    pub fn refresh_now(&self) -> Result<Vec<Mount>, InventoryError> {
        let mut entry = self.lock();
        self.rebuild(&mut entry)
    }

    /// Drop the cached inventory so the next read rebuilds it.
    pub fn invalidate(&self) {
        *self.lock() = CacheEntry::default();
        tracing::debug!("inventory invalidated");
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntry> {
        // the entry is only ever replaced whole, a panicked holder cannot leave it torn
        self.entry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rebuild(&self, entry: &mut CacheEntry) -> Result<Vec<Mount>, InventoryError> {
        let started = Instant::now();
        let mounts = self.build()?;
        tracing::info!(
            mounts  = mounts.len(),
            busy    = mounts.iter().filter(|m| m.is_busy()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inventory refreshed"
        );
        *entry = CacheEntry {
            mounts:       Some(mounts.clone()),
            last_refresh: Some(Instant::now()),
        };
        Ok(mounts)
    }

    fn build(&self) -> Result<Vec<Mount>, InventoryError> {
        let raw = mount_table::query(self.host.as_ref())?;
        let parsed = mount_table::parse_mounts(&raw, &self.rules);
        if parsed.skipped > 0 {
            tracing::debug!(skipped = parsed.skipped, "mount table lines skipped");
        }
        Ok(parsed.records.into_iter().map(|mp| self.describe(mp)).collect())
    }

    /// Attach holders and free space to one mount. Failures stay on the mount.
    fn describe(&self, mp: MountPoint) -> Mount {
        let host = self.host.as_ref();
        let mut mount = Mount::new(mp.device, mp.path);

        match open_files::usages_for(host, &mount.path) {
            Ok(usages) => mount.usages = usages,
            Err(e) => {
                tracing::warn!(path = %mount.path, error = %e, "open-file query failed");
                mount.usage_error = Some(e);
            }
        }

        if self.space_enabled {
            match space::space_info(host, &mount.path) {
                Ok(s) => {
                    mount.free_space            = Some(s.free);
                    mount.free_space_percentage = Some(s.free_percent);
                    mount.total_space           = Some(s.total);
                }
                Err(e) => tracing::warn!(path = %mount.path, error = %e, "free space unknown"),
            }
        }

        mount
    }
}
