use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub mounts: MountsConfig,

    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Maximum age of the cached mount inventory, in seconds
    pub cache_ttl_secs: u64,
    /// Upper bound on any single external command, in seconds
    pub command_timeout_secs: u64,
    /// TUI refresh interval in milliseconds
    pub refresh_interval_ms: u64,
    /// Query free space for every mount while building the inventory
    pub space_enabled: bool,
    /// Prefix privileged commands (lsof, umount, kill, smbstatus, restart) with sudo
    pub use_sudo: bool,
    /// Wait after restarting the automount daemon before re-reading mounts
    pub restart_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountsConfig {
    /// Only devices whose path starts with this prefix are listed
    pub device_prefix: String,
    /// Mount roots that are eligible for listing and unmounting
    pub mount_roots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// systemd unit of the automount daemon
    pub automount_unit: String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs:       5,
            command_timeout_secs: 10,
            refresh_interval_ms:  2000,
            space_enabled:        true,
            use_sudo:             true,
            restart_settle_ms:    2000,
        }
    }
}

impl Default for MountsConfig {
    fn default() -> Self {
        Self {
            device_prefix: "/dev/sd".into(),
            mount_roots:   vec!["/mnt/".into(), "/media/".into()],
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self { automount_unit: "autofs".into() }
    }
}

impl GeneralConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        let path = match Config::config_path() {
            Some(p) => p,
            None    => return Config::default(),
        };
        match Config::load_from(&path) {
            Ok(c)  => c,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                } else {
                    // Write defaults on first run (best-effort)
                    let _ = write_defaults(&path);
                }
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&text)?;
        Ok(cfg)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("unmounter").join("unmounter.toml"))
    }
}

pub fn write_defaults(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# unmounter configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unmounter.toml");
        fs::write(&path, "[general]\ncache_ttl_secs = 30\n\n[mounts]\nmount_roots = [\"/srv/usb/\"]\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.general.cache_ttl_secs, 30);
        assert_eq!(cfg.general.command_timeout_secs, 10);
        assert!(cfg.general.use_sudo);
        assert_eq!(cfg.mounts.mount_roots, vec!["/srv/usb/".to_string()]);
        assert_eq!(cfg.mounts.device_prefix, "/dev/sd");
        assert_eq!(cfg.services.automount_unit, "autofs");
    }

    #[test]
    fn written_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("unmounter.toml");
        write_defaults(&path).unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.general.cache_ttl(), Duration::from_secs(5));
        assert_eq!(cfg.mounts.mount_roots, vec!["/mnt/".to_string(), "/media/".to_string()]);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let g = GeneralConfig { command_timeout_secs: 0, ..GeneralConfig::default() };
        assert_eq!(g.command_timeout(), Duration::from_secs(1));
    }
}
