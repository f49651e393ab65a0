use super::Parsed;
use crate::config::MountsConfig;
use crate::error::CommandError;
use crate::host::{CommandSpec, Host};
use regex::Regex;
use std::sync::OnceLock;

/// One device/path pair from the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub device: String,
    pub path:   String,
}

// "<device> on <path> type <fstype> (<options>)". The path is greedy so it
// runs up to the last " type ", which keeps paths with spaces intact.
fn line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+on\s+(.+)\s+type\s+(\S+)(?:\s+\(.*\))?\s*$")
            .expect("mount line pattern is valid")
    })
}

/// Run `mount` and return its raw output.
pub fn query(host: &dyn Host) -> Result<String, CommandError> {
    let out = host.run(&CommandSpec::new("mount", Vec::<String>::new()))?;
    if !out.success() {
        return Err(out.into_failure("mount"));
    }
    Ok(out.stdout)
}

/// Extract eligible mounts: block devices under `rules.device_prefix`
/// mounted below one of `rules.mount_roots`. Lines that are not mount
/// entries count as skipped; well-formed but ineligible entries are dropped
/// silently.
pub fn parse_mounts(raw: &str, rules: &MountsConfig) -> Parsed<MountPoint> {
    let mut parsed = Parsed::default();

    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() { continue; }

        let caps = match line_pattern().captures(line) {
            Some(c) => c,
            None    => {
                parsed.skipped += 1;
                continue;
            }
        };

        let device = &caps[1];
        let path   = &caps[2];
        if !device.starts_with(&rules.device_prefix) { continue; }
        if !rules.mount_roots.iter().any(|root| path.starts_with(root.as_str())) { continue; }

        parsed.records.push(MountPoint {
            device: device.to_string(),
            path:   path.to_string(),
        });
    }

    parsed
}
