use super::Parsed;
use crate::host::{CommandSpec, Host};
use crate::models::Usage;
use regex::Regex;
use std::sync::OnceLock;

// COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME. NAME is the rest of
// the line and may contain spaces.
fn row_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\d+)\s+(\S+)\s+\S+\s+\S+\s+\S+\s+\S+\s+\S+\s+(.*)$")
            .expect("lsof row pattern is valid")
    })
}

/// Parse `lsof` output. The first line is the header; rows that do not fit
/// the column layout or carry an unusable PID are skipped.
pub fn parse_usages(raw: &str) -> Parsed<Usage> {
    let mut parsed = Parsed::default();

    for line in raw.lines().skip(1) {
        if line.trim().is_empty() { continue; }

        let caps = match row_pattern().captures(line) {
            Some(c) => c,
            None    => {
                parsed.skipped += 1;
                continue;
            }
        };

        // PID 0 would make `kill -9 0` signal our own process group
        let pid = match caps[2].parse::<u32>() {
            Ok(p) if p > 0 => p,
            _ => {
                parsed.skipped += 1;
                continue;
            }
        };

        parsed.records.push(Usage {
            command:    caps[1].to_string(),
            pid,
            user:       caps[3].to_string(),
            name:       caps[4].to_string(),
            also_open:  0,
        });
    }

    parsed
}

/// One entry per process: lsof lists every open file, we keep the first row
/// of each PID and count the rest.
pub fn collapse_by_pid(rows: Vec<Usage>) -> Vec<Usage> {
    let mut out: Vec<Usage> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.iter_mut().find(|u| u.pid == row.pid) {
            Some(existing) => existing.also_open += 1,
            None           => out.push(row),
        }
    }
    out
}

/// Processes holding files open under `path`.
///
/// `lsof` exits non-zero both when nothing is open (no output) and on real
/// failures (with output); only the latter is an error. The error is a
/// message rather than a type because it is stored on the mount as-is.
pub fn usages_for(host: &dyn Host, path: &str) -> Result<Vec<Usage>, String> {
    let out = host
        .run(&CommandSpec::privileged("lsof", ["--", path]))
        .map_err(|e| format!("error executing lsof on {}: {}", path, e))?;

    if !out.success() {
        if out.is_silent() {
            return Ok(Vec::new());
        }
        let e = out.into_failure("lsof");
        return Err(format!("error executing lsof on {}: {}", path, e));
    }

    let parsed = parse_usages(&out.stdout);
    if parsed.skipped > 0 {
        tracing::debug!(path, skipped = parsed.skipped, "lsof rows skipped");
    }
    Ok(collapse_by_pid(parsed.records))
}
