const GB: u64 = 1 << 30;
const MB: u64 = 1 << 20;

/// Format a byte count the way the dashboard shows free space:
/// "12.50 GB", "512.00 MB", "4096 bytes".
pub fn fmt_bytes(bytes: u64) -> String {
    if bytes >= GB      { format!("{:.2} GB", bytes as f64 / GB as f64) }
    else if bytes >= MB { format!("{:.2} MB", bytes as f64 / MB as f64) }
    else                { format!("{} bytes", bytes) }
}

/// Shorten a path to `max` chars, keeping the tail: "…/audio/track.flac".
pub fn truncate_left(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max || max == 0 { return s.to_string(); }
    let tail: String = s.chars().skip(n - max + 1).collect();
    format!("…{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_boundaries() {
        assert_eq!(fmt_bytes(0), "0 bytes");
        assert_eq!(fmt_bytes(MB - 1), "1048575 bytes");
        assert_eq!(fmt_bytes(MB), "1.00 MB");
        assert_eq!(fmt_bytes(500 * MB), "500.00 MB");
        assert_eq!(fmt_bytes(GB), "1.00 GB");
        assert_eq!(fmt_bytes(5 * GB / 2), "2.50 GB");
    }

    #[test]
    fn truncation_keeps_tail() {
        assert_eq!(truncate_left("/mnt/a", 10), "/mnt/a");
        assert_eq!(truncate_left("/mnt/external/audio", 8), "…l/audio");
        assert_eq!(truncate_left("/mnt/external/audio", 8).chars().count(), 8);
    }
}
