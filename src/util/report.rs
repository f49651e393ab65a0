use crate::models::{ServiceStatus, SystemSnapshot};

/// Generate a human-readable mount report to a String.
pub fn generate(snap: &SystemSnapshot) -> String {
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  Unmounter Report  {}\n", snap.taken_at));
    out.push_str("═══════════════════════════════════════════════\n\n");

    // ── Services ───────────────────────────────────────────────────────
    out.push_str("── Services ───────────────────────────────────\n");
    push_service(&mut out, &snap.autofs, snap.autofs_error.as_deref());
    push_service(&mut out, &snap.samba, snap.samba_error.as_deref());
    out.push('\n');

    // ── Mounts ─────────────────────────────────────────────────────────
    if let Some(err) = &snap.error {
        out.push_str("── Mounts ─────────────────────────────────────\n");
        out.push_str(&format!("  ✖ inventory unavailable: {}\n\n", err));
    } else {
        out.push_str(&format!(
            "── Mounts ({}, {} busy) ───────────────────────\n",
            snap.mounts.len(), snap.busy_count()
        ));
        if snap.mounts.is_empty() {
            out.push_str("  ● No removable mounts\n");
        }
        for m in &snap.mounts {
            let free = match (&m.free_space, m.free_space_percentage, &m.total_space) {
                (Some(f), Some(p), Some(t)) => format!("{} free of {} ({}%)", f, t, p),
                _                           => "space unknown".to_string(),
            };
            out.push_str(&format!("  {:<10} {:<28} {}\n", m.short_device(), m.path, free));

            if let Some(err) = &m.usage_error {
                out.push_str(&format!("      ✖ {}\n", err));
            } else if m.usages.is_empty() {
                out.push_str("      not in use\n");
            } else {
                for u in &m.usages {
                    let extra = if u.also_open > 0 { format!(" (+{} more)", u.also_open) } else { String::new() };
                    out.push_str(&format!(
                        "      {:<8} {:>7}  {:<12} {}{}\n",
                        u.command, u.pid, u.user, u.name, extra
                    ));
                }
            }
        }
        out.push('\n');
    }

    out.push_str("═══════════════════════════════════════════════\n");
    out
}

fn push_service(out: &mut String, svc: &ServiceStatus, err: Option<&str>) {
    match err {
        Some(e) => out.push_str(&format!("  {:<8} ✖ check failed: {}\n", svc.name, e)),
        None    => {
            let dot = if svc.active { "●" } else { "○" };
            out.push_str(&format!("  {:<8} {} {}\n", svc.name, dot, svc.label()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mount, Usage};

    fn snapshot() -> SystemSnapshot {
        let mut busy = Mount::new("/dev/sda1", "/mnt/external");
        busy.usages.push(Usage {
            command: "smbd".into(), pid: 258080, user: "sambauser".into(),
            name: "/mnt/external".into(), also_open: 1,
        });
        busy.free_space = Some("2.50 GB".into());
        busy.free_space_percentage = Some(25);
        busy.total_space = Some("10.00 GB".into());

        let mut broken = Mount::new("/dev/sdb2", "/media/usb0");
        broken.usage_error = Some("error executing lsof on /media/usb0: timed out".into());

        SystemSnapshot {
            mounts:       vec![busy, broken],
            autofs:       ServiceStatus { name: "Autofs".into(), active: true, detail: String::new() },
            samba:        ServiceStatus::unavailable("Samba"),
            error:        None,
            autofs_error: None,
            samba_error:  Some("smbstatus timed out after 10s".into()),
            taken_at:     "2025-02-04 17:33:57".into(),
        }
    }

    #[test]
    fn report_lists_mounts_holders_and_failures() {
        let r = generate(&snapshot());
        assert!(r.contains("Mounts (2, 1 busy)"));
        assert!(r.contains("2.50 GB free of 10.00 GB (25%)"));
        assert!(r.contains("258080"));
        assert!(r.contains("(+1 more)"));
        assert!(r.contains("space unknown"));
        assert!(r.contains("✖ error executing lsof on /media/usb0"));
        assert!(r.contains("● active"));
        assert!(r.contains("check failed: smbstatus timed out"));
    }

    #[test]
    fn inventory_failure_replaces_mount_section() {
        let mut s = snapshot();
        s.mounts.clear();
        s.error = Some("mount exited with status 1".into());
        let r = generate(&s);
        assert!(r.contains("inventory unavailable: mount exited with status 1"));
        assert!(!r.contains("busy)"));
    }
}
