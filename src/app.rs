use crate::input::{handle_key, Action};
use crate::ui::theme::{Theme, ThemeVariant};
use crate::ui::{dashboard, help, popup};
use anyhow::Result;
use crossterm::event::{self, Event, MouseEventKind};
use ratatui::widgets::TableState;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use unmounter::models::{Mount, SystemSnapshot, Usage};
use unmounter::Engine;

const POLL_TIMEOUT: Duration = Duration::from_millis(150);
const FLASH_FOR:    Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Mounts,
    Holders,
}

/// A mutation waiting for the operator to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    Unmount { path: String, busy: bool },
    Kill { pid: u32, command: String, path: String },
    RestartAutomount { unit: String },
}

impl Pending {
    pub fn describe(&self) -> String {
        match self {
            Pending::Unmount { path, .. }          => format!("Unmount {}?", path),
            Pending::Kill { pid, command, path }   => format!("Kill {} (pid {}) holding {}?", command, pid, path),
            Pending::RestartAutomount { unit }     => format!("Restart {}?", unit),
        }
    }
}

/// Message shown in the header after a mutation finished.
#[derive(Debug, Clone)]
pub struct Flash {
    pub ok:       bool,
    pub text:     String,
    pub guidance: Option<&'static str>,
    pub at:       Instant,
}

// ── Background jobs ───────────────────────────────────────────────────

enum JobResult {
    Snapshot(Box<SystemSnapshot>),
    Mutation(Flash),
}

pub struct App {
    engine: Arc<Engine>,

    // Theme
    pub theme:         Theme,
    pub theme_variant: ThemeVariant,

    pub focus:        Focus,
    pub mount_state:  TableState,
    pub holder_state: TableState,
    pub show_help:    bool,
    pub pending:      Option<Pending>,
    pub flash:        Option<Flash>,
    /// Label of the mutation currently running, if any
    pub working:      Option<String>,

    pub snapshot:        Option<SystemSnapshot>,
    snapshot_in_flight:  bool,
    /// Another snapshot was requested while one was running; `true` if it
    /// must bypass the cache.
    rerun_snapshot:      Option<bool>,
    last_refresh:        Instant,
    refresh_every:       Duration,

    job_tx: mpsc::Sender<JobResult>,
    job_rx: mpsc::Receiver<JobResult>,

    pub should_quit: bool,
}

impl App {
    pub fn new(engine: Arc<Engine>, initial_theme: ThemeVariant, interval_ms: u64) -> Self {
        let (job_tx, job_rx) = mpsc::channel();
        let refresh_every = Duration::from_millis(interval_ms.max(500));
        Self {
            engine,
            theme:         Theme::for_variant(initial_theme),
            theme_variant: initial_theme,
            focus:         Focus::Mounts,
            mount_state:   TableState::default(),
            holder_state:  TableState::default(),
            show_help:     false,
            pending:       None,
            flash:         None,
            working:       None,
            snapshot:           None,
            snapshot_in_flight: false,
            rerun_snapshot:     None,
            last_refresh:       Instant::now() - refresh_every,
            refresh_every,
            job_tx,
            job_rx,
            should_quit: false,
        }
    }

    // ── Main event loop ───────────────────────────────────────────────

    pub fn run<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) -> Result<()> {
        loop {
            self.consume_jobs();

            if self.last_refresh.elapsed() >= self.refresh_every {
                self.schedule_snapshot(false);
            }

            terminal.draw(|f| {
                dashboard::render(f, self);
                if let Some(p) = &self.pending {
                    popup::render_confirm(f, p, &self.theme);
                } else if let Some(label) = &self.working {
                    popup::render_working(f, label, &self.theme);
                }
                if self.show_help {
                    help::render(f, &self.theme);
                }
            })?;

            if event::poll(POLL_TIMEOUT)? {
                match event::read()? {
                    Event::Key(key) => self.handle_action(handle_key(key)),
                    Event::Mouse(me) => match me.kind {
                        MouseEventKind::ScrollDown => self.handle_action(Action::SelectDown),
                        MouseEventKind::ScrollUp   => self.handle_action(Action::SelectUp),
                        _ => {}
                    },
                    _ => {}
                }
            }

            if self.should_quit { break; }
        }
        Ok(())
    }

    // ── Input dispatch ────────────────────────────────────────────────

    pub fn handle_action(&mut self, action: Action) {
        if self.show_help {
            match action {
                Action::Quit => self.should_quit = true,
                Action::ShowHelp | Action::Back => self.show_help = false,
                _ => {}
            }
            return;
        }

        if self.pending.is_some() {
            match action {
                Action::Yes | Action::Confirm => {
                    if let Some(p) = self.pending.take() { self.start_mutation(p); }
                }
                Action::No | Action::Back => self.pending = None,
                Action::Quit => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match action {
            Action::Quit     => self.should_quit = true,
            Action::ShowHelp => self.show_help = true,

            Action::CycleTheme => {
                self.theme_variant = self.theme_variant.next();
                self.theme = Theme::for_variant(self.theme_variant);
            }

            Action::FocusNext | Action::FocusPrev => self.toggle_focus(),
            Action::Confirm => {
                if self.focus == Focus::Mounts && self.selected_mount().is_some_and(|m| m.is_busy()) {
                    self.focus = Focus::Holders;
                    self.holder_state.select(Some(0));
                }
            }
            Action::Back => {
                if self.focus == Focus::Holders {
                    self.focus = Focus::Mounts;
                } else {
                    self.flash = None;
                }
            }

            Action::SelectUp   => self.select_delta(-1),
            Action::SelectDown => self.select_delta(1),
            Action::JumpTop    => self.select_edge(false),
            Action::JumpBottom => self.select_edge(true),

            Action::Unmount => {
                if let Some(m) = self.selected_mount() {
                    self.pending = Some(Pending::Unmount { path: m.path.clone(), busy: m.is_busy() });
                }
            }
            Action::Kill => {
                if let (Some(m), Some(u)) = (self.selected_mount(), self.selected_holder()) {
                    self.pending = Some(Pending::Kill { pid: u.pid, command: u.command.clone(), path: m.path.clone() });
                }
            }
            Action::RestartAutomount => {
                let unit = self.engine.config().services.automount_unit.clone();
                self.pending = Some(Pending::RestartAutomount { unit });
            }
            Action::Refresh => self.schedule_snapshot(true),

            Action::Yes | Action::No | Action::None => {}
        }
    }

    // ── Selection ─────────────────────────────────────────────────────

    pub fn mounts(&self) -> &[Mount] {
        self.snapshot.as_ref().map(|s| s.mounts.as_slice()).unwrap_or(&[])
    }

    pub fn selected_mount(&self) -> Option<&Mount> {
        self.mount_state.selected().and_then(|i| self.mounts().get(i))
    }

    pub fn selected_holder(&self) -> Option<&Usage> {
        if self.focus != Focus::Holders { return None; }
        let m = self.selected_mount()?;
        self.holder_state.selected().and_then(|i| m.usages.get(i))
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Mounts  => Focus::Holders,
            Focus::Holders => Focus::Mounts,
        };
        if self.focus == Focus::Holders && self.holder_state.selected().is_none() {
            self.holder_state.select(Some(0));
        }
    }

    fn list_len(&self) -> usize {
        match self.focus {
            Focus::Mounts  => self.mounts().len(),
            Focus::Holders => self.selected_mount().map_or(0, |m| m.usages.len()),
        }
    }

    fn state_mut(&mut self) -> &mut TableState {
        match self.focus {
            Focus::Mounts  => &mut self.mount_state,
            Focus::Holders => &mut self.holder_state,
        }
    }

    fn select_delta(&mut self, delta: i32) {
        let len = self.list_len();
        if len == 0 { return; }
        let state = self.state_mut();
        let cur = state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        state.select(Some(next));
        if self.focus == Focus::Mounts {
            self.holder_state.select(Some(0));
        }
    }

    fn select_edge(&mut self, bottom: bool) {
        let len = self.list_len();
        if len == 0 { return; }
        let idx = if bottom { len - 1 } else { 0 };
        self.state_mut().select(Some(idx));
    }

    /// Keep selections in range after the mount list changed, and follow the
    /// previously selected path if it is still there.
    fn apply_snapshot(&mut self, snap: SystemSnapshot) {
        let prev_path = self.selected_mount().map(|m| m.path.clone());
        self.snapshot = Some(snap);

        let mounts = self.mounts();
        let idx = prev_path
            .and_then(|p| mounts.iter().position(|m| m.path == p))
            .or(if mounts.is_empty() { None } else { Some(0) });
        let idx = idx.map(|i| i.min(mounts.len().saturating_sub(1)));
        let holders = idx.and_then(|i| mounts.get(i)).map_or(0, |m| m.usages.len());

        self.mount_state.select(idx);
        match self.holder_state.selected() {
            _ if holders == 0 => {
                self.holder_state.select(None);
                self.focus = Focus::Mounts;
            }
            Some(h) if h >= holders => self.holder_state.select(Some(holders - 1)),
            None => self.holder_state.select(Some(0)),
            _ => {}
        }
    }

    // ── Workers ───────────────────────────────────────────────────────

    /// Collect a snapshot off the UI thread. `force` drops the cached
    /// inventory first; that takes the cache lock, so it happens in the worker.
    fn schedule_snapshot(&mut self, force: bool) {
        self.last_refresh = Instant::now();
        if self.snapshot_in_flight {
            self.rerun_snapshot = Some(force || self.rerun_snapshot.unwrap_or(false));
            return;
        }
        self.snapshot_in_flight = true;

        let engine = self.engine.clone();
        let tx     = self.job_tx.clone();
        thread::spawn(move || {
            if force {
                engine.inventory().invalidate();
            }
            let snap = engine.snapshot();
            let _ = tx.send(JobResult::Snapshot(Box::new(snap)));
        });
    }

    fn start_mutation(&mut self, pending: Pending) {
        if self.working.is_some() { return; }
        self.working = Some(pending.describe().trim_end_matches('?').to_string());

        let engine = self.engine.clone();
        let tx     = self.job_tx.clone();
        thread::spawn(move || {
            let mc = engine.mutations();
            let (result, done) = match &pending {
                Pending::Unmount { path, .. } => (mc.unmount(path), format!("Unmounted {}", path)),
                Pending::Kill { pid, command, .. } => (mc.kill_process(*pid), format!("Killed {} ({})", command, pid)),
                Pending::RestartAutomount { unit } => (mc.restart_automount(), format!("Restarted {}", unit)),
            };
            let flash = match result {
                Ok(()) => Flash { ok: true, text: done, guidance: None, at: Instant::now() },
                Err(e) => Flash { ok: false, text: e.to_string(), guidance: Some(e.guidance()), at: Instant::now() },
            };
            let _ = tx.send(JobResult::Mutation(flash));
        });
    }

    fn consume_jobs(&mut self) {
        while let Ok(job) = self.job_rx.try_recv() {
            match job {
                JobResult::Snapshot(snap) => {
                    self.snapshot_in_flight = false;
                    self.apply_snapshot(*snap);
                    // the finished snapshot may predate the last request
                    if let Some(force) = self.rerun_snapshot.take() {
                        self.schedule_snapshot(force);
                    }
                }
                JobResult::Mutation(flash) => {
                    self.working = None;
                    self.flash = Some(flash);
                    // the mutation invalidated the cache, show the result right away
                    self.schedule_snapshot(false);
                }
            }
        }
    }

    pub fn active_flash(&self) -> Option<&Flash> {
        self.flash.as_ref().filter(|f| f.at.elapsed() < FLASH_FOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unmounter::config::Config;
    use unmounter::host::FixtureHost;
    use unmounter::util::action_log::ActionLog;

    fn app() -> App {
        let engine = Engine::new(Config::default(), Arc::new(FixtureHost::demo()), ActionLog::disabled());
        let mut app = App::new(Arc::new(engine), ThemeVariant::Default, 2000);
        let snap = app.engine.snapshot();
        app.apply_snapshot(snap);
        app
    }

    #[test]
    fn first_snapshot_selects_first_mount() {
        let app = app();
        assert_eq!(app.selected_mount().map(|m| m.path.as_str()), Some("/mnt/external"));
        assert_eq!(app.focus, Focus::Mounts);
    }

    #[test]
    fn unmount_needs_confirmation() {
        let mut app = app();
        app.handle_action(Action::Unmount);
        assert_eq!(app.pending, Some(Pending::Unmount { path: "/mnt/external".into(), busy: true }));

        app.handle_action(Action::No);
        assert!(app.pending.is_none());
        assert!(app.working.is_none());
    }

    #[test]
    fn kill_targets_selected_holder() {
        let mut app = app();
        app.handle_action(Action::SelectDown);
        app.handle_action(Action::Confirm);
        assert_eq!(app.focus, Focus::Holders);
        app.handle_action(Action::SelectDown);
        app.handle_action(Action::Kill);
        match &app.pending {
            Some(Pending::Kill { pid, path, .. }) => {
                assert_eq!(*pid, 5678);
                assert_eq!(path, "/media/usb0");
            }
            other => panic!("unexpected pending: {other:?}"),
        }
    }

    #[test]
    fn kill_without_holder_focus_does_nothing() {
        let mut app = app();
        app.handle_action(Action::Kill);
        assert!(app.pending.is_none());
    }

    #[test]
    fn selection_follows_path_across_refresh() {
        let mut app = app();
        app.handle_action(Action::SelectDown);
        let mut snap = app.snapshot.clone().unwrap();
        snap.mounts.remove(0);
        app.apply_snapshot(snap);
        assert_eq!(app.selected_mount().map(|m| m.path.as_str()), Some("/media/usb0"));
    }

    #[test]
    fn refresh_does_not_wait_for_a_running_rebuild() {
        let host = Arc::new(FixtureHost::demo().with_delay(Duration::from_millis(200)));
        let engine = Arc::new(Engine::new(Config::default(), host, ActionLog::disabled()));
        let mut app = App::new(engine.clone(), ThemeVariant::Default, 2000);

        let busy = {
            let engine = engine.clone();
            thread::spawn(move || engine.inventory().get_mounts())
        };
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        app.handle_action(Action::Refresh);
        assert!(started.elapsed() < Duration::from_millis(100), "refresh blocked for {:?}", started.elapsed());
        assert!(app.snapshot_in_flight);

        busy.join().unwrap().unwrap();
    }

    #[test]
    fn request_during_snapshot_reruns_after_it() {
        let mut app = app();
        app.snapshot_in_flight = true;

        app.schedule_snapshot(false);
        app.schedule_snapshot(true);
        app.schedule_snapshot(false);
        assert_eq!(app.rerun_snapshot, Some(true));

        let stale = app.snapshot.clone().unwrap();
        app.job_tx.send(JobResult::Snapshot(Box::new(stale))).unwrap();
        app.consume_jobs();

        assert!(app.rerun_snapshot.is_none());
        assert!(app.snapshot_in_flight);
    }
}
