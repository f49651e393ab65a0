mod app;
mod input;
mod ui;

use anyhow::Result;
use app::App;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use unmounter::config::Config;
use unmounter::util::action_log::ActionLog;
use unmounter::util::report;
use unmounter::{Engine, MutationError};

#[derive(Parser, Debug)]
#[command(name = "unmounter", about = "Inspect removable mounts, find what holds them, and unmount them", version)]
struct Cli {
    /// Refresh interval in milliseconds (defaults to the configured value)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Color theme: default, dracula, gruvbox, nord
    #[arg(short = 't', long, default_value = "default")]
    theme: String,

    /// Print a one-shot JSON snapshot and exit
    #[arg(long)]
    json: bool,

    /// Print a human-readable report and exit
    #[arg(long)]
    report: bool,

    /// Unmount PATH and exit (0 on success, 1 on failure)
    #[arg(long, value_name = "PATH")]
    unmount: Option<String>,

    /// Kill the process PID holding a mount open and exit
    #[arg(long, value_name = "PID")]
    kill: Option<u32>,

    /// Restart the automount daemon and exit
    #[arg(long)]
    restart_automount: bool,

    /// Print recent action log entries and exit
    #[arg(long)]
    history: bool,

    /// Number of action log entries to show (used with --history)
    #[arg(long, default_value_t = 50)]
    last: usize,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Use built-in demo data instead of the real system
    #[arg(long)]
    fixture: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "unmounter", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }
    if cli.history {
        return run_history(cli.last);
    }
    if cli.config {
        return run_print_config();
    }

    let interactive = !(cli.json || cli.report || cli.unmount.is_some() || cli.kill.is_some() || cli.restart_automount);
    let _guard = init_tracing(cli.verbose, interactive);

    let cfg = Config::load();
    let interval = cli.interval.unwrap_or(cfg.general.refresh_interval_ms);
    let engine = Arc::new(Engine::from_config(cfg, cli.fixture));

    if cli.json {
        let snap = engine.snapshot();
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(ExitCode::SUCCESS);
    }
    if cli.report {
        print!("{}", report::generate(&engine.snapshot()));
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(path) = &cli.unmount {
        return Ok(outcome(engine.mutations().unmount(path), &format!("Unmounted {}", path)));
    }
    if let Some(pid) = cli.kill {
        return Ok(outcome(engine.mutations().kill_process(pid), &format!("Killed process {}", pid)));
    }
    if cli.restart_automount {
        let unit = engine.config().services.automount_unit.clone();
        return Ok(outcome(engine.mutations().restart_automount(), &format!("Restarted {}", unit)));
    }

    let initial_theme = ui::theme::ThemeVariant::from_name(&cli.theme);

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    let result = run(engine, initial_theme, interval);
    restore_terminal()?;
    result.map(|_| ExitCode::SUCCESS)
}

/// One-shot modes log to stderr. The TUI owns the terminal, so it logs to
/// `<data_local_dir>/unmounter/unmounter.log` instead.
fn init_tracing(verbose: bool, to_file: bool) -> Option<WorkerGuard> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if to_file {
        let dir = dirs::data_local_dir()?.join("unmounter");
        std::fs::create_dir_all(&dir).ok()?;
        let appender = tracing_appender::rolling::never(dir, "unmounter.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
        None
    }
}

fn outcome(result: Result<(), MutationError>, done: &str) -> ExitCode {
    match result {
        Ok(()) => {
            println!("✔ {}", done);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✖ {}", e);
            println!("  {}", e.guidance());
            ExitCode::FAILURE
        }
    }
}

fn run_history(n: usize) -> Result<ExitCode> {
    let log = ActionLog::default_location();
    let entries = log.load_recent(n);
    if entries.is_empty() {
        println!("No actions in log.");
        return Ok(ExitCode::SUCCESS);
    }
    for line in &entries {
        println!("{}", line);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_print_config() -> Result<ExitCode> {
    let cfg = Config::load();
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    let g = &cfg.general;
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  cache_ttl_secs       = {}", g.cache_ttl_secs);
    println!("  command_timeout_secs = {}", g.command_timeout_secs);
    println!("  refresh_interval_ms  = {}", g.refresh_interval_ms);
    println!("  space_enabled        = {}", g.space_enabled);
    println!("  use_sudo             = {}", g.use_sudo);
    println!("  restart_settle_ms    = {}", g.restart_settle_ms);
    println!();
    println!("[mounts]");
    println!("  device_prefix = {:?}", cfg.mounts.device_prefix);
    println!("  mount_roots   = {:?}", cfg.mounts.mount_roots);
    println!();
    println!("[services]");
    println!("  automount_unit = {:?}", cfg.services.automount_unit);
    println!();
    let log = ActionLog::default_location();
    match log.path() {
        Some(p) => println!("Action log: {}", p.display()),
        None    => println!("Action log: (disabled, no data directory)"),
    }
    Ok(ExitCode::SUCCESS)
}

fn run(engine: Arc<Engine>, initial_theme: ui::theme::ThemeVariant, interval_ms: u64) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut term = Terminal::new(backend)?;

    let mut app = App::new(engine, initial_theme, interval_ms);
    app.run(&mut term)?;

    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}
