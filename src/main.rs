mod app;
mod cli;
mod config;
mod context;
mod dispatch;
mod docker;
mod forms;
mod input;
mod item;
mod model;
mod notifications;
mod overlay;
mod resource_view;
mod resources;
mod selection;
mod split_view;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand, LoopEvent};
use clap::Parser;
use cli::CliArgs;
use config::AppConfig;
use context::AppContext;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use docker::DockerGateway;
use dispatch::OperationOutcome;
use futures::StreamExt;
use model::ResourceTab;
use notifications::Notification;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::HashSet;
use std::io::{self, Stdout};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command as TokioCommand;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const REFRESH_TIMEOUT: Duration = Duration::from_secs(5);
const SPINNER_TICK: Duration = Duration::from_millis(120);
const DEBUG_LOG_FILE: &str = "debug.log";

struct Tasks {
    tx: UnboundedSender<LoopEvent>,
    refreshing: HashSet<ResourceTab>,
    logs: Option<(String, JoinHandle<()>)>,
}

impl Tasks {
    fn stop_logs(&mut self) {
        if let Some((container_id, handle)) = self.logs.take() {
            debug!(%container_id, "stopping log stream");
            handle.abort();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let _log_guard = init_tracing(&args.log_filter)?;

    let config = AppConfig::load(&args)?;
    if let Some(source) = &config.source {
        debug!("loaded config from {}", source.display());
    }

    let gateway = DockerGateway::connect().await?;
    let mut context = AppContext::new(config, gateway);
    let mut app = App::new(&context.config);

    run(&mut app, &mut context).await
}

fn init_tracing(level_filter: &str) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    if std::env::var_os("DEBUG").is_some() {
        let appender = tracing_appender::rolling::never(".", DEBUG_LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = builder.with_ansi(false).with_writer(writer).try_init();
        return Ok(Some(guard));
    }

    let _ = builder.with_writer(std::io::sink).try_init();
    Ok(None)
}

async fn run(app: &mut App, context: &mut AppContext) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, context).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

fn apply_window_size(app: &mut App, context: &mut AppContext, width: u16, height: u16) {
    if context.set_window(width, height) {
        let (body_width, body_height) = context.window().body();
        app.resize(body_width, body_height);
    }
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, context: &mut AppContext) -> Result<()> {
    let size = terminal.size().context("failed to read terminal size")?;
    apply_window_size(app, context, size.width, size.height);

    let (tx, mut rx) = mpsc::unbounded_channel::<LoopEvent>();
    let mut tasks = Tasks {
        tx,
        refreshing: HashSet::new(),
        logs: None,
    };
    execute_app_command(terminal, app, context, &mut tasks, AppCommand::RefreshAll).await;

    let mut reader = EventStream::new();
    let mut spinner = interval(SPINNER_TICK);
    spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticker = interval(Duration::from_millis(context.config.refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        terminal
            .draw(|frame| ui::render(frame, app, &context.config.theme))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(terminal, app, context, &mut tasks, command).await;
                        }
                    }
                    Some(Ok(Event::Resize(width, height))) => {
                        apply_window_size(app, context, width, height);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!("terminal event error: {error}");
                        app.notify(Notification::error(format!("terminal event error: {error}")));
                    }
                    None => {
                        warn!("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = spinner.tick() => {
                app.tick(Instant::now());
            }
            _ = ticker.tick() => {
                let active = app.active_tab();
                execute_app_command(terminal, app, context, &mut tasks, AppCommand::Refresh(active)).await;
            }
            maybe_event = rx.recv() => {
                if let Some(event) = maybe_event {
                    if let LoopEvent::Refreshed { tab, .. } = &event {
                        tasks.refreshing.remove(tab);
                    }
                    if let LoopEvent::LogsEnded { container_id, .. } = &event
                        && tasks.logs.as_ref().is_some_and(|(id, _)| id == container_id)
                    {
                        tasks.logs = None;
                    }
                    let command = app.handle_loop_event(event);
                    execute_app_command(terminal, app, context, &mut tasks, command).await;
                }
            }
        }
    }

    tasks.stop_logs();
    Ok(())
}

async fn execute_app_command(
    terminal: &mut TuiTerminal,
    app: &mut App,
    context: &AppContext,
    tasks: &mut Tasks,
    command: AppCommand,
) {
    match command {
        AppCommand::None => {}
        AppCommand::Refresh(tab) => spawn_refresh(context, tasks, tab),
        AppCommand::RefreshAll => {
            for tab in app.tabs() {
                spawn_refresh(context, tasks, *tab);
            }
        }
        AppCommand::RunOperation(operation) => {
            debug!(
                id = operation.id,
                tab = %operation.tab,
                verb = %operation.verb,
                targets = operation.targets.len(),
                "dispatching operation"
            );
            let gateway = context.gateway.clone();
            let tx = tasks.tx.clone();
            tokio::spawn(async move {
                let result = gateway.run_operation(&operation).await;
                let _ = tx.send(LoopEvent::Operation(OperationOutcome { operation, result }));
            });
        }
        AppCommand::PullImage { reference } => {
            app.notify(Notification::info(format!("Pulling {reference}…")));
            let gateway = context.gateway.clone();
            let tx = tasks.tx.clone();
            tokio::spawn(async move {
                let result = gateway
                    .pull_image(&reference)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(LoopEvent::Pulled { reference, result });
            });
        }
        AppCommand::CreateContainer(spec) => {
            let gateway = context.gateway.clone();
            let tx = tasks.tx.clone();
            tokio::spawn(async move {
                let result = gateway
                    .create_container(&spec)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(LoopEvent::Created {
                    image: spec.image,
                    result,
                });
            });
        }
        AppCommand::StreamLogs { container_id, name } => {
            tasks.stop_logs();
            debug!(%container_id, %name, "starting log stream");
            let handle = context.gateway.spawn_log_stream(
                container_id.clone(),
                context.config.log_tail,
                tasks.tx.clone(),
            );
            tasks.logs = Some((container_id, handle));
        }
        AppCommand::StopLogs { container_id } => {
            if tasks
                .logs
                .as_ref()
                .is_some_and(|(id, _)| *id == container_id)
            {
                tasks.stop_logs();
            }
        }
        AppCommand::OpenShell { container_id, name } => {
            let result = run_docker_shell(terminal, &container_id, &context.config.shell)
                .await
                .map_err(|error| {
                    warn!("shell for {name} failed: {error:#}");
                    compact_error(&error)
                });
            let _ = tasks.tx.send(LoopEvent::ShellExited { name, result });
        }
    }
}

fn spawn_refresh(context: &AppContext, tasks: &mut Tasks, tab: ResourceTab) {
    if !tasks.refreshing.insert(tab) {
        debug!(%tab, "refresh already in flight");
        return;
    }

    let gateway = context.gateway.clone();
    let tx = tasks.tx.clone();
    tokio::spawn(async move {
        let result = match timeout(REFRESH_TIMEOUT, gateway.fetch(tab)).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(error)) => Err(compact_error(&error)),
            Err(_) => Err(format!(
                "timed out after {}s listing {}",
                REFRESH_TIMEOUT.as_secs(),
                tab.noun()
            )),
        };
        let _ = tx.send(LoopEvent::Refreshed { tab, result });
    });
}

async fn run_docker_shell(terminal: &mut TuiTerminal, container_id: &str, shell: &str) -> Result<()> {
    suspend_terminal_for_subprocess(terminal)?;

    let mut cmd = TokioCommand::new("docker");
    cmd.arg("exec")
        .arg("-it")
        .arg(container_id)
        .arg(shell)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let run_result = cmd
        .status()
        .await
        .with_context(|| format!("failed to run docker exec for {container_id}"));
    let restore_result = resume_terminal_after_subprocess(terminal);

    let status = match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => {
            return Err(anyhow::anyhow!(
                "{run_error:#}\nterminal resume error: {restore_error:#}"
            ));
        }
        (Err(error), _) => return Err(error),
        (_, Err(error)) => return Err(error),
        (Ok(status), Ok(())) => status,
    };

    if status.success() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("docker exec exited with {status}"))
    }
}

fn suspend_terminal_for_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode for subprocess")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen for subprocess")?;
    terminal
        .show_cursor()
        .context("failed to show cursor for subprocess")?;
    Ok(())
}

fn resume_terminal_after_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    enable_raw_mode().context("failed to re-enable raw mode after subprocess")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)
        .context("failed to re-enter alternate screen after subprocess")?;
    terminal
        .clear()
        .context("failed to clear terminal after subprocess")?;
    Ok(())
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::compact_error;
    use anyhow::anyhow;

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = anyhow!("root")
            .context("middle")
            .context("outer")
            .context("top");
        assert_eq!(
            compact_error(&error),
            "top\ncaused by: outer\ncaused by: middle"
        );
    }
}
