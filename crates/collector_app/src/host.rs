use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use collector_core::{update, AppState, Msg, SessionState};
use collector_logging::{collector_info, collector_warn, LogDestination};
use collector_runner::JobRunner;
use log::LevelFilter;

use crate::cli::Cli;
use crate::config;
use crate::effects::EffectRunner;
use crate::log_export::LogExport;

/// Poll interval for runner events; also paces rendering.
const TICK: Duration = Duration::from_millis(75);

enum HostInput {
    Interrupt,
}

/// Terminal host: drives the core state machine and prints the session log.
struct Host {
    state: AppState,
    effects: EffectRunner,
    printed: usize,
}

impl Host {
    fn new(effects: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            effects,
            printed: 0,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                inbox.extend(self.effects.apply(effect));
            }
        }
        if self.state.consume_dirty() {
            self.render();
        }
    }

    fn render(&mut self) {
        let log = self.state.log();
        for line in &log[self.printed..] {
            println!("{line}");
        }
        self.printed = log.len();
    }

    fn session(&self) -> SessionState {
        self.state.session()
    }

    /// Feed events the runner queued before the session went idle.
    fn drain_pending(&mut self) {
        while let Some(msg) = self.effects.next_message(Duration::ZERO) {
            self.dispatch(msg);
        }
    }
}

pub fn run(cli: Cli) -> Result<i32> {
    init_logging(&cli);

    let config = config::load_or_create(&cli.config);
    let runner = JobRunner::new(config.runner.clone()).context("creating job runner")?;
    let worker = runner.config();
    collector_info!(
        "Worker: {} {} (working dir {:?})",
        worker.interpreter,
        worker.script_path.display(),
        worker.working_dir
    );
    let log_dir: Option<PathBuf> = cli.save_log.clone().or_else(|| config.log_dir.clone());
    let save_log_on_exit = log_dir.is_some();
    let log_export = log_dir.map(|dir| LogExport::new(dir, config.log_file_prefix.clone()));
    let mut host = Host::new(EffectRunner::new(runner, log_export));

    let (input_tx, input_rx) = mpsc::channel();
    spawn_interrupt_listener(input_tx);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| config.default_output_path.clone());
    host.dispatch(Msg::KeywordsChanged(cli.keywords.join(",")));
    host.dispatch(Msg::OutputPathChanged(output));
    host.dispatch(Msg::StartClicked);

    let mut interrupts = 0;
    let mut abandoned = false;
    while host.session() != SessionState::Idle {
        while let Ok(HostInput::Interrupt) = input_rx.try_recv() {
            interrupts += 1;
        }
        match interrupts {
            0 => {}
            1 if host.session() == SessionState::Running => host.dispatch(Msg::StopClicked),
            1 => {}
            _ => {
                collector_warn!("Second interrupt; shutting down without waiting");
                abandoned = true;
                break;
            }
        }

        match host.effects.next_message(TICK) {
            Some(msg) => host.dispatch(msg),
            None => host.dispatch(Msg::Tick),
        }
    }

    if !abandoned {
        host.drain_pending();
    }

    host.effects.shutdown();
    if save_log_on_exit {
        host.dispatch(Msg::SaveLogClicked);
    }

    let view = host.state.view();
    collector_info!("Session finished; exit code {:?}", view.last_exit_code);
    Ok(match view.last_exit_code {
        Some(0) => 0,
        _ => 1,
    })
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    match &cli.log_file {
        Some(path) if cli.verbose => {
            collector_logging::initialize(LogDestination::Both, level, path)
        }
        Some(path) => collector_logging::initialize(LogDestination::File, LevelFilter::Info, path),
        None => collector_logging::initialize(LogDestination::Terminal, level, &PathBuf::new()),
    }
}

/// Forward Ctrl-C presses to the host loop.
fn spawn_interrupt_listener(input_tx: mpsc::Sender<HostInput>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                collector_warn!("Interrupt handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if input_tx.send(HostInput::Interrupt).is_err() {
                    break;
                }
            }
        });
    });
}
