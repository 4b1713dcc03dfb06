use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use pagepress_core::{update, AppState, Effect, JobPhase, Msg};
use pagepress_engine::{inspect_pdf, EngineConfig};
use press_logging::{press_info, press_warn};

use crate::cli::Args;
use crate::config::AppConfig;
use crate::render::{summary_lines, ConsoleRenderer};
use crate::runner::{EffectRunner, HostRequest};

const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run_app(args: Args, config: AppConfig) -> Result<()> {
    let bytes = fs::read(&args.input)
        .map(Bytes::from)
        .with_context(|| format!("failed to read {:?}", args.input))?;
    let file_name = display_name(&args.input);

    let mut session = Session::new(config, file_name.clone(), bytes.clone());
    session.dispatch(document_msg(&file_name, &bytes));
    if session.state.document().is_none() {
        session.flush_render();
        bail!("{:?} cannot be optimized", args.input);
    }

    if let Some(profile) = args.profile {
        session.dispatch(Msg::AllProfilesSelected {
            code: profile.code(),
        });
    }
    for page in &args.pages {
        session.dispatch(Msg::ProfileSelected {
            index: page.index,
            code: page.profile.code(),
        });
    }
    if let Some(error) = session.state.view().last_error {
        bail!(error);
    }
    for line in summary_lines(&session.state.view()) {
        println!("{line}");
    }

    if args.estimate_only {
        // Give the signature pre-check a moment to report.
        session.drain_for(Duration::from_millis(250));
        session.flush_render();
        return Ok(());
    }

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_interrupt_listener(msg_tx);
    session.dispatch(Msg::SubmitClicked);
    session.run_until_settled(&msg_rx);
    session.outcome()
}

fn document_msg(file_name: &str, bytes: &[u8]) -> Msg {
    match inspect_pdf(bytes) {
        Ok(info) => Msg::DocumentLoaded {
            name: file_name.to_string(),
            size_bytes: bytes.len() as u64,
            page_count: info.page_count,
        },
        Err(err) => Msg::DocumentRejected {
            reason: err.to_string(),
        },
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}

/// Each Ctrl-C becomes an exit request. Runs its own small runtime.
fn spawn_interrupt_listener(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                press_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if msg_tx.send(Msg::ExitRequested).is_err() {
                    break;
                }
            }
        });
    });
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: ConsoleRenderer,
    exit_warned: bool,
    exiting: bool,
}

impl Session {
    fn new(config: AppConfig, file_name: String, bytes: Bytes) -> Self {
        let engine_config = EngineConfig {
            service: config.service,
            policy: config.policy.clone(),
            output_dir: config.output_dir,
        };
        Self {
            state: AppState::with_policy(config.policy),
            runner: EffectRunner::new(engine_config, file_name, bytes),
            renderer: ConsoleRenderer::default(),
            exit_warned: false,
            exiting: false,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.execute(effects);
        if self.state.consume_dirty() {
            self.flush_render();
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for request in self.runner.enqueue(effects) {
            match request {
                HostRequest::ConfirmExit { warning } if self.exit_warned => {
                    press_info!("Exit confirmed: {}", warning);
                    self.exiting = true;
                    let state = std::mem::take(&mut self.state);
                    let (state, effects) = update(state, Msg::AbortClicked);
                    self.state = state;
                    self.runner.enqueue(effects);
                }
                HostRequest::ConfirmExit { warning } => {
                    self.exit_warned = true;
                    eprintln!("{warning}");
                    eprintln!("Press Ctrl-C again to abandon the job.");
                }
                HostRequest::ConfirmClear { warning } => {
                    press_warn!("Clear needs confirmation: {}", warning);
                }
                HostRequest::Exit => self.exiting = true,
            }
        }
    }

    fn flush_render(&mut self) {
        for line in self.renderer.render(&self.state.view()) {
            println!("{line}");
        }
    }

    fn pump_engine(&mut self) {
        for msg in self.runner.poll() {
            self.dispatch(msg);
        }
    }

    fn drain_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.pump_engine();
            thread::sleep(TICK_INTERVAL.min(duration));
        }
        self.pump_engine();
    }

    /// True once nothing is uploading, running or downloading.
    fn settled(&self) -> bool {
        !self.state.guard().is_uploading()
            && self.state.job().is_none_or(|job| job.is_terminal())
            && !self.runner.download_pending()
    }

    fn run_until_settled(&mut self, msg_rx: &mpsc::Receiver<Msg>) {
        while !self.exiting && !self.settled() {
            self.pump_engine();
            if let Ok(msg) = msg_rx.recv_timeout(TICK_INTERVAL) {
                self.dispatch(msg);
            }
            self.dispatch(Msg::Tick {
                now: Instant::now(),
            });
        }
        self.flush_render();
    }

    fn outcome(&self) -> Result<()> {
        let view = self.state.view();
        if let Some(path) = &view.saved_to {
            println!("Saved optimized document to {}", path.display());
            return Ok(());
        }
        match self.state.job().map(|job| &job.phase) {
            Some(JobPhase::Aborted) => bail!("job abandoned"),
            _ => bail!(view
                .last_error
                .unwrap_or_else(|| "job did not complete".to_string())),
        }
    }
}
