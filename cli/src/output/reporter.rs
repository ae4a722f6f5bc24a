//! Presentation-layer implementations of `SyncReporter`.
//!
//! The sync run executes as its own future and reports through a
//! [`ChannelReporter`]. The command drains the other end of the channel into
//! a [`TerminalReporter`], which owns the progress bar and prints the run log,
//! so the run never waits on the terminal.

use std::sync::OnceLock;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::application::ports::SyncReporter;
use crate::domain::{LogLine, Progress};
use crate::output::{OutputContext, progress};

/// One reporter call, carried across the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Step(String),
    Warn(String),
    Log(LogLine),
    Progress(Progress),
}

/// Forwards every report to an unbounded channel.
pub struct ChannelReporter {
    tx: UnboundedSender<SyncEvent>,
}

impl ChannelReporter {
    #[must_use]
    pub fn new(tx: UnboundedSender<SyncEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SyncEvent) {
        // A closed receiver means the presentation side has gone away.
        if self.tx.send(event).is_err() {
            tracing::debug!("report dropped: receiver closed");
        }
    }
}

impl SyncReporter for ChannelReporter {
    fn step(&self, message: &str) {
        self.send(SyncEvent::Step(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.send(SyncEvent::Warn(message.to_string()));
    }

    fn log(&self, line: &LogLine) {
        self.send(SyncEvent::Log(line.clone()));
    }

    fn progress(&self, progress: Progress) {
        self.send(SyncEvent::Progress(progress));
    }
}

/// Terminal reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ⚠ {message}"` (suppressed when `ctx.quiet`)
/// - failed fields and failed lookups go to stderr and are never suppressed
/// - progress drives a row bar, created on the first tick, when stdout is a TTY
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    bar: OnceLock<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            bar: OnceLock::new(),
        }
    }

    /// Render events until every sender has been dropped.
    pub async fn drain(&self, mut rx: UnboundedReceiver<SyncEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
    }

    /// Render a single event.
    pub fn handle(&self, event: SyncEvent) {
        match event {
            SyncEvent::Step(message) => self.step(&message),
            SyncEvent::Warn(message) => self.warn(&message),
            SyncEvent::Log(line) => self.log(&line),
            SyncEvent::Progress(p) => self.progress(p),
        }
    }

    /// Print above the bar, if one is being drawn.
    fn print(&self, f: impl FnOnce()) {
        match self.bar.get() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

impl SyncReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            self.print(|| println!("  {} {message}", "→".cyan()));
        }
    }

    fn warn(&self, message: &str) {
        self.print(|| self.ctx.warn(message));
    }

    fn log(&self, line: &LogLine) {
        match line {
            LogLine::Assigning { .. } => {
                if !self.ctx.quiet {
                    self.print(|| println!("    {}", line.style(self.ctx.styles.dim)));
                }
            }
            LogLine::FieldFailed { .. } | LogLine::LookupFailed { .. } => {
                self.print(|| self.ctx.error(&line.to_string()));
            }
            LogLine::MachineNotFound { .. } => self.print(|| self.ctx.warn(&line.to_string())),
            LogLine::Cancelled { .. } => match self.bar.get() {
                Some(bar) => progress::finish_error(bar, &line.to_string()),
                None => self.ctx.warn(&line.to_string()),
            },
            LogLine::Done => match self.bar.get() {
                Some(bar) => progress::finish_success(bar, &line.to_string()),
                None => self.ctx.success(&line.to_string()),
            },
        }
    }

    fn progress(&self, p: Progress) {
        if !self.ctx.show_progress() {
            return;
        }
        let bar = self
            .bar
            .get_or_init(|| progress::rows_bar(u64::try_from(p.total).unwrap_or(u64::MAX)));
        bar.set_position(u64::try_from(p.current).unwrap_or(u64::MAX));
    }
}
