//! In-progress indicator shown while a command runs.
//!
//! Runs as a tokio task that owns its writer. `stop` cancels the task and
//! awaits it, so once `stop` returns no further frame can be drawn.

use std::io::Write;
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tlog_trace;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub struct Spinner<W: Write + Send + 'static> {
    out: W,
    interval: Duration,
}

impl Spinner<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send + 'static> Spinner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            interval: FRAME_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn start(self, message: impl Into<String>) -> SpinnerHandle<W> {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let message = message.into();
        let Spinner { mut out, interval } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = draw(&mut out, FRAMES[frame % FRAMES.len()], &message);
                        frame += 1;
                        tlog_trace!("spinner frame {}", frame);
                    }
                }
            }
            let _ = clear(&mut out);
            out
        });

        SpinnerHandle { cancel, task }
    }
}

fn draw<W: Write>(out: &mut W, frame: &str, message: &str) -> std::io::Result<()> {
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(frame.cyan()),
        Print(" "),
        Print(message)
    )?;
    out.flush()
}

fn clear<W: Write>(out: &mut W) -> std::io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    out.flush()
}

pub struct SpinnerHandle<W> {
    cancel: CancellationToken,
    task: JoinHandle<W>,
}

impl<W> SpinnerHandle<W> {
    /// Stop and wait for the final clear. Returns the writer.
    pub async fn stop(self) -> Option<W> {
        self.cancel.cancel();
        self.task.await.ok()
    }
}
