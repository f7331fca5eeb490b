//! Activity indicator shown while a request or a script run is outstanding.

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{stdout, Write};
use std::time::Duration;
use tokio::sync::watch;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

/// Stops the animation when dropped or when [`SpinnerHandle::stop`] is awaited.
pub struct SpinnerHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl SpinnerHandle {
    /// Stop the animation and clear its line.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        let _ = clear_line(&mut stdout());
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        let mut out = stdout();
        let _ = queue!(out, Show);
        let _ = out.flush();
    }
}

/// One-line spinner: a braille frame followed by a status message.
pub struct Spinner {
    message: String,
    color: Color,
}

impl Spinner {
    pub fn new(message: impl Into<String>, color: Color) -> Self {
        Self {
            message: message.into(),
            color,
        }
    }

    /// Redraw the line for the given tick.
    fn draw<W: Write>(&self, out: &mut W, tick: usize) -> std::io::Result<()> {
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(self.color),
            Print(FRAMES[tick % FRAMES.len()]),
            Print(' '),
            Print(&self.message),
            ResetColor
        )?;
        out.flush()
    }

    /// Animate on stdout until the returned handle is stopped.
    pub fn start(self) -> SpinnerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut out = stdout();
            let _ = queue!(out, Hide);
            let mut tick = 0;
            while !*stop_rx.borrow() {
                let _ = self.draw(&mut out, tick);
                tick += 1;
                tokio::select! {
                    _ = tokio::time::sleep(TICK) => {}
                    _ = stop_rx.changed() => break,
                }
            }
        });

        SpinnerHandle {
            stop_tx,
            task: Some(task),
        }
    }
}

fn clear_line<W: Write>(out: &mut W) -> std::io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Show)?;
    out.flush()
}
