//! Progress variant: two numbers in the output, a current count and a total, drive a desktop
//! progress bar.

pub mod args;
pub mod dialog;
pub mod kdialog;

use std::{io::Write, ops::ControlFlow};

use anyhow::Result;
use args::ProgressArgs;
use dialog::{DialogStatus, ProgressDialog};
use kdialog::KDialog;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    extract::{FieldCache, FieldRef},
    poll::{
        command::ShellRunner, liveness::LivenessCheck, shutdown::detect_shutdown, PollLoop,
        StopReason,
    },
    utils::{clock::DefaultClock, percentage::Percentage},
};

/// How far along `current` is. When counting backward the count starts at `total` and the work
/// is done at 0. `None` when `total` isn't positive.
pub fn progress_percentage(current: f64, total: f64, backward: bool) -> Option<Percentage> {
    let done = if backward { total - current } else { current };
    Percentage::of(done, total)
}

pub struct ProgressPoller {
    poll: PollLoop,
    dialog: Box<dyn ProgressDialog>,
    current: FieldRef,
    total: FieldRef,
    backward: bool,
    steps: u32,
}

impl ProgressPoller {
    pub fn new(
        poll: PollLoop,
        dialog: Box<dyn ProgressDialog>,
        current: FieldRef,
        total: FieldRef,
        backward: bool,
        steps: u32,
    ) -> Self {
        Self {
            poll,
            dialog,
            current,
            total,
            backward,
            steps,
        }
    }

    fn progress_of(&self, output: &str) -> Option<Percentage> {
        let mut fields = FieldCache::new(output);
        let current = fields.get(self.current)?.value;
        let total = fields.get(self.total)?.value;
        progress_percentage(current, total, self.backward)
    }

    async fn poll_dialog(&mut self, out: &mut impl Write) -> Result<StopReason> {
        if self.dialog.set_auto_close(true).await? == DialogStatus::Gone {
            return Ok(StopReason::DialogGone);
        }
        loop {
            if !self.dialog.is_alive().await {
                return Ok(StopReason::DialogGone);
            }

            let output = match self.poll.next_output(out).await? {
                ControlFlow::Continue(output) => output,
                ControlFlow::Break(reason) => return Ok(reason),
            };

            match self.progress_of(&output) {
                Some(percentage) => {
                    debug!("Progress at {percentage}");
                    let value = percentage.to_steps(self.steps);
                    if self.dialog.set_value(value).await? == DialogStatus::Gone {
                        return Ok(StopReason::DialogGone);
                    }
                }
                None => debug!("No progress in this output"),
            }

            if let ControlFlow::Break(reason) = self.poll.pause(out).await? {
                return Ok(reason);
            }
        }
    }

    /// Executes the polling loop. The dialog is closed when polling stops for any reason other
    /// than the dialog itself going away.
    pub async fn run(mut self, out: &mut impl Write) -> Result<StopReason> {
        let reason = self.poll_dialog(out).await?;
        info!("Progress polling stopped: {reason:?}");
        if reason != StopReason::DialogGone {
            if let Err(e) = self.dialog.close().await {
                error!("Failed to close the progress dialog {e:?}");
            }
        }
        Ok(reason)
    }
}

/// Entry point of `numwatch-progress`.
pub async fn run_progress(args: ProgressArgs) -> Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let dialog = KDialog::open(&args.message, args.steps).await?;
    let poll = PollLoop::new(
        args.command,
        Box::new(ShellRunner),
        args.pid.map(LivenessCheck::Process),
        args.echo,
        args.interval,
        shutdown.clone(),
        Box::new(DefaultClock),
    );
    let poller = ProgressPoller::new(
        poll,
        Box::new(dialog),
        args.current,
        args.total,
        args.backward,
        args.steps,
    );
    poller.run(&mut std::io::stdout()).await?;
    shutdown.cancel();
    Ok(())
}
