//! The polling loop: run the command, hand its output over, wait, repeat. Exactly one command is
//! in flight at a time and cycles never overlap.

pub mod command;
pub mod liveness;
pub mod shutdown;

use std::{io::Write, ops::ControlFlow};

use anyhow::Result;
use command::{CommandOutcome, CommandRunner};
use liveness::LivenessCheck;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    rate::Monitor,
    utils::{clock::Clock, interval::PollInterval},
};

/// Why polling ended. None of these are errors, they are all the ways a run normally finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    /// The liveness check stopped holding.
    NotAlive,
    CommandFailed(String),
    /// The progress dialog was closed or vanished.
    DialogGone,
}

/// The parts of a polling cycle that don't depend on what is done with the output.
pub struct PollLoop {
    command: String,
    runner: Box<dyn CommandRunner>,
    liveness: Option<LivenessCheck>,
    echo: bool,
    interval: PollInterval,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl PollLoop {
    pub fn new(
        command: String,
        runner: Box<dyn CommandRunner>,
        liveness: Option<LivenessCheck>,
        echo: bool,
        interval: PollInterval,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            command,
            runner,
            liveness,
            echo,
            interval,
            shutdown,
            clock,
        }
    }

    fn interrupted<T>(out: &mut impl Write) -> Result<ControlFlow<StopReason, T>> {
        // Leave the terminal on a fresh line after ^C.
        writeln!(out)?;
        out.flush()?;
        info!("Interrupted");
        Ok(ControlFlow::Break(StopReason::Interrupted))
    }

    /// Runs the command once and returns its output, echoing it when asked to.
    pub async fn next_output(
        &mut self,
        out: &mut impl Write,
    ) -> Result<ControlFlow<StopReason, String>> {
        if let Some(check) = &self.liveness {
            if !check.is_alive() {
                info!("Liveness check {check} no longer holds");
                return Ok(ControlFlow::Break(StopReason::NotAlive));
            }
        }

        let outcome = select! {
            biased;
            _ = self.shutdown.cancelled() => return Self::interrupted(out),
            outcome = self.runner.run(&self.command) => outcome?,
        };

        match outcome {
            // The interrupt usually reaches the command too.
            _ if self.shutdown.is_cancelled() => Self::interrupted(out),
            CommandOutcome::Interrupted => {
                // The signal handler may not have run yet, make sure everything else stops too.
                self.shutdown.cancel();
                Self::interrupted(out)
            }
            CommandOutcome::Output(output) => {
                if self.echo {
                    write!(out, "{output}")?;
                    // Readings always start on their own line.
                    if !output.is_empty() && !output.ends_with('\n') {
                        writeln!(out)?;
                    }
                }
                Ok(ControlFlow::Continue(output))
            }
            CommandOutcome::Failed(status) => {
                warn!("Command {} failed with {status}", self.command);
                eprintln!("Command ended with {status}, stopping");
                Ok(ControlFlow::Break(StopReason::CommandFailed(status)))
            }
        }
    }

    /// Waits until the next cycle is due.
    pub async fn pause(&mut self, out: &mut impl Write) -> Result<ControlFlow<StopReason>> {
        out.flush()?;
        select! {
            biased;
            _ = self.shutdown.cancelled() => Self::interrupted(out),
            _ = self.clock.sleep(*self.interval) => Ok(ControlFlow::Continue(())),
        }
    }
}

/// Prints a line per [MonitorSpec](crate::extract::MonitorSpec) on every cycle.
pub struct Poller {
    poll: PollLoop,
    monitor: Monitor,
}

impl Poller {
    pub fn new(poll: PollLoop, monitor: Monitor) -> Self {
        Self { poll, monitor }
    }

    /// Executes the polling loop until one of the [StopReason]s happens.
    pub async fn run(mut self, out: &mut impl Write) -> Result<StopReason> {
        loop {
            let output = match self.poll.next_output(out).await? {
                ControlFlow::Continue(output) => output,
                ControlFlow::Break(reason) => return Ok(reason),
            };

            let readings = self.monitor.observe(&output);
            debug!("Cycle produced {} readings", readings.len());
            for reading in readings {
                writeln!(out, "{reading}")?;
            }

            if let ControlFlow::Break(reason) = self.poll.pause(out).await? {
                return Ok(reason);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod poll_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use tempfile::NamedTempFile;
    use tokio_util::sync::CancellationToken;

    use super::{
        command::{CommandOutcome, MockCommandRunner},
        liveness::LivenessCheck,
        PollLoop, Poller, StopReason,
    };
    use crate::{
        rate::{Monitor, RateOptions},
        utils::{clock::Clock, interval::PollInterval, logging::TEST_LOGGING},
    };

    /// Records sleeps instead of waiting. Cancels `shutdown` after `interrupt_after` sleeps.
    #[derive(Clone, Default)]
    pub struct TestClock {
        pub sleeps: Arc<Mutex<Vec<Duration>>>,
        pub interrupt_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl Clock for TestClock {
        async fn sleep(&self, duration: Duration) {
            let count = {
                let mut sleeps = self.sleeps.lock().unwrap();
                sleeps.push(duration);
                sleeps.len()
            };
            if let Some((after, token)) = &self.interrupt_after {
                if count >= *after {
                    token.cancel();
                    // Never wakes up, the cancellation has to win.
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    /// A runner returning `outputs` in order and failing afterwards.
    pub fn scripted_runner(outputs: Vec<&str>) -> MockCommandRunner {
        let mut outputs = outputs
            .into_iter()
            .map(|v| CommandOutcome::Output(v.to_string()))
            .chain(std::iter::once(CommandOutcome::Failed(
                "exit status: 1".into(),
            )))
            .collect::<Vec<_>>()
            .into_iter();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|command| command == "status")
            .returning(move |_| Ok(outputs.next().expect("Runner called after failing")));
        runner
    }

    pub fn poll_loop(
        runner: MockCommandRunner,
        liveness: Option<LivenessCheck>,
        echo: bool,
        shutdown: CancellationToken,
        clock: TestClock,
    ) -> PollLoop {
        PollLoop::new(
            "status".into(),
            Box::new(runner),
            liveness,
            echo,
            PollInterval::from_secs_f64(2.).unwrap(),
            shutdown,
            Box::new(clock),
        )
    }

    fn monitor(specs: &[&str]) -> Monitor {
        Monitor::new(
            specs.iter().map(|s| s.parse().unwrap()).collect(),
            RateOptions {
                interval: PollInterval::from_secs_f64(2.).unwrap(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn prints_readings_until_command_fails() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::default();
        let runner = scripted_runner(vec![
            "Total: 100 done\nRemaining: 40\n",
            "Total: 100 done\nRemaining: 30\n",
        ]);
        let poller = Poller::new(
            poll_loop(runner, None, false, CancellationToken::new(), clock.clone()),
            monitor(&["done:1:1:%", "left:2:1"]),
        );

        let mut out: Vec<u8> = vec![];
        let reason = poller.run(&mut out).await?;

        assert_eq!(reason, StopReason::CommandFailed("exit status: 1".into()));
        assert_eq!(
            String::from_utf8(out)?,
            "done: 100%\nleft: 40\ndone: 100% (0.0%/s)\nleft: 30 (-5.0/s)\n"
        );
        assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(2); 2]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_field_skips_only_that_line() -> Result<()> {
        let runner = scripted_runner(vec!["1 2 3", "4 5 6"]);
        let poller = Poller::new(
            poll_loop(runner, None, false, CancellationToken::new(), TestClock::default()),
            monitor(&["fifth:1:5", "first:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        poller.run(&mut out).await?;
        assert_eq!(String::from_utf8(out)?, "first: 1\nfirst: 4 (1.5/s)\n");
        Ok(())
    }

    #[tokio::test]
    async fn echoes_raw_output() -> Result<()> {
        let runner = scripted_runner(vec!["load 7\n"]);
        let poller = Poller::new(
            poll_loop(runner, None, true, CancellationToken::new(), TestClock::default()),
            monitor(&["load:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        poller.run(&mut out).await?;
        assert_eq!(String::from_utf8(out)?, "load 7\nload: 7\n");
        Ok(())
    }

    #[tokio::test]
    async fn echo_without_trailing_newline() -> Result<()> {
        let runner = scripted_runner(vec!["load 7", ""]);
        let poller = Poller::new(
            poll_loop(runner, None, true, CancellationToken::new(), TestClock::default()),
            monitor(&["load:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        poller.run(&mut out).await?;
        assert_eq!(String::from_utf8(out)?, "load 7\nload: 7\n");
        Ok(())
    }

    #[tokio::test]
    async fn interrupt_while_command_runs() -> Result<()> {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(move |_| {
            token.cancel();
            Ok(CommandOutcome::Output("12".into()))
        });
        let poller = Poller::new(
            poll_loop(runner, None, false, shutdown, TestClock::default()),
            monitor(&["n:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        assert_eq!(poller.run(&mut out).await?, StopReason::Interrupted);
        // Output of the interrupted run is dropped, only the newline is printed.
        assert_eq!(String::from_utf8(out)?, "\n");
        Ok(())
    }

    #[tokio::test]
    async fn interrupt_before_command_starts() -> Result<()> {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        let poller = Poller::new(
            poll_loop(runner, None, false, shutdown, TestClock::default()),
            monitor(&["n:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        assert_eq!(poller.run(&mut out).await?, StopReason::Interrupted);
        assert_eq!(String::from_utf8(out)?, "\n");
        Ok(())
    }

    #[tokio::test]
    async fn command_killed_by_interrupt() -> Result<()> {
        let shutdown = CancellationToken::new();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Ok(CommandOutcome::Interrupted));
        let poller = Poller::new(
            poll_loop(runner, None, false, shutdown.clone(), TestClock::default()),
            monitor(&["n:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        assert_eq!(poller.run(&mut out).await?, StopReason::Interrupted);
        assert_eq!(String::from_utf8(out)?, "\n");
        assert!(shutdown.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn interrupt_during_sleep_prints_newline() -> Result<()> {
        let shutdown = CancellationToken::new();
        let clock = TestClock {
            interrupt_after: Some((1, shutdown.clone())),
            ..Default::default()
        };
        let runner = scripted_runner(vec!["12", "13"]);
        let poller = Poller::new(
            poll_loop(runner, None, false, shutdown, clock),
            monitor(&["n:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        let reason = poller.run(&mut out).await?;
        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(String::from_utf8(out)?, "n: 12\n\n");
        Ok(())
    }

    #[tokio::test]
    async fn stops_when_liveness_fails() -> Result<()> {
        let file = NamedTempFile::new()?;
        let check = LivenessCheck::File(file.path().to_path_buf());
        file.close()?;

        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        let poller = Poller::new(
            poll_loop(runner, Some(check), false, CancellationToken::new(), TestClock::default()),
            monitor(&["n:1:1"]),
        );

        let mut out: Vec<u8> = vec![];
        assert_eq!(poller.run(&mut out).await?, StopReason::NotAlive);
        assert!(out.is_empty());
        Ok(())
    }
}
