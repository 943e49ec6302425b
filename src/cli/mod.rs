use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    extract::MonitorSpec,
    poll::{
        command::ShellRunner, liveness::LivenessCheck, shutdown::detect_shutdown, PollLoop,
        Poller,
    },
    rate::{scale::ScaleMode, Monitor, RateOptions},
    utils::{clock::DefaultClock, interval::PollInterval, logging::LoggingArgs},
};

#[derive(Parser, Debug)]
#[command(name = "numwatch", version, long_about = None)]
#[command(
    about = "Run a command repeatedly and report how the numbers in its output change",
    after_help = "Each SPEC is label:line:field[:units]. Line and field start at 1, field counts the numbers on the line from the left."
)]
pub struct Args {
    #[arg(help = "Shell command to run on every cycle")]
    command: String,
    #[arg(required = true, value_name = "SPEC", help = "Numbers to follow")]
    specs: Vec<MonitorSpec>,
    #[arg(
        short = 'n',
        long,
        default_value_t,
        help = "Seconds between runs of the command"
    )]
    interval: PollInterval,
    #[arg(short, long, help = "Print the output of the command")]
    echo: bool,
    #[arg(
        short,
        long,
        value_name = "MODE",
        help = "Show rates with decimal (k, M, ...) or binary (ki, Mi, ...) prefixes"
    )]
    scale: Option<ScaleMode>,
    #[arg(short, long, help = "Group digits in threes")]
    group: bool,
    #[arg(
        short = 'w',
        long = "while",
        value_name = "CHECK",
        help = "Keep going only while file:<path> exists or pid:<number> runs"
    )]
    liveness: Option<LivenessCheck>,
    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Entry point of `numwatch`.
pub async fn run_cli(args: Args) -> Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let monitor = Monitor::new(
        args.specs,
        RateOptions {
            interval: args.interval,
            scale: args.scale,
            grouping: args.group,
        },
    );
    let poll = PollLoop::new(
        args.command,
        Box::new(ShellRunner),
        args.liveness,
        args.echo,
        args.interval,
        shutdown.clone(),
        Box::new(DefaultClock),
    );

    let reason = Poller::new(poll, monitor)
        .run(&mut std::io::stdout())
        .await?;
    info!("Polling stopped: {reason:?}");
    shutdown.cancel();
    Ok(())
}
