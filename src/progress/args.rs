use clap::Parser;

use crate::{
    extract::FieldRef,
    utils::{interval::PollInterval, logging::LoggingArgs},
};

#[derive(Parser, Debug)]
#[command(name = "numwatch-progress", version, long_about = None)]
#[command(about = "Show how far a command has got in a KDE progress dialog")]
pub struct ProgressArgs {
    #[arg(help = "Shell command to run on every cycle")]
    pub command: String,
    #[arg(help = "Position of the current count as line:field")]
    pub current: FieldRef,
    #[arg(help = "Position of the total count as line:field")]
    pub total: FieldRef,
    #[arg(help = "Text shown in the dialog")]
    pub message: String,
    #[arg(
        short,
        long,
        help = "The current count goes down towards 0 instead of up towards the total"
    )]
    pub backward: bool,
    #[arg(
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of steps in the progress bar"
    )]
    pub steps: u32,
    #[arg(short, long, help = "Stop once the process with this id is gone")]
    pub pid: Option<u32>,
    #[arg(
        short = 'n',
        long,
        default_value_t,
        help = "Seconds between runs of the command"
    )]
    pub interval: PollInterval,
    #[arg(short, long, help = "Print the output of the command")]
    pub echo: bool,
    #[command(flatten)]
    pub logging: LoggingArgs,
}
