use anyhow::Result;
use clap::Parser;
use tracing::error;
use numwatch::{
    progress::{args::ProgressArgs, run_progress},
    utils::{logging::PROGRESS_PREFIX, runtime::single_thread_runtime},
};

fn main() -> Result<()> {
    let args = ProgressArgs::parse();
    args.logging.enable(PROGRESS_PREFIX)?;

    single_thread_runtime()?
        .block_on(run_progress(args))
        .inspect_err(|e| error!("Error running progress dialog {e:?}"))?;
    Ok(())
}
