use anyhow::Result;
use clap::Parser;
use tracing::error;
use numwatch::{
    cli::{run_cli, Args},
    utils::logging::CLI_PREFIX,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.logging.enable(CLI_PREFIX)?;

    run_cli(args).await.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
