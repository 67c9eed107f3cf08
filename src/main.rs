use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use tf_proxy::cli::{self, Cli};
use tf_proxy::{logging, preflight, runner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    logging::init();

    preflight::check_process_environment()?;

    let cli = Cli::parse();

    let work_dir = std::env::current_dir()?;
    let status = cli::execute(&cli, &work_dir).await?;

    tracing::debug!(%status, "terraform finished");
    Ok(ExitCode::from(runner::exit_code(status)))
}
