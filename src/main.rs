use clap::Parser;
use disdro_l1::cli::{run, Cli};
use disdro_l1::error::Result;
use disdro_l1::utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    run(cli).await
}
