use clap::Parser;
use egc_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match commands::dispatch(cli.command, cli.config.as_deref()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(target = "egc", error = %err, "command failed");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
