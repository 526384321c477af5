//! sitekit binary.
//!
//! Two independent tools behind one CLI: `deploy` uploads the static site
//! tree to the hosting API in batches, `serve` runs the local admin server
//! that serves the site and accepts `POST /save` edits.

mod config;
mod deploy;
mod error;
mod http;
mod listing;
mod logging;
mod prompt;
mod save;
mod scan;
mod server;
mod storage;

use clap::Parser;
use shadow_rs::shadow;
use tracing::error;

use crate::config::{Cli, Command};

shadow!(build);

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Deploy(args) => {
            if let Err(err) = deploy::run(args).await {
                error!(error = %err, "deploy failed");
                return Err(std::io::Error::other(err.to_string()));
            }
            Ok(())
        }
        Command::Serve(args) => server::run(args).await,
    }
}
