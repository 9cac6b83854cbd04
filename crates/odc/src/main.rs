use std::process::ExitCode;

use clap::Parser;

use crate::cli::app::App;

mod cli;
mod config;
mod logging;
mod printer;

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();
    logging::init(app.verbose);

    match app.run().await {
        Ok(code) => code,
        Err(err) => {
            printer::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
