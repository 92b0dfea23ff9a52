mod args;
mod wineds;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match wineds::run_conversion(&args) {
        Ok(written) => {
            info!("done, {} file(s) written", written.len());
        }
        Err(e) => {
            error!("conversion failed: {}", e);
            eprintln!("Error: {}", e);
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("Caused by: {}", source);
            }
            std::process::exit(1);
        }
    }
}
