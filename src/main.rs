use clap::Parser;
use env_logger::Env;
use log::error;

use record_joiner::cli::Cli;
use record_joiner::orchestrator::run_job;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = run_job(&cfg) {
        error!("join failed: {:#}", e);
        std::process::exit(1);
    }
}
