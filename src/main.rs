//! civicstream command-line entry point

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use civicstream::config::Config;
use civicstream::menu::Menu;
use civicstream::{AccessLog, DataProcessor, FileAccessLog, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    let log: Arc<dyn AccessLog> = match &config.log {
        Some(path) => Arc::new(FileAccessLog::open(path)),
        None => Arc::new(FileAccessLog::stderr()),
    };
    log.log(&std::env::args().skip(1).collect::<Vec<_>>().join(" "));

    config.validate()?;
    for path in config.data_files() {
        log.log(&path.display().to_string());
    }

    let processor = DataProcessor::load(&config, log.clone())?;
    let mut menu = Menu::new(
        processor,
        config.sources(),
        log,
        io::stdin().lock(),
        io::stdout().lock(),
    );
    menu.run()
}
