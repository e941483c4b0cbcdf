use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod controller;
mod domain;
mod fetch;
mod inputter;
mod model;
mod ui;

use controller::Controller;
use domain::{UdirConfig, UdirError};
use fetch::FetchHandle;
use model::{Model, Status};
use ui::TableUI;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Write tracing output to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli) {
        eprintln!("Error: failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let result = run().await;
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(cli: &Cli) -> std::io::Result<()> {
    if let Some(path) = &cli.log_file {
        let file = std::fs::File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

async fn run() -> Result<(), UdirError> {
    let cfg = UdirConfig::default();

    let mut model = Model::new(&cfg);
    let ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    // The one suspend point: a background fetch whose result the loop polls.
    // Dropping the handle cancels it, so quitting mid-flight is safe.
    let mut fetch = Some(FetchHandle::spawn(&cfg));

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;

        if let Some(handle) = fetch.as_mut()
            && let Some(batch) = handle.poll()
        {
            model.ingest(batch);
            fetch = None;
        }

        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        }

        if model.take_reload_request() {
            fetch = Some(FetchHandle::spawn(&cfg));
        }
    }

    Ok(())
}
