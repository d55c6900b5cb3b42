mod app;
mod camera;
mod cli;
mod scene;

use anyhow::Context;
use clap::Parser;

use fishtank_engine::device::GpuInit;
use fishtank_engine::logging::{init_logging, LoggingConfig};
use fishtank_engine::projection::{ContextId, ProjectorRegistry};
use fishtank_engine::session::VirtualWindowSession;
use fishtank_engine::window::{Runtime, RuntimeConfig};

use crate::app::ViewerApp;
use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &cli.log {
        logging = logging.filter(filter.clone());
    }
    init_logging(logging);

    let registry = ProjectorRegistry::new();
    let session = VirtualWindowSession::start(cli.session_config(), &registry, ContextId(0))
        .context("failed to start virtual window session")?;

    if session.aggregator().is_empty() {
        log::warn!("no trackers configured; pass --device <id> or --mouse");
    }

    let app = ViewerApp::new(session, cli.mouse)?;
    Runtime::run(
        RuntimeConfig::default().title("fishtank").size(1280.0, 720.0),
        GpuInit::default(),
        app,
    )
}
