use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;
use glam::{Quat, Vec3};

use fishtank_engine::coords::Transform;
use fishtank_engine::ingest::{IngestConfig, DEFAULT_PORT};
use fishtank_engine::projection::TopEdge;
use fishtank_engine::session::VirtualWindowConfig;
use fishtank_engine::tracking::SourceConfig;

/// Device id of the cursor-driven tracker.
pub const MOUSE_DEVICE: &str = "mouse";

#[derive(Parser, Debug)]
#[command(
    name = "fishtank-viewer",
    version,
    about = "Render a scene through a head-tracked virtual window",
    long_about = "Listens for face-tracker OSC messages and renders a reference room \
                  through the configured window.\n\nKeys: Space toggles the override, \
                  T toggles the top edge policy, Escape quits."
)]
pub struct Cli {
    /// UDP port the trackers send to.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind the listener on.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Physical window width in centimetres.
    #[arg(long, default_value_t = 68.5)]
    pub width: f32,

    /// Physical window height in centimetres.
    #[arg(long, default_value_t = 38.58)]
    pub height: f32,

    /// Real-to-virtual scale; physical dimensions are divided by it.
    #[arg(long, default_value_t = 1.0)]
    pub rate: f32,

    /// Tracker as `<id>[@x,y,z[,yaw]]` (world cm, degrees). Repeatable.
    #[arg(long = "device", value_name = "SPEC", value_parser = parse_device)]
    pub devices: Vec<SourceConfig>,

    /// Drive a simulated tracker from the cursor.
    #[arg(long)]
    pub mouse: bool,

    /// Use the physical window height for the top frustum edge.
    #[arg(long)]
    pub physical_top: bool,

    /// Start with the override disabled.
    #[arg(long)]
    pub disabled: bool,

    /// Treat a tracker as lost after this many milliseconds without a sample.
    #[arg(long, value_name = "MS")]
    pub stale_ms: Option<u64>,

    /// Log filter, `env_logger` syntax (overrides RUST_LOG).
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

impl Cli {
    pub fn session_config(&self) -> VirtualWindowConfig {
        let ingest = IngestConfig::default().bind_addr(self.bind).port(self.port);
        let top_edge = if self.physical_top { TopEdge::WindowHeight } else { TopEdge::ViewportAspect };

        let mut config = VirtualWindowConfig::default()
            .enabled(!self.disabled)
            .window_size(self.width, self.height)
            .real_virtual_rate(self.rate)
            .window_transform(Transform::new(Quat::IDENTITY, Vec3::new(100.0, 0.0, 0.0)))
            .top_edge(top_edge)
            .stale_after(self.stale_ms.map(Duration::from_millis))
            .ingest(ingest);

        for device in &self.devices {
            config = config.source(device.clone());
        }
        if self.mouse {
            config = config.source(SourceConfig::new(MOUSE_DEVICE));
        }
        config
    }
}

fn parse_device(spec: &str) -> Result<SourceConfig, String> {
    let (id, placement) = match spec.split_once('@') {
        Some((id, placement)) => (id, Some(placement)),
        None => (spec, None),
    };
    if id.is_empty() {
        return Err("device id is empty".into());
    }

    let mut source = SourceConfig::new(id);
    let Some(placement) = placement else {
        return Ok(source);
    };

    let values = placement
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("`{v}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [x, y, z] => source = source.location(Vec3::new(*x, *y, *z)),
        [x, y, z, yaw] => source = source.location(Vec3::new(*x, *y, *z)).yaw(*yaw),
        other => return Err(format!("expected x,y,z or x,y,z,yaw, got {} values", other.len())),
    }
    Ok(source)
}
