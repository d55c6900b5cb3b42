use std::sync::Arc;

use glam::Vec3;

use fishtank_engine::coords::ColorRgba;
use fishtank_engine::core::{App, AppControl, FrameCtx};
use fishtank_engine::ingest::PoseEvent;
use fishtank_engine::input::Key;
use fishtank_engine::projection::{SharedProjector, TopEdge, WindowPlane};
use fishtank_engine::render::{LineBatch, LineRenderer};
use fishtank_engine::session::{FrameUpdate, VirtualWindowSession};

use crate::camera::HostCamera;
use crate::cli::MOUSE_DEVICE;
use crate::scene;

const CLEAR: ColorRgba = ColorRgba::rgb(0.01, 0.01, 0.02);

/// Depth of the simulated eye in front of the window.
const MOUSE_EYE_DISTANCE: f32 = 60.0;

pub struct ViewerApp {
    session: VirtualWindowSession,
    projector: SharedProjector,
    camera: HostCamera,
    room: LineBatch,
    renderer: LineRenderer,
    mouse: bool,
    title: String,
}

impl ViewerApp {
    pub fn new(session: VirtualWindowSession, mouse: bool) -> anyhow::Result<Self> {
        let projector = session
            .projector()
            .map(Arc::clone)
            .ok_or_else(|| anyhow::anyhow!("session has no projector"))?;
        let window = projector.read().window();

        Ok(Self {
            session,
            projector,
            camera: HostCamera::facing(&window),
            room: scene::reference_room(&window),
            renderer: LineRenderer::new(),
            mouse,
            title: String::new(),
        })
    }

    fn handle_keys(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        let input = ctx.input_frame;
        if input.pressed(Key::Escape) {
            return AppControl::Exit;
        }

        if input.pressed(Key::Space) {
            let enabled = !self.session.is_enabled();
            self.session.set_enabled(enabled);
            // Applied on the next tracked frame; reflect it now so the toggle
            // also works while nothing is tracked.
            self.projector.write().set_enabled(enabled);
            log::info!("virtual window override {}", if enabled { "on" } else { "off" });
        }

        if input.pressed(Key::Letter('T')) {
            let mut projector = self.projector.write();
            let next = match projector.top_edge() {
                TopEdge::ViewportAspect => TopEdge::WindowHeight,
                TopEdge::WindowHeight => TopEdge::ViewportAspect,
            };
            projector.set_top_edge(next);
            log::info!("top edge policy: {next:?}");
        }

        AppControl::Continue
    }

    fn drive_mouse_tracker(&self, ctx: &FrameCtx<'_, '_>) {
        if !self.mouse || !ctx.input_frame.pointer_changed {
            return;
        }

        let event = match ctx.input.pointer_pos {
            Some(pointer) => {
                let window = self.projector.read().window();
                PoseEvent::EyePosition(mouse_eye(pointer, ctx.window.logical_size(), &window))
            }
            None => PoseEvent::Lost,
        };

        if let Err(err) = self.session.dispatcher().apply(MOUSE_DEVICE, event) {
            log::warn!("simulated tracker: {err}");
        }
    }

    fn update_title(&mut self, ctx: &FrameCtx<'_, '_>, update: FrameUpdate) {
        let tracked = match update {
            FrameUpdate::Updated(fused) => fused.contributors,
            FrameUpdate::Retained => 0,
        };
        let (enabled, top_edge) = {
            let p = self.projector.read();
            (p.is_enabled(), p.top_edge())
        };

        let title = format!(
            "fishtank | override {} | top {:?} | tracked {tracked}",
            if enabled { "on" } else { "off" },
            top_edge,
        );
        if title != self.title {
            ctx.window.set_title(&title);
            self.title = title;
        }
    }
}

impl App for ViewerApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_keys(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }
        self.drive_mouse_tracker(ctx);

        let update = self.session.update_frame();
        self.update_title(ctx, update);

        let aspect = ctx.viewport().aspect();
        let view_proj = self.camera.view_projection(aspect, &mut *self.projector.write());

        let (renderer, room) = (&mut self.renderer, &self.room);
        ctx.render(CLEAR, |rctx, target| {
            renderer.render(rctx, target, room, view_proj);
        })
    }

    fn on_exit(&mut self) {
        self.session.stop();
        log::info!(
            "received {} packets, applied {} events, dropped {}",
            self.session.stats().packets_received(),
            self.session.stats().events_applied(),
            self.session.stats().events_dropped(),
        );
    }
}

/// Maps the cursor onto an eye position in front of the window: the window
/// centre for a centred cursor, twice the window extent across the viewport.
fn mouse_eye(pointer: (f32, f32), viewport: (f32, f32), window: &WindowPlane) -> Vec3 {
    let nx = pointer.0 / viewport.0.max(1.0) - 0.5;
    let ny = 0.5 - pointer.1 / viewport.1.max(1.0);

    window.position
        + Vec3::new(
            -MOUSE_EYE_DISTANCE,
            nx * window.width * 2.0,
            window.height / 2.0 + ny * window.height * 2.0,
        )
}
