use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::projector::WindowFrustumProjector;

/// Projector shared between the frame update and the host pipeline of one context.
pub type SharedProjector = Arc<RwLock<WindowFrustumProjector>>;

/// Identifies one rendering context (a world, a window, a render graph...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

/// One projector per rendering context, held weakly.
///
/// The first request for a context creates its projector. Later requests share
/// it for as long as anyone holds a strong reference; once every holder has
/// dropped it, the next request builds a fresh one.
#[derive(Debug, Default)]
pub struct ProjectorRegistry {
    entries: Mutex<HashMap<ContextId, Weak<RwLock<WindowFrustumProjector>>>>,
}

impl ProjectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projector_for(&self, context: ContextId) -> SharedProjector {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(&context).and_then(Weak::upgrade) {
            return existing;
        }

        // Opportunistic cleanup of contexts whose projectors are gone.
        entries.retain(|_, weak| weak.strong_count() > 0);

        let projector = Arc::new(RwLock::new(WindowFrustumProjector::new()));
        entries.insert(context, Arc::downgrade(&projector));
        log::debug!("created projector for context {}", context.0);
        projector
    }

    /// Looks up a live projector without creating one.
    pub fn get(&self, context: ContextId) -> Option<SharedProjector> {
        self.entries.lock().get(&context).and_then(Weak::upgrade)
    }

    /// Number of contexts whose projector is still alive.
    pub fn live_contexts(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
