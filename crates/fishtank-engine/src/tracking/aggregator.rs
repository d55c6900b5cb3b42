use std::time::{Duration, Instant};

use glam::Vec3;
use parking_lot::Mutex;

use super::error::TrackingError;
use super::source::{DeviceId, SourceConfig, TrackedSource};

/// Receipt for a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    device_id: DeviceId,
}

impl SourceHandle {
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

/// Result of fusing every tracked source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FusedEye {
    /// Per-axis weighted mean of the contributing eye positions.
    pub position: Vec3,

    /// Number of sources that contributed.
    pub contributors: usize,
}

/// Thread-safe registry of tracking sources.
///
/// Every read or write of source state, and the whole of `fuse`, runs under a
/// single mutex, so a fused result never mixes fields from before and after
/// one source's update.
#[derive(Debug, Default)]
pub struct EyePositionAggregator {
    sources: Mutex<Vec<TrackedSource>>,
    stale_after: Option<Duration>,
}

impl EyePositionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources whose last eye sample is older than `stale_after` are treated as lost.
    pub fn with_staleness(stale_after: Option<Duration>) -> Self {
        Self {
            sources: Mutex::new(Vec::new()),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after
    }

    pub fn register(&self, config: SourceConfig) -> Result<SourceHandle, TrackingError> {
        let mut sources = self.sources.lock();
        if sources.iter().any(|s| *s.device_id() == config.device_id) {
            return Err(TrackingError::DuplicateDevice(config.device_id.to_string()));
        }

        let handle = SourceHandle { device_id: config.device_id.clone() };
        sources.push(TrackedSource::new(config));
        drop(sources);

        log::debug!("registered tracking source `{}`", handle.device_id);
        Ok(handle)
    }

    pub fn unregister(&self, device_id: &str) -> Result<TrackedSource, TrackingError> {
        let mut sources = self.sources.lock();
        let index = position_of(&sources, device_id)?;
        Ok(sources.remove(index))
    }

    /// Runs `f` on one source while holding the registry lock.
    pub fn update<R>(
        &self,
        device_id: &str,
        f: impl FnOnce(&mut TrackedSource) -> R,
    ) -> Result<R, TrackingError> {
        let mut sources = self.sources.lock();
        let index = position_of(&sources, device_id)?;
        Ok(f(&mut sources[index]))
    }

    /// Copy of one source's state.
    pub fn snapshot(&self, device_id: &str) -> Result<TrackedSource, TrackingError> {
        let sources = self.sources.lock();
        let index = position_of(&sources, device_id)?;
        Ok(sources[index].clone())
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.sources.lock().iter().any(|s| s.device_id().as_str() == device_id)
    }

    pub fn len(&self) -> usize {
        self.sources.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracked_count(&self) -> usize {
        self.sources.lock().iter().filter(|s| s.is_tracked()).count()
    }

    /// Fused eye position, or `None` when no source is tracked.
    pub fn fuse(&self) -> Option<FusedEye> {
        self.fuse_at(Instant::now())
    }

    /// `fuse` evaluated against an explicit clock reading.
    pub fn fuse_at(&self, now: Instant) -> Option<FusedEye> {
        let mut sources = self.sources.lock();

        let mut sum = Vec3::ZERO;
        let mut weights = Vec3::ZERO;
        let mut contributors = 0;
        let mut expired = Vec::new();

        for source in sources.iter_mut() {
            if !source.is_tracked() {
                continue;
            }
            if self.is_stale(source, now) {
                source.set_tracked(false);
                expired.push(source.device_id().clone());
                continue;
            }

            // Uniform for now; the per-axis division below already handles other weights.
            let weight = Vec3::ONE;
            sum += weight * source.world_eye_position();
            weights += weight;
            contributors += 1;
        }
        drop(sources);

        // Logging may block on stderr; never under the lock.
        for device_id in &expired {
            log::info!("tracking source `{device_id}` expired");
        }

        if contributors == 0 {
            return None;
        }

        Some(FusedEye {
            position: sum / weights,
            contributors,
        })
    }

    fn is_stale(&self, source: &TrackedSource, now: Instant) -> bool {
        match (self.stale_after, source.last_sample()) {
            (Some(limit), Some(at)) => now.saturating_duration_since(at) > limit,
            _ => false,
        }
    }
}

fn position_of(sources: &[TrackedSource], device_id: &str) -> Result<usize, TrackingError> {
    sources
        .iter()
        .position(|s| s.device_id().as_str() == device_id)
        .ok_or_else(|| TrackingError::UnknownDevice(device_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn aggregator(ids: &[&str]) -> EyePositionAggregator {
        let agg = EyePositionAggregator::new();
        for id in ids {
            agg.register(SourceConfig::new(*id)).unwrap();
        }
        agg
    }

    fn track(agg: &EyePositionAggregator, id: &str, p: Vec3) {
        agg.update(id, |s| s.set_eye_position(p)).unwrap();
    }

    // ── registry ──────────────────────────────────────────────────────────

    #[test]
    fn register_returns_handle_for_device() {
        let agg = EyePositionAggregator::new();
        let handle = agg.register(SourceConfig::new("phone")).unwrap();
        assert_eq!(handle.device_id().as_str(), "phone");
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let agg = aggregator(&["a"]);
        assert_eq!(
            agg.register(SourceConfig::new("a")),
            Err(TrackingError::DuplicateDevice("a".into()))
        );
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn update_of_unknown_device_fails() {
        let agg = aggregator(&["a"]);
        let err = agg.update("ghost", |s| s.set_tracked(true)).unwrap_err();
        assert_eq!(err, TrackingError::UnknownDevice("ghost".into()));
        assert!(!agg.snapshot("a").unwrap().is_tracked());
    }

    #[test]
    fn unregister_removes_source() {
        let agg = aggregator(&["a", "b"]);
        let removed = agg.unregister("a").unwrap();
        assert_eq!(removed.device_id().as_str(), "a");
        assert!(!agg.contains("a"));
        assert!(agg.contains("b"));
        assert!(agg.unregister("a").is_err());
    }

    // ── fusion ────────────────────────────────────────────────────────────

    #[test]
    fn nothing_tracked_fuses_to_none() {
        let agg = aggregator(&["a", "b"]);
        assert_eq!(agg.fuse(), None);
        assert_eq!(EyePositionAggregator::new().fuse(), None);
    }

    #[test]
    fn fusion_is_arithmetic_mean() {
        let agg = aggregator(&["a", "b", "c"]);
        track(&agg, "a", Vec3::new(0.0, 3.0, 9.0));
        track(&agg, "b", Vec3::new(6.0, 0.0, 0.0));
        track(&agg, "c", Vec3::new(3.0, 6.0, 3.0));

        let fused = agg.fuse().unwrap();
        assert_eq!(fused.contributors, 3);
        assert_abs_diff_eq!(fused.position, Vec3::new(3.0, 3.0, 4.0), epsilon = 1e-5);
    }

    #[test]
    fn untracked_source_never_contributes() {
        let agg = aggregator(&["a", "b"]);
        track(&agg, "a", Vec3::new(10.0, 10.0, 10.0));
        track(&agg, "b", Vec3::new(1.0e6, -1.0e6, 1.0e6));
        agg.update("b", |s| s.set_tracked(false)).unwrap();

        let fused = agg.fuse().unwrap();
        assert_eq!(fused.contributors, 1);
        assert_eq!(fused.position, Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(agg.tracked_count(), 1);
    }

    #[test]
    fn lost_then_fuse_follows_remaining_source() {
        let agg = aggregator(&["a", "b"]);
        track(&agg, "a", Vec3::new(100.0, 10.0, 0.0));
        track(&agg, "b", Vec3::new(100.0, -10.0, 0.0));
        assert_eq!(agg.fuse().unwrap().position, Vec3::new(100.0, 0.0, 0.0));

        agg.update("a", |s| s.set_tracked(false)).unwrap();
        assert_eq!(agg.fuse().unwrap().position, Vec3::new(100.0, -10.0, 0.0));
    }

    // ── staleness ─────────────────────────────────────────────────────────

    #[test]
    fn without_policy_sources_never_expire() {
        let agg = aggregator(&["a"]);
        track(&agg, "a", Vec3::X);
        let much_later = Instant::now() + Duration::from_secs(3600);
        assert!(agg.fuse_at(much_later).is_some());
    }

    #[test]
    fn stale_source_is_dropped_and_marked_lost() {
        let agg = EyePositionAggregator::with_staleness(Some(Duration::from_millis(500)));
        agg.register(SourceConfig::new("a")).unwrap();
        agg.register(SourceConfig::new("b")).unwrap();

        let t0 = Instant::now();
        agg.update("a", |s| s.set_eye_position_at(Vec3::X, t0)).unwrap();
        agg.update("b", |s| s.set_eye_position_at(Vec3::Y, t0 + Duration::from_secs(2))).unwrap();

        let fused = agg.fuse_at(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(fused.contributors, 1);
        assert_eq!(fused.position, Vec3::Y);
        assert!(!agg.snapshot("a").unwrap().is_tracked());
    }

    #[test]
    fn fresh_sample_revives_expired_source() {
        let agg = EyePositionAggregator::with_staleness(Some(Duration::from_millis(100)));
        agg.register(SourceConfig::new("a")).unwrap();
        let t0 = Instant::now();
        agg.update("a", |s| s.set_eye_position_at(Vec3::X, t0)).unwrap();
        assert!(agg.fuse_at(t0 + Duration::from_secs(1)).is_none());

        agg.update("a", |s| s.set_eye_position_at(Vec3::Z, t0 + Duration::from_secs(1))).unwrap();
        assert_eq!(agg.fuse_at(t0 + Duration::from_secs(1)).unwrap().position, Vec3::Z);
    }
}
