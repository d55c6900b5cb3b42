use glam::Vec3;

use crate::tracking::TrackedSource;

use super::error::IngestError;
use super::osc::OscArg;

pub const EYE_POSITION: &str = "eye-position";
pub const LOST: &str = "lost";
pub const GRAVITY: &str = "gravity";

/// Device id and method extracted from `/<router>/<device-id>/<method>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseAddress<'a> {
    pub device_id: &'a str,
    pub method: &'a str,
}

impl<'a> PoseAddress<'a> {
    /// The method is the last segment, the device id the second container.
    /// Containers past the device id are ignored.
    pub fn parse(address: &'a str) -> Result<Self, IngestError> {
        let malformed = || IngestError::MalformedAddress(address.to_string());

        let path = address.strip_prefix('/').ok_or_else(malformed)?;
        let (containers, method) = path.rsplit_once('/').ok_or_else(malformed)?;
        let device_id = containers.split('/').nth(1).ok_or_else(malformed)?;

        if device_id.is_empty() || method.is_empty() {
            return Err(malformed());
        }
        Ok(Self { device_id, method })
    }
}

/// A decoded pose update for one source. Vectors are in the device frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PoseEvent {
    EyePosition(Vec3),
    Lost,
    Gravity(Vec3),
}

impl PoseEvent {
    pub fn from_method(method: &str, args: &[OscArg]) -> Result<Self, IngestError> {
        match method {
            EYE_POSITION => vec3_arg(EYE_POSITION, args).map(PoseEvent::EyePosition),
            GRAVITY => vec3_arg(GRAVITY, args).map(PoseEvent::Gravity),
            LOST => Ok(PoseEvent::Lost),
            other => Err(IngestError::UnknownMethod(other.to_string())),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            PoseEvent::EyePosition(_) => EYE_POSITION,
            PoseEvent::Lost => LOST,
            PoseEvent::Gravity(_) => GRAVITY,
        }
    }

    /// Runs under the aggregator lock, so it must not log or do other I/O.
    ///
    /// Returns `true` when the event took the source from tracked to lost.
    pub fn apply(&self, source: &mut TrackedSource) -> bool {
        match *self {
            PoseEvent::EyePosition(local) => {
                source.set_eye_position(local);
                false
            }
            PoseEvent::Lost => {
                let was_tracked = source.is_tracked();
                source.set_tracked(false);
                was_tracked
            }
            PoseEvent::Gravity(gravity) => {
                source.set_orientation(gravity);
                false
            }
        }
    }
}

/// First three arguments as a vector; extra trailing arguments are ignored.
fn vec3_arg(method: &'static str, args: &[OscArg]) -> Result<Vec3, IngestError> {
    let bad = || IngestError::BadArguments { method, expected: 3, got: args.len() };

    let [x, y, z] = match args {
        [x, y, z, ..] => [x, y, z],
        _ => return Err(bad()),
    };
    let v = Vec3::new(
        x.as_f32().ok_or_else(bad)?,
        y.as_f32().ok_or_else(bad)?,
        z.as_f32().ok_or_else(bad)?,
    );

    if !v.is_finite() {
        return Err(bad());
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::SourceConfig;

    fn floats(values: &[f32]) -> Vec<OscArg> {
        values.iter().copied().map(OscArg::Float).collect()
    }

    // ── addressing ────────────────────────────────────────────────────────

    #[test]
    fn parses_tracker_address() {
        let addr = PoseAddress::parse("/face-tracker/phone-2/eye-position").unwrap();
        assert_eq!(addr.device_id, "phone-2");
        assert_eq!(addr.method, "eye-position");
    }

    #[test]
    fn extra_containers_are_ignored() {
        let addr = PoseAddress::parse("/face-tracker/7/left/gravity").unwrap();
        assert_eq!(addr.device_id, "7");
        assert_eq!(addr.method, "gravity");
    }

    #[test]
    fn too_few_containers_is_malformed() {
        for address in ["/lost", "/face-tracker/lost", "face-tracker/1/lost", "/face-tracker//lost"] {
            assert!(
                matches!(PoseAddress::parse(address), Err(IngestError::MalformedAddress(_))),
                "{address}"
            );
        }
    }

    // ── arguments ─────────────────────────────────────────────────────────

    #[test]
    fn eye_position_accepts_mixed_numeric_types() {
        let args = [OscArg::Int(1), OscArg::Double(2.5), OscArg::Float(-3.0), OscArg::Nil];
        let event = PoseEvent::from_method("eye-position", &args).unwrap();
        assert_eq!(event, PoseEvent::EyePosition(Vec3::new(1.0, 2.5, -3.0)));
    }

    #[test]
    fn short_argument_list_is_rejected() {
        let err = PoseEvent::from_method("gravity", &floats(&[0.0, 1.0])).unwrap_err();
        assert!(matches!(
            err,
            IngestError::BadArguments { method: "gravity", expected: 3, got: 2 }
        ));
    }

    #[test]
    fn non_numeric_argument_is_rejected() {
        let args = [OscArg::Float(0.0), OscArg::Str("up".into()), OscArg::Float(0.0)];
        assert!(matches!(
            PoseEvent::from_method("eye-position", &args),
            Err(IngestError::BadArguments { .. })
        ));
    }

    #[test]
    fn non_finite_sample_is_rejected() {
        let args = floats(&[f32::NAN, 0.0, 0.0]);
        assert!(PoseEvent::from_method("eye-position", &args).is_err());
    }

    #[test]
    fn lost_ignores_arguments() {
        assert_eq!(PoseEvent::from_method("lost", &floats(&[1.0])).unwrap(), PoseEvent::Lost);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(matches!(
            PoseEvent::from_method("blink", &[]),
            Err(IngestError::UnknownMethod(m)) if m == "blink"
        ));
    }

    // ── application ───────────────────────────────────────────────────────

    #[test]
    fn events_drive_source_state() {
        let mut source = TrackedSource::new(SourceConfig::new("a").location(Vec3::new(0.0, 5.0, 0.0)));

        assert!(!PoseEvent::EyePosition(Vec3::new(100.0, 0.0, 0.0)).apply(&mut source));
        assert!(source.is_tracked());
        assert_eq!(source.world_eye_position(), Vec3::new(100.0, 5.0, 0.0));

        assert!(PoseEvent::Lost.apply(&mut source));
        assert!(!source.is_tracked());
        assert!(!PoseEvent::Lost.apply(&mut source), "already lost");

        assert!(!PoseEvent::Gravity(Vec3::new(0.0, 1.0, 0.0)).apply(&mut source));
        assert!((source.rotation().roll + 90.0).abs() < 1e-4);
    }
}
