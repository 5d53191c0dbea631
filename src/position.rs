// src/position.rs
use crate::record::PingHeader;
use crate::types::{Pose, PoseSource, UNKNOWN_DEPTH};
use crate::utils::coord::{lat_from_83p, lon_from_83p};
use log::debug;

/// Source of vehicle pose for a ping time.
///
/// `None` is an ordinary answer: the ping is then placed with the sonar's own
/// GNSS fix (see [`fallback_pose`]). Implementations may block on I/O.
pub trait PositionResolver {
    fn position_at(&mut self, timestamp_seconds: f64) -> Option<Pose>;
}

impl<P: PositionResolver + ?Sized> PositionResolver for &mut P {
    fn position_at(&mut self, timestamp_seconds: f64) -> Option<Pose> {
        (**self).position_at(timestamp_seconds)
    }
}

impl<P: PositionResolver + ?Sized> PositionResolver for Box<P> {
    fn position_at(&mut self, timestamp_seconds: f64) -> Option<Pose> {
        (**self).position_at(timestamp_seconds)
    }
}

/// A resolver that never knows where the vehicle is
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNavigation;

impl PositionResolver for NoNavigation {
    fn position_at(&mut self, _timestamp_seconds: f64) -> Option<Pose> {
        None
    }
}

/// In-memory navigation track.
///
/// Answers with the pose closest in time, as long as it lies within
/// `max_gap_ms` of the request.
#[derive(Debug, Clone)]
pub struct PoseTrack {
    poses: Vec<Pose>,
    max_gap_ms: i64,
}

impl PoseTrack {
    pub fn new(mut poses: Vec<Pose>, max_gap_ms: i64) -> Self {
        poses.sort_by_key(|p| p.time_ms);
        PoseTrack { poses, max_gap_ms }
    }

    pub fn push(&mut self, pose: Pose) {
        let at = self.poses.partition_point(|p| p.time_ms <= pose.time_ms);
        self.poses.insert(at, pose);
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    fn nearest(&self, time_ms: i64) -> Option<&Pose> {
        let at = self.poses.partition_point(|p| p.time_ms < time_ms);
        let before = at.checked_sub(1).and_then(|i| self.poses.get(i));
        let after = self.poses.get(at);

        let best = match (before, after) {
            (Some(b), Some(a)) => {
                if time_ms - b.time_ms <= a.time_ms - time_ms {
                    b
                } else {
                    a
                }
            }
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => return None,
        };

        ((best.time_ms - time_ms).abs() <= self.max_gap_ms).then_some(best)
    }
}

impl PositionResolver for PoseTrack {
    fn position_at(&mut self, timestamp_seconds: f64) -> Option<Pose> {
        let time_ms = (timestamp_seconds * 1000.0).round() as i64;
        self.nearest(time_ms).copied()
    }
}

/// Pose assembled from the ping header alone.
///
/// Position comes from the header's GNSS strings (0, 0 when they cannot be
/// read), attitude from the orientation module. Depth is unknown.
pub fn fallback_pose(header: &PingHeader, time_ms: i64) -> Pose {
    let latitude = lat_from_83p(&header.gnss_latitude);
    let longitude = lon_from_83p(&header.gnss_longitude);
    if latitude.is_none() || longitude.is_none() {
        debug!(
            "Unreadable sonar GNSS fix {:?} {:?} at {}",
            header.gnss_latitude, header.gnss_longitude, time_ms
        );
    }

    debug!("No position found on navigation at {}, using partial data from sonar", time_ms);

    Pose {
        time_ms,
        latitude_deg: latitude.unwrap_or(0.0),
        longitude_deg: longitude.unwrap_or(0.0),
        depth: UNKNOWN_DEPTH,
        altitude: header.altitude as f64,
        roll: header.roll_degrees().to_radians(),
        pitch: header.pitch_degrees().to_radians(),
        yaw: header.heading_degrees().to_radians(),
        source: PoseSource::SonarHeader,
    }
}

/// Ask `resolver` for the pose at `time_ms`, falling back to the header
pub fn resolve_pose<P: PositionResolver + ?Sized>(resolver: &mut P, header: &PingHeader, time_ms: i64) -> Pose {
    match resolver.position_at(time_ms as f64 / 1000.0) {
        Some(pose) => pose,
        None => fallback_pose(header, time_ms),
    }
}
