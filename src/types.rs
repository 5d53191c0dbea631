// src/types.rs
use serde::{Deserialize, Serialize};

/// Depth reported for poses that were not resolved from navigation.
pub const UNKNOWN_DEPTH: f64 = -1.0;

/// Declared maximum of an intensity sample.
pub const INTENSITY_MAX: u16 = u16::MAX;

/// Where the pose attached to a swath came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseSource {
    /// Answered by the [`PositionResolver`](crate::position::PositionResolver)
    Navigation,
    /// Built from the ping header's own GNSS fix and orientation module.
    /// Depth is unknown and accuracy is degraded.
    SonarHeader,
}

/// Vehicle position and attitude at a ping.
///
/// Angles are in radians, depth and altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Epoch milliseconds, UTC
    pub time_ms: i64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub depth: f64,
    pub altitude: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub source: PoseSource,
}

impl Pose {
    /// A navigation pose with level attitude
    pub fn new(time_ms: i64, latitude_deg: f64, longitude_deg: f64, depth: f64) -> Self {
        Pose {
            time_ms,
            latitude_deg,
            longitude_deg,
            depth,
            altitude: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            source: PoseSource::Navigation,
        }
    }

    pub fn with_attitude(mut self, roll: f64, pitch: f64, yaw: f64) -> Self {
        self.roll = roll;
        self.pitch = pitch;
        self.yaw = yaw;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.source == PoseSource::SonarHeader
    }
}

/// One geocoded beam return, relative to the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BathymetryPoint {
    pub along_track: f32,
    pub cross_track: f32,
    pub height: f32,
    pub intensity: Option<u16>,
    pub intensity_max: u16,
}

impl BathymetryPoint {
    pub fn new(along_track: f32, cross_track: f32, height: f32) -> Self {
        BathymetryPoint {
            along_track,
            cross_track,
            height,
            intensity: None,
            intensity_max: INTENSITY_MAX,
        }
    }

    pub fn with_intensity(mut self, intensity: u16) -> Self {
        self.intensity = Some(intensity);
        self
    }
}

/// All points decoded from one ping.
///
/// `points` has one slot per beam; `None` marks a beam without a return.
#[derive(Debug, Clone, PartialEq)]
pub struct BathymetrySwath {
    pub timestamp_ms: i64,
    pub pose: Pose,
    pub points: Vec<Option<BathymetryPoint>>,
    pub num_beams: usize,
}

impl BathymetrySwath {
    /// Iterate over the beams that produced a point
    pub fn valid_points(&self) -> impl Iterator<Item = &BathymetryPoint> {
        self.points.iter().flatten()
    }

    pub fn point_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

/// Processing flags stored in header byte 123
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionFlags(u8);

impl OptionFlags {
    pub const ROLL_CORRECTED: u8 = 1 << 0;
    pub const RAY_BENDING_CORRECTED: u8 = 1 << 1;
    pub const OVERLAPPED_MODE: u8 = 1 << 2;

    pub fn new(flags: u8) -> Self {
        OptionFlags(flags)
    }

    pub fn empty() -> Self {
        OptionFlags(0)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }

    pub fn is_roll_corrected(&self) -> bool {
        self.0 & Self::ROLL_CORRECTED != 0
    }

    pub fn is_ray_bending_corrected(&self) -> bool {
        self.0 & Self::RAY_BENDING_CORRECTED != 0
    }

    pub fn is_overlapped_mode(&self) -> bool {
        self.0 & Self::OVERLAPPED_MODE != 0
    }

    pub fn set_roll_corrected(&mut self, value: bool) {
        self.set(Self::ROLL_CORRECTED, value);
    }

    pub fn set_ray_bending_corrected(&mut self, value: bool) {
        self.set(Self::RAY_BENDING_CORRECTED, value);
    }

    pub fn set_overlapped_mode(&mut self, value: bool) {
        self.set(Self::OVERLAPPED_MODE, value);
    }

    fn set(&mut self, bit: u8, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}
