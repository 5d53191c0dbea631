// src/swath.rs
use crate::record::PingHeader;
use crate::types::{BathymetryPoint, BathymetrySwath, Pose};
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

/// Payload offset of beam 0's intensity sample.
///
/// Intensity slot `c` starts at `479 + 2c`, one byte before the half-way
/// point of a 240-beam payload, so it straddles two u16 cells. This is how
/// the sonar lays the samples out.
pub const INTENSITY_BASE_OFFSET: usize = 479;

/// Knobs applied while geocoding beams
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwathOptions {
    /// Rescale ranges by `sound_velocity / 1500` when the header reports a velocity
    pub sound_speed_correction: bool,
    /// Added to every beam angle when computing heights, degrees
    pub roll_bias_degrees: f64,
}

/// Turns a ping payload into vehicle-relative points.
pub struct SwathDecoder;

impl SwathDecoder {
    /// Decode every beam of `payload` (the bytes following the header).
    ///
    /// Beams whose range is zero, or whose range sample lies past the end of
    /// the payload, have no return and leave their slot empty.
    pub fn decode(
        header: &PingHeader,
        payload: &[u8],
        pose: &Pose,
        options: &SwathOptions,
    ) -> BathymetrySwath {
        let ranges = Self::beam_ranges(header, payload, options);
        let yaw = -pose.yaw;
        let (sin_yaw, cos_yaw) = yaw.sin_cos();

        let points = ranges
            .iter()
            .enumerate()
            .map(|(c, &range)| {
                if range == 0.0 {
                    return None;
                }
                let angle = beam_angle(header, c);
                let height = (range * (options.roll_bias_degrees + angle).to_radians().cos() + pose.depth) as f32;
                let x = range * angle.to_radians().sin();
                let point = BathymetryPoint::new((x * sin_yaw) as f32, (x * cos_yaw) as f32, height);

                Some(match intensity_at(header, payload, c) {
                    Some(intensity) => point.with_intensity(intensity),
                    None => point,
                })
            })
            .collect();

        BathymetrySwath {
            timestamp_ms: header.timestamp_ms,
            pose: *pose,
            points,
            num_beams: header.num_beams as usize,
        }
    }

    /// Range per beam in meters, sound-speed corrected when enabled.
    /// A zero marks a beam with no return.
    pub fn beam_ranges(header: &PingHeader, payload: &[u8], options: &SwathOptions) -> Vec<f64> {
        let resolution = header.range_resolution_mm as f64 / 1000.0;
        let sound_velocity = header.sound_velocity_mps();
        let correct = options.sound_speed_correction && sound_velocity != PingHeader::REFERENCE_SOUND_VELOCITY;

        (0..header.num_beams as usize)
            .map(|c| {
                let raw = payload
                    .get(c * 2..c * 2 + 2)
                    .map(BigEndian::read_u16)
                    .unwrap_or(0);
                let range = raw as f64 * resolution;
                if correct && range != 0.0 {
                    range * sound_velocity / PingHeader::REFERENCE_SOUND_VELOCITY
                } else {
                    range
                }
            })
            .collect()
    }
}

/// Beam angle in degrees
pub fn beam_angle(header: &PingHeader, beam: usize) -> f64 {
    header.start_angle + header.angle_increment * beam as f64
}

/// Intensity slot offset within the payload for `beam`
pub fn intensity_offset(beam: usize) -> usize {
    INTENSITY_BASE_OFFSET + beam * 2
}

fn intensity_at(header: &PingHeader, payload: &[u8], beam: usize) -> Option<u16> {
    if !header.has_intensity {
        return None;
    }
    let offset = intensity_offset(beam);
    payload.get(offset..offset + 2).map(BigEndian::read_u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(num_beams: u16, has_intensity: bool) -> PingHeader {
        let mut h = PingHeader::new(num_beams, has_intensity, 0);
        h.start_angle = -30.0;
        h.angle_increment = 20.0;
        h.range_resolution_mm = 10;
        h
    }

    fn payload(ranges: &[u16], len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        for (c, r) in ranges.iter().enumerate() {
            BigEndian::write_u16(&mut bytes[c * 2..], *r);
        }
        bytes
    }

    #[test]
    fn test_zero_range_has_no_point() {
        let h = header(4, false);
        let p = payload(&[1000, 0, 1000, 1000], 8);
        let swath = SwathDecoder::decode(&h, &p, &Pose::new(0, 0.0, 0.0, 0.0), &SwathOptions::default());
        assert_eq!(swath.points.len(), 4);
        assert!(swath.points[1].is_none());
        assert_eq!(swath.point_count(), 3);
    }

    #[test]
    fn test_height_formula() {
        let h = header(4, false);
        let p = payload(&[1000, 2000, 1500, 500], 8);
        let pose = Pose::new(0, 41.0, -8.0, 3.0).with_attitude(0.0, 0.0, 0.4);
        let options = SwathOptions { sound_speed_correction: false, roll_bias_degrees: 2.0 };
        let swath = SwathDecoder::decode(&h, &p, &pose, &options);

        for (c, raw) in [1000u16, 2000, 1500, 500].iter().enumerate() {
            let range = *raw as f64 * 0.01;
            let angle = -30.0 + 20.0 * c as f64;
            let point = swath.points[c].unwrap();
            let expected_height = range * (2.0 + angle).to_radians().cos() + 3.0;
            let x = range * angle.to_radians().sin();
            assert!((point.height as f64 - expected_height).abs() < 1e-4);
            assert!((point.along_track as f64 - x * (-0.4f64).sin()).abs() < 1e-4);
            assert!((point.cross_track as f64 - x * (-0.4f64).cos()).abs() < 1e-4);
            assert_eq!(point.intensity, None);
            assert_eq!(point.intensity_max, 65535);
        }
    }

    #[test]
    fn test_sound_speed_correction() {
        let mut h = header(1, false);
        h.sound_velocity = Some(1530.0);
        let p = payload(&[1000], 2);

        let plain = SwathDecoder::beam_ranges(&h, &p, &SwathOptions::default());
        assert!((plain[0] - 10.0).abs() < 1e-9);

        let options = SwathOptions { sound_speed_correction: true, roll_bias_degrees: 0.0 };
        let corrected = SwathDecoder::beam_ranges(&h, &p, &options);
        assert!((corrected[0] - 10.0 * 1530.0 / 1500.0).abs() < 1e-9);

        // Reference velocity leaves ranges alone
        h.sound_velocity = None;
        assert_eq!(SwathDecoder::beam_ranges(&h, &p, &options), plain);
    }

    #[test]
    fn test_intensity_slot_quirk() {
        let h = header(240, true);
        let mut p = payload(&[100; 240], 960);
        p[479] = 0x12;
        p[480] = 0x34;
        let swath = SwathDecoder::decode(&h, &p, &Pose::new(0, 0.0, 0.0, 0.0), &SwathOptions::default());
        assert_eq!(swath.points[0].unwrap().intensity, Some(0x1234));
        assert_eq!(intensity_offset(239), 957);
    }

    #[test]
    fn test_intensity_outside_payload() {
        // 4 beams with intensity: 16 payload bytes, slot 0 sits at 479
        let h = header(4, true);
        let p = payload(&[100, 100, 100, 100], 16);
        let swath = SwathDecoder::decode(&h, &p, &Pose::new(0, 0.0, 0.0, 0.0), &SwathOptions::default());
        assert!(swath.valid_points().all(|pt| pt.intensity.is_none()));
        assert_eq!(swath.point_count(), 4);
    }

    #[test]
    fn test_short_payload_has_no_returns() {
        let h = header(4, false);
        let swath = SwathDecoder::decode(&h, &[0x03, 0xE8], &Pose::new(0, 0.0, 0.0, 0.0), &SwathOptions::default());
        assert_eq!(swath.point_count(), 1);
        assert_eq!(swath.num_beams, 4);
    }
}
