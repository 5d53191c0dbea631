// src/utils/coord.rs
//! 83P coordinate strings and WGS-84 offsets.
//!
//! The sonar writes its GNSS fix as `" dd.mm.xxxxx N"` and
//! `"ddd.mm.xxxxx E"`: whole degrees, whole minutes, then five digits of
//! decimal minutes and the hemisphere letter.

/// WGS-84 semi-major axis, meters
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared
const WGS84_E2: f64 = 0.00669438;

const FRACTION_DIGITS: i64 = 100_000;

/// Parse an 83P latitude string into signed decimal degrees
pub fn lat_from_83p(value: &str) -> Option<f64> {
    parse_83p(value)
}

/// Parse an 83P longitude string into signed decimal degrees
pub fn lon_from_83p(value: &str) -> Option<f64> {
    parse_83p(value)
}

fn parse_83p(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value
        .trim()
        .split(|c: char| c == '.' || c == ' ')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 4 {
        return None;
    }

    let degrees: f64 = parts[0].parse().ok()?;
    let minutes: f64 = format!("{}.{}", parts[1], parts[2]).parse().ok()?;
    let sign = match parts[3] {
        "N" | "E" | "n" | "e" => 1.0,
        "S" | "W" | "s" | "w" => -1.0,
        _ => return None,
    };
    Some(sign * (degrees + minutes / 60.0))
}

pub fn lat_to_83p(lat_deg: f64) -> String {
    let (deg, min, frac) = split_minutes(lat_deg);
    let hemisphere = if lat_deg < 0.0 { 'S' } else { 'N' };
    format!(" {deg:02}.{min:02}.{frac:05} {hemisphere}")
}

pub fn lon_to_83p(lon_deg: f64) -> String {
    let (deg, min, frac) = split_minutes(lon_deg);
    let hemisphere = if lon_deg < 0.0 { 'W' } else { 'E' };
    format!("{deg:03}.{min:02}.{frac:05} {hemisphere}")
}

fn split_minutes(value: f64) -> (i64, i64, i64) {
    let total = (value.abs() * 60.0 * FRACTION_DIGITS as f64).round() as i64;
    let per_degree = 60 * FRACTION_DIGITS;
    let rest = total % per_degree;
    (total / per_degree, rest / FRACTION_DIGITS, rest % FRACTION_DIGITS)
}

/// Move a geodetic point by `north`/`east` meters on the WGS-84 ellipsoid.
///
/// Works through ECEF, so the result stays consistent for large offsets.
pub fn wgs84_displace(lat_deg: f64, lon_deg: f64, north: f64, east: f64) -> (f64, f64) {
    let (mut x, mut y, mut z) = to_ecef(lat_deg.to_radians(), lon_deg.to_radians(), 0.0);

    let phi = z.atan2((x * x + y * y).sqrt());
    let (sphi, cphi) = phi.sin_cos();
    let (slon, clon) = lon_deg.to_radians().sin_cos();

    x += -slon * east - clon * sphi * north;
    y += clon * east - slon * sphi * north;
    z += cphi * north;

    let (lat, lon) = to_geodetic(x, y, z);
    (lat.to_degrees(), lon.to_degrees())
}

fn n_rad(lat: f64) -> f64 {
    let s = lat.sin();
    WGS84_A / (1.0 - WGS84_E2 * s * s).sqrt()
}

fn to_ecef(lat: f64, lon: f64, depth: f64) -> (f64, f64, f64) {
    let rn = n_rad(lat);
    let (slat, clat) = lat.sin_cos();
    let (slon, clon) = lon.sin_cos();
    (
        (rn - depth) * clat * clon,
        (rn - depth) * clat * slon,
        ((1.0 - WGS84_E2) * rn - depth) * slat,
    )
}

fn to_geodetic(x: f64, y: f64, z: f64) -> (f64, f64) {
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);
    let mut lat = (z / p).atan2(0.01);
    let mut n = n_rad(lat);
    let mut h = p / lat.cos() - n;
    let mut old_h = -1e9;

    let mut iterations = 0;
    while (h - old_h).abs() > 1e-4 && iterations < 100 {
        old_h = h;
        let den = 1.0 - WGS84_E2 * n / (n + h);
        lat = (z / p).atan2(den);
        n = n_rad(lat);
        h = p / lat.cos() - n;
        iterations += 1;
    }
    (lat, lon)
}
