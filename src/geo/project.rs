//! Spherical (Web) Mercator projection shared by markers, clustering and
//! search re-centering. Geographic degrees are projected to meters exactly
//! once; everything downstream works in projected coordinates.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitudes beyond this fold into the projection's singularity.
const MAX_LATITUDE_DEG: f64 = 85.051_128_779_806_59;

/// A position in Web Mercator meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub fn distance(self, other: WorldPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub fn from_lon_lat(lon: f64, lat: f64) -> WorldPos {
    let lat = lat.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG);
    let d = PI / 180.0;
    WorldPos {
        x: EARTH_RADIUS_M * lon * d,
        y: EARTH_RADIUS_M * (FRAC_PI_4 + (lat * d) / 2.0).tan().ln(),
    }
}

pub fn to_lon_lat(pos: WorldPos) -> (f64, f64) {
    let d = 180.0 / PI;
    (
        pos.x / EARTH_RADIUS_M * d,
        (2.0 * (pos.y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2) * d,
    )
}

/// Map units (meters) per screen pixel at a zoom level, following the usual
/// 256px Web Mercator tile pyramid.
pub fn resolution_at_zoom(zoom: f64) -> f64 {
    let base = 2.0 * PI * EARTH_RADIUS_M / 256.0;
    base / 2f64.powf(zoom)
}
