use std::f64::consts::{FRAC_PI_2, PI};

use crate::model::Point;

/// 地球の平均半径（メートル）
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearing {
    North,
    East,
    South,
    West,
}

impl Bearing {
    pub fn radians(&self) -> f64 {
        match self {
            Bearing::North => 0.0,
            Bearing::East => FRAC_PI_2,
            Bearing::South => PI,
            Bearing::West => PI + FRAC_PI_2,
        }
    }
}

/// 球面上で、起点から指定方位に指定距離（メートル）進んだ地点を求める
pub fn destination_point(origin: Point, distance_m: f64, bearing: Bearing) -> Point {
    let lat = origin.lat.to_radians();
    let lon = origin.lon.to_radians();
    let brng = bearing.radians();
    let d = distance_m / EARTH_RADIUS_M;

    let dest_lat = (lat.sin() * d.cos() + lat.cos() * d.sin() * brng.cos()).asin();
    let dest_lon = lon
        + (brng.sin() * d.sin() * lat.cos()).atan2(d.cos() - lat.sin() * dest_lat.sin());

    Point::new(dest_lon.to_degrees(), dest_lat.to_degrees())
}

/// 2点間の大円距離（メートル）
pub fn haversine_distance(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
