//! Output coordinate reference systems.
//!
//! Bounding boxes are stored in WGS84 longitude/latitude and converted to the
//! caller's CRS when rows are built. Search boxes given in another CRS are
//! converted back to WGS84 before filtering.

use std::{
    f64::consts::{FRAC_PI_2, FRAC_PI_4},
    fmt,
};

use serde::{Deserialize, Serialize};

/// URI prefix of EPSG coordinate reference systems.
pub const EPSG_URI_PREFIX: &str = "http://www.opengis.net/def/crs/EPSG/0/";

/// WGS84 equatorial radius in metres, used by spherical Web Mercator.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of Web Mercator.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Supported output reference systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Srid {
    /// EPSG:4326 (and CRS84), longitude/latitude in degrees.
    #[default]
    Wgs84,
    /// EPSG:3857, spherical Web Mercator in metres.
    WebMercator,
    /// EPSG:28992, Amersfoort / RD New in metres.
    RdNew,
}

impl Srid {
    /// Looks up a supported EPSG code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            4326 => Some(Self::Wgs84),
            3857 => Some(Self::WebMercator),
            28992 => Some(Self::RdNew),
            _ => None,
        }
    }

    /// The EPSG code.
    pub fn code(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
            Self::RdNew => 28992,
        }
    }

    /// The OGC URI of this reference system.
    pub fn uri(self) -> String {
        format!("{EPSG_URI_PREFIX}{}", self.code())
    }

    /// Converts a WGS84 longitude/latitude pair.
    pub fn project(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Self::Wgs84 => (lon, lat),
            Self::WebMercator => web_mercator(lon, lat),
            Self::RdNew => rd_new(lon, lat),
        }
    }

    /// Converts a coordinate pair in this system back to WGS84 longitude/latitude.
    pub fn unproject(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Wgs84 => (x, y),
            Self::WebMercator => web_mercator_inverse(x, y),
            Self::RdNew => rd_new_inverse(x, y),
        }
    }
}

impl fmt::Display for Srid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.code())
    }
}

/// Spherical Web Mercator forward projection.
fn web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Spherical Web Mercator inverse projection.
fn web_mercator_inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// RD New from WGS84 using the Schreutelkamp/Strang van Hees polynomial.
///
/// Accurate to about a metre inside the Netherlands; meaningless far outside it.
fn rd_new(lon: f64, lat: f64) -> (f64, f64) {
    const PHI0: f64 = 52.155_174_40;
    const LAM0: f64 = 5.387_206_21;
    const X0: f64 = 155_000.0;
    const Y0: f64 = 463_000.0;

    // (p, q, coefficient) for dphi^p * dlam^q.
    const R: [(i32, i32, f64); 9] = [
        (0, 1, 190_094.945),
        (1, 1, -11_832.228),
        (2, 1, -114.221),
        (0, 3, -32.391),
        (1, 0, -0.705),
        (3, 1, -2.340),
        (1, 3, -0.608),
        (0, 2, -0.008),
        (2, 3, 0.148),
    ];
    const S: [(i32, i32, f64); 10] = [
        (1, 0, 309_056.544),
        (0, 2, 3_638.893),
        (2, 0, 73.077),
        (1, 2, -157.984),
        (3, 0, 59.788),
        (0, 1, 0.433),
        (2, 2, -6.439),
        (1, 1, -0.032),
        (0, 4, 0.092),
        (1, 4, -0.054),
    ];

    let dphi = 0.36 * (lat - PHI0);
    let dlam = 0.36 * (lon - LAM0);
    let sum = |terms: &[(i32, i32, f64)]| -> f64 {
        terms
            .iter()
            .map(|&(p, q, c)| c * dphi.powi(p) * dlam.powi(q))
            .sum()
    };

    (X0 + sum(&R), Y0 + sum(&S))
}

/// WGS84 from RD New, the inverse polynomial of [`rd_new`].
fn rd_new_inverse(x: f64, y: f64) -> (f64, f64) {
    const PHI0: f64 = 52.155_174_40;
    const LAM0: f64 = 5.387_206_21;
    const X0: f64 = 155_000.0;
    const Y0: f64 = 463_000.0;

    // (p, q, coefficient) for dx^p * dy^q, in arcseconds.
    const K: [(i32, i32, f64); 11] = [
        (0, 1, 3_235.653_89),
        (2, 0, -32.582_97),
        (0, 2, -0.247_50),
        (2, 1, -0.849_78),
        (0, 3, -0.065_50),
        (2, 2, -0.017_09),
        (1, 0, -0.007_38),
        (4, 0, 0.005_30),
        (2, 3, -0.000_39),
        (4, 1, 0.000_33),
        (1, 1, -0.000_12),
    ];
    const L: [(i32, i32, f64); 12] = [
        (1, 0, 5_260.529_16),
        (1, 1, 105.946_84),
        (1, 2, 2.456_56),
        (3, 0, -0.818_85),
        (1, 3, 0.055_94),
        (3, 1, -0.056_07),
        (0, 1, 0.011_99),
        (3, 2, -0.002_56),
        (1, 4, 0.001_28),
        (0, 2, 0.000_22),
        (2, 0, -0.000_22),
        (5, 0, 0.000_26),
    ];

    let dx = (x - X0) * 1e-5;
    let dy = (y - Y0) * 1e-5;
    let sum = |terms: &[(i32, i32, f64)]| -> f64 {
        terms
            .iter()
            .map(|&(p, q, c)| c * dx.powi(p) * dy.powi(q))
            .sum()
    };

    (LAM0 + sum(&L) / 3600.0, PHI0 + sum(&K) / 3600.0)
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Minimum x (longitude in WGS84).
    pub min_x: f64,
    /// Minimum y (latitude in WGS84).
    pub min_y: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
}

impl BBox {
    /// Reprojects a WGS84 box by converting all four corners.
    pub fn reproject(&self, srid: Srid) -> Self {
        if srid == Srid::Wgs84 {
            return *self;
        }
        self.map_corners(|x, y| srid.project(x, y))
    }

    /// Converts a box given in `srid` to WGS84.
    pub fn to_wgs84(&self, srid: Srid) -> Self {
        if srid == Srid::Wgs84 {
            return *self;
        }
        self.map_corners(|x, y| srid.unproject(x, y))
    }

    /// True if the box encloses a positive area.
    pub fn has_area(&self) -> bool {
        (self.max_x - self.min_x) * (self.max_y - self.min_y) > 0.0
    }

    /// The envelope of the four corners after `convert`.
    fn map_corners(&self, convert: impl Fn(f64, f64) -> (f64, f64)) -> Self {
        let corners = [
            convert(self.min_x, self.min_y),
            convert(self.min_x, self.max_y),
            convert(self.max_x, self.min_y),
            convert(self.max_x, self.max_y),
        ];
        corners.iter().skip(1).fold(
            Self {
                min_x: corners[0].0,
                min_y: corners[0].1,
                max_x: corners[0].0,
                max_y: corners[0].1,
            },
            |acc, &(x, y)| Self {
                min_x: acc.min_x.min(x),
                min_y: acc.min_y.min(y),
                max_x: acc.max_x.max(x),
                max_y: acc.max_y.max(y),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn codes_round_trip() {
        for srid in [Srid::Wgs84, Srid::WebMercator, Srid::RdNew] {
            assert_eq!(Srid::from_code(srid.code()), Some(srid));
        }
        assert_eq!(Srid::from_code(4258), None);
        assert_eq!(
            Srid::RdNew.uri(),
            "http://www.opengis.net/def/crs/EPSG/0/28992"
        );
    }

    #[test]
    fn wgs84_is_identity() {
        assert_eq!(Srid::Wgs84.project(4.9, 52.37), (4.9, 52.37));
    }

    #[test]
    fn web_mercator_origin_and_extent() {
        let (x, y) = Srid::WebMercator.project(0.0, 0.0);
        assert!(close(x, 0.0, 1e-6) && close(y, 0.0, 1e-6));

        let (x, _) = Srid::WebMercator.project(180.0, 0.0);
        assert!(close(x, 20_037_508.342_789_244, 1e-3));

        let (_, y) = Srid::WebMercator.project(0.0, 90.0);
        assert!(y.is_finite());
    }

    #[test]
    fn rd_new_reference_point() {
        let (x, y) = Srid::RdNew.project(5.387_206_21, 52.155_174_40);
        assert!(close(x, 155_000.0, 1e-6));
        assert!(close(y, 463_000.0, 1e-6));
    }

    #[test]
    fn rd_new_dam_square() {
        // Dam, Amsterdam: roughly (121 400, 487 400) in RD.
        let (x, y) = Srid::RdNew.project(4.8932, 52.3731);
        assert!(close(x, 121_400.0, 300.0), "x = {x}");
        assert!(close(y, 487_400.0, 300.0), "y = {y}");
    }

    #[test]
    fn bbox_reprojection_keeps_ordering() {
        let bbox = BBox {
            min_x: 4.88,
            min_y: 52.36,
            max_x: 4.90,
            max_y: 52.38,
        };
        for srid in [Srid::WebMercator, Srid::RdNew] {
            let out = bbox.reproject(srid);
            assert!(out.min_x < out.max_x, "{srid}");
            assert!(out.min_y < out.max_y, "{srid}");
        }
        assert_eq!(bbox.reproject(Srid::Wgs84), bbox);
    }

    #[test]
    fn unproject_inverts_project() {
        for srid in [Srid::Wgs84, Srid::WebMercator, Srid::RdNew] {
            for (lon, lat) in [(4.8932, 52.3731), (4.3114, 52.078), (6.5, 53.2)] {
                let (x, y) = srid.project(lon, lat);
                let (back_lon, back_lat) = srid.unproject(x, y);
                assert!(close(back_lon, lon, 1e-6), "{srid} lon {back_lon}");
                assert!(close(back_lat, lat, 1e-6), "{srid} lat {back_lat}");
            }
        }
    }

    #[test]
    fn rd_new_inverse_reference_point() {
        let (lon, lat) = Srid::RdNew.unproject(155_000.0, 463_000.0);
        assert!(close(lon, 5.387_206_21, 1e-9));
        assert!(close(lat, 52.155_174_40, 1e-9));
    }

    #[test]
    fn bbox_to_wgs84_encloses_source() {
        let wgs84 = BBox {
            min_x: 4.88,
            min_y: 52.36,
            max_x: 4.90,
            max_y: 52.38,
        };
        let back = wgs84.reproject(Srid::RdNew).to_wgs84(Srid::RdNew);
        assert!(back.min_x <= wgs84.min_x + 1e-6 && back.max_x >= wgs84.max_x - 1e-6);
        assert!(back.min_y <= wgs84.min_y + 1e-6 && back.max_y >= wgs84.max_y - 1e-6);
        assert_eq!(wgs84.to_wgs84(Srid::Wgs84), wgs84);
    }

    #[test]
    fn degenerate_boxes_have_no_area() {
        let line = BBox {
            min_x: 4.0,
            min_y: 52.0,
            max_x: 5.0,
            max_y: 52.0,
        };
        assert!(!line.has_area());
        let inverted = BBox {
            min_x: 5.0,
            min_y: 52.0,
            max_x: 4.0,
            max_y: 53.0,
        };
        assert!(!inverted.has_area());
    }
}
