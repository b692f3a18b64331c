use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::config::MapConfig;

/// Rotated transverse Mercator projection from geographic degrees to
/// screen coordinates.
///
/// The pipeline is: longitude rotation, then the two-axis spherical
/// rotation, then the raw transverse-Mercator transform
/// `(ln tan(π/4 + φ/2), -λ)`, then scale and translate with the y axis
/// pointing down.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    delta_lambda: f64,
    cos_delta_phi: f64,
    sin_delta_phi: f64,
    cos_delta_gamma: f64,
    sin_delta_gamma: f64,
    translate: [f64; 2],
    scale: f64,
}

impl Projection {
    /// `rotate` holds the three rotation angles in degrees. The roll axis
    /// sits a quarter turn from the configured angle in the transverse
    /// aspect, so the triple keeps its conventional meaning.
    pub fn new(rotate: [f64; 3], translate: [f64; 2], scale: f64) -> Self {
        let delta_phi = rotate[1].to_radians();
        let delta_gamma = (rotate[2] + 90.0).to_radians();
        Projection {
            delta_lambda: rotate[0].to_radians(),
            cos_delta_phi: delta_phi.cos(),
            sin_delta_phi: delta_phi.sin(),
            cos_delta_gamma: delta_gamma.cos(),
            sin_delta_gamma: delta_gamma.sin(),
            translate,
            scale,
        }
    }

    pub fn from_config(map: &MapConfig) -> Self {
        Self::new(map.rotate, map.translate, map.scale)
    }

    /// Project a (longitude, latitude) pair in degrees.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (lambda, phi) = self.rotate(lon.to_radians(), lat.to_radians());
        let x = ((FRAC_PI_2 + phi) / 2.0).tan().ln();
        let y = -lambda;
        (
            self.translate[0] + self.scale * x,
            self.translate[1] - self.scale * y,
        )
    }

    fn rotate(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_longitude(lambda + self.delta_lambda);
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * self.cos_delta_phi + x * self.sin_delta_phi;
        (
            (y * self.cos_delta_gamma - k * self.sin_delta_gamma)
                .atan2(x * self.cos_delta_phi - z * self.sin_delta_phi),
            (k * self.cos_delta_gamma + y * self.sin_delta_gamma).asin(),
        )
    }

    pub fn project_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.project(coord.x, coord.y);
        Coord { x, y }
    }

    fn project_ring(&self, ring: &LineString<f64>) -> LineString<f64> {
        LineString::new(ring.coords().map(|c| self.project_coord(*c)).collect())
    }

    /// Project a whole region into screen space. Used both for drawing
    /// the SVG paths and for pointer hit-testing.
    pub fn project_multi_polygon(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(
            geometry
                .0
                .iter()
                .map(|polygon| {
                    Polygon::new(
                        self.project_ring(polygon.exterior()),
                        polygon
                            .interiors()
                            .iter()
                            .map(|ring| self.project_ring(ring))
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

fn wrap_longitude(lambda: f64) -> f64 {
    if lambda.abs() > PI {
        lambda - (lambda / TAU).round() * TAU
    } else {
        lambda
    }
}
