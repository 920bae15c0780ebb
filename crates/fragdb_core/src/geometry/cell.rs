//! Unit cell metrics and coordinate conversion.

use serde::{Deserialize, Serialize};

/// Crystallographic unit cell. Lengths in Å, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    /// Identity metric: coordinates measured in this cell are cartesian Å.
    pub fn cartesian() -> Self {
        Self::new(1.0, 1.0, 1.0, 90.0, 90.0, 90.0)
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        let [a, b, c, alpha, beta, gamma] = values;
        Self::new(a, b, c, alpha, beta, gamma)
    }

    fn radians(&self) -> (f64, f64, f64) {
        (
            self.alpha.to_radians(),
            self.beta.to_radians(),
            self.gamma.to_radians(),
        )
    }
}

/// Converts fractional coordinates into cartesian Å.
///
/// The cartesian x axis runs along `a`, y lies in the `ab` plane.
pub fn fractional_to_cartesian(frac: [f64; 3], cell: &UnitCell) -> [f64; 3] {
    let (alpha, beta, gamma) = cell.radians();
    let [x, y, z] = frac;

    let cos_alpha_star =
        (beta.cos() * gamma.cos() - alpha.cos()) / (beta.sin() * gamma.sin());
    let sin_alpha_star = (1.0 - cos_alpha_star * cos_alpha_star).sqrt();

    let xc = cell.a * x + cell.b * gamma.cos() * y + cell.c * beta.cos() * z;
    let yc = cell.b * gamma.sin() * y - cell.c * beta.sin() * cos_alpha_star * z;
    let zc = cell.c * beta.sin() * sin_alpha_star * z;
    [xc, yc, zc]
}

/// Distance between two points given in the coordinate system of `cell`.
///
/// With [`UnitCell::cartesian`] this is the plain euclidean distance.
pub fn atomic_distance(p1: [f64; 3], p2: [f64; 3], cell: &UnitCell) -> f64 {
    let (alpha, beta, gamma) = cell.radians();
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    let dz = p1[2] - p2[2];

    let squared = (cell.a * dx).powi(2)
        + (cell.b * dy).powi(2)
        + (cell.c * dz).powi(2)
        + 2.0 * cell.b * cell.c * alpha.cos() * dy * dz
        + 2.0 * cell.a * cell.c * beta.cos() * dx * dz
        + 2.0 * cell.a * cell.b * gamma.cos() * dx * dy;
    squared.max(0.0).sqrt()
}

/// Volume of the tetrahedron spanned by four cartesian points.
pub fn tetrahedron_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    let ad = sub(a, d);
    let bd = sub(b, d);
    let cd = sub(c, d);
    let cross = [
        bd[1] * cd[2] - bd[2] * cd[1],
        bd[2] * cd[0] - bd[0] * cd[2],
        bd[0] * cd[1] - bd[1] * cd[0],
    ];
    (ad[0] * cross[0] + ad[1] * cross[1] + ad[2] * cross[2]).abs() / 6.0
}

fn sub(p: [f64; 3], q: [f64; 3]) -> [f64; 3] {
    [p[0] - q[0], p[1] - q[1], p[2] - q[2]]
}
