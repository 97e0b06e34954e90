//! SPH smoothing kernels for the PBF solver.
//!
//! All kernels share the same two guards: pairs farther apart than the
//! smoothing radius and coincident pairs return the identity (zero
//! scalar or zero vector), so division by a near-zero distance can never
//! leak NaN or infinity into particle state. Singular pairs are frequent
//! and expected, not errors.

use glam::Vec3;
use std::f32::consts::PI;

/// Poly6 density kernel: `k6 * (h^2 - |r|^2)^3` inside the radius.
///
/// The only kernel used for density estimation; its gradient vanishes at
/// the support boundary, which the density sum requires.
#[inline]
pub fn poly6(pi: Vec3, pj: Vec3, h: f32) -> f32 {
    let r2 = (pi - pj).length_squared();
    if r2 > h * h || r2 == 0.0 {
        return 0.0;
    }
    let k6 = 315.0 / (64.0 * PI * h.powi(9));
    k6 * (h * h - r2).powi(3)
}

/// Analytic gradient of [`poly6`].
///
/// Not on the solver hot path (Spiky serves there); kept for density
/// field consumers.
#[inline]
pub fn poly6_gradient(pi: Vec3, pj: Vec3, h: f32) -> Vec3 {
    let r = pi - pj;
    let r2 = r.length_squared();
    if r2 > h * h || r2 == 0.0 {
        return Vec3::ZERO;
    }
    let k6 = 315.0 / (64.0 * PI * h.powi(9));
    r * (-6.0 * k6 * (h * h - r2).powi(2))
}

/// Spiky kernel gradient: magnitude `k_s * (h - |r|)^2 / |r|` along the
/// pair displacement.
///
/// Does not vanish at short range, which position corrections and
/// vorticity need to avoid clustering artifacts; never use it for
/// density estimation.
#[inline]
pub fn spiky_gradient(pi: Vec3, pj: Vec3, h: f32) -> Vec3 {
    let r = pi - pj;
    let r_len = r.length();
    if r_len > h || r_len == 0.0 {
        return Vec3::ZERO;
    }
    let ks = 45.0 / (PI * h.powi(6));
    let coeff = ks * (h - r_len) * (h - r_len) / r_len;
    r * -coeff
}

/// Linear falloff `1 - |r|/h` weighting relative neighbor proximity in
/// the trapped-air potential.
#[inline]
pub fn air_potential(pi: Vec3, pj: Vec3, h: f32) -> f32 {
    let r_len = (pi - pj).length();
    if r_len > h || r_len == 0.0 {
        return 0.0;
    }
    1.0 - r_len / h
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 0.1;

    #[test]
    fn test_kernels_zero_beyond_radius() {
        let pi = Vec3::ZERO;
        let pj = Vec3::new(1.5 * H, 0.0, 0.0);
        assert_eq!(poly6(pi, pj, H), 0.0);
        assert_eq!(poly6_gradient(pi, pj, H), Vec3::ZERO);
        assert_eq!(spiky_gradient(pi, pj, H), Vec3::ZERO);
        assert_eq!(air_potential(pi, pj, H), 0.0);
    }

    #[test]
    fn test_kernels_zero_at_coincident_pair() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(poly6(p, p, H), 0.0);
        assert_eq!(poly6_gradient(p, p, H), Vec3::ZERO);
        assert_eq!(spiky_gradient(p, p, H), Vec3::ZERO);
        assert_eq!(air_potential(p, p, H), 0.0);
    }

    #[test]
    fn test_poly6_below_peak_at_half_radius() {
        let w = poly6(Vec3::ZERO, Vec3::new(0.5 * H, 0.0, 0.0), H);
        // Analytic peak the kernel approaches as |r| -> 0.
        let peak = 315.0 / (64.0 * PI * H.powi(9)) * H.powi(6);
        assert!(w > 0.0);
        assert!(w < peak);
    }

    #[test]
    fn test_poly6_decreases_with_distance() {
        let near = poly6(Vec3::ZERO, Vec3::new(0.3 * H, 0.0, 0.0), H);
        let far = poly6(Vec3::ZERO, Vec3::new(0.8 * H, 0.0, 0.0), H);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_spiky_points_toward_neighbor() {
        // The gradient opposes the displacement; multiplied by a
        // negative lambda it becomes repulsive.
        let pi = Vec3::new(0.05, 0.0, 0.0);
        let pj = Vec3::ZERO;
        let grad = spiky_gradient(pi, pj, H);
        assert!(grad.x < 0.0);
        assert!(grad.dot(pi - pj) < 0.0);
    }

    #[test]
    fn test_air_potential_linear_falloff() {
        let w = air_potential(Vec3::ZERO, Vec3::new(0.5 * H, 0.0, 0.0), H);
        assert!((w - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_kernels_finite_near_contact() {
        // Very small but nonzero separation must not blow up.
        let pj = Vec3::new(1e-6, 0.0, 0.0);
        assert!(poly6(Vec3::ZERO, pj, H).is_finite());
        assert!(spiky_gradient(Vec3::ZERO, pj, H).is_finite());
    }
}
