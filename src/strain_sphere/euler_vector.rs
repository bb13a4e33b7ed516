use ndarray::{Array2, array};

/// Euler vector (rotation pole and rate) with its propagated uncertainty
///
/// All angles are in radian, rates in radian / year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EulerVector {
    /// Total rotation rate
    pub omega: f64,
    /// Colatitude of the Euler pole
    pub theta_p: f64,
    /// Longitude of the Euler pole
    pub phi_p: f64,
    pub s_omega: f64,
    pub s_theta_p: f64,
    pub s_phi_p: f64,
    /// Correlation coefficient between `phi_p` and `theta_p`, for plotting uncertainty ellipses
    pub r_phi_theta: f64,
}

impl EulerVector {
    /// Used when the rotation was not estimated
    pub fn nan() -> Self {
        return EulerVector {
            omega: f64::NAN,
            theta_p: f64::NAN,
            phi_p: f64::NAN,
            s_omega: f64::NAN,
            s_theta_p: f64::NAN,
            s_phi_p: f64::NAN,
            r_phi_theta: f64::NAN,
        };
    }

    /// Colatitude and longitude of the pole in degrees, `phi_p` wrapped into (-180, 180]
    pub fn pole_degrees(&self) -> (f64, f64) {
        return (self.theta_p.to_degrees(), self.phi_p.to_degrees());
    }
}

/// Convert the local rotation vector into an Euler vector, appendix (A7) of Savage et al. (2001)
///
/// The uncertainty is found by linearising the (non-linear) map
/// `(omega_r, omega_phi, omega_theta) -> (omega, phi_p, theta_p)` with its Jacobian `J`, and
/// propagating `cov_e = J * cov_p * J^T`.
///
/// # Arguments
/// * `omega_theta`, `omega_phi`, `omega_r` - local rotation components at the centroid, radian / year
/// * `covariance_rotation` - covariance of `(omega_theta, omega_phi, omega_r)`, in that order, shape = [3, 3]
/// * `theta_0` - colatitude of the centroid, radian
/// * `phi_0` - longitude of the centroid, radian
///
/// # Returns
/// * `euler_vector` - pole, rate and their 1-sigma uncertainties
///
pub fn euler_vector_from_rotation(
    omega_theta: f64,
    omega_phi: f64,
    omega_r: f64,
    covariance_rotation: &Array2<f64>,
    theta_0: f64,
    phi_0: f64,
) -> EulerVector {
    let (sin_theta_0, cos_theta_0): (f64, f64) = theta_0.sin_cos();
    let (sin_phi_0, cos_phi_0): (f64, f64) = phi_0.sin_cos();

    let omega: f64 = (omega_r.powi(2) + omega_phi.powi(2) + omega_theta.powi(2)).sqrt();
    let y: f64 = omega_r * cos_theta_0 - omega_theta * sin_theta_0;
    let theta_p: f64 = (y / omega).acos();
    let a: f64 = omega_r * sin_theta_0 * sin_phi_0 + omega_theta * cos_theta_0 * sin_phi_0 + omega_phi * cos_phi_0;
    let b: f64 = omega_r * sin_theta_0 * cos_phi_0 + omega_theta * cos_theta_0 * cos_phi_0 - omega_phi * sin_phi_0;
    let phi_p: f64 = a.atan2(b);
    let z: f64 = 1.0 / (1.0 - (y / omega).powi(2)).sqrt();
    let a2_plus_b2: f64 = a * a + b * b;

    // Rows: (omega, phi_p, theta_p); columns: (omega_r, omega_phi, omega_theta)
    let jacobian: Array2<f64> = array![
        [omega_r / omega, omega_phi / omega, omega_theta / omega],
        [
            (sin_theta_0 / a2_plus_b2) * (b * sin_phi_0 - a * cos_phi_0),
            (1.0 / a2_plus_b2) * (b * cos_phi_0 + a * sin_phi_0),
            (cos_theta_0 / a2_plus_b2) * (b * sin_phi_0 - a * cos_phi_0),
        ],
        [
            -(z / omega) * (cos_theta_0 - y * omega_r / omega.powi(2)),
            z * y * omega_phi / omega.powi(3),
            (z / omega) * (sin_theta_0 + y * omega_theta / omega.powi(2)),
        ],
    ];

    // Re-order the covariance from (omega_theta, omega_phi, omega_r) to (omega_r, omega_phi, omega_theta)
    let c: &Array2<f64> = covariance_rotation;
    let covariance_p: Array2<f64> = array![
        [c[(2, 2)], c[(2, 1)], c[(2, 0)]],
        [c[(2, 1)], c[(1, 1)], c[(0, 1)]],
        [c[(2, 0)], c[(0, 1)], c[(0, 0)]],
    ];
    let covariance_e: Array2<f64> = jacobian.dot(&covariance_p).dot(&jacobian.t());

    return EulerVector {
        omega,
        theta_p,
        phi_p,
        s_omega: covariance_e[(0, 0)].sqrt(),
        s_phi_p: covariance_e[(1, 1)].sqrt(),
        s_theta_p: covariance_e[(2, 2)].sqrt(),
        r_phi_theta: covariance_e[(1, 2)] / (covariance_e[(1, 1)] * covariance_e[(2, 2)]).sqrt(),
    };
}

#[test]
fn test_euler_vector_vertical_rotation_at_pole_longitude() {
    use approx::assert_abs_diff_eq;

    // A purely vertical rotation vector at the centroid means the pole is at the centroid itself
    let theta_0: f64 = 50.0_f64.to_radians();
    let phi_0: f64 = -123.0_f64.to_radians();
    let omega_r: f64 = 2.0e-9;
    let covariance: Array2<f64> = Array2::eye(3) * 1e-20;

    let euler: EulerVector = euler_vector_from_rotation(0.0, 0.0, omega_r, &covariance, theta_0, phi_0);

    assert_abs_diff_eq!(euler.omega, omega_r, epsilon = 1e-20);
    assert_abs_diff_eq!(euler.theta_p, theta_0, epsilon = 1e-6);
    assert_abs_diff_eq!(euler.phi_p, phi_0, epsilon = 1e-12);
    // d(omega) / d(omega_r) = 1
    assert_abs_diff_eq!(euler.s_omega, 1e-10, epsilon = 1e-16);
    assert!(euler.r_phi_theta.abs() <= 1.0 + 1e-12);
}

#[test]
fn test_euler_vector_recovers_geocentric_pole() {
    use approx::assert_abs_diff_eq;

    // Build the local rotation components of a known geocentric Euler vector
    // Local basis at (theta_0, phi_0): r_hat, theta_hat (south), phi_hat (east)
    let theta_pole: f64 = 40.0_f64.to_radians();
    let phi_pole: f64 = 60.0_f64.to_radians();
    let omega_true: f64 = 5.0e-9;
    let omega_xyz: [f64; 3] = [
        omega_true * theta_pole.sin() * phi_pole.cos(),
        omega_true * theta_pole.sin() * phi_pole.sin(),
        omega_true * theta_pole.cos(),
    ];

    let theta_0: f64 = 55.0_f64.to_radians();
    let phi_0: f64 = -120.0_f64.to_radians();
    let r_hat: [f64; 3] = [theta_0.sin() * phi_0.cos(), theta_0.sin() * phi_0.sin(), theta_0.cos()];
    let theta_hat: [f64; 3] = [theta_0.cos() * phi_0.cos(), theta_0.cos() * phi_0.sin(), -theta_0.sin()];
    let phi_hat: [f64; 3] = [-phi_0.sin(), phi_0.cos(), 0.0];
    let dot = |u: &[f64; 3], v: &[f64; 3]| -> f64 { u[0] * v[0] + u[1] * v[1] + u[2] * v[2] };

    let omega_r: f64 = dot(&omega_xyz, &r_hat);
    let omega_theta: f64 = dot(&omega_xyz, &theta_hat);
    let omega_phi: f64 = dot(&omega_xyz, &phi_hat);

    let covariance: Array2<f64> = Array2::eye(3) * 1e-22;
    let euler: EulerVector = euler_vector_from_rotation(omega_theta, omega_phi, omega_r, &covariance, theta_0, phi_0);

    assert_abs_diff_eq!(euler.omega, omega_true, epsilon = 1e-18);
    assert_abs_diff_eq!(euler.theta_p, theta_pole, epsilon = 1e-9);
    assert_abs_diff_eq!(euler.phi_p, phi_pole, epsilon = 1e-9);
    let (theta_p_deg, phi_p_deg): (f64, f64) = euler.pole_degrees();
    assert_abs_diff_eq!(theta_p_deg, 40.0, epsilon = 1e-6);
    assert_abs_diff_eq!(phi_p_deg, 60.0, epsilon = 1e-6);
}
