use super::Error;
use ndarray::{Array1, Array2};
use ndarray_linalg::LeastSquaresSvd;

/// Residual (radians) below which the stations are treated as lying on one line
pub const COLLINEARITY_TOLERANCE: f64 = 1e-5;

/// Degenerate station geometry; the inversion is rank deficient or close to it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collinearity {
    /// All stations fall on a straight line `theta = a + b * phi`
    AlongLine,
    /// All stations share the same longitude or the same colatitude
    ConstantCoordinate,
}

/// Check whether the stations are (nearly) collinear
///
/// # Arguments
/// * `phi` - longitudes, radian
/// * `theta` - colatitudes, radian
///
/// # Returns
/// * `None` for a well conditioned network, otherwise the kind of degeneracy.
///   `ConstantCoordinate` takes precedence over `AlongLine`.
///
pub fn check_collinearity(phi: &Array1<f64>, theta: &Array1<f64>) -> Result<Option<Collinearity>, Error> {
    let n_sites: usize = phi.len();
    if n_sites == 0 {
        return Err(Error::NoObservations);
    }

    let phi_mean: f64 = phi.mean().unwrap_or(f64::NAN);
    let theta_mean: f64 = theta.mean().unwrap_or(f64::NAN);
    let constant_phi: bool = phi.iter().all(|&value| (value - phi_mean).abs() < COLLINEARITY_TOLERANCE);
    let constant_theta: bool = theta.iter().all(|&value| (value - theta_mean).abs() < COLLINEARITY_TOLERANCE);
    if constant_phi || constant_theta {
        return Ok(Some(Collinearity::ConstantCoordinate));
    }

    // Straight line fit, `theta = a + b * phi`
    let mut g_line: Array2<f64> = Array2::ones((n_sites, 2));
    g_line.column_mut(1).assign(phi);
    let line_fit = g_line.least_squares(theta).map_err(|source| Error::Linalg {
        context: "fitting a line through the stations",
        collinearity: None,
        source,
    })?;
    let residuals: Array1<f64> = g_line.dot(&line_fit.solution) - theta;
    let max_residual: f64 = residuals.iter().fold(0.0, |acc: f64, value| acc.max(value.abs()));

    if max_residual < COLLINEARITY_TOLERANCE {
        return Ok(Some(Collinearity::AlongLine));
    }
    return Ok(None);
}

#[test]
fn test_check_collinearity() {
    const DEG: f64 = std::f64::consts::PI / 180.0;

    // Same colatitude
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.5, -122.0]) * DEG;
    let theta: Array1<f64> = Array1::from(vec![50.0, 50.0, 50.0]) * DEG;
    assert_eq!(check_collinearity(&phi, &theta).unwrap(), Some(Collinearity::ConstantCoordinate));

    // Same longitude
    let phi: Array1<f64> = Array1::from(vec![-123.0, -123.0, -123.0]) * DEG;
    let theta: Array1<f64> = Array1::from(vec![49.0, 49.5, 50.0]) * DEG;
    assert_eq!(check_collinearity(&phi, &theta).unwrap(), Some(Collinearity::ConstantCoordinate));

    // Diagonal line
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.5, -122.0, -121.0]) * DEG;
    let theta: Array1<f64> = Array1::from(vec![49.0, 49.25, 49.5, 50.0]) * DEG;
    assert_eq!(check_collinearity(&phi, &theta).unwrap(), Some(Collinearity::AlongLine));

    // Triangle
    let phi: Array1<f64> = Array1::from(vec![-123.0, -123.0, -123.5]) * DEG;
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.75, 49.5]) * DEG;
    assert_eq!(check_collinearity(&phi, &theta).unwrap(), None);
}
