use super::{EARTH_RADIUS, ParameterSelection};
use ndarray::{Array1, Array2};

/// Design matrix relating surface velocities to rotation and strain rate, Savage et al. (2001)
///
/// The velocity field is linearised about the network centroid `(phi_0, theta_0)` on a sphere of
/// radius `EARTH_RADIUS`. Site `i` contributes two rows: row `2 * i` for the phi-ward (east)
/// velocity and row `2 * i + 1` for the theta-ward (south) velocity.
///
/// Column order:
/// * rotation: `omega_theta`, `omega_phi`, `omega_r`, radian / year
/// * strain rate: `e_phiphi`, `e_thetaphi`, `e_thetatheta`, 1 / year
///
/// With `ParameterSelection::Both` the rotation columns come first.
///
/// # Arguments
/// * `phi` - longitudes, radian
/// * `theta` - colatitudes, radian
/// * `phi_0` - longitude of the linearisation point, radian
/// * `theta_0` - colatitude of the linearisation point, radian
/// * `parameter_selection` - which parameters to include
///
/// # Returns
/// * `g` - shape = [2 * n_sites, n_parameters], metre
///
pub fn design_matrix(phi: &Array1<f64>, theta: &Array1<f64>, phi_0: f64, theta_0: f64, parameter_selection: ParameterSelection) -> Array2<f64> {
    let n_sites: usize = phi.len();
    let n_parameters: usize = parameter_selection.n_parameters();
    let r0: f64 = EARTH_RADIUS;
    let sin_theta_0: f64 = theta_0.sin();
    let cos_theta_0: f64 = theta_0.cos();

    let mut g: Array2<f64> = Array2::zeros((2 * n_sites, n_parameters));
    for i_site in 0..n_sites {
        let d_phi: f64 = phi[i_site] - phi_0;
        let d_theta: f64 = theta[i_site] - theta_0;
        let row_phi: usize = 2 * i_site;
        let row_theta: usize = 2 * i_site + 1;

        if parameter_selection.solves_rotation() {
            g[(row_phi, 0)] = -r0;
            g[(row_phi, 1)] = -r0 * cos_theta_0 * d_phi;
            g[(row_phi, 2)] = r0 * d_theta;

            g[(row_theta, 0)] = -r0 * cos_theta_0 * d_phi;
            g[(row_theta, 1)] = r0;
            g[(row_theta, 2)] = -r0 * sin_theta_0 * d_phi;
        }

        if let Some(i_strain) = parameter_selection.strain_offset() {
            g[(row_phi, i_strain)] = r0 * sin_theta_0 * d_phi;
            g[(row_phi, i_strain + 1)] = r0 * d_theta;
            // e_thetatheta does not enter the phi-ward velocity

            // e_phiphi does not enter the theta-ward velocity
            g[(row_theta, i_strain + 1)] = r0 * sin_theta_0 * d_phi;
            g[(row_theta, i_strain + 2)] = r0 * d_theta;
        }
    }

    return g;
}

#[test]
fn test_design_matrix_layout() {
    use approx::assert_abs_diff_eq;

    let phi: Array1<f64> = Array1::from(vec![0.1, 0.3]);
    let theta: Array1<f64> = Array1::from(vec![0.9, 0.7]);
    let phi_0: f64 = 0.2;
    let theta_0: f64 = 0.8;
    let r0: f64 = EARTH_RADIUS;

    let g_both: Array2<f64> = design_matrix(&phi, &theta, phi_0, theta_0, ParameterSelection::Both);
    assert_eq!(g_both.dim(), (4, 6));

    // Second site: d_phi = +0.1, d_theta = -0.1
    let expected_row_phi: Array1<f64> = Array1::from(vec![
        -r0,
        -r0 * theta_0.cos() * 0.1,
        -r0 * 0.1,
        r0 * theta_0.sin() * 0.1,
        -r0 * 0.1,
        0.0,
    ]);
    let expected_row_theta: Array1<f64> = Array1::from(vec![
        -r0 * theta_0.cos() * 0.1,
        r0,
        -r0 * theta_0.sin() * 0.1,
        0.0,
        r0 * theta_0.sin() * 0.1,
        -r0 * 0.1,
    ]);
    assert_abs_diff_eq!(g_both.row(2).to_owned(), expected_row_phi, epsilon = 1e-6);
    assert_abs_diff_eq!(g_both.row(3).to_owned(), expected_row_theta, epsilon = 1e-6);

    // The three-parameter matrices are the corresponding column blocks
    let g_rotation: Array2<f64> = design_matrix(&phi, &theta, phi_0, theta_0, ParameterSelection::RotationOnly);
    let g_strain: Array2<f64> = design_matrix(&phi, &theta, phi_0, theta_0, ParameterSelection::StrainOnly);
    assert_abs_diff_eq!(g_rotation, g_both.slice(ndarray::s![.., 0..3]).to_owned(), epsilon = 1e-6);
    assert_abs_diff_eq!(g_strain, g_both.slice(ndarray::s![.., 3..6]).to_owned(), epsilon = 1e-6);
}
