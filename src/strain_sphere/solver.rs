use super::observation::observations_to_arrays;
use super::{
    Collinearity, DataOrdering, EARTH_RADIUS, Error, EulerVector, ParameterSelection, RigidRotation, SolverWarning, StrainRateTensor,
    StrainSphereSolution, VelocityObservation, check_collinearity, design_matrix, euler_vector_from_rotation,
};
use log::{debug, warn};
use ndarray::{Array1, Array2, s};
use ndarray_linalg::Inverse;

/// Estimate strain rate and rigid rotation from GNSS velocities on a sphere, Savage et al. (2001)
///
/// Solves the overdetermined system `G * m = d` by (weighted) least squares:
/// * weighted: `M = (G^T W G)^-1 G^T W`, `W = diag(1 / covd)`
/// * unweighted: `M = (G^T G)^-1 G^T`
///
/// and propagates the data covariance with `covm = M * covd * M^T`.
///
/// The data vector is laid out as `DataOrdering::ComponentStacked`, which reproduces the
/// published results; see `strain_sphere_with_ordering` for the alternative.
///
/// # Arguments
/// * `phi` - longitudes, degree
/// * `theta` - colatitudes (90 - latitude), degree
/// * `u_phi` - phi-ward (east) velocities, metre / year
/// * `u_theta` - theta-ward (south) velocities, metre / year
/// * `s_phi` - uncertainties of `u_phi`, metre / year
/// * `s_theta` - uncertainties of `u_theta`, metre / year
/// * `weighted` - use the uncertainties as weights in the inversion
/// * `parameter_selection` - rotation only, strain only, or both
///
/// # Returns
/// * `solution` - strain rate, rotation, Euler vector, misfit and predicted velocities.
///   Components which are not solved for are NaN.
///
/// # Notes
/// * `chi2` is normalised by the number of data `N`, not by the degrees of freedom `N - p`;
///   with three stations and six parameters `N - p` is zero.
/// * Collinear stations are reported in `solution.warnings`, the solve still goes ahead.
///   A normal matrix which LAPACK cannot invert is returned as `Error::Linalg`, carrying
///   the collinearity found beforehand.
///
/// # Example
/// ```
/// use gnss_strain_rs::strain_sphere::{ParameterSelection, StrainSphereSolution, strain_sphere};
/// use ndarray::Array1;
///
/// let phi: Array1<f64> = Array1::from(vec![-123.0, -123.0, -123.5]);
/// let theta: Array1<f64> = Array1::from(vec![50.0, 49.75, 49.5]);
/// let u_phi: Array1<f64> = Array1::from(vec![0.023, 0.025, 0.027]);
/// let u_theta: Array1<f64> = Array1::from(vec![0.013, 0.011, 0.011]);
/// let sigma: Array1<f64> = Array1::from_elem(3, 0.002);
///
/// let solution: StrainSphereSolution =
///     strain_sphere(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::Both).unwrap();
/// assert!(solution.chi2 < 1e-12);
/// assert!(solution.warnings.is_empty());
/// ```
///
#[allow(clippy::too_many_arguments)]
pub fn strain_sphere(
    phi: &Array1<f64>,
    theta: &Array1<f64>,
    u_phi: &Array1<f64>,
    u_theta: &Array1<f64>,
    s_phi: &Array1<f64>,
    s_theta: &Array1<f64>,
    weighted: bool,
    parameter_selection: ParameterSelection,
) -> Result<StrainSphereSolution, Error> {
    return strain_sphere_with_ordering(phi, theta, u_phi, u_theta, s_phi, s_theta, weighted, parameter_selection, DataOrdering::default());
}

/// `strain_sphere` with an explicit layout of the data vector
///
/// `DataOrdering::SiteInterleaved` pairs every velocity with the design matrix row of its own
/// site, so synthetic velocities built from `G * m` are fitted exactly.
/// `u_phi_predicted` and `u_theta_predicted` are the even and odd rows of `G * m` in both cases.
///
#[allow(clippy::too_many_arguments)]
pub fn strain_sphere_with_ordering(
    phi: &Array1<f64>,
    theta: &Array1<f64>,
    u_phi: &Array1<f64>,
    u_theta: &Array1<f64>,
    s_phi: &Array1<f64>,
    s_theta: &Array1<f64>,
    weighted: bool,
    parameter_selection: ParameterSelection,
    data_ordering: DataOrdering,
) -> Result<StrainSphereSolution, Error> {
    let n_sites: usize = phi.len();
    if n_sites == 0 {
        return Err(Error::NoObservations);
    }
    for (name, values) in [("theta", theta), ("u_phi", u_phi), ("u_theta", u_theta), ("s_phi", s_phi), ("s_theta", s_theta)] {
        if values.len() != n_sites {
            return Err(Error::InputLengthMismatch {
                name,
                expected: n_sites,
                found: values.len(),
            });
        }
    }

    let phi: Array1<f64> = phi.mapv(f64::to_radians);
    let theta: Array1<f64> = theta.mapv(f64::to_radians);
    let phi_0: f64 = phi.mean().unwrap_or(f64::NAN);
    let theta_0: f64 = theta.mean().unwrap_or(f64::NAN);
    let r0: f64 = EARTH_RADIUS;

    let mut warnings: Vec<SolverWarning> = Vec::new();
    let collinearity: Option<Collinearity> = check_collinearity(&phi, &theta)?;
    if let Some(kind) = collinearity {
        warn!("strain_sphere: points are collinear ({:?}), results may be unstable", kind);
        warnings.push(SolverWarning::Collinear(kind));
    }

    let g: Array2<f64> = design_matrix(&phi, &theta, phi_0, theta_0, parameter_selection);

    // Data and its (diagonal) covariance
    let n_data: usize = 2 * n_sites;
    let (d, covd_diagonal): (Array1<f64>, Array1<f64>) = data_ordering.arrange(u_phi, u_theta, s_phi, s_theta);

    // Generalised inverse, shape = [n_parameters, n_data]
    let g_t_w: Array2<f64> = if weighted {
        let weights: Array1<f64> = covd_diagonal.mapv(|variance| 1.0 / variance);
        &g.t() * &weights
    } else {
        g.t().to_owned()
    };
    let normal_matrix_inverse: Array2<f64> = g_t_w.dot(&g).inv().map_err(|source| Error::Linalg {
        context: "inverting the normal matrix",
        collinearity,
        source,
    })?;
    let generalised_inverse: Array2<f64> = normal_matrix_inverse.dot(&g_t_w);

    let model: Array1<f64> = generalised_inverse.dot(&d);
    // Rows of `g` are per site whatever the data layout
    let d_predicted: Array1<f64> = g.dot(&model);
    let u_phi_predicted: Array1<f64> = d_predicted.slice(s![0..;2]).to_owned();
    let u_theta_predicted: Array1<f64> = d_predicted.slice(s![1..;2]).to_owned();

    // covm = M * covd * M^T, with covd diagonal
    let model_covariance: Array2<f64> = (&generalised_inverse * &covd_diagonal).dot(&generalised_inverse.t());
    let sigma = |i_parameter: usize| -> f64 { model_covariance[(i_parameter, i_parameter)].sqrt() };

    let residual: Array1<f64> = &d - &d_predicted;
    let chi2: f64 = (&residual * &residual / &covd_diagonal).sum() / (n_data as f64);

    let rotation: RigidRotation = if parameter_selection.solves_rotation() {
        RigidRotation {
            omega_theta: model[0],
            omega_phi: model[1],
            omega_r: model[2],
            u_theta: r0 * model[1],
            u_phi: -r0 * model[0],
            s_omega_theta: sigma(0),
            s_omega_phi: sigma(1),
            s_omega_r: sigma(2),
            s_u_theta: r0 * sigma(1),
            s_u_phi: r0 * sigma(0),
        }
    } else {
        RigidRotation::nan()
    };

    let strain_rate: StrainRateTensor = match parameter_selection.strain_offset() {
        Some(i_strain) => StrainRateTensor {
            e_phiphi: model[i_strain],
            e_thetaphi: model[i_strain + 1],
            e_thetatheta: model[i_strain + 2],
            s_e_phiphi: sigma(i_strain),
            s_e_thetaphi: sigma(i_strain + 1),
            s_e_thetatheta: sigma(i_strain + 2),
        },
        None => StrainRateTensor::nan(),
    };

    let euler_vector: EulerVector = if parameter_selection.solves_rotation() {
        let covariance_rotation: Array2<f64> = model_covariance.slice(s![0..3, 0..3]).to_owned();
        euler_vector_from_rotation(rotation.omega_theta, rotation.omega_phi, rotation.omega_r, &covariance_rotation, theta_0, phi_0)
    } else {
        EulerVector::nan()
    };

    if model.iter().any(|value| !value.is_finite()) {
        warn!("strain_sphere: non-finite model parameters {:?}", model);
        warnings.push(SolverWarning::NonFiniteParameters);
    }
    debug!("strain_sphere: n_sites={}, {:?}, {:?}, chi2={:e}", n_sites, parameter_selection, data_ordering, chi2);

    return Ok(StrainSphereSolution {
        strain_rate,
        rotation,
        euler_vector,
        chi2,
        u_phi_predicted,
        u_theta_predicted,
        model,
        model_covariance,
        phi_0,
        theta_0,
        warnings,
    });
}

/// `strain_sphere_with_ordering` for a slice of `VelocityObservation`s
pub fn strain_sphere_observations(
    observations: &[VelocityObservation],
    weighted: bool,
    parameter_selection: ParameterSelection,
    data_ordering: DataOrdering,
) -> Result<StrainSphereSolution, Error> {
    let (phi, theta, u_phi, u_theta, s_phi, s_theta) = observations_to_arrays(observations);
    return strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, weighted, parameter_selection, data_ordering);
}

// Velocities predicted by the linearised model for known parameters, used to build synthetic tests
#[cfg(test)]
fn forward_model(phi_deg: &Array1<f64>, theta_deg: &Array1<f64>, model: &Array1<f64>, parameter_selection: ParameterSelection) -> (Array1<f64>, Array1<f64>) {
    let phi: Array1<f64> = phi_deg.mapv(f64::to_radians);
    let theta: Array1<f64> = theta_deg.mapv(f64::to_radians);
    let g: Array2<f64> = design_matrix(&phi, &theta, phi.mean().unwrap(), theta.mean().unwrap(), parameter_selection);
    let d: Array1<f64> = g.dot(model);
    return (d.slice(s![0..;2]).to_owned(), d.slice(s![1..;2]).to_owned());
}

// Three stations in northern California, (phi, theta, u_phi, u_theta, s_phi, s_theta)
#[cfg(test)]
fn three_station_network() -> (Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>) {
    let phi: Array1<f64> = Array1::from(vec![-123.0, -123.0, -123.5]);
    let latitude: Array1<f64> = Array1::from(vec![40.0, 40.25, 40.5]);
    let theta: Array1<f64> = 90.0 - &latitude;
    let u_phi: Array1<f64> = Array1::from(vec![0.023, 0.025, 0.027]);
    let u_theta: Array1<f64> = Array1::from(vec![0.013, 0.011, 0.011]);
    let sigma: Array1<f64> = Array1::from(vec![0.002, 0.002, 0.002]);
    return (phi, theta, u_phi, u_theta, sigma.clone(), sigma);
}

#[test]
fn test_strain_sphere_three_station_reference() {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Recorded reference output for this network
    let (phi, theta, u_phi, u_theta, s_phi, s_theta) = three_station_network();
    let solution: StrainSphereSolution = strain_sphere(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, true, ParameterSelection::Both).unwrap();

    let precision: f64 = 1e-8;
    assert_relative_eq!(solution.strain_rate.e_phiphi, 4.729731718654107e-07, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.e_thetaphi, -1.909175102625965e-07, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.e_thetatheta, 4.3120059840514004e-07, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.s_e_phiphi, 1.1532335794048123e-07, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.s_e_thetaphi, 7.685886596954667e-08, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.s_e_thetatheta, 1.0163495572799055e-07, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_theta, -3.1880422284937805e-09, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_phi, 2.560886380265496e-09, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_r, 4.7183977460883197e-08, max_relative = precision);
    assert_relative_eq!(solution.rotation.s_omega_theta, 1.8104429889922413e-10, max_relative = precision);
    assert_relative_eq!(solution.rotation.s_omega_phi, 1.8104429889922413e-10, max_relative = precision);
    assert_relative_eq!(solution.rotation.s_omega_r, 7.685886596954667e-08, max_relative = precision);
    assert_relative_eq!(solution.rotation.u_theta, 0.01633333333333333, max_relative = precision);
    assert_relative_eq!(solution.rotation.u_phi, 0.02033333333333333, max_relative = precision);
    assert_relative_eq!(solution.rotation.s_u_theta, 0.0011547005383792516, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.omega, 4.736084333426108e-08, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.theta_p, 0.8022551217824695, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.phi_p, -2.0743807872010627, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_omega, 7.657185546774059e-08, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_phi_p, 0.1296874184427466, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_theta_p, 0.10473134772835975, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.r_phi_theta, -0.9984933734856912, max_relative = precision);

    // Six data and six parameters: G * m reproduces the stacked data vector,
    // which the even / odd split hands back as below
    assert_abs_diff_eq!(solution.chi2, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(solution.u_phi_predicted, Array1::from(vec![0.023, 0.027, 0.011]), epsilon = 1e-12);
    assert_abs_diff_eq!(solution.u_theta_predicted, Array1::from(vec![0.025, 0.013, 0.011]), epsilon = 1e-12);
    assert!(solution.warnings.is_empty());
    assert_eq!(solution.model.len(), 6);
    assert_eq!(solution.model_covariance.dim(), (6, 6));
}

#[test]
fn test_strain_sphere_three_station_site_interleaved() {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Same network with each velocity against its own site's rows
    let (phi, theta, u_phi, u_theta, s_phi, s_theta) = three_station_network();
    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, true, ParameterSelection::Both, DataOrdering::SiteInterleaved).unwrap();

    let precision: f64 = 1e-8;
    assert_relative_eq!(solution.strain_rate.e_phiphi, 1.5485359637562893e-09, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.e_thetaphi, -6.113278995168904e-08, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.e_thetatheta, 7.186676640085666e-08, max_relative = precision);
    assert_relative_eq!(solution.strain_rate.s_e_phiphi, 1.1532335794048123e-07, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_theta, -3.919724051426779e-09, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_phi, 1.829204557332497e-09, max_relative = precision);
    assert_relative_eq!(solution.rotation.omega_r, -1.0733976449167681e-08, max_relative = precision);
    assert_relative_eq!(solution.rotation.s_omega_r, 7.685886596954667e-08, max_relative = precision);
    assert_relative_eq!(solution.rotation.u_theta, 0.011666666666666667, max_relative = precision);
    assert_relative_eq!(solution.rotation.u_phi, 0.025, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.omega, 1.1572747139862081e-08, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.theta_p, 1.9185481045589612, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.phi_p, 0.823001347647526, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_omega, 7.128825259697172e-08, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_phi_p, 0.9066194575454073, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.s_theta_p, 2.3315254910295553, max_relative = precision);
    assert_relative_eq!(solution.euler_vector.r_phi_theta, 0.9998090445327001, max_relative = precision);

    assert_abs_diff_eq!(solution.chi2, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(solution.u_phi_predicted, u_phi, epsilon = 1e-12);
    assert_abs_diff_eq!(solution.u_theta_predicted, u_theta, epsilon = 1e-12);
}

#[test]
fn test_strain_sphere_rotation_only_recovers_rotation() {
    use approx::assert_relative_eq;

    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.1, -121.4, -122.7, -121.9]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.4, 50.2, 50.6, 49.9]);
    let sigma: Array1<f64> = Array1::from_elem(5, 0.001);
    // (omega_theta, omega_phi, omega_r), radian / year
    let model_true: Array1<f64> = Array1::from(vec![-2.0e-9, 1.5e-9, 4.0e-9]);
    let (u_phi, u_theta) = forward_model(&phi, &theta, &model_true, ParameterSelection::RotationOnly);

    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::RotationOnly, DataOrdering::SiteInterleaved)
            .unwrap();

    assert!(solution.strain_rate.e_phiphi.is_nan());
    assert!(solution.strain_rate.e_thetaphi.is_nan());
    assert!(solution.strain_rate.e_thetatheta.is_nan());
    assert!(solution.strain_rate.s_e_phiphi.is_nan());

    assert_relative_eq!(solution.rotation.omega_theta, -2.0e-9, max_relative = 1e-8);
    assert_relative_eq!(solution.rotation.omega_phi, 1.5e-9, max_relative = 1e-8);
    assert_relative_eq!(solution.rotation.omega_r, 4.0e-9, max_relative = 1e-8);
    assert_relative_eq!(solution.rotation.u_phi, 2.0e-9 * EARTH_RADIUS, max_relative = 1e-8);
    assert_relative_eq!(solution.rotation.u_theta, 1.5e-9 * EARTH_RADIUS, max_relative = 1e-8);
    assert_relative_eq!(solution.rotation.s_u_phi, solution.rotation.s_omega_theta * EARTH_RADIUS, max_relative = 1e-12);

    // The Euler vector rate is the norm of the local rotation vector
    let omega_norm: f64 = (2.0e-9_f64.powi(2) + 1.5e-9_f64.powi(2) + 4.0e-9_f64.powi(2)).sqrt();
    assert_relative_eq!(solution.euler_vector.omega, omega_norm, max_relative = 1e-8);
    assert!(solution.euler_vector.s_omega.is_finite());
    assert!(solution.euler_vector.r_phi_theta.abs() <= 1.0 + 1e-9);
    assert!(solution.chi2 < 1e-12);
}

#[test]
fn test_strain_sphere_rotation_only_pure_translation() {
    use approx::assert_relative_eq;

    // A uniform translation has (almost) no vertical-axis rotation over a small network
    let phi: Array1<f64> = Array1::from(vec![-123.0, -123.0, -123.5]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.75, 49.5]);
    let u_phi: Array1<f64> = Array1::from_elem(3, 0.02);
    let u_theta: Array1<f64> = Array1::from_elem(3, 0.01);
    let sigma: Array1<f64> = Array1::from_elem(3, 0.002);

    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, false, ParameterSelection::RotationOnly, DataOrdering::SiteInterleaved)
            .unwrap();

    assert_relative_eq!(solution.rotation.u_phi, 0.02, max_relative = 1e-4);
    assert_relative_eq!(solution.rotation.u_theta, 0.01, max_relative = 1e-4);

    // Velocity from the vertical-axis rotation across the network aperture, relative to the translation
    let aperture: f64 = 0.5_f64.to_radians();
    let speed: f64 = (0.02_f64.powi(2) + 0.01_f64.powi(2)).sqrt();
    assert!(solution.rotation.omega_r.abs() * EARTH_RADIUS * aperture < 0.01 * speed);
    assert!(solution.strain_rate.e_thetatheta.is_nan());
}

#[test]
fn test_strain_sphere_strain_only_uniform_extension() {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Uniform extension along phi, nothing else
    let phi: Array1<f64> = Array1::from(vec![-118.0, -117.2, -117.6, -116.9]);
    let theta: Array1<f64> = Array1::from(vec![56.0, 56.3, 55.5, 55.9]);
    let sigma: Array1<f64> = Array1::from_elem(4, 0.001);
    let model_true: Array1<f64> = Array1::from(vec![1.0e-7, 0.0, 0.0]);
    let (u_phi, u_theta) = forward_model(&phi, &theta, &model_true, ParameterSelection::StrainOnly);
    assert_abs_diff_eq!(u_theta, Array1::zeros(4), epsilon = 1e-15);

    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::StrainOnly, DataOrdering::SiteInterleaved)
            .unwrap();

    assert_relative_eq!(solution.strain_rate.e_phiphi, 1.0e-7, max_relative = 1e-8);
    assert!(solution.strain_rate.e_phiphi > 0.0);
    assert_abs_diff_eq!(solution.strain_rate.e_thetaphi, 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(solution.strain_rate.e_thetatheta, 0.0, epsilon = 1e-15);
    assert!(solution.strain_rate.s_e_phiphi > 0.0);

    // Unsolved uncertainties are NaN, not zero
    assert!(solution.rotation.omega_r.is_nan());
    assert!(solution.rotation.omega_phi.is_nan());
    assert!(solution.rotation.omega_theta.is_nan());
    assert!(solution.rotation.u_phi.is_nan());
    assert!(solution.rotation.u_theta.is_nan());
    assert!(solution.rotation.s_u_phi.is_nan());
    assert!(solution.rotation.s_u_theta.is_nan());
    assert!(solution.rotation.s_omega_r.is_nan());
    assert!(solution.euler_vector.omega.is_nan());
    assert!(solution.euler_vector.theta_p.is_nan());
    assert!(solution.euler_vector.phi_p.is_nan());
    assert!(solution.euler_vector.r_phi_theta.is_nan());
    assert!(solution.warnings.is_empty());
}

#[test]
fn test_strain_sphere_predicted_velocities_round_trip() {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Overdetermined network with velocities which do not fit the model exactly
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.1, -121.4, -122.7, -121.9, -122.4]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.4, 50.2, 50.6, 49.9, 49.1]);
    let u_phi: Array1<f64> = Array1::from(vec![0.021, 0.024, 0.019, 0.026, 0.022, 0.020]);
    let u_theta: Array1<f64> = Array1::from(vec![0.012, 0.010, 0.013, 0.009, 0.011, 0.014]);
    let s_phi: Array1<f64> = Array1::from(vec![0.001, 0.002, 0.001, 0.003, 0.002, 0.001]);
    let s_theta: Array1<f64> = Array1::from(vec![0.002, 0.002, 0.001, 0.002, 0.003, 0.001]);
    let ordering: DataOrdering = DataOrdering::SiteInterleaved;

    let first: StrainSphereSolution = strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, true, ParameterSelection::Both, ordering).unwrap();
    assert!(first.chi2 > 0.0);

    let second: StrainSphereSolution = strain_sphere_with_ordering(
        &phi,
        &theta,
        &first.u_phi_predicted,
        &first.u_theta_predicted,
        &s_phi,
        &s_theta,
        true,
        ParameterSelection::Both,
        ordering,
    )
    .unwrap();

    assert_abs_diff_eq!(second.chi2, 0.0, epsilon = 1e-12);
    for i_parameter in 0..6 {
        assert_relative_eq!(second.model[i_parameter], first.model[i_parameter], epsilon = 1e-15, max_relative = 1e-8);
    }
    assert_relative_eq!(second.euler_vector.omega, first.euler_vector.omega, max_relative = 1e-8);
}

#[test]
fn test_strain_sphere_chi2_normalised_by_number_of_data() {
    use approx::assert_relative_eq;

    // Five stations, ten data, six parameters
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.1, -121.4, -122.7, -121.9]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.4, 50.2, 50.6, 49.9]);
    let u_phi: Array1<f64> = Array1::from(vec![0.021, 0.024, 0.019, 0.026, 0.022]);
    let u_theta: Array1<f64> = Array1::from(vec![0.012, 0.010, 0.013, 0.009, 0.011]);
    let s_phi: Array1<f64> = Array1::from(vec![0.001, 0.002, 0.0015, 0.003, 0.002]);
    let s_theta: Array1<f64> = Array1::from(vec![0.002, 0.001, 0.001, 0.0025, 0.003]);
    let n_data: f64 = 10.0;
    let n_parameters: f64 = 6.0;

    // Per site residuals
    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, true, ParameterSelection::Both, DataOrdering::SiteInterleaved).unwrap();
    let mut misfit: f64 = 0.0;
    for i_site in 0..5 {
        misfit += ((u_phi[i_site] - solution.u_phi_predicted[i_site]) / s_phi[i_site]).powi(2);
        misfit += ((u_theta[i_site] - solution.u_theta_predicted[i_site]) / s_theta[i_site]).powi(2);
    }
    assert!(misfit > 0.0);
    assert_relative_eq!(solution.chi2, misfit / n_data, max_relative = 1e-10);
    assert!((solution.chi2 - misfit / (n_data - n_parameters)).abs() > 0.5 * solution.chi2);

    // Stacked layout: residuals are the stacked data minus the rows of G * m in order
    let solution: StrainSphereSolution = strain_sphere(&phi, &theta, &u_phi, &u_theta, &s_phi, &s_theta, true, ParameterSelection::Both).unwrap();
    let d: Vec<f64> = u_phi.iter().chain(u_theta.iter()).copied().collect();
    let sigma: Vec<f64> = s_phi.iter().chain(s_theta.iter()).copied().collect();
    let mut d_predicted: Vec<f64> = Vec::with_capacity(10);
    for i_site in 0..5 {
        d_predicted.push(solution.u_phi_predicted[i_site]);
        d_predicted.push(solution.u_theta_predicted[i_site]);
    }
    let misfit: f64 = (0..10).map(|i_data| ((d[i_data] - d_predicted[i_data]) / sigma[i_data]).powi(2)).sum();
    assert!(misfit > 0.0);
    assert_relative_eq!(solution.chi2, misfit / n_data, max_relative = 1e-10);
}

#[test]
fn test_strain_sphere_collinear_warning() {
    // Three stations along one parallel
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.5, -122.0]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 50.0, 50.0]);
    let u_phi: Array1<f64> = Array1::from(vec![0.020, 0.021, 0.022]);
    let u_theta: Array1<f64> = Array1::from(vec![0.010, 0.010, 0.011]);
    let sigma: Array1<f64> = Array1::from_elem(3, 0.002);

    // The rotation-only system is still well posed, so the solve itself succeeds
    let solution: StrainSphereSolution = strain_sphere(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::RotationOnly).unwrap();
    assert_eq!(solution.collinearity(), Some(Collinearity::ConstantCoordinate));
    assert!(solution.warnings.contains(&SolverWarning::Collinear(Collinearity::ConstantCoordinate)));
}

#[test]
fn test_strain_sphere_collinear_singular_keeps_diagnostic() {
    // Constant colatitude zeroes the e_thetatheta column of G, so solving for strain is singular
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.5, -122.0]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 50.0, 50.0]);
    let u_phi: Array1<f64> = Array1::from(vec![0.020, 0.021, 0.022]);
    let u_theta: Array1<f64> = Array1::from(vec![0.010, 0.010, 0.011]);
    let sigma: Array1<f64> = Array1::from_elem(3, 0.002);

    let result = strain_sphere(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::Both);
    assert!(
        matches!(
            result,
            Err(Error::Linalg {
                collinearity: Some(Collinearity::ConstantCoordinate),
                ..
            })
        ),
        "{:?}",
        result
    );

    let observations: Vec<VelocityObservation> = (0..3)
        .map(|i_site| VelocityObservation {
            phi: phi[i_site],
            theta: theta[i_site],
            u_phi: u_phi[i_site],
            u_theta: u_theta[i_site],
            s_phi: 0.002,
            s_theta: 0.002,
        })
        .collect();
    let result = strain_sphere_observations(&observations, true, ParameterSelection::StrainOnly, DataOrdering::SiteInterleaved);
    assert!(matches!(
        result,
        Err(Error::Linalg {
            collinearity: Some(Collinearity::ConstantCoordinate),
            ..
        })
    ));
}

#[test]
fn test_strain_sphere_weighted_equals_unweighted_for_equal_sigma() {
    use approx::assert_relative_eq;

    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.1, -121.4, -122.7, -121.9]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.4, 50.2, 50.6, 49.9]);
    let u_phi: Array1<f64> = Array1::from(vec![0.021, 0.024, 0.019, 0.026, 0.022]);
    let u_theta: Array1<f64> = Array1::from(vec![0.012, 0.010, 0.013, 0.009, 0.011]);
    let sigma: Array1<f64> = Array1::from_elem(5, 0.0015);

    let weighted: StrainSphereSolution = strain_sphere(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::Both).unwrap();
    let unweighted: StrainSphereSolution = strain_sphere(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, false, ParameterSelection::Both).unwrap();

    for i_parameter in 0..6 {
        assert_relative_eq!(weighted.model[i_parameter], unweighted.model[i_parameter], epsilon = 1e-15, max_relative = 1e-8);
        assert_relative_eq!(
            weighted.model_covariance[(i_parameter, i_parameter)],
            unweighted.model_covariance[(i_parameter, i_parameter)],
            max_relative = 1e-8
        );
    }
    assert_relative_eq!(weighted.chi2, unweighted.chi2, max_relative = 1e-8);
}

#[test]
fn test_strain_sphere_noisy_field_within_uncertainty() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Known rotation and strain, plus Gaussian noise at the stated uncertainty
    let mut rng: StdRng = StdRng::seed_from_u64(20011012);
    let n_sites: usize = 40;
    let phi: Array1<f64> = (0..n_sites).map(|_| rng.random_range(-122.0..-118.0)).collect();
    let theta: Array1<f64> = (0..n_sites).map(|_| rng.random_range(52.0..56.0)).collect();
    let model_true: Array1<f64> = Array1::from(vec![-3.0e-9, 2.0e-9, 5.0e-9, 4.0e-8, -2.0e-8, 3.0e-8]);
    let (u_phi_exact, u_theta_exact) = forward_model(&phi, &theta, &model_true, ParameterSelection::Both);

    let sigma_value: f64 = 0.0005;
    let mut gaussian = || -> f64 {
        // Box-Muller
        let u1: f64 = rng.random_range(f64::EPSILON..1.0);
        let u2: f64 = rng.random_range(0.0..1.0);
        return (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    };
    let u_phi: Array1<f64> = u_phi_exact.mapv(|value| value + sigma_value * gaussian());
    let u_theta: Array1<f64> = u_theta_exact.mapv(|value| value + sigma_value * gaussian());
    let sigma: Array1<f64> = Array1::from_elem(n_sites, sigma_value);

    let solution: StrainSphereSolution =
        strain_sphere_with_ordering(&phi, &theta, &u_phi, &u_theta, &sigma, &sigma, true, ParameterSelection::Both, DataOrdering::SiteInterleaved).unwrap();

    for i_parameter in 0..6 {
        let error: f64 = (solution.model[i_parameter] - model_true[i_parameter]).abs();
        let sigma_parameter: f64 = solution.model_covariance[(i_parameter, i_parameter)].sqrt();
        assert!(error < 5.0 * sigma_parameter, "parameter {} off by {:e} (sigma {:e})", i_parameter, error, sigma_parameter);
    }
    // Reduced misfit of pure noise is close to one (normalised by N, so slightly below)
    assert!(solution.chi2 > 0.5 && solution.chi2 < 1.5, "chi2 = {}", solution.chi2);
}

#[test]
fn test_strain_sphere_input_errors() {
    let phi: Array1<f64> = Array1::from(vec![-123.0, -122.0, -121.0]);
    let theta: Array1<f64> = Array1::from(vec![50.0, 49.0]);
    let values: Array1<f64> = Array1::from_elem(3, 0.01);
    let result = strain_sphere(&phi, &theta, &values, &values, &values, &values, true, ParameterSelection::Both);
    assert!(matches!(
        result,
        Err(Error::InputLengthMismatch {
            name: "theta",
            expected: 3,
            found: 2
        })
    ));

    let empty: Array1<f64> = Array1::zeros(0);
    let result = strain_sphere(&empty, &empty, &empty, &empty, &empty, &empty, true, ParameterSelection::Both);
    assert!(matches!(result, Err(Error::NoObservations)));

    let observations: Vec<VelocityObservation> = Vec::new();
    assert!(matches!(
        strain_sphere_observations(&observations, false, ParameterSelection::RotationOnly, DataOrdering::default()),
        Err(Error::NoObservations)
    ));
}
