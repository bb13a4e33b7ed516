//! Invert the velocities of three stations in northern California and log the result.
//!
//! Run with `RUST_LOG=info cargo run --bin strain_demo`.

use gnss_strain_rs::strain_sphere::{DataOrdering, ParameterSelection, StrainSphereSolution, VelocityObservation, strain_sphere_observations};
use gnss_strain_rs::strain_tensor::HorizontalStrainTensor;
use log::{error, info, warn};
use std::process::ExitCode;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    env_logger::init();
    let time_start: Instant = Instant::now();

    // (longitude, latitude, v_east, v_north, s_east, s_north), metre / year
    let stations: [(f64, f64, f64, f64, f64, f64); 3] = [
        (-123.0, 40.0, 0.023, -0.013, 0.002, 0.002),
        (-123.0, 40.25, 0.025, -0.011, 0.002, 0.002),
        (-123.5, 40.5, 0.027, -0.011, 0.002, 0.002),
    ];
    let observations: Vec<VelocityObservation> = stations
        .iter()
        .map(|&(longitude, latitude, v_east, v_north, s_east, s_north)| {
            VelocityObservation::from_east_north(longitude, latitude, v_east, v_north, s_east, s_north)
        })
        .collect();

    let solution: StrainSphereSolution = match strain_sphere_observations(&observations, true, ParameterSelection::Both, DataOrdering::default()) {
        Ok(solution) => solution,
        Err(inversion_error) => {
            error!("strain_demo: inversion failed: {}", inversion_error);
            return ExitCode::FAILURE;
        }
    };
    for warning in &solution.warnings {
        warn!("strain_demo: {:?}", warning);
    }

    let strain_rate = &solution.strain_rate;
    info!(
        "e_phiphi = {:e} +/- {:e}, e_thetaphi = {:e} +/- {:e}, e_thetatheta = {:e} +/- {:e} (1 / yr)",
        strain_rate.e_phiphi, strain_rate.s_e_phiphi, strain_rate.e_thetaphi, strain_rate.s_e_thetaphi, strain_rate.e_thetatheta, strain_rate.s_e_thetatheta
    );
    info!(
        "omega_r = {:e} +/- {:e} (rad / yr), translation u_phi = {:.4}, u_theta = {:.4} (m / yr)",
        solution.rotation.omega_r, solution.rotation.s_omega_r, solution.rotation.u_phi, solution.rotation.u_theta
    );
    let (pole_colatitude, pole_longitude): (f64, f64) = solution.euler_vector.pole_degrees();
    info!(
        "Euler pole colatitude = {:.3}, longitude = {:.3} (degree), rate = {:e} (rad / yr)",
        pole_colatitude, pole_longitude, solution.euler_vector.omega
    );
    info!("chi2 = {:e}", solution.chi2);

    // Nanostrain / yr in local east / north axes
    let tensor: HorizontalStrainTensor = HorizontalStrainTensor::from_sphere(strain_rate, 1.0e9);
    match tensor.principal_strains() {
        Ok(principal) => {
            info!(
                "e1 = {:.2}, e2 = {:.2} (nanostrain / yr), e1 azimuth = {:.1} degree, dilatation = {:.2}",
                principal.e1,
                principal.e2,
                principal.azimuth_e1(),
                tensor.dilatation()
            );
        }
        Err(eigen_error) => {
            error!("strain_demo: eigen-decomposition failed: {}", eigen_error);
            return ExitCode::FAILURE;
        }
    }

    let duration: Duration = time_start.elapsed();
    info!("strain_demo time elapsed: {:?}", duration);
    return ExitCode::SUCCESS;
}
