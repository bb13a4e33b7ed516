use ndarray::Array1;

/// Horizontal velocity of one GNSS site, in spherical (phi, theta) components
///
/// `theta` is colatitude, so the theta-ward direction is south.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityObservation {
    /// Longitude, degree
    pub phi: f64,
    /// Colatitude, degree
    pub theta: f64,
    /// Phi-ward (east) velocity, metre / year
    pub u_phi: f64,
    /// Theta-ward (south) velocity, metre / year
    pub u_theta: f64,
    /// Uncertainty of `u_phi`, metre / year
    pub s_phi: f64,
    /// Uncertainty of `u_theta`, metre / year
    pub s_theta: f64,
}

/// How a latitude becomes the `theta` handed to the solver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColatitudeConvention {
    /// `theta = 90 - latitude`, true colatitude
    Geographic,
    /// `theta = latitude - 90`, as used by the published strain maps.
    ///
    /// Flips the sign of every `theta` difference and of `sin(theta_0)`, which flips the sign of
    /// `omega_r` and of all three strain rate components. `omega_theta` and `omega_phi` are unchanged.
    ShiftedLatitude,
}

impl ColatitudeConvention {
    /// `theta` for `latitude`, degree
    pub fn colatitude(&self, latitude: f64) -> f64 {
        return match self {
            ColatitudeConvention::Geographic => 90.0 - latitude,
            ColatitudeConvention::ShiftedLatitude => latitude - 90.0,
        };
    }
}

impl VelocityObservation {
    /// Build an observation from a geographic station velocity, with true colatitude
    ///
    /// # Arguments
    /// * `longitude`, `latitude` - degree
    /// * `v_east`, `v_north` - metre / year
    /// * `s_east`, `s_north` - 1-sigma uncertainties, metre / year
    ///
    pub fn from_east_north(longitude: f64, latitude: f64, v_east: f64, v_north: f64, s_east: f64, s_north: f64) -> Self {
        return VelocityObservation::from_east_north_with_convention(longitude, latitude, v_east, v_north, s_east, s_north, ColatitudeConvention::Geographic);
    }

    /// `from_east_north` with `theta` taken from `convention`; `u_theta` is `-v_north` either way
    pub fn from_east_north_with_convention(
        longitude: f64,
        latitude: f64,
        v_east: f64,
        v_north: f64,
        s_east: f64,
        s_north: f64,
        convention: ColatitudeConvention,
    ) -> Self {
        return VelocityObservation {
            phi: longitude,
            theta: convention.colatitude(latitude),
            u_phi: v_east,
            u_theta: -v_north,
            s_phi: s_east,
            s_theta: s_north,
        };
    }
}

/// Parallel arrays `(phi, theta, u_phi, u_theta, s_phi, s_theta)`, the layout the solver works on
pub(crate) fn observations_to_arrays(
    observations: &[VelocityObservation],
) -> (Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>, Array1<f64>) {
    let collect = |field: fn(&VelocityObservation) -> f64| -> Array1<f64> { observations.iter().map(field).collect() };

    return (
        collect(|obs| obs.phi),
        collect(|obs| obs.theta),
        collect(|obs| obs.u_phi),
        collect(|obs| obs.u_theta),
        collect(|obs| obs.s_phi),
        collect(|obs| obs.s_theta),
    );
}

#[test]
fn test_from_east_north() {
    let obs: VelocityObservation = VelocityObservation::from_east_north(-123.0, 40.25, 0.025, 0.011, 0.002, 0.003);
    assert_eq!(obs.phi, -123.0);
    assert_eq!(obs.theta, 49.75);
    assert_eq!(obs.u_phi, 0.025);
    assert_eq!(obs.u_theta, -0.011);
    assert_eq!(obs.s_phi, 0.002);
    assert_eq!(obs.s_theta, 0.003);

    let (phi, theta, _u_phi, u_theta, _s_phi, s_theta) = observations_to_arrays(&[obs, obs]);
    assert_eq!(phi.len(), 2);
    assert_eq!(theta[1], 49.75);
    assert_eq!(u_theta[0], -0.011);
    assert_eq!(s_theta[1], 0.003);
}

#[test]
fn test_colatitude_convention() {
    assert_eq!(ColatitudeConvention::Geographic.colatitude(40.25), 49.75);
    assert_eq!(ColatitudeConvention::ShiftedLatitude.colatitude(40.25), -49.75);

    let obs: VelocityObservation =
        VelocityObservation::from_east_north_with_convention(-123.0, 40.25, 0.025, 0.011, 0.002, 0.003, ColatitudeConvention::ShiftedLatitude);
    assert_eq!(obs.theta, -49.75);
    assert_eq!(obs.u_theta, -0.011);
}
