//! Strain rate and rotation from GNSS velocities on a sphere.
//!
//! See Savage, Gan and Svarc (2001), JGR 106(B10), appendix on p. 22,005 for the derivation.
//! Note that `theta` is colatitude, so theta-ward means southward.

// Private modules
mod collinearity;
mod data_ordering;
mod design_matrix;
mod euler_vector;
mod observation;
mod parameter_selection;
mod solution;
mod solver;

// Public flattened exports
pub use collinearity::{COLLINEARITY_TOLERANCE, Collinearity, check_collinearity};
pub use data_ordering::DataOrdering;
pub use design_matrix::design_matrix;
pub use euler_vector::{EulerVector, euler_vector_from_rotation};
pub use observation::{ColatitudeConvention, VelocityObservation};
pub use parameter_selection::ParameterSelection;
pub use solution::{RigidRotation, SolverWarning, StrainRateTensor, StrainSphereSolution};
pub use solver::{strain_sphere, strain_sphere_observations, strain_sphere_with_ordering};

/// Mean equatorial Earth radius, metre
pub const EARTH_RADIUS: f64 = 6.378e6;

// Define the possible **external** failures this module can produce
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no velocity observations supplied")]
    NoObservations,
    #[error("`{name}` has {found} values but `phi` has {expected}")]
    InputLengthMismatch { name: &'static str, expected: usize, found: usize },
    #[error("linear algebra failure while {context} (station geometry: {collinearity:?})")]
    Linalg {
        context: &'static str,
        /// Degenerate station geometry found before the failure, the usual cause of a singular system
        collinearity: Option<Collinearity>,
        #[source]
        source: ndarray_linalg::error::LinalgError,
    },
}
