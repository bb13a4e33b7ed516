//! Triangle-wise strain rate mapping of a GNSS velocity field.
//!
//! The stations are Delaunay-triangulated in (longitude, latitude) and each triangle
//! is inverted with `strain_sphere`.

// Private modules
mod compute;
mod velocity_field;

// Public flattened exports
pub use compute::{StrainField, StrainFieldSettings, TriangleStrain, compute_strain_field};
pub use velocity_field::{StationVelocity, VelocityField};

// Define the possible **external** failures this module can produce
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{name}` has {found} values but `longitude` has {expected}")]
    InputLengthMismatch { name: &'static str, expected: usize, found: usize },
    #[error("Delaunay triangulation failed: {0}")]
    Triangulation(String),
    #[error("no station at triangle vertex ({longitude}, {latitude})")]
    VertexNotFound { longitude: f64, latitude: f64 },
    #[error("{n_stations} stations share the triangle vertex ({longitude}, {latitude})")]
    AmbiguousVertex { longitude: f64, latitude: f64, n_stations: usize },
    #[error("strain inversion failed")]
    Inversion(#[from] crate::strain_sphere::Error),
    #[error("eigen-decomposition of the strain rate tensor failed")]
    Eigen(#[source] ndarray_linalg::error::LinalgError),
}
