//! Crustal strain rate from GNSS velocities.
//!
//! * `strain_sphere` - strain rate and rigid rotation of a station network on a sphere
//! * `strain_tensor` - principal strains and invariants of the horizontal tensor
//! * `strain_field` - triangle-by-triangle strain rate over a Delaunay triangulation
//! * `time_series` - offsets in daily displacement series and GRACE pairing

pub mod strain_field;
pub mod strain_sphere;
pub mod strain_tensor;
pub mod time_series;

#[cfg(feature = "python")]
mod python;

// Public flattened exports
pub use strain_field::{StrainField, StrainFieldSettings, TriangleStrain, VelocityField, compute_strain_field};
pub use strain_sphere::{ColatitudeConvention, DataOrdering, ParameterSelection, StrainSphereSolution, VelocityObservation, strain_sphere};
pub use strain_tensor::{HorizontalStrainTensor, PrincipalStrains};
pub use time_series::{Offset, PairedTimeseries, Timeseries};
