use super::{Error, StationVelocity, VelocityField};
use crate::strain_sphere::{
    ColatitudeConvention, DataOrdering, ParameterSelection, SolverWarning, StrainSphereSolution, VelocityObservation, strain_sphere_observations,
};
use crate::strain_tensor::{HorizontalStrainTensor, PrincipalStrains};
use approx::abs_diff_eq;
use geo::{Centroid, Coord, MultiPoint, Point, TriangulateSpade, Triangle};
use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Largest coordinate difference (degree) for a triangle vertex to match a station
const VERTEX_MATCH_TOLERANCE: f64 = 1e-9;

/// Settings for `compute_strain_field`
///
/// The default reproduces the published strain maps: stacked data and `theta = latitude - 90`.
/// Compared with `StrainFieldSettings::geographic()` on the same data ordering, that convention gives
/// `exx`, `exy` and `rotation` of opposite sign and the same `eyy`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrainFieldSettings {
    /// Use the velocity uncertainties as weights
    pub weighted: bool,
    pub parameter_selection: ParameterSelection,
    /// Applied to the strain rate and rotation; 1000 turns mm/yr velocities into nanostrain/yr
    pub output_scale: f64,
    pub data_ordering: DataOrdering,
    pub colatitude_convention: ColatitudeConvention,
}

impl Default for StrainFieldSettings {
    fn default() -> Self {
        return StrainFieldSettings {
            weighted: true,
            parameter_selection: ParameterSelection::Both,
            output_scale: 1000.0,
            data_ordering: DataOrdering::ComponentStacked,
            colatitude_convention: ColatitudeConvention::ShiftedLatitude,
        };
    }
}

impl StrainFieldSettings {
    /// True colatitude with each velocity against its own site's rows:
    /// `exx` is east-west extension and `rotation` is positive counter-clockwise
    pub fn geographic() -> Self {
        return StrainFieldSettings {
            data_ordering: DataOrdering::SiteInterleaved,
            colatitude_convention: ColatitudeConvention::Geographic,
            ..StrainFieldSettings::default()
        };
    }
}

/// Strain rate estimated from the three stations of one Delaunay triangle
#[derive(Clone, Debug)]
pub struct TriangleStrain {
    /// Indices into `VelocityField::stations`
    pub station_indices: [usize; 3],
    /// (longitude, latitude) vertices, degree
    pub triangle: Triangle<f64>,
    pub centroid: Point<f64>,
    /// Local east / north tensor, scaled by `output_scale`
    pub strain_tensor: HorizontalStrainTensor,
    pub principal: PrincipalStrains,
    /// `log10(|second invariant|)`
    pub log10_second_invariant: f64,
    pub max_shear: f64,
    /// Vertical-axis rotation rate `omega_r`, scaled by `output_scale`
    pub rotation: f64,
    pub chi2: f64,
    pub warnings: Vec<SolverWarning>,
}

/// Strain rate over a triangulated station network
#[derive(Clone, Debug, Default)]
pub struct StrainField {
    pub triangles: Vec<TriangleStrain>,
}

impl StrainField {
    pub fn len(&self) -> usize {
        return self.triangles.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.triangles.is_empty();
    }

    /// One value per triangle, for the plotting collaborators
    pub fn column<F>(&self, value: F) -> Array1<f64>
    where
        F: Fn(&TriangleStrain) -> f64,
    {
        return self.triangles.iter().map(value).collect();
    }
}

/// Map the strain rate over a station network, one inversion per Delaunay triangle
///
/// # Arguments
/// * `velocity_field` - station positions, velocities and uncertainties
/// * `settings` - inversion settings and output scaling
///
/// # Returns
/// * `strain_field` - one `TriangleStrain` per triangle, in triangulation order
///
/// # Errors
/// * `Error::AmbiguousVertex` if two stations share the coordinates of a triangle vertex
/// * `Error::Inversion` if a triangle cannot be inverted
///
pub fn compute_strain_field(velocity_field: &VelocityField, settings: &StrainFieldSettings) -> Result<StrainField, Error> {
    let time_start: Instant = Instant::now();
    let stations: &Vec<StationVelocity> = &velocity_field.stations;

    let points: MultiPoint<f64> = stations.iter().map(|station| Point::new(station.longitude, station.latitude)).collect();
    let triangles: Vec<Triangle<f64>> = points
        .unconstrained_triangulation()
        .map_err(|error| Error::Triangulation(format!("{:?}", error)))?;
    info!("compute_strain_field: {} triangles from {} stations", triangles.len(), stations.len());

    let results: Vec<TriangleStrain> = triangles
        .into_par_iter() // Use Rayon to create a parallel iterator
        .map(|triangle| triangle_strain(stations, triangle, settings))
        .collect::<Result<Vec<TriangleStrain>, Error>>()?;

    let n_degenerate: usize = results.iter().filter(|result| !result.warnings.is_empty()).count();
    if n_degenerate > 0 {
        warn!("compute_strain_field: {} triangles have degenerate geometry", n_degenerate);
    }

    let duration: Duration = time_start.elapsed();
    info!("compute_strain_field time elapsed: {:?}", duration);

    return Ok(StrainField { triangles: results });
}

fn triangle_strain(stations: &[StationVelocity], triangle: Triangle<f64>, settings: &StrainFieldSettings) -> Result<TriangleStrain, Error> {
    let vertices: [Coord<f64>; 3] = triangle.to_array();
    let station_indices: [usize; 3] = [
        station_index(stations, vertices[0])?,
        station_index(stations, vertices[1])?,
        station_index(stations, vertices[2])?,
    ];

    let observations: Vec<VelocityObservation> = station_indices
        .iter()
        .map(|&i_station| stations[i_station].to_observation(settings.colatitude_convention))
        .collect();
    let solution: StrainSphereSolution =
        strain_sphere_observations(&observations, settings.weighted, settings.parameter_selection, settings.data_ordering)?;

    let strain_tensor: HorizontalStrainTensor =
        HorizontalStrainTensor::from_sphere_with_convention(&solution.strain_rate, settings.output_scale, settings.colatitude_convention);
    let principal: PrincipalStrains = if solution.strain_rate.is_finite() {
        strain_tensor.principal_strains().map_err(Error::Eigen)?
    } else {
        PrincipalStrains {
            e1: f64::NAN,
            e2: f64::NAN,
            eigenvectors: Array2::from_elem((2, 2), f64::NAN),
        }
    };
    let log10_second_invariant: f64 = strain_tensor.second_invariant().abs().log10();
    let max_shear: f64 = principal.max_shear();
    debug!(
        "triangle {:?}: e1={:e}, e2={:e}, rotation={:e}",
        station_indices,
        principal.e1,
        principal.e2,
        solution.rotation.omega_r * settings.output_scale
    );

    return Ok(TriangleStrain {
        station_indices,
        triangle,
        centroid: triangle.centroid(),
        strain_tensor,
        principal,
        log10_second_invariant,
        max_shear,
        rotation: solution.rotation.omega_r * settings.output_scale,
        chi2: solution.chi2,
        warnings: solution.warnings,
    });
}

/// Index of the unique station at `vertex`
fn station_index(stations: &[StationVelocity], vertex: Coord<f64>) -> Result<usize, Error> {
    let matches: Vec<usize> = stations
        .iter()
        .enumerate()
        .filter(|(_, station)| {
            abs_diff_eq!(station.longitude, vertex.x, epsilon = VERTEX_MATCH_TOLERANCE)
                && abs_diff_eq!(station.latitude, vertex.y, epsilon = VERTEX_MATCH_TOLERANCE)
        })
        .map(|(i_station, _)| i_station)
        .collect();

    return match matches.as_slice() {
        [i_station] => Ok(*i_station),
        [] => Err(Error::VertexNotFound {
            longitude: vertex.x,
            latitude: vertex.y,
        }),
        _ => Err(Error::AmbiguousVertex {
            longitude: vertex.x,
            latitude: vertex.y,
            n_stations: matches.len(),
        }),
    };
}

// Stations on a regular-ish grid, with velocities from a uniform velocity gradient (metre / year per degree)
#[cfg(test)]
fn synthetic_field(d_v_east_d_lon: f64, d_v_east_d_lat: f64, d_v_north_d_lon: f64, d_v_north_d_lat: f64) -> VelocityField {
    let lon_0: f64 = -118.0;
    let lat_0: f64 = 35.0;
    let offsets: [(f64, f64); 6] = [(0.0, 0.0), (0.4, 0.05), (0.85, -0.1), (0.1, 0.45), (0.5, 0.5), (0.9, 0.4)];
    let stations: Vec<StationVelocity> = offsets
        .iter()
        .enumerate()
        .map(|(i_station, &(d_lon, d_lat))| StationVelocity {
            name: format!("S{:03}", i_station),
            longitude: lon_0 + d_lon,
            latitude: lat_0 + d_lat,
            v_east: 0.004 + d_v_east_d_lon * d_lon + d_v_east_d_lat * d_lat,
            v_north: 0.002 + d_v_north_d_lon * d_lon + d_v_north_d_lat * d_lat,
            s_east: 0.001,
            s_north: 0.001,
        })
        .collect();
    return VelocityField::new(stations);
}

#[test]
fn test_compute_strain_field_north_south_stretching() {
    use approx::assert_abs_diff_eq;

    // North velocity increases northward: extension along north, nothing else
    let field: VelocityField = synthetic_field(0.0, 0.0, 0.0, 0.004);
    let strain_field: StrainField = compute_strain_field(&field, &StrainFieldSettings::geographic()).unwrap();

    // Six points in general position: 2 * n - 2 - n_hull triangles, at least 4
    assert!(strain_field.len() >= 4);
    for triangle in strain_field.triangles.iter() {
        let tensor: HorizontalStrainTensor = triangle.strain_tensor;
        // 0.004 m/yr per degree of latitude, over ~111 km, times the 1000 output scale
        let eyy_expected: f64 = 1000.0 * 0.004 / (crate::strain_sphere::EARTH_RADIUS * 1.0_f64.to_radians());
        assert_abs_diff_eq!(tensor.eyy, eyy_expected, epsilon = 0.05 * eyy_expected);
        assert!(tensor.exx.abs() < 0.05 * eyy_expected);
        assert!(tensor.exy.abs() < 0.05 * eyy_expected);
        assert!(triangle.principal.e1 > 0.0);
        // e1 axis points north (or south)
        assert!(triangle.principal.azimuth_e1() < 5.0 || triangle.principal.azimuth_e1() > 175.0);
        assert_abs_diff_eq!(triangle.chi2, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(triangle.max_shear, (triangle.principal.e1 - triangle.principal.e2) / 2.0, epsilon = 1e-18);
        assert!(triangle.log10_second_invariant.is_finite() || tensor.second_invariant() == 0.0);
    }
}

#[test]
fn test_compute_strain_field_rigid_spin() {
    // Counter-clockwise spin about the vertical: east velocity decreases northward, north velocity increases eastward
    let field: VelocityField = synthetic_field(0.0, -0.004, 0.004, 0.0);
    let strain_field: StrainField = compute_strain_field(&field, &StrainFieldSettings::geographic()).unwrap();

    for triangle in strain_field.triangles.iter() {
        assert!(triangle.rotation > 0.0, "rotation = {}", triangle.rotation);
        // Very little strain compared to the rotation
        assert!(triangle.principal.e1.abs() < 0.3 * triangle.rotation);
        assert!(triangle.principal.e2.abs() < 0.3 * triangle.rotation);
    }
}

#[test]
fn test_compute_strain_field_shifted_latitude_signs() {
    use approx::assert_relative_eq;

    // One triangle stretched east-west and north-south
    let mut field: VelocityField = synthetic_field(0.003, 0.0, 0.0, 0.001);
    field.stations.truncate(3);

    for data_ordering in [DataOrdering::SiteInterleaved, DataOrdering::ComponentStacked] {
        let geographic_settings: StrainFieldSettings = StrainFieldSettings {
            data_ordering,
            ..StrainFieldSettings::geographic()
        };
        let shifted_settings: StrainFieldSettings = StrainFieldSettings {
            data_ordering,
            ..StrainFieldSettings::default()
        };
        let geographic: StrainField = compute_strain_field(&field, &geographic_settings).unwrap();
        let shifted: StrainField = compute_strain_field(&field, &shifted_settings).unwrap();
        assert_eq!(geographic.len(), 1);
        assert_eq!(shifted.len(), 1);

        let expected: &TriangleStrain = &geographic.triangles[0];
        let found: &TriangleStrain = &shifted.triangles[0];
        assert_eq!(found.station_indices, expected.station_indices);
        assert_relative_eq!(found.strain_tensor.exx, -expected.strain_tensor.exx, max_relative = 1e-9);
        assert_relative_eq!(found.strain_tensor.exy, -expected.strain_tensor.exy, epsilon = 1e-15, max_relative = 1e-9);
        assert_relative_eq!(found.strain_tensor.eyy, expected.strain_tensor.eyy, max_relative = 1e-9);
        assert_relative_eq!(found.rotation, -expected.rotation, epsilon = 1e-15, max_relative = 1e-9);
    }

    // With true colatitude east-west extension is positive exx
    let geographic: StrainField = compute_strain_field(&field, &StrainFieldSettings::geographic()).unwrap();
    let tensor: HorizontalStrainTensor = geographic.triangles[0].strain_tensor;
    assert!(tensor.exx > 0.0, "exx = {}", tensor.exx);
    assert!(tensor.eyy > 0.0, "eyy = {}", tensor.eyy);
    assert!(tensor.exx > 2.0 * tensor.eyy);
}

#[test]
fn test_compute_strain_field_vertices_and_centroids() {
    use approx::assert_abs_diff_eq;

    let field: VelocityField = synthetic_field(0.001, 0.0, 0.0, 0.0);
    let strain_field: StrainField = compute_strain_field(&field, &StrainFieldSettings::default()).unwrap();

    for triangle in strain_field.triangles.iter() {
        let vertices: [Coord<f64>; 3] = triangle.triangle.to_array();
        for (i_vertex, &i_station) in triangle.station_indices.iter().enumerate() {
            assert_eq!(field.stations[i_station].longitude, vertices[i_vertex].x);
            assert_eq!(field.stations[i_station].latitude, vertices[i_vertex].y);
        }
        let mean_lon: f64 = vertices.iter().map(|vertex| vertex.x).sum::<f64>() / 3.0;
        let mean_lat: f64 = vertices.iter().map(|vertex| vertex.y).sum::<f64>() / 3.0;
        assert_abs_diff_eq!(triangle.centroid.x(), mean_lon, epsilon = 1e-12);
        assert_abs_diff_eq!(triangle.centroid.y(), mean_lat, epsilon = 1e-12);
    }

    let rotation: Array1<f64> = strain_field.column(|triangle| triangle.rotation);
    assert_eq!(rotation.len(), strain_field.len());
}

#[test]
fn test_compute_strain_field_duplicate_station() {
    let mut field: VelocityField = synthetic_field(0.001, 0.0, 0.0, 0.0);
    let mut duplicate: StationVelocity = field.stations[0].clone();
    duplicate.name = "DUPL".to_string();
    field.stations.push(duplicate);

    let result = compute_strain_field(&field, &StrainFieldSettings::default());
    assert!(matches!(result, Err(Error::AmbiguousVertex { n_stations: 2, .. })));
}

#[test]
fn test_compute_strain_field_too_few_stations() {
    let mut field: VelocityField = synthetic_field(0.001, 0.0, 0.0, 0.0);
    field.stations.truncate(2);

    let strain_field: StrainField = compute_strain_field(&field, &StrainFieldSettings::default()).unwrap();
    assert!(strain_field.is_empty());
}
