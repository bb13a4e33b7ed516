use crate::strain_field::{StrainField, StrainFieldSettings, TriangleStrain, VelocityField, compute_strain_field};
use crate::strain_sphere::{Collinearity, DataOrdering, ParameterSelection, StrainSphereSolution, strain_sphere_with_ordering};
use ndarray::{Array1, Array2};
use numpy::IntoPyArray; // converting to python data types
use numpy::PyArray1;
use numpy::PyArrayMethods; // used in to convert python data into ndarray
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

/// A Python module implemented in Rust; bindings added here
#[pymodule]
fn gnss_strain_rs(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    /// `weight` and `paramsel` take the legacy integer codes:
    /// `weight = 1` weights by the uncertainties, `paramsel = 1` rotation only,
    /// `paramsel = 2` strain only, anything else both.
    /// `interleaved = True` pairs each velocity with its own site's design matrix rows.
    #[pyfn(m)]
    #[pyo3(signature = (phi, theta, u_phi, u_theta, s_phi, s_theta, weight=1, paramsel=0, interleaved=false))]
    fn strain_sphere_py<'py>(
        py: Python<'py>,
        phi: &Bound<'py, PyArray1<f64>>,
        theta: &Bound<'py, PyArray1<f64>>,
        u_phi: &Bound<'py, PyArray1<f64>>,
        u_theta: &Bound<'py, PyArray1<f64>>,
        s_phi: &Bound<'py, PyArray1<f64>>,
        s_theta: &Bound<'py, PyArray1<f64>>,
        weight: i64,
        paramsel: i64,
        interleaved: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let phi_ndarray: Array1<f64> = Array1::from(unsafe { phi.as_array() }.to_vec());
        let theta_ndarray: Array1<f64> = Array1::from(unsafe { theta.as_array() }.to_vec());
        let u_phi_ndarray: Array1<f64> = Array1::from(unsafe { u_phi.as_array() }.to_vec());
        let u_theta_ndarray: Array1<f64> = Array1::from(unsafe { u_theta.as_array() }.to_vec());
        let s_phi_ndarray: Array1<f64> = Array1::from(unsafe { s_phi.as_array() }.to_vec());
        let s_theta_ndarray: Array1<f64> = Array1::from(unsafe { s_theta.as_array() }.to_vec());

        let data_ordering: DataOrdering = if interleaved {
            DataOrdering::SiteInterleaved
        } else {
            DataOrdering::ComponentStacked
        };
        let solution: StrainSphereSolution = strain_sphere_with_ordering(
            &phi_ndarray,
            &theta_ndarray,
            &u_phi_ndarray,
            &u_theta_ndarray,
            &s_phi_ndarray,
            &s_theta_ndarray,
            weight == 1,
            ParameterSelection::from_code(paramsel),
            data_ordering,
        )
        .map_err(|error| PyValueError::new_err(format!("strain_sphere: {}", error)))?;

        let collinearity: Option<&str> = solution.collinearity().map(|kind| match kind {
            Collinearity::AlongLine => "along_line",
            Collinearity::ConstantCoordinate => "constant_coordinate",
        });

        let results: Bound<'py, PyDict> = PyDict::new(py);
        results.set_item("e_phiphi", solution.strain_rate.e_phiphi)?;
        results.set_item("e_thetaphi", solution.strain_rate.e_thetaphi)?;
        results.set_item("e_thetatheta", solution.strain_rate.e_thetatheta)?;
        results.set_item("s_e_phiphi", solution.strain_rate.s_e_phiphi)?;
        results.set_item("s_e_thetaphi", solution.strain_rate.s_e_thetaphi)?;
        results.set_item("s_e_thetatheta", solution.strain_rate.s_e_thetatheta)?;
        results.set_item("omega_theta", solution.rotation.omega_theta)?;
        results.set_item("omega_phi", solution.rotation.omega_phi)?;
        results.set_item("omega_r", solution.rotation.omega_r)?;
        results.set_item("s_omega_theta", solution.rotation.s_omega_theta)?;
        results.set_item("s_omega_phi", solution.rotation.s_omega_phi)?;
        results.set_item("s_omega_r", solution.rotation.s_omega_r)?;
        results.set_item("u_theta", solution.rotation.u_theta)?;
        results.set_item("u_phi", solution.rotation.u_phi)?;
        results.set_item("s_u_theta", solution.rotation.s_u_theta)?;
        results.set_item("s_u_phi", solution.rotation.s_u_phi)?;
        results.set_item("omega", solution.euler_vector.omega)?;
        results.set_item("theta_p", solution.euler_vector.theta_p)?;
        results.set_item("phi_p", solution.euler_vector.phi_p)?;
        results.set_item("s_omega", solution.euler_vector.s_omega)?;
        results.set_item("s_theta_p", solution.euler_vector.s_theta_p)?;
        results.set_item("s_phi_p", solution.euler_vector.s_phi_p)?;
        results.set_item("r_phi_theta", solution.euler_vector.r_phi_theta)?;
        results.set_item("chi2", solution.chi2)?;
        results.set_item("u_phi_predicted", solution.u_phi_predicted.into_pyarray(py))?;
        results.set_item("u_theta_predicted", solution.u_theta_predicted.into_pyarray(py))?;
        results.set_item("model", solution.model.into_pyarray(py))?;
        results.set_item("model_covariance", solution.model_covariance.into_pyarray(py))?;
        results.set_item("collinearity", collinearity)?;

        return Ok(results);
    }

    /// `geographic = True` uses true colatitude and interleaved data, see `StrainFieldSettings::geographic`
    #[pyfn(m)]
    #[pyo3(signature = (longitude, latitude, v_east, v_north, s_east, s_north, weighted=true, paramsel=0, output_scale=1000.0, geographic=false))]
    fn compute_strain_field_py<'py>(
        py: Python<'py>,
        longitude: &Bound<'py, PyArray1<f64>>,
        latitude: &Bound<'py, PyArray1<f64>>,
        v_east: &Bound<'py, PyArray1<f64>>,
        v_north: &Bound<'py, PyArray1<f64>>,
        s_east: &Bound<'py, PyArray1<f64>>,
        s_north: &Bound<'py, PyArray1<f64>>,
        weighted: bool,
        paramsel: i64,
        output_scale: f64,
        geographic: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let longitude_ndarray: Array1<f64> = Array1::from(unsafe { longitude.as_array() }.to_vec());
        let latitude_ndarray: Array1<f64> = Array1::from(unsafe { latitude.as_array() }.to_vec());
        let v_east_ndarray: Array1<f64> = Array1::from(unsafe { v_east.as_array() }.to_vec());
        let v_north_ndarray: Array1<f64> = Array1::from(unsafe { v_north.as_array() }.to_vec());
        let s_east_ndarray: Array1<f64> = Array1::from(unsafe { s_east.as_array() }.to_vec());
        let s_north_ndarray: Array1<f64> = Array1::from(unsafe { s_north.as_array() }.to_vec());

        let velocity_field: VelocityField = VelocityField::from_arrays(
            &longitude_ndarray,
            &latitude_ndarray,
            &v_east_ndarray,
            &v_north_ndarray,
            &s_east_ndarray,
            &s_north_ndarray,
        )
        .map_err(|error| PyValueError::new_err(format!("compute_strain_field: {}", error)))?;
        let base_settings: StrainFieldSettings = if geographic {
            StrainFieldSettings::geographic()
        } else {
            StrainFieldSettings::default()
        };
        let settings: StrainFieldSettings = StrainFieldSettings {
            weighted,
            parameter_selection: ParameterSelection::from_code(paramsel),
            output_scale,
            ..base_settings
        };
        let strain_field: StrainField =
            compute_strain_field(&velocity_field, &settings).map_err(|error| PyValueError::new_err(format!("compute_strain_field: {}", error)))?;

        // Vertices as [n_triangles, 3] arrays, in the triangulation's vertex order
        let n_triangles: usize = strain_field.len();
        let mut vertex_indices: Array2<usize> = Array2::zeros((n_triangles, 3));
        let mut vertex_longitude: Array2<f64> = Array2::zeros((n_triangles, 3));
        let mut vertex_latitude: Array2<f64> = Array2::zeros((n_triangles, 3));
        for (i_triangle, triangle_strain) in strain_field.triangles.iter().enumerate() {
            for (i_vertex, coordinate) in triangle_strain.triangle.to_array().iter().enumerate() {
                vertex_indices[(i_triangle, i_vertex)] = triangle_strain.station_indices[i_vertex];
                vertex_longitude[(i_triangle, i_vertex)] = coordinate.x;
                vertex_latitude[(i_triangle, i_vertex)] = coordinate.y;
            }
        }

        let results: Bound<'py, PyDict> = PyDict::new(py);
        results.set_item("vertex_indices", vertex_indices.into_pyarray(py))?;
        results.set_item("vertex_longitude", vertex_longitude.into_pyarray(py))?;
        results.set_item("vertex_latitude", vertex_latitude.into_pyarray(py))?;
        results.set_item("centroid_longitude", strain_field.column(|triangle: &TriangleStrain| triangle.centroid.x()).into_pyarray(py))?;
        results.set_item("centroid_latitude", strain_field.column(|triangle: &TriangleStrain| triangle.centroid.y()).into_pyarray(py))?;
        results.set_item("exx", strain_field.column(|triangle: &TriangleStrain| triangle.strain_tensor.exx).into_pyarray(py))?;
        results.set_item("exy", strain_field.column(|triangle: &TriangleStrain| triangle.strain_tensor.exy).into_pyarray(py))?;
        results.set_item("eyy", strain_field.column(|triangle: &TriangleStrain| triangle.strain_tensor.eyy).into_pyarray(py))?;
        results.set_item("e1", strain_field.column(|triangle: &TriangleStrain| triangle.principal.e1).into_pyarray(py))?;
        results.set_item("e2", strain_field.column(|triangle: &TriangleStrain| triangle.principal.e2).into_pyarray(py))?;
        results.set_item("azimuth_e1", strain_field.column(|triangle: &TriangleStrain| triangle.principal.azimuth_e1()).into_pyarray(py))?;
        results.set_item(
            "log10_second_invariant",
            strain_field.column(|triangle: &TriangleStrain| triangle.log10_second_invariant).into_pyarray(py),
        )?;
        results.set_item("max_shear", strain_field.column(|triangle: &TriangleStrain| triangle.max_shear).into_pyarray(py))?;
        results.set_item("rotation", strain_field.column(|triangle: &TriangleStrain| triangle.rotation).into_pyarray(py))?;
        results.set_item("chi2", strain_field.column(|triangle: &TriangleStrain| triangle.chi2).into_pyarray(py))?;

        return Ok(results);
    }

    Ok(())
}
