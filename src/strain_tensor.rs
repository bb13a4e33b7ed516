use crate::strain_sphere::{ColatitudeConvention, StrainRateTensor};
use ndarray::{Array1, Array2, array};
use ndarray_linalg::error::LinalgError;
use ndarray_linalg::{Eigh, UPLO};

/// Symmetric 2x2 horizontal strain rate tensor in local east (x) and north (y) axes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizontalStrainTensor {
    pub exx: f64,
    pub exy: f64,
    pub eyy: f64,
}

/// Principal strain rates and directions
#[derive(Clone, Debug, PartialEq)]
pub struct PrincipalStrains {
    /// Largest (most extensional) principal strain rate
    pub e1: f64,
    /// Smallest (most compressional) principal strain rate
    pub e2: f64,
    /// Unit eigenvectors as columns: column 0 belongs to `e1`, column 1 to `e2`. shape = [2, 2]
    pub eigenvectors: Array2<f64>,
}

impl PrincipalStrains {
    pub fn max_shear(&self) -> f64 {
        return (self.e1 - self.e2) / 2.0;
    }

    /// Azimuth of the `e1` axis, degree clockwise from north, in [0, 180)
    pub fn azimuth_e1(&self) -> f64 {
        let east: f64 = self.eigenvectors[(0, 0)];
        let north: f64 = self.eigenvectors[(1, 0)];
        return east.atan2(north).to_degrees().rem_euclid(180.0);
    }
}

impl HorizontalStrainTensor {
    pub fn new(exx: f64, exy: f64, eyy: f64) -> Self {
        return HorizontalStrainTensor { exx, exy, eyy };
    }

    /// Rotate a spherical strain rate tensor into local east / north axes
    ///
    /// theta (colatitude) increases southward, so with `y` = north:
    /// `exx = e_phiphi`, `exy = -e_thetaphi`, `eyy = e_thetatheta`.
    ///
    /// # Arguments
    /// * `strain_rate` - spherical components, 1 / year
    /// * `scale` - unit conversion applied to every component, e.g. `1000.0` for velocities in mm / yr
    ///
    pub fn from_sphere(strain_rate: &StrainRateTensor, scale: f64) -> Self {
        return HorizontalStrainTensor {
            exx: scale * strain_rate.e_phiphi,
            exy: -scale * strain_rate.e_thetaphi,
            eyy: scale * strain_rate.e_thetatheta,
        };
    }

    /// Local east / north tensor of a solve made with `convention`
    ///
    /// `ColatitudeConvention::ShiftedLatitude` negates the shear and theta-theta components:
    /// `exx = e_phiphi`, `exy = -e_thetaphi`, `eyy = -e_thetatheta`. Because that solve has already
    /// flipped every strain component, the result against the same data solved with true colatitude is
    /// `exx` and `exy` of opposite sign and the same `eyy`.
    pub fn from_sphere_with_convention(strain_rate: &StrainRateTensor, scale: f64, convention: ColatitudeConvention) -> Self {
        return match convention {
            ColatitudeConvention::Geographic => HorizontalStrainTensor::from_sphere(strain_rate, scale),
            ColatitudeConvention::ShiftedLatitude => HorizontalStrainTensor {
                exx: scale * strain_rate.e_phiphi,
                exy: -scale * strain_rate.e_thetaphi,
                eyy: -scale * strain_rate.e_thetatheta,
            },
        };
    }

    pub fn as_matrix(&self) -> Array2<f64> {
        return array![[self.exx, self.exy], [self.exy, self.eyy]];
    }

    /// Second invariant, `sqrt(|exx * eyy - exy^2|)`
    pub fn second_invariant(&self) -> f64 {
        return (self.exx * self.eyy - self.exy.powi(2)).abs().sqrt();
    }

    /// Areal strain rate (trace)
    pub fn dilatation(&self) -> f64 {
        return self.exx + self.eyy;
    }

    /// Eigenvalues and eigenvectors, sorted so that `e1 >= e2`
    pub fn principal_strains(&self) -> Result<PrincipalStrains, LinalgError> {
        // `eigh` returns the eigenvalues in ascending order
        let (eigenvalues, eigenvectors): (Array1<f64>, Array2<f64>) = self.as_matrix().eigh(UPLO::Lower)?;

        let mut sorted_eigenvectors: Array2<f64> = Array2::zeros((2, 2));
        sorted_eigenvectors.column_mut(0).assign(&eigenvectors.column(1));
        sorted_eigenvectors.column_mut(1).assign(&eigenvectors.column(0));

        return Ok(PrincipalStrains {
            e1: eigenvalues[1],
            e2: eigenvalues[0],
            eigenvectors: sorted_eigenvectors,
        });
    }

    pub fn max_shear(&self) -> Result<f64, LinalgError> {
        return Ok(self.principal_strains()?.max_shear());
    }
}

#[test]
fn test_principal_strains_of_rotated_uniaxial_extension() {
    use approx::assert_abs_diff_eq;

    // Uniaxial extension of 30 nanostrain / yr along azimuth N30E, plus 10 of shortening normal to it
    let azimuth: f64 = 30.0_f64.to_radians();
    let (s, c): (f64, f64) = azimuth.sin_cos();
    let e_along: f64 = 30.0;
    let e_across: f64 = -10.0;
    // Unit vectors (east, north): along = (sin, cos), across = (cos, -sin)
    let tensor: HorizontalStrainTensor = HorizontalStrainTensor::new(
        e_along * s * s + e_across * c * c,
        e_along * s * c - e_across * s * c,
        e_along * c * c + e_across * s * s,
    );

    let principal: PrincipalStrains = tensor.principal_strains().unwrap();
    assert_abs_diff_eq!(principal.e1, 30.0, epsilon = 1e-10);
    assert_abs_diff_eq!(principal.e2, -10.0, epsilon = 1e-10);
    assert_abs_diff_eq!(principal.max_shear(), 20.0, epsilon = 1e-10);
    assert_abs_diff_eq!(principal.azimuth_e1(), 30.0, epsilon = 1e-8);
    assert_abs_diff_eq!(tensor.dilatation(), 20.0, epsilon = 1e-10);
    assert_abs_diff_eq!(tensor.second_invariant(), 300.0_f64.sqrt(), epsilon = 1e-10);

    // Eigenvectors are orthonormal
    let v: &Array2<f64> = &principal.eigenvectors;
    assert_abs_diff_eq!(v.t().dot(v), Array2::eye(2), epsilon = 1e-12);
}

#[test]
fn test_from_sphere_sign_convention() {
    use approx::assert_abs_diff_eq;

    let strain_rate: StrainRateTensor = StrainRateTensor {
        e_phiphi: 1.0e-8,
        e_thetaphi: 2.0e-8,
        e_thetatheta: -3.0e-8,
        s_e_phiphi: 0.0,
        s_e_thetaphi: 0.0,
        s_e_thetatheta: 0.0,
    };
    let tensor: HorizontalStrainTensor = HorizontalStrainTensor::from_sphere(&strain_rate, 1000.0);

    assert_abs_diff_eq!(tensor.exx, 1.0e-5, epsilon = 1e-18);
    assert_abs_diff_eq!(tensor.exy, -2.0e-5, epsilon = 1e-18);
    assert_abs_diff_eq!(tensor.eyy, -3.0e-5, epsilon = 1e-18);

    let geographic: HorizontalStrainTensor = HorizontalStrainTensor::from_sphere_with_convention(&strain_rate, 1000.0, ColatitudeConvention::Geographic);
    assert_eq!(geographic, tensor);
    let shifted: HorizontalStrainTensor = HorizontalStrainTensor::from_sphere_with_convention(&strain_rate, 1000.0, ColatitudeConvention::ShiftedLatitude);
    assert_abs_diff_eq!(shifted.exx, 1.0e-5, epsilon = 1e-18);
    assert_abs_diff_eq!(shifted.exy, -2.0e-5, epsilon = 1e-18);
    assert_abs_diff_eq!(shifted.eyy, 3.0e-5, epsilon = 1e-18);
}

#[test]
fn test_pure_shear_max_shear() {
    use approx::assert_abs_diff_eq;

    let tensor: HorizontalStrainTensor = HorizontalStrainTensor::new(0.0, 5.0, 0.0);
    assert_abs_diff_eq!(tensor.max_shear().unwrap(), 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(tensor.dilatation(), 0.0);
    let principal: PrincipalStrains = tensor.principal_strains().unwrap();
    assert_abs_diff_eq!(principal.e1, 5.0, epsilon = 1e-12);
    // e1 axis is at N45E (or the equivalent S45W)
    assert_abs_diff_eq!(principal.azimuth_e1(), 45.0, epsilon = 1e-8);
}
