use super::{Collinearity, EulerVector};
use ndarray::{Array1, Array2};

/// Horizontal strain rate tensor in spherical components, 1 / year
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrainRateTensor {
    /// Extension rate along phi (east)
    pub e_phiphi: f64,
    /// Shear strain rate
    pub e_thetaphi: f64,
    /// Extension rate along theta (south)
    pub e_thetatheta: f64,
    pub s_e_phiphi: f64,
    pub s_e_thetaphi: f64,
    pub s_e_thetatheta: f64,
}

impl StrainRateTensor {
    pub fn nan() -> Self {
        return StrainRateTensor {
            e_phiphi: f64::NAN,
            e_thetaphi: f64::NAN,
            e_thetatheta: f64::NAN,
            s_e_phiphi: f64::NAN,
            s_e_thetaphi: f64::NAN,
            s_e_thetatheta: f64::NAN,
        };
    }

    pub fn is_finite(&self) -> bool {
        return self.e_phiphi.is_finite() && self.e_thetaphi.is_finite() && self.e_thetatheta.is_finite();
    }
}

/// Solid body rotation of the network about its centroid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidRotation {
    /// Rotation about the local theta axis, radian / year
    pub omega_theta: f64,
    /// Rotation about the local phi axis, radian / year
    pub omega_phi: f64,
    /// Rotation about the vertical axis, radian / year
    pub omega_r: f64,
    /// Average theta-ward translation, `r0 * omega_phi`, metre / year
    pub u_theta: f64,
    /// Average phi-ward translation, `-r0 * omega_theta`, metre / year
    pub u_phi: f64,
    pub s_omega_theta: f64,
    pub s_omega_phi: f64,
    pub s_omega_r: f64,
    pub s_u_theta: f64,
    pub s_u_phi: f64,
}

impl RigidRotation {
    pub fn nan() -> Self {
        return RigidRotation {
            omega_theta: f64::NAN,
            omega_phi: f64::NAN,
            omega_r: f64::NAN,
            u_theta: f64::NAN,
            u_phi: f64::NAN,
            s_omega_theta: f64::NAN,
            s_omega_phi: f64::NAN,
            s_omega_r: f64::NAN,
            s_u_theta: f64::NAN,
            s_u_phi: f64::NAN,
        };
    }

    pub fn is_finite(&self) -> bool {
        return self.omega_theta.is_finite() && self.omega_phi.is_finite() && self.omega_r.is_finite();
    }
}

/// Non-fatal problems found while solving; the numbers are returned regardless
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverWarning {
    /// Station geometry is degenerate, results may be unstable
    Collinear(Collinearity),
    /// At least one estimated parameter is NaN or infinite
    NonFiniteParameters,
}

/// Everything `strain_sphere` estimates
///
/// Components which were not solved for are NaN rather than 0, uncertainties included:
/// `s_e_*` in rotation-only mode, `s_omega_*` and `s_u_*` in strain-only mode.
#[derive(Clone, Debug)]
pub struct StrainSphereSolution {
    /// NaN, with NaN uncertainties, when only rotation was solved
    pub strain_rate: StrainRateTensor,
    /// NaN, with NaN uncertainties, when only strain was solved
    pub rotation: RigidRotation,
    /// NaN when only strain was solved
    pub euler_vector: EulerVector,
    /// Weighted misfit normalised by the number of data, `N = 2 * n_sites`
    pub chi2: f64,
    /// Even rows of `G * m`, the predicted phi-ward velocity at each site, metre / year
    pub u_phi_predicted: Array1<f64>,
    /// Odd rows of `G * m`, the predicted theta-ward velocity at each site, metre / year
    pub u_theta_predicted: Array1<f64>,
    /// Model vector, ordered as the design matrix columns
    pub model: Array1<f64>,
    /// Covariance of `model`
    pub model_covariance: Array2<f64>,
    /// Longitude of the network centroid, radian
    pub phi_0: f64,
    /// Colatitude of the network centroid, radian
    pub theta_0: f64,
    pub warnings: Vec<SolverWarning>,
}

impl StrainSphereSolution {
    pub fn collinearity(&self) -> Option<Collinearity> {
        return self.warnings.iter().find_map(|warning| match warning {
            SolverWarning::Collinear(kind) => Some(*kind),
            SolverWarning::NonFiniteParameters => None,
        });
    }
}
