/// Which model parameters the spherical inversion estimates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterSelection {
    /// Solid body rotation only: `(omega_theta, omega_phi, omega_r)`
    RotationOnly,
    /// Horizontal strain rate only: `(e_phiphi, e_thetaphi, e_thetatheta)`
    StrainOnly,
    /// Rotation and strain rate, six parameters
    #[default]
    Both,
}

impl ParameterSelection {
    /// Decode the legacy integer selector: `1` = rotation only, `2` = strain only, anything else = both
    pub fn from_code(code: i64) -> Self {
        return match code {
            1 => ParameterSelection::RotationOnly,
            2 => ParameterSelection::StrainOnly,
            _ => ParameterSelection::Both,
        };
    }

    /// Number of columns in the design matrix
    pub fn n_parameters(&self) -> usize {
        return match self {
            ParameterSelection::RotationOnly | ParameterSelection::StrainOnly => 3,
            ParameterSelection::Both => 6,
        };
    }

    pub fn solves_rotation(&self) -> bool {
        return *self != ParameterSelection::StrainOnly;
    }

    pub fn solves_strain(&self) -> bool {
        return *self != ParameterSelection::RotationOnly;
    }

    /// Column of the first strain parameter in the design matrix, if strain is solved
    pub fn strain_offset(&self) -> Option<usize> {
        return match self {
            ParameterSelection::RotationOnly => None,
            ParameterSelection::StrainOnly => Some(0),
            ParameterSelection::Both => Some(3),
        };
    }
}

#[test]
fn test_parameter_selection_from_code() {
    assert_eq!(ParameterSelection::from_code(1), ParameterSelection::RotationOnly);
    assert_eq!(ParameterSelection::from_code(2), ParameterSelection::StrainOnly);
    assert_eq!(ParameterSelection::from_code(0), ParameterSelection::Both);
    assert_eq!(ParameterSelection::from_code(-7), ParameterSelection::Both);
    assert_eq!(ParameterSelection::default(), ParameterSelection::Both);

    assert_eq!(ParameterSelection::RotationOnly.n_parameters(), 3);
    assert_eq!(ParameterSelection::StrainOnly.n_parameters(), 3);
    assert_eq!(ParameterSelection::Both.n_parameters(), 6);

    assert_eq!(ParameterSelection::StrainOnly.strain_offset(), Some(0));
    assert_eq!(ParameterSelection::Both.strain_offset(), Some(3));
    assert!(!ParameterSelection::StrainOnly.solves_rotation());
    assert!(!ParameterSelection::RotationOnly.solves_strain());
}
