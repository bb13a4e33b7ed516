use super::Error;
use crate::strain_sphere::{ColatitudeConvention, VelocityObservation};
use ndarray::Array1;

/// Horizontal velocity of a GNSS station, geographic components
#[derive(Clone, Debug, PartialEq)]
pub struct StationVelocity {
    pub name: String,
    /// degree
    pub longitude: f64,
    /// degree
    pub latitude: f64,
    /// East velocity, metre / year
    pub v_east: f64,
    /// North velocity, metre / year
    pub v_north: f64,
    pub s_east: f64,
    pub s_north: f64,
}

impl StationVelocity {
    pub fn to_observation(&self, convention: ColatitudeConvention) -> VelocityObservation {
        return VelocityObservation::from_east_north_with_convention(
            self.longitude,
            self.latitude,
            self.v_east,
            self.v_north,
            self.s_east,
            self.s_north,
            convention,
        );
    }
}

/// A network of station velocities
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VelocityField {
    pub stations: Vec<StationVelocity>,
}

impl VelocityField {
    pub fn new(stations: Vec<StationVelocity>) -> Self {
        return VelocityField { stations };
    }

    /// Build a field from parallel arrays; stations are named by their index
    ///
    /// # Arguments
    /// * `longitude`, `latitude` - degree
    /// * `v_east`, `v_north` - metre / year
    /// * `s_east`, `s_north` - 1-sigma uncertainties, metre / year
    ///
    pub fn from_arrays(
        longitude: &Array1<f64>,
        latitude: &Array1<f64>,
        v_east: &Array1<f64>,
        v_north: &Array1<f64>,
        s_east: &Array1<f64>,
        s_north: &Array1<f64>,
    ) -> Result<Self, Error> {
        let n_stations: usize = longitude.len();
        for (name, values) in [("latitude", latitude), ("v_east", v_east), ("v_north", v_north), ("s_east", s_east), ("s_north", s_north)] {
            if values.len() != n_stations {
                return Err(Error::InputLengthMismatch {
                    name,
                    expected: n_stations,
                    found: values.len(),
                });
            }
        }

        let stations: Vec<StationVelocity> = (0..n_stations)
            .map(|i_station| StationVelocity {
                name: format!("{:04}", i_station),
                longitude: longitude[i_station],
                latitude: latitude[i_station],
                v_east: v_east[i_station],
                v_north: v_north[i_station],
                s_east: s_east[i_station],
                s_north: s_north[i_station],
            })
            .collect();

        return Ok(VelocityField { stations });
    }

    pub fn len(&self) -> usize {
        return self.stations.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.stations.is_empty();
    }
}

#[test]
fn test_velocity_field_from_arrays() {
    let longitude: Array1<f64> = Array1::from(vec![-120.0, -119.0]);
    let latitude: Array1<f64> = Array1::from(vec![35.0, 36.0]);
    let values: Array1<f64> = Array1::from(vec![0.01, 0.02]);

    let field: VelocityField = VelocityField::from_arrays(&longitude, &latitude, &values, &values, &values, &values).unwrap();
    assert_eq!(field.len(), 2);
    assert_eq!(field.stations[1].name, "0001");
    assert_eq!(field.stations[1].v_north, 0.02);

    let observation: VelocityObservation = field.stations[0].to_observation(ColatitudeConvention::Geographic);
    assert_eq!(observation.theta, 55.0);
    assert_eq!(observation.u_theta, -0.01);
    let observation: VelocityObservation = field.stations[0].to_observation(ColatitudeConvention::ShiftedLatitude);
    assert_eq!(observation.theta, -55.0);

    let short: Array1<f64> = Array1::from(vec![0.01]);
    let result = VelocityField::from_arrays(&longitude, &latitude, &values, &short, &values, &values);
    assert!(matches!(result, Err(Error::InputLengthMismatch { name: "v_north", .. })));
}
