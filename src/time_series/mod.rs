//! Daily GNSS displacement time series: empirical offsets and pairing with GRACE loading models.

// Private modules
mod grace;
mod offsets;

// Public flattened exports
pub use grace::{PairedTimeseries, pair_gps_grace};
pub use offsets::{DEFAULT_OFFSET_WINDOW_DAYS, Offset, filter_offset_list_to_date, fit_single_offset, remove_offsets, solve_for_offsets};

use chrono::{Datelike, NaiveDate};
use ndarray::Array1;

// Define the possible **external** failures this module can produce
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{name}` has {found} samples but `dates` has {expected}")]
    ComponentLengthMismatch { name: &'static str, expected: usize, found: usize },
    #[error("interpolation failed")]
    Interpolation(#[from] interpolation::Error),
}

/// Displacement time series of one station, one sample per day, millimetre
#[derive(Clone, Debug, PartialEq)]
pub struct Timeseries {
    pub name: String,
    /// degree
    pub longitude: f64,
    /// degree
    pub latitude: f64,
    pub dates: Vec<NaiveDate>,
    pub d_east: Array1<f64>,
    pub d_north: Array1<f64>,
    pub d_up: Array1<f64>,
    pub s_east: Array1<f64>,
    pub s_north: Array1<f64>,
    pub s_up: Array1<f64>,
    pub earthquake_dates: Vec<NaiveDate>,
}

impl Timeseries {
    /// Create a time series, checking every component has one sample per date
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        longitude: f64,
        latitude: f64,
        dates: Vec<NaiveDate>,
        d_east: Array1<f64>,
        d_north: Array1<f64>,
        d_up: Array1<f64>,
        s_east: Array1<f64>,
        s_north: Array1<f64>,
        s_up: Array1<f64>,
        earthquake_dates: Vec<NaiveDate>,
    ) -> Result<Self, Error> {
        let n_dates: usize = dates.len();
        for (component_name, component) in [
            ("d_east", &d_east),
            ("d_north", &d_north),
            ("d_up", &d_up),
            ("s_east", &s_east),
            ("s_north", &s_north),
            ("s_up", &s_up),
        ] {
            check_length(component_name, component, n_dates)?;
        }

        return Ok(Timeseries {
            name: name.to_string(),
            longitude,
            latitude,
            dates,
            d_east,
            d_north,
            d_up,
            s_east,
            s_north,
            s_up,
            earthquake_dates,
        });
    }

    pub fn len(&self) -> usize {
        return self.dates.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.dates.is_empty();
    }

    /// Sample epochs as decimal years
    pub fn decimal_years(&self) -> Array1<f64> {
        return self.dates.iter().map(|&date| decimal_year(date)).collect();
    }
}

pub(crate) fn check_length(name: &'static str, values: &Array1<f64>, expected: usize) -> Result<(), Error> {
    if values.len() != expected {
        return Err(Error::ComponentLengthMismatch {
            name,
            expected,
            found: values.len(),
        });
    }
    return Ok(());
}

/// `year + (day_of_year - 1) / days_in_year`
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year: u32 = NaiveDate::from_ymd_opt(date.year(), 12, 31).map_or(365, |last_day| last_day.ordinal());
    return date.year() as f64 + (date.ordinal0() as f64) / (days_in_year as f64);
}

#[test]
fn test_decimal_year() {
    use approx::assert_abs_diff_eq;

    let new_year: NaiveDate = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    assert_abs_diff_eq!(decimal_year(new_year), 2020.0);

    // 2020 is a leap year, so 2 July is day 184 of 366
    let mid_leap_year: NaiveDate = NaiveDate::from_ymd_opt(2020, 7, 2).unwrap();
    assert_abs_diff_eq!(decimal_year(mid_leap_year), 2020.5, epsilon = 1e-12);

    let mid_year: NaiveDate = NaiveDate::from_ymd_opt(2021, 7, 2).unwrap();
    assert_abs_diff_eq!(decimal_year(mid_year), 2021.0 + 182.0 / 365.0, epsilon = 1e-12);
}

#[test]
fn test_timeseries_new_checks_lengths() {
    let dates: Vec<NaiveDate> = vec![NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()];
    let two: Array1<f64> = Array1::zeros(2);
    let three: Array1<f64> = Array1::zeros(3);

    let ok = Timeseries::new("P123", -120.0, 36.0, dates.clone(), two.clone(), two.clone(), two.clone(), two.clone(), two.clone(), two.clone(), vec![]);
    assert_eq!(ok.unwrap().len(), 2);

    let result = Timeseries::new("P123", -120.0, 36.0, dates, two.clone(), two.clone(), two.clone(), two.clone(), three, two, vec![]);
    assert!(matches!(
        result,
        Err(Error::ComponentLengthMismatch {
            name: "s_north",
            expected: 2,
            found: 3
        })
    ));
}
