use super::{Error, Timeseries, decimal_year};
use chrono::NaiveDate;
use interpolation::Dim1Linear;
use log::info;
use ndarray::Array1;
use ndarray_stats::QuantileExt;

/// GNSS samples alongside the GRACE loading model resampled onto the same epochs, millimetre
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PairedTimeseries {
    pub dates: Vec<NaiveDate>,
    pub north: Array1<f64>,
    pub east: Array1<f64>,
    pub vert: Array1<f64>,
    pub n_err: Array1<f64>,
    pub e_err: Array1<f64>,
    pub v_err: Array1<f64>,
    pub grace_east: Array1<f64>,
    pub grace_north: Array1<f64>,
    pub grace_up: Array1<f64>,
}

impl PairedTimeseries {
    pub fn len(&self) -> usize {
        return self.dates.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.dates.is_empty();
    }
}

/// Resample a GRACE series onto the GNSS epochs inside the GRACE date range
///
/// # Arguments
/// * `gps` - daily GNSS series
/// * `grace` - GRACE loading model, dates strictly increasing
///
/// # Returns
/// * `paired` - GNSS samples strictly inside the GRACE date range, with the GRACE east,
///   north and up series linearly interpolated in decimal year
///
pub fn pair_gps_grace(gps: &Timeseries, grace: &Timeseries) -> Result<PairedTimeseries, Error> {
    let gps_decimal_years: Array1<f64> = gps.decimal_years();
    let grace_decimal_years: Array1<f64> = grace.decimal_years();

    // GNSS usually runs past the end of the GRACE mission
    let grace_start: f64 = *grace_decimal_years.min_skipnan();
    let grace_end: f64 = *grace_decimal_years.max_skipnan();
    let inside: Vec<usize> = (0..gps.len())
        .filter(|&i_date| grace_start < gps_decimal_years[i_date] && gps_decimal_years[i_date] < grace_end)
        .collect();
    info!("pair_gps_grace: {} of {} samples of {} overlap GRACE", inside.len(), gps.len(), gps.name);

    if inside.is_empty() {
        return Ok(PairedTimeseries::default());
    }

    let select = |values: &Array1<f64>| -> Array1<f64> { inside.iter().map(|&i_date| values[i_date]).collect() };
    let decimal_years: Array1<f64> = select(&gps_decimal_years);

    let grace_east: Array1<f64> = Dim1Linear::new(&grace_decimal_years, &grace.d_east)?.interpolate_array1(&decimal_years)?;
    let grace_north: Array1<f64> = Dim1Linear::new(&grace_decimal_years, &grace.d_north)?.interpolate_array1(&decimal_years)?;
    let grace_up: Array1<f64> = Dim1Linear::new(&grace_decimal_years, &grace.d_up)?.interpolate_array1(&decimal_years)?;

    return Ok(PairedTimeseries {
        dates: inside.iter().map(|&i_date| gps.dates[i_date]).collect(),
        north: select(&gps.d_north),
        east: select(&gps.d_east),
        vert: select(&gps.d_up),
        n_err: select(&gps.s_north),
        e_err: select(&gps.s_east),
        v_err: select(&gps.s_up),
        grace_east,
        grace_north,
        grace_up,
    });
}

#[test]
fn test_pair_gps_grace() {
    use approx::assert_abs_diff_eq;

    // Monthly GRACE samples, linear in decimal year
    let grace_dates: Vec<NaiveDate> = vec![
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
    ];
    let grace_years: Array1<f64> = grace_dates.iter().map(|&date| decimal_year(date)).collect();
    let grace_east: Array1<f64> = grace_years.mapv(|year| 10.0 * (year - 2020.0));
    let grace_north: Array1<f64> = grace_years.mapv(|year| -4.0 * (year - 2020.0));
    let grace_up: Array1<f64> = Array1::from_elem(3, 2.0);
    let grace_sigma: Array1<f64> = Array1::zeros(3);
    let grace: Timeseries = Timeseries::new(
        "GRACE",
        -120.0,
        36.0,
        grace_dates,
        grace_east,
        grace_north,
        grace_up,
        grace_sigma.clone(),
        grace_sigma.clone(),
        grace_sigma,
        vec![],
    )
    .unwrap();

    // Daily GNSS from 25 December 2019 to 10 March 2020
    let gps_start: NaiveDate = NaiveDate::from_ymd_opt(2019, 12, 25).unwrap();
    let gps_dates: Vec<NaiveDate> = (0..77).map(|i_day| gps_start + chrono::TimeDelta::days(i_day)).collect();
    let n_gps: usize = gps_dates.len();
    let gps_east: Array1<f64> = Array1::from_iter((0..n_gps).map(|i_day| i_day as f64));
    let gps_sigma: Array1<f64> = Array1::from_elem(n_gps, 1.5);
    let gps: Timeseries = Timeseries::new(
        "P001",
        -120.0,
        36.0,
        gps_dates,
        gps_east,
        Array1::zeros(n_gps),
        Array1::zeros(n_gps),
        gps_sigma.clone(),
        gps_sigma.clone(),
        gps_sigma,
        vec![],
    )
    .unwrap();

    let paired: PairedTimeseries = pair_gps_grace(&gps, &grace).unwrap();

    // 2 January to 29 February, both GRACE end points excluded
    assert_eq!(paired.len(), 59);
    assert_eq!(paired.dates[0], NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    assert_eq!(paired.dates[58], NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    // 2 January is the 9th GNSS sample
    assert_eq!(paired.east[0], 8.0);
    assert_eq!(paired.e_err[0], 1.5);

    for (i_date, &date) in paired.dates.iter().enumerate() {
        let year: f64 = decimal_year(date) - 2020.0;
        assert_abs_diff_eq!(paired.grace_east[i_date], 10.0 * year, epsilon = 1e-10);
        assert_abs_diff_eq!(paired.grace_north[i_date], -4.0 * year, epsilon = 1e-10);
        assert_abs_diff_eq!(paired.grace_up[i_date], 2.0, epsilon = 1e-12);
    }
}

#[test]
fn test_pair_gps_grace_without_overlap() {
    let grace_dates: Vec<NaiveDate> = vec![NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2010, 2, 1).unwrap()];
    let two: Array1<f64> = Array1::zeros(2);
    let grace: Timeseries = Timeseries::new("GRACE", 0.0, 0.0, grace_dates, two.clone(), two.clone(), two.clone(), two.clone(), two.clone(), two.clone(), vec![]).unwrap();

    let gps_dates: Vec<NaiveDate> = vec![NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()];
    let gps: Timeseries = Timeseries::new("P001", 0.0, 0.0, gps_dates, two.clone(), two.clone(), two.clone(), two.clone(), two.clone(), two, vec![]).unwrap();

    let paired: PairedTimeseries = pair_gps_grace(&gps, &grace).unwrap();
    assert!(paired.is_empty());
}
