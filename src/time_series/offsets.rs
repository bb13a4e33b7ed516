use super::{Error, Timeseries, check_length};
use chrono::NaiveDate;
use log::{info, warn};
use ndarray::Array1;

/// Half-width of the averaging windows either side of an offset, day
pub const DEFAULT_OFFSET_WINDOW_DAYS: i64 = 10;

/// Step in the displacement of a station at `date`, millimetre
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Offset {
    pub east: f64,
    pub north: f64,
    pub up: f64,
    pub date: NaiveDate,
}

/// Empirical offset of one component across `interval`
///
/// The "before" samples are those up to `window_days` before `interval.0` (inclusive),
/// and the "after" samples those up to `window_days` after `interval.1` (inclusive).
/// A single date offset uses the same date twice.
///
/// # Arguments
/// * `dates` - sample dates
/// * `data` - one displacement component, millimetre
/// * `interval` - (start, end) of the period spanning the offset
/// * `window_days` - width of the averaging windows, day
///
/// # Returns
/// * `offset` - `mean(after) - mean(before)` ignoring NaN samples; 0.0 when either window
///   holds fewer than two samples or the difference is NaN
///
pub fn fit_single_offset(dates: &[NaiveDate], data: &Array1<f64>, interval: (NaiveDate, NaiveDate), window_days: i64) -> Result<f64, Error> {
    check_length("data", data, dates.len())?;
    let (start, end): (NaiveDate, NaiveDate) = interval;

    let mut before: Vec<f64> = Vec::new();
    let mut after: Vec<f64> = Vec::new();
    for (date, &value) in dates.iter().zip(data.iter()) {
        let days_from_start: i64 = date.signed_duration_since(start).num_days();
        let days_from_end: i64 = date.signed_duration_since(end).num_days();
        if (-window_days..=0).contains(&days_from_start) {
            before.push(value);
        }
        if (0..=window_days).contains(&days_from_end) {
            after.push(value);
        }
    }

    if before.len() < 2 || after.len() < 2 {
        warn!("fit_single_offset: no data before or after offset at {}, returning offset=0", start);
        return Ok(0.0);
    }

    let offset: f64 = nan_mean(&after) - nan_mean(&before);
    if offset.is_nan() {
        warn!("fit_single_offset: NaN offset at {}, returning offset=0", start);
        return Ok(0.0);
    }
    return Ok(offset);
}

/// Solve for the east, north and up offsets of `timeseries` at each of `offset_dates`
pub fn solve_for_offsets(timeseries: &Timeseries, offset_dates: &[NaiveDate], window_days: i64) -> Result<Vec<Offset>, Error> {
    info!("solve_for_offsets: {} offsets for station {}", offset_dates.len(), timeseries.name);

    let mut offsets: Vec<Offset> = Vec::with_capacity(offset_dates.len());
    for &date in offset_dates {
        offsets.push(Offset {
            east: fit_single_offset(&timeseries.dates, &timeseries.d_east, (date, date), window_days)?,
            north: fit_single_offset(&timeseries.dates, &timeseries.d_north, (date, date), window_days)?,
            up: fit_single_offset(&timeseries.dates, &timeseries.d_up, (date, date), window_days)?,
            date,
        });
    }
    return Ok(offsets);
}

/// Subtract `offsets` from every later sample
///
/// Samples on the date of an offset are set to NaN, the displacement of that day is
/// not trusted.
pub fn remove_offsets(timeseries: &Timeseries, offsets: &[Offset]) -> Timeseries {
    let mut corrected: Timeseries = timeseries.clone();
    if offsets.is_empty() {
        return corrected;
    }

    for (i_date, date) in timeseries.dates.iter().enumerate() {
        for offset in offsets {
            if *date == offset.date {
                corrected.d_east[i_date] = f64::NAN;
                corrected.d_north[i_date] = f64::NAN;
                corrected.d_up[i_date] = f64::NAN;
            }
            if *date > offset.date {
                corrected.d_east[i_date] -= offset.east;
                corrected.d_north[i_date] -= offset.north;
                corrected.d_up[i_date] -= offset.up;
            }
        }
    }
    return corrected;
}

/// The offset on `date`; when several match the last one wins
pub fn filter_offset_list_to_date(offsets: &[Offset], date: NaiveDate) -> Option<&Offset> {
    return offsets.iter().rev().find(|offset| offset.date == date);
}

fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count): (f64, usize) = values
        .iter()
        .filter(|value| !value.is_nan())
        .fold((0.0, 0), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return f64::NAN;
    }
    return sum / count as f64;
}

// 31 days of January 2020 with a 5 mm east step after the 15th, which is itself missing
#[cfg(test)]
fn stepped_timeseries() -> Timeseries {
    let start: NaiveDate = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..31).map(|i_day| start + chrono::TimeDelta::days(i_day)).collect();
    let offset_date: NaiveDate = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();

    let d_east: Array1<f64> = dates
        .iter()
        .map(|&date| {
            if date < offset_date {
                0.0
            } else if date == offset_date {
                f64::NAN
            } else {
                5.0
            }
        })
        .collect();
    let d_north: Array1<f64> = Array1::from_elem(31, 1.0);
    let d_up: Array1<f64> = Array1::from_elem(31, f64::NAN);
    let sigma: Array1<f64> = Array1::from_elem(31, 0.5);

    return Timeseries::new("P001", -120.0, 36.0, dates, d_east, d_north, d_up, sigma.clone(), sigma.clone(), sigma, vec![offset_date]).unwrap();
}

#[test]
fn test_solve_and_remove_offsets() {
    use approx::assert_abs_diff_eq;

    let timeseries: Timeseries = stepped_timeseries();
    let offset_date: NaiveDate = timeseries.earthquake_dates[0];

    let offsets: Vec<Offset> = solve_for_offsets(&timeseries, &[offset_date], DEFAULT_OFFSET_WINDOW_DAYS).unwrap();
    assert_eq!(offsets.len(), 1);
    assert_abs_diff_eq!(offsets[0].east, 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(offsets[0].north, 0.0, epsilon = 1e-12);
    // All-NaN windows give a NaN difference, which is replaced by 0
    assert_eq!(offsets[0].up, 0.0);

    let corrected: Timeseries = remove_offsets(&timeseries, &offsets);
    for (i_date, date) in corrected.dates.iter().enumerate() {
        if *date == offset_date {
            assert!(corrected.d_east[i_date].is_nan());
            assert!(corrected.d_north[i_date].is_nan());
        } else {
            assert_abs_diff_eq!(corrected.d_east[i_date], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(corrected.d_north[i_date], 1.0, epsilon = 1e-12);
        }
    }

    let unchanged: Timeseries = remove_offsets(&timeseries, &[]);
    assert_eq!(unchanged.dates, timeseries.dates);
    assert_eq!(unchanged.d_north, timeseries.d_north);
}

#[test]
fn test_fit_single_offset_without_data() {
    let timeseries: Timeseries = stepped_timeseries();

    // Nothing recorded in the window after the offset
    let late: NaiveDate = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
    let offset: f64 = fit_single_offset(&timeseries.dates, &timeseries.d_east, (late, late), DEFAULT_OFFSET_WINDOW_DAYS).unwrap();
    assert_eq!(offset, 0.0);

    let short: Array1<f64> = Array1::zeros(3);
    let result = fit_single_offset(&timeseries.dates, &short, (late, late), DEFAULT_OFFSET_WINDOW_DAYS);
    assert!(matches!(result, Err(Error::ComponentLengthMismatch { name: "data", .. })));
}

#[test]
fn test_filter_offset_list_to_date() {
    let date_1: NaiveDate = NaiveDate::from_ymd_opt(2019, 7, 6).unwrap();
    let date_2: NaiveDate = NaiveDate::from_ymd_opt(2020, 5, 15).unwrap();
    let offsets: Vec<Offset> = vec![
        Offset {
            east: 1.0,
            north: 2.0,
            up: 3.0,
            date: date_1,
        },
        Offset {
            east: 4.0,
            north: 5.0,
            up: 6.0,
            date: date_2,
        },
        Offset {
            east: 7.0,
            north: 8.0,
            up: 9.0,
            date: date_1,
        },
    ];

    let found: Option<&Offset> = filter_offset_list_to_date(&offsets, date_1);
    assert_eq!(found.map(|offset| offset.east), Some(7.0));

    let missing: NaiveDate = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    assert!(filter_offset_list_to_date(&offsets, missing).is_none());
}
