use crate::errors::Error;
use ndarray::Array1;

/// Piecewise linear interpolator over a strictly increasing abscissa.
///
/// Used to resample slowly varying series (e.g. monthly GRACE loading models)
/// onto the epochs of a denser series (e.g. daily GNSS positions).
pub struct Dim1Linear<'a> {
    x: &'a Array1<f64>,
    f: &'a Array1<f64>,
}

impl<'a> Dim1Linear<'a> {
    /// Create a new 1D linear interpolator
    ///
    /// # Arguments
    /// - `x`: The x values at which the function is known, strictly increasing
    /// - `f`: The function values at the known x values
    ///
    /// # Returns
    /// A new `Dim1Linear` interpolator, or an error if `x` and `f` are inconsistent
    ///
    /// # Notes
    /// Borrows `x` and `f` rather than owning them, so the interpolator cannot outlive the data.
    ///
    pub fn new(x: &'a Array1<f64>, f: &'a Array1<f64>) -> Result<Self, Error> {
        if x.len() != f.len() {
            return Err(Error::FunctionAndXLengthMismatch {
                f_len: f.len(),
                x_len: x.len(),
            });
        }
        if x.len() < 2 {
            return Err(Error::TooFewSamples { n_samples: x.len() });
        }

        for i_x in 0..x.len() - 1 {
            let step: f64 = x[i_x + 1] - x[i_x];
            if step.abs() < f64::EPSILON {
                return Err(Error::DuplicateXValues {
                    x_value: x[i_x],
                    index: i_x,
                });
            }
            if step < 0.0 {
                return Err(Error::XNotIncreasing {
                    x_value1: x[i_x],
                    x_value2: x[i_x + 1],
                    index: i_x,
                });
            }
        }

        return Ok(Dim1Linear { x, f });
    }

    /// Interpolate a single value; `x_new` must lie inside `[x[0], x[n - 1]]`
    pub fn interpolate_scalar(&self, x_new: f64) -> Result<f64, Error> {
        let n_x: usize = self.x.len();
        let x_min: f64 = self.x[0];
        let x_max: f64 = self.x[n_x - 1];
        // Written so that NaN also fails the bounds check
        if !(x_new >= x_min && x_new <= x_max) {
            return Err(Error::XOutOfBounds {
                x_desired: x_new,
                x_min,
                x_max,
            });
        }

        // Index of the first sample strictly greater than `x_new`, clamped so the last sample
        // falls into the final segment
        let i_upper: usize = self
            .x
            .as_slice()
            .map(|x_slice| x_slice.partition_point(|&x_known| x_known <= x_new))
            .unwrap_or_else(|| self.x.iter().take_while(|&&x_known| x_known <= x_new).count())
            .clamp(1, n_x - 1);
        let i_lower: usize = i_upper - 1;

        let segment_fraction: f64 = (x_new - self.x[i_lower]) / (self.x[i_upper] - self.x[i_lower]);
        let f_new: f64 = self.f[i_lower] * (1.0 - segment_fraction) + self.f[i_upper] * segment_fraction;

        return Ok(f_new);
    }

    pub fn interpolate_array1(&self, x_new: &Array1<f64>) -> Result<Array1<f64>, Error> {
        let mut f_new: Array1<f64> = Array1::from_elem(x_new.len(), f64::NAN);
        for (i_x_new, &x_value) in x_new.iter().enumerate() {
            f_new[i_x_new] = self.interpolate_scalar(x_value)?;
        }

        return Ok(f_new);
    }
}

#[test]
fn test_dim1_linear_reproduces_straight_line() {
    use approx::assert_abs_diff_eq;

    // Linear interpolation is exact for a straight line, including on the end points
    let x: Array1<f64> = Array1::from(vec![2010.0, 2010.25, 2011.0, 2013.5]);
    let f: Array1<f64> = 3.0 * &x - 6000.0;
    let interpolator: Dim1Linear = Dim1Linear::new(&x, &f).expect("valid samples");

    let x_new: Array1<f64> = Array1::linspace(2010.0, 2013.5, 11);
    let f_new: Array1<f64> = interpolator.interpolate_array1(&x_new).expect("inside bounds");
    let f_expected: Array1<f64> = 3.0 * &x_new - 6000.0;

    assert_abs_diff_eq!(f_new, f_expected, epsilon = 1e-9);
}

#[test]
fn test_dim1_linear_between_samples() {
    use approx::assert_abs_diff_eq;

    let x: Array1<f64> = Array1::from(vec![0.0, 1.0, 3.0]);
    let f: Array1<f64> = Array1::from(vec![0.0, 10.0, -10.0]);
    let interpolator: Dim1Linear = Dim1Linear::new(&x, &f).expect("valid samples");

    assert_abs_diff_eq!(interpolator.interpolate_scalar(0.5).unwrap(), 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(interpolator.interpolate_scalar(1.0).unwrap(), 10.0, epsilon = 1e-12);
    assert_abs_diff_eq!(interpolator.interpolate_scalar(2.0).unwrap(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(interpolator.interpolate_scalar(3.0).unwrap(), -10.0, epsilon = 1e-12);
}

#[test]
fn test_dim1_linear_rejects_bad_input() {
    let x: Array1<f64> = Array1::from(vec![0.0, 1.0, 1.0]);
    let f: Array1<f64> = Array1::from(vec![0.0, 1.0, 2.0]);
    assert!(matches!(Dim1Linear::new(&x, &f), Err(Error::DuplicateXValues { index: 1, .. })));

    let x: Array1<f64> = Array1::from(vec![0.0, 2.0, 1.0]);
    assert!(matches!(Dim1Linear::new(&x, &f), Err(Error::XNotIncreasing { index: 1, .. })));

    let x: Array1<f64> = Array1::from(vec![0.0, 1.0]);
    assert!(matches!(
        Dim1Linear::new(&x, &f),
        Err(Error::FunctionAndXLengthMismatch { f_len: 3, x_len: 2 })
    ));

    let x: Array1<f64> = Array1::from(vec![0.0]);
    let f: Array1<f64> = Array1::from(vec![0.0]);
    assert!(matches!(Dim1Linear::new(&x, &f), Err(Error::TooFewSamples { n_samples: 1 })));

    let x: Array1<f64> = Array1::from(vec![0.0, 1.0]);
    let f: Array1<f64> = Array1::from(vec![0.0, 1.0]);
    let interpolator: Dim1Linear = Dim1Linear::new(&x, &f).expect("valid samples");
    assert!(matches!(interpolator.interpolate_scalar(1.5), Err(Error::XOutOfBounds { .. })));
    assert!(interpolator.interpolate_scalar(f64::NAN).is_err());
}
