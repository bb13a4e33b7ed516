#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("function length {f_len} != x length {x_len}")]
    FunctionAndXLengthMismatch { f_len: usize, x_len: usize },
    #[error("at least two samples are needed to interpolate, got {n_samples}")]
    TooFewSamples { n_samples: usize },
    #[error("x={x_desired} not in [{x_min}, {x_max}]")]
    XOutOfBounds { x_desired: f64, x_min: f64, x_max: f64 },
    #[error("duplicate x value {x_value} at index {index}")]
    DuplicateXValues { x_value: f64, index: usize },
    #[error("x not increasing at index {index}: {x_value1} >= {x_value2}")]
    XNotIncreasing { x_value1: f64, x_value2: f64, index: usize },
}
