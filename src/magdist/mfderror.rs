use thiserror::Error;

use crate::math::series::evenlydiscretizedseries::SeriesError;

#[derive(Debug, Error)]
pub enum MfdError {
    #[error("invalid parameter range: {0}")]
    InvalidRange(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    OutOfRange(#[from] SeriesError),
    #[error("cannot rescale: {quantity} is zero")]
    DivideByZero { quantity: &'static str },
    #[error(
        "total moment rate {target} is unattainable within the grid \
         (reached {achieved} at the highest bin)"
    )]
    UnattainableMomentRate { target: f64, achieved: f64 },
    #[error("corner magnitude search failed: {0}")]
    CornerMagnitudeSearch(String),
    #[error(
        "grid mismatch: expected min = {expected_min}, delta = {expected_delta}, \
         num = {expected_num}; got min = {found_min}, delta = {found_delta}, num = {found_num}"
    )]
    GridMismatch {
        expected_min: f64,
        expected_delta: f64,
        expected_num: usize,
        found_min: f64,
        found_delta: f64,
        found_num: usize,
    },
    #[error("distribution \"{info}\" was never added to this summed distribution")]
    NotFound { info: String },
}
