use serde::Deserialize;

/// How a Gaussian magnitude distribution is cut off, expressed in standard
/// deviations around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TruncationType {
    None,
    Upper,
    UpperAndLower,
}
