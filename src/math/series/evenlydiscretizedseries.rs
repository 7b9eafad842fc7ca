use thiserror::Error;

use crate::math::series::discretizedfunction::DiscretizedFunction;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("index {index} is outside the series (num = {num})")]
    IndexOutOfRange { index: usize, num: usize },
    #[error("x value {x} does not match a permitted discrete value")]
    XOutOfRange { x: f64 },
    #[error("num points must be >= 1, got {num}")]
    InvalidNum { num: usize },
    #[error("delta must be > 0, got {delta}")]
    InvalidDelta { delta: f64 },
    #[error("min ({min}) must be <= max ({max})")]
    InvalidBounds { min: f64, max: f64 },
    #[error("min must equal max when num = 1")]
    DegenerateBounds,
    #[error("x value {x} is outside the interpolation range [{min}, {max}]")]
    InterpolationOutOfRange { x: f64, min: f64, max: f64 },
    #[error("x values must be strictly increasing (x[{index}] = {x} repeats or decreases)")]
    UnorderedPoints { index: usize, x: f64 },
}

/// A fixed-size sequence of (x, y) samples at uniform x spacing.
///
/// The x axis is fully determined by `min_x`, `delta` and `num`; only the y
/// values are stored. A lookup tolerance of `delta / 1e6` absorbs
/// floating-point drift when matching an x value to an index.
#[derive(Clone, Debug, PartialEq)]
pub struct EvenlyDiscretizedSeries {
    min_x: f64,
    delta: f64,
    ys: Vec<f64>,
}

impl EvenlyDiscretizedSeries {
    pub fn new(min_x: f64, num: usize, delta: f64) -> Result<EvenlyDiscretizedSeries, SeriesError> {
        if num < 1 {
            return Err(SeriesError::InvalidNum { num });
        }
        // A single-bin series has no spacing; delta 0 is permitted there.
        if !(delta > 0.0) && !(num == 1 && delta == 0.0) {
            return Err(SeriesError::InvalidDelta { delta });
        }
        Ok(EvenlyDiscretizedSeries {
            min_x,
            delta,
            ys: vec![0.0; num],
        })
    }

    /// Alternative construction from the end points; `delta` is derived as
    /// `(max_x - min_x) / (num - 1)`.
    pub fn with_bounds(
        min_x: f64,
        max_x: f64,
        num: usize,
    ) -> Result<EvenlyDiscretizedSeries, SeriesError> {
        if num < 1 {
            return Err(SeriesError::InvalidNum { num });
        }
        if min_x > max_x {
            return Err(SeriesError::InvalidBounds { min: min_x, max: max_x });
        }
        if num == 1 {
            if min_x != max_x {
                return Err(SeriesError::DegenerateBounds);
            }
            return EvenlyDiscretizedSeries::new(min_x, 1, 0.0);
        }
        let delta = (max_x - min_x) / ((num - 1) as f64);
        EvenlyDiscretizedSeries::new(min_x, num, delta)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + ((self.ys.len() - 1) as f64) * self.delta
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn num(&self) -> usize {
        self.ys.len()
    }

    pub fn tolerance(&self) -> f64 {
        self.delta / 1e6
    }

    pub fn x_at(&self, index: usize) -> f64 {
        self.min_x + (index as f64) * self.delta
    }

    pub fn y_at(&self, index: usize) -> Result<f64, SeriesError> {
        self.check_index(index)?;
        Ok(self.ys[index])
    }

    pub fn y(&self, x: f64) -> Result<f64, SeriesError> {
        let index = self.x_index(x)?;
        Ok(self.ys[index])
    }

    /// Returns the index whose x value matches `x` within tolerance, or an
    /// error if `x` is not a permitted discrete value.
    pub fn x_index(&self, x: f64) -> Result<usize, SeriesError> {
        if self.delta == 0.0 {
            return if x == self.min_x {
                Ok(0)
            } else {
                Err(SeriesError::XOutOfRange { x })
            };
        }
        let offset = (x - self.min_x) / self.delta;
        let i = offset.round();
        if i < 0.0 || i >= self.ys.len() as f64 {
            return Err(SeriesError::XOutOfRange { x });
        }
        let index = i as usize;
        if (x - self.x_at(index)).abs() <= self.tolerance() {
            Ok(index)
        } else {
            Err(SeriesError::XOutOfRange { x })
        }
    }

    /// Nearest-bin lookup for resampling: plain rounding with no tolerance
    /// check, `None` when the rounded index falls outside the series. Ties at
    /// bin midpoints round away from zero (`f64::round`).
    pub fn nearest_index(&self, x: f64) -> Option<usize> {
        if self.delta == 0.0 {
            return (x == self.min_x).then_some(0);
        }
        let i = ((x - self.min_x) / self.delta).round();
        if i < 0.0 || i >= self.ys.len() as f64 {
            None
        } else {
            Some(i as usize)
        }
    }

    pub fn set_y_at(&mut self, index: usize, y: f64) -> Result<(), SeriesError> {
        self.check_index(index)?;
        self.ys[index] = y;
        Ok(())
    }

    pub fn set_y(&mut self, x: f64, y: f64) -> Result<(), SeriesError> {
        let index = self.x_index(x)?;
        self.ys[index] = y;
        Ok(())
    }

    pub fn add_y_at(&mut self, index: usize, y: f64) -> Result<(), SeriesError> {
        self.check_index(index)?;
        self.ys[index] += y;
        Ok(())
    }

    pub fn add_y(&mut self, x: f64, y: f64) -> Result<(), SeriesError> {
        let index = self.x_index(x)?;
        self.ys[index] += y;
        Ok(())
    }

    pub fn fill(&mut self, y: f64) {
        self.ys.fill(y);
    }

    pub fn scale(&mut self, factor: f64) {
        for y in self.ys.iter_mut() {
            *y *= factor;
        }
    }

    pub fn sum_y(&self) -> f64 {
        self.ys.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ys
            .iter()
            .enumerate()
            .map(|(i, &y)| (self.x_at(i), y))
    }

    /// True when `other` samples exactly the same x axis.
    pub fn same_grid(&self, other: &EvenlyDiscretizedSeries) -> bool {
        self.min_x == other.min_x && self.delta == other.delta && self.ys.len() == other.ys.len()
    }

    fn check_index(&self, index: usize) -> Result<(), SeriesError> {
        if index < self.ys.len() {
            Ok(())
        } else {
            Err(SeriesError::IndexOutOfRange {
                index,
                num: self.ys.len(),
            })
        }
    }
}

impl DiscretizedFunction for EvenlyDiscretizedSeries {
    fn num(&self) -> usize {
        self.ys.len()
    }

    fn x(&self, index: usize) -> f64 {
        self.x_at(index)
    }

    fn y(&self, index: usize) -> f64 {
        self.ys[index]
    }
}
