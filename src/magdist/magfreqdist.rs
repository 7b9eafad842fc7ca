use crate::magdist::mfderror::MfdError;
use crate::math::moment::mag_to_moment;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// Read-only surface shared by every magnitude-frequency distribution.
///
/// Implementors expose their bin series; everything else is derived. Rates
/// are only ever written through each family's own parameterization entry
/// points, so holding a `&dyn MagFreqDist` can never change one.
pub trait MagFreqDist: Send + Sync {
    fn series(&self) -> &EvenlyDiscretizedSeries;

    /// Identifies the distribution family, for reporting.
    fn name(&self) -> &'static str;

    /// Human-readable parameter summary, for reporting. Not parsed here.
    fn info(&self) -> String;

    fn min_x(&self) -> f64 {
        self.series().min_x()
    }

    fn max_x(&self) -> f64 {
        self.series().max_x()
    }

    fn delta(&self) -> f64 {
        self.series().delta()
    }

    fn num(&self) -> usize {
        self.series().num()
    }

    /// Occurrence rate of the bin at `index`.
    fn incremental_rate_at(&self, index: usize) -> Result<f64, MfdError> {
        Ok(self.series().y_at(index)?)
    }

    /// Occurrence rate of the bin matching `mag` within tolerance.
    fn incremental_rate(&self, mag: f64) -> Result<f64, MfdError> {
        Ok(self.series().y(mag)?)
    }

    /// Total rate of events at and above the bin at `index`.
    fn cumulative_rate_at(&self, index: usize) -> Result<f64, MfdError> {
        self.series().y_at(index)?;
        Ok((index..self.num())
            .map(|i| self.series().y_at(i).unwrap_or(0.0))
            .sum())
    }

    fn cumulative_rate(&self, mag: f64) -> Result<f64, MfdError> {
        let index = self.series().x_index(mag)?;
        self.cumulative_rate_at(index)
    }

    /// Moment release rate of the bin at `index`.
    fn moment_rate_at(&self, index: usize) -> Result<f64, MfdError> {
        Ok(self.series().y_at(index)? * mag_to_moment(self.series().x_at(index)))
    }

    fn moment_rate(&self, mag: f64) -> Result<f64, MfdError> {
        let index = self.series().x_index(mag)?;
        self.moment_rate_at(index)
    }

    fn total_incremental_rate(&self) -> f64 {
        self.series().sum_y()
    }

    fn total_moment_rate(&self) -> f64 {
        self.series()
            .iter()
            .map(|(mag, rate)| rate * mag_to_moment(mag))
            .sum()
    }

    /// A fresh series over the same grid holding cumulative rates.
    fn cumulative_rate_distribution(&self) -> EvenlyDiscretizedSeries {
        let mut out = self.series().clone();
        let mut running = 0.0;
        for index in (0..self.num()).rev() {
            running += self.series().y_at(index).unwrap_or(0.0);
            let _ = out.set_y_at(index, running);
        }
        out
    }

    /// A fresh series over the same grid holding per-bin moment rates.
    fn moment_rate_distribution(&self) -> EvenlyDiscretizedSeries {
        let mut out = self.series().clone();
        for index in 0..self.num() {
            let rate = self.series().y_at(index).unwrap_or(0.0);
            let _ = out.set_y_at(index, rate * mag_to_moment(out.x_at(index)));
        }
        out
    }

    /// Magnitude of the highest bin carrying a nonzero rate, if any.
    fn max_magnitude_with_nonzero_rate(&self) -> Option<f64> {
        (0..self.num())
            .rev()
            .find(|&i| self.series().y_at(i).unwrap_or(0.0) > 0.0)
            .map(|i| self.series().x_at(i))
    }
}
