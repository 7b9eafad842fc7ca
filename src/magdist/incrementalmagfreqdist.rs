use tracing::trace;

use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::moment::mag_to_moment;
use crate::math::series::discretizedfunction::DiscretizedFunction;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// The editable base distribution: a bin grid whose rates are set directly or
/// folded in from externally supplied functions.
///
/// This is the only distribution type with public rate mutators. The analytic
/// families own one of these privately and drive it from their own
/// parameterization entry points, so their bins cannot be edited from
/// outside.
#[derive(Clone, Debug, PartialEq)]
pub struct IncrementalMagFreqDist {
    series: EvenlyDiscretizedSeries,
    info: String,
}

pub const ARBITRARY_INCREMENTAL_NAME: &str = "Arbitrary Incremental Dist";

impl IncrementalMagFreqDist {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Result<IncrementalMagFreqDist, MfdError> {
        let series = EvenlyDiscretizedSeries::new(min_mag, num, delta)?;
        Ok(IncrementalMagFreqDist::from_series(series))
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<IncrementalMagFreqDist, MfdError> {
        let series = EvenlyDiscretizedSeries::with_bounds(min_mag, max_mag, num)?;
        Ok(IncrementalMagFreqDist::from_series(series))
    }

    fn from_series(series: EvenlyDiscretizedSeries) -> IncrementalMagFreqDist {
        let info = format!(
            "minMag={}; maxMag={}; num={}",
            series.min_x(),
            series.max_x(),
            series.num()
        );
        IncrementalMagFreqDist { series, info }
    }

    pub fn set_info(&mut self, info: String) {
        self.info = info;
    }

    pub fn set_rate(&mut self, mag: f64, rate: f64) -> Result<(), MfdError> {
        Ok(self.series.set_y(mag, rate)?)
    }

    pub fn set_rate_at(&mut self, index: usize, rate: f64) -> Result<(), MfdError> {
        Ok(self.series.set_y_at(index, rate)?)
    }

    pub fn add_rate(&mut self, mag: f64, rate: f64) -> Result<(), MfdError> {
        Ok(self.series.add_y(mag, rate)?)
    }

    pub fn add_rate_at(&mut self, index: usize, rate: f64) -> Result<(), MfdError> {
        Ok(self.series.add_y_at(index, rate)?)
    }

    pub fn zero_all_rates(&mut self) {
        self.series.fill(0.0);
    }

    /// Divides every bin by the total incremental rate, so the rates sum to
    /// one.
    pub fn normalize_by_total_rate(&mut self) -> Result<(), MfdError> {
        let total = self.total_incremental_rate();
        if total == 0.0 {
            return Err(MfdError::DivideByZero {
                quantity: "total incremental rate",
            });
        }
        self.series.scale(1.0 / total);
        Ok(())
    }

    pub fn scale_to_total_moment_rate(&mut self, target: f64) -> Result<(), MfdError> {
        let total = self.total_moment_rate();
        if total == 0.0 {
            return Err(MfdError::DivideByZero {
                quantity: "total moment rate",
            });
        }
        self.series.scale(target / total);
        Ok(())
    }

    pub fn scale_to_cumulative_rate(&mut self, mag: f64, target: f64) -> Result<(), MfdError> {
        let index = self.series.x_index(mag)?;
        self.scale_to_cumulative_rate_at(index, target)
    }

    pub fn scale_to_cumulative_rate_at(
        &mut self,
        index: usize,
        target: f64,
    ) -> Result<(), MfdError> {
        let current = self.cumulative_rate_at(index)?;
        if current == 0.0 {
            return Err(MfdError::DivideByZero {
                quantity: "cumulative rate",
            });
        }
        self.series.scale(target / current);
        Ok(())
    }

    pub fn scale_to_incremental_rate(&mut self, mag: f64, target: f64) -> Result<(), MfdError> {
        let index = self.series.x_index(mag)?;
        self.scale_to_incremental_rate_at(index, target)
    }

    pub fn scale_to_incremental_rate_at(
        &mut self,
        index: usize,
        target: f64,
    ) -> Result<(), MfdError> {
        let current = self.incremental_rate_at(index)?;
        if current == 0.0 {
            return Err(MfdError::DivideByZero {
                quantity: "incremental rate",
            });
        }
        self.series.scale(target / current);
        Ok(())
    }

    /// Folds a single (magnitude, rate) point onto the nearest bin. Points
    /// landing outside the grid are expected from external functions and are
    /// silently dropped.
    ///
    /// With `preserve_rates` the rate is added as-is; otherwise the point's
    /// moment contribution is preserved by scaling the rate with the moment
    /// ratio between its magnitude and the receiving bin's.
    pub fn add_resampled_mag_rate(&mut self, mag: f64, rate: f64, preserve_rates: bool) {
        let Some(index) = self.series.nearest_index(mag) else {
            trace!(mag, rate, "dropping resampled point outside the grid");
            return;
        };
        let folded = if preserve_rates {
            rate
        } else {
            rate * mag_to_moment(mag) / mag_to_moment(self.series.x_at(index))
        };
        let _ = self.series.add_y_at(index, folded);
    }

    /// Replaces the bins with the point-wise resampling of an arbitrary
    /// external function (any spacing or range).
    pub fn set_resampled_mag_freq_dist(
        &mut self,
        source: &impl DiscretizedFunction,
        preserve_rates: bool,
    ) {
        self.zero_all_rates();
        for i in 0..source.num() {
            self.add_resampled_mag_rate(source.x(i), source.y(i), preserve_rates);
        }
    }

    /// Replaces the bins with incremental rates derived from an external
    /// cumulative distribution: each bin's rate is the difference of the
    /// source's log-y interpolated values at the bin's half-width edges. Bins
    /// whose edges fall outside the source's range get zero.
    pub fn set_cum_rate_dist(&mut self, source: &impl DiscretizedFunction) {
        let half = self.series.delta() / 2.0;
        for index in 0..self.series.num() {
            let mag = self.series.x_at(index);
            let lower = source.interpolated_y_in_log_y_domain(mag - half);
            let upper = source.interpolated_y_in_log_y_domain(mag + half);
            let rate = match (lower, upper) {
                (Ok(lower), Ok(upper)) => lower - upper,
                _ => {
                    trace!(mag, "bin edges outside cumulative source, rate set to zero");
                    0.0
                }
            };
            let _ = self.series.set_y_at(index, rate);
        }
    }
}

impl MagFreqDist for IncrementalMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        &self.series
    }

    fn name(&self) -> &'static str {
        ARBITRARY_INCREMENTAL_NAME
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}
