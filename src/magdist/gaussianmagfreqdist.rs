use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::magdist::truncation::TruncationType;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// Gaussian magnitude distribution, optionally truncated at a number of
/// standard deviations around the mean.
pub struct GaussianMagFreqDist {
    dist: IncrementalMagFreqDist,
    mean: f64,
    std_dev: f64,
    truncation_level: f64,
    truncation_type: TruncationType,
}

pub const GAUSSIAN_NAME: &str = "Gaussian Dist";

impl GaussianMagFreqDist {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Result<GaussianMagFreqDist, MfdError> {
        Ok(GaussianMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            mean: f64::NAN,
            std_dev: f64::NAN,
            truncation_level: f64::NAN,
            truncation_type: TruncationType::None,
        })
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<GaussianMagFreqDist, MfdError> {
        Ok(GaussianMagFreqDist {
            dist: IncrementalMagFreqDist::with_bounds(min_mag, max_mag, num)?,
            mean: f64::NAN,
            std_dev: f64::NAN,
            truncation_level: f64::NAN,
            truncation_type: TruncationType::None,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn truncation_level(&self) -> f64 {
        self.truncation_level
    }

    pub fn truncation_type(&self) -> TruncationType {
        self.truncation_type
    }

    /// Defines everything but the total cumulative rate: the Gaussian shape
    /// is rescaled to the given total moment rate.
    pub fn set_all_but_cum_rate(
        &mut self,
        mean: f64,
        std_dev: f64,
        total_mo_rate: f64,
        truncation_level: f64,
        truncation_type: TruncationType,
    ) -> Result<(), MfdError> {
        self.set_relative_rates(mean, std_dev, truncation_level, truncation_type)?;
        self.dist.scale_to_total_moment_rate(total_mo_rate)
    }

    /// Defines everything but the total moment rate: the shape is rescaled
    /// so the cumulative rate at the lowest bin equals `total_cum_rate`.
    pub fn set_all_but_total_mo_rate(
        &mut self,
        mean: f64,
        std_dev: f64,
        total_cum_rate: f64,
        truncation_level: f64,
        truncation_type: TruncationType,
    ) -> Result<(), MfdError> {
        self.set_relative_rates(mean, std_dev, truncation_level, truncation_type)?;
        self.dist.scale_to_cumulative_rate_at(0, total_cum_rate)
    }

    fn set_relative_rates(
        &mut self,
        mean: f64,
        std_dev: f64,
        truncation_level: f64,
        truncation_type: TruncationType,
    ) -> Result<(), MfdError> {
        if std_dev < 0.0 {
            return Err(MfdError::InvalidRange(format!(
                "stdDev must be >= 0, got {std_dev}"
            )));
        }
        if truncation_type != TruncationType::None && truncation_level < 0.0 {
            return Err(MfdError::InvalidRange(format!(
                "truncation level must be >= 0, got {truncation_level}"
            )));
        }
        if std_dev == 0.0 {
            // Degenerate case: a unit spike at the mean, which must land on
            // a bin exactly.
            let index = self.dist.series().x_index(mean).map_err(|_| {
                MfdError::InvalidParameter(format!(
                    "mean ({mean}) must equal a discrete bin when stdDev is zero"
                ))
            })?;
            self.dist.zero_all_rates();
            self.dist.set_rate_at(index, 1.0)?;
        } else {
            for index in 0..self.dist.num() {
                let mag = self.dist.series().x_at(index);
                let deviation = (mag - mean) / std_dev;
                let truncated = match truncation_type {
                    TruncationType::None => false,
                    TruncationType::Upper => mag >= mean + truncation_level * std_dev,
                    TruncationType::UpperAndLower => {
                        mag >= mean + truncation_level * std_dev
                            || mag <= mean - truncation_level * std_dev
                    }
                };
                let rate = if truncated {
                    0.0
                } else {
                    (-0.5 * deviation * deviation).exp()
                };
                self.dist.set_rate_at(index, rate)?;
            }
        }
        self.mean = mean;
        self.std_dev = std_dev;
        self.truncation_level = truncation_level;
        self.truncation_type = truncation_type;
        Ok(())
    }
}

impl MagFreqDist for GaussianMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        GAUSSIAN_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; mean={}; stdDev={}; truncType={:?}; \
             truncLevel={}; totMoRate={:.3e}; totCumRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.mean,
            self.std_dev,
            self.truncation_type,
            self.truncation_level,
            self.total_moment_rate(),
            self.cumulative_rate_at(0).unwrap_or(f64::NAN)
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::GaussianMagFreqDist;
    use crate::magdist::magfreqdist::MagFreqDist;
    use crate::magdist::mfderror::MfdError;
    use crate::magdist::truncation::TruncationType;

    #[test]
    fn two_sided_truncation_zeroes_the_tails() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gauss
            .set_all_but_total_mo_rate(6.5, 0.25, 1.0, 2.0, TruncationType::UpperAndLower)
            .unwrap();
        // Cuts at 6.0 and 7.0, inclusive.
        for index in 0..gauss.num() {
            let mag = gauss.series().x_at(index);
            let rate = gauss.incremental_rate_at(index).unwrap();
            if mag <= 6.0 + 1e-9 || mag >= 7.0 - 1e-9 {
                assert_eq!(rate, 0.0, "expected zero rate at magnitude {mag}");
            } else {
                assert!(rate > 0.0, "expected nonzero rate at magnitude {mag}");
            }
        }
        assert!(gauss.incremental_rate(6.5).unwrap() > 0.0);
    }

    #[test]
    fn upper_truncation_keeps_the_lower_tail() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gauss
            .set_all_but_total_mo_rate(6.5, 0.25, 1.0, 2.0, TruncationType::Upper)
            .unwrap();
        assert_eq!(gauss.incremental_rate(7.0).unwrap(), 0.0);
        assert!(gauss.incremental_rate(6.0).unwrap() > 0.0);
        assert!(gauss.incremental_rate(5.0).unwrap() > 0.0);
    }

    #[test]
    fn cumulative_rescale_anchors_the_total() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gauss
            .set_all_but_total_mo_rate(6.5, 0.5, 3.0, 0.0, TruncationType::None)
            .unwrap();
        assert_relative_eq!(gauss.total_incremental_rate(), 3.0, max_relative = 1e-12);
    }

    #[test]
    fn moment_rescale_hits_target() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gauss
            .set_all_but_cum_rate(6.5, 0.5, 1e18, 1.5, TruncationType::Upper)
            .unwrap();
        assert_relative_eq!(gauss.total_moment_rate(), 1e18, max_relative = 1e-9);
    }

    #[test]
    fn zero_std_dev_is_a_spike_at_the_mean() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gauss
            .set_all_but_total_mo_rate(6.5, 0.0, 4.0, 0.0, TruncationType::None)
            .unwrap();
        assert_relative_eq!(gauss.incremental_rate(6.5).unwrap(), 4.0, max_relative = 1e-12);
        assert_relative_eq!(gauss.total_incremental_rate(), 4.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_std_dev_off_bin_mean_is_rejected() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        assert!(matches!(
            gauss.set_all_but_total_mo_rate(6.52, 0.0, 4.0, 0.0, TruncationType::None),
            Err(MfdError::InvalidParameter(_))
        ));
    }

    #[test]
    fn negative_parameters_are_rejected() {
        let mut gauss = GaussianMagFreqDist::new(5.0, 31, 0.1).unwrap();
        assert!(matches!(
            gauss.set_all_but_total_mo_rate(6.5, -0.1, 4.0, 1.0, TruncationType::None),
            Err(MfdError::InvalidRange(_))
        ));
        assert!(matches!(
            gauss.set_all_but_total_mo_rate(6.5, 0.2, 4.0, -1.0, TruncationType::Upper),
            Err(MfdError::InvalidRange(_))
        ));
    }
}
