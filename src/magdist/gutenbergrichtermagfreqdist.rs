use tracing::debug;

use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::moment::mag_to_moment;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// Truncated Gutenberg-Richter distribution: rates follow `10^(-b * m)`
/// between `mag_lower` and `mag_upper` inclusive and are zero elsewhere.
pub struct GutenbergRichterMagFreqDist {
    dist: IncrementalMagFreqDist,
    mag_lower: f64,
    mag_upper: f64,
    b_value: f64,
}

pub const GUTENBERG_RICHTER_NAME: &str = "Gutenberg-Richter Dist";

impl GutenbergRichterMagFreqDist {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Result<GutenbergRichterMagFreqDist, MfdError> {
        Ok(GutenbergRichterMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            mag_lower: f64::NAN,
            mag_upper: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<GutenbergRichterMagFreqDist, MfdError> {
        Ok(GutenbergRichterMagFreqDist {
            dist: IncrementalMagFreqDist::with_bounds(min_mag, max_mag, num)?,
            mag_lower: f64::NAN,
            mag_upper: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn mag_lower(&self) -> f64 {
        self.mag_lower
    }

    pub fn mag_upper(&self) -> f64 {
        self.mag_upper
    }

    pub fn b_value(&self) -> f64 {
        self.b_value
    }

    /// Realized cumulative rate at `mag_lower`.
    pub fn total_cum_rate(&self) -> Result<f64, MfdError> {
        self.dist.cumulative_rate(self.mag_lower)
    }

    /// Defines everything but the total moment rate, which becomes derived:
    /// the relative `10^(-b m)` rates are rescaled so the cumulative rate at
    /// `mag_lower` equals `total_cum_rate`.
    pub fn set_all_but_total_moment_rate(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        total_cum_rate: f64,
        b_value: f64,
    ) -> Result<(), MfdError> {
        let (lower_index, _) = self.set_relative_rates(mag_lower, mag_upper, b_value)?;
        self.dist
            .scale_to_cumulative_rate_at(lower_index, total_cum_rate)
    }

    /// Defines everything but the total cumulative rate: rates are rescaled
    /// to the given total moment rate.
    pub fn set_all_but_total_cum_rate(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        total_mo_rate: f64,
        b_value: f64,
    ) -> Result<(), MfdError> {
        self.set_relative_rates(mag_lower, mag_upper, b_value)?;
        self.dist.scale_to_total_moment_rate(total_mo_rate)
    }

    /// Finds `mag_upper` by sweeping candidate bins upward from `mag_lower`
    /// until the analytically integrated moment rate of the continuous
    /// power-law density first reaches `total_mo_rate`, tie-breaking to the
    /// closer of the last two candidates. With both totals supplied the final
    /// distribution can honor only one exactly: `relax_total_moment` keeps
    /// the cumulative rate exact, otherwise the moment rate.
    pub fn set_all_but_mag_upper(
        &mut self,
        mag_lower: f64,
        total_mo_rate: f64,
        total_cum_rate: f64,
        b_value: f64,
        relax_total_moment: bool,
    ) -> Result<(), MfdError> {
        let lower_index = self.dist.series().x_index(mag_lower)?;
        let num = self.dist.num();

        let mut chosen = lower_index;
        let mut current = f64::NAN;
        let mut previous = f64::NAN;
        let mut reached = false;
        for index in lower_index..num {
            previous = current;
            let candidate = self.dist.series().x_at(index);
            current = analytic_moment_rate(mag_lower, candidate, total_cum_rate, b_value);
            debug!(candidate, moment_rate = current, "magUpper sweep step");
            if current >= total_mo_rate {
                chosen = index;
                reached = true;
                break;
            }
        }
        if !reached {
            return Err(MfdError::UnattainableMomentRate {
                target: total_mo_rate,
                achieved: current,
            });
        }
        if chosen > lower_index
            && (previous - total_mo_rate).abs() < (current - total_mo_rate).abs()
        {
            chosen -= 1;
        }
        let mag_upper = self.dist.series().x_at(chosen);
        debug!(mag_upper, "magUpper sweep finished");

        if relax_total_moment {
            self.set_all_but_total_moment_rate(mag_lower, mag_upper, total_cum_rate, b_value)
        } else {
            self.set_all_but_total_cum_rate(mag_lower, mag_upper, total_mo_rate, b_value)
        }
    }

    /// Validates the defining magnitudes and writes the unscaled `10^(-b m)`
    /// rates. Returns the bounding bin indices.
    fn set_relative_rates(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        b_value: f64,
    ) -> Result<(usize, usize), MfdError> {
        let lower_index = self.dist.series().x_index(mag_lower)?;
        let upper_index = self.dist.series().x_index(mag_upper)?;
        if lower_index > upper_index {
            return Err(MfdError::InvalidRange(format!(
                "magLower ({mag_lower}) must be <= magUpper ({mag_upper})"
            )));
        }
        self.dist.zero_all_rates();
        for index in lower_index..=upper_index {
            let mag = self.dist.series().x_at(index);
            self.dist
                .set_rate_at(index, 10.0_f64.powf(-b_value * mag))?;
        }
        self.mag_lower = mag_lower;
        self.mag_upper = mag_upper;
        self.b_value = b_value;
        Ok((lower_index, upper_index))
    }
}

/// Total moment rate of the continuous Gutenberg-Richter density with
/// cumulative rate `total_cum_rate` between `mag_lower` and `mag_upper`,
/// integrated in closed form. The degenerate exponent `b = 1.5` uses the
/// logarithmic limit, and `mag_upper == mag_lower` the point-mass limit.
fn analytic_moment_rate(mag_lower: f64, mag_upper: f64, total_cum_rate: f64, b_value: f64) -> f64 {
    if mag_upper == mag_lower {
        return total_cum_rate * mag_to_moment(mag_lower);
    }
    let z = 1.5 - b_value;
    let denom = 10.0_f64.powf(-b_value * mag_lower) - 10.0_f64.powf(-b_value * mag_upper);
    let scale = total_cum_rate * b_value * 10.0_f64.powf(9.05);
    if z.abs() < 1e-9 {
        scale * 10.0_f64.ln() * (mag_upper - mag_lower) / denom
    } else {
        scale / z * (10.0_f64.powf(z * mag_upper) - 10.0_f64.powf(z * mag_lower)) / denom
    }
}

impl MagFreqDist for GutenbergRichterMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        GUTENBERG_RICHTER_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; bValue={}; magLower={}; magUpper={}; \
             totMoRate={:.3e}; totCumRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.b_value,
            self.mag_lower,
            self.mag_upper,
            self.total_moment_rate(),
            self.total_cum_rate().unwrap_or(f64::NAN)
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{GutenbergRichterMagFreqDist, analytic_moment_rate};
    use crate::magdist::magfreqdist::MagFreqDist;
    use crate::magdist::mfderror::MfdError;
    use crate::math::moment::mag_to_moment;

    #[test]
    fn rates_decay_as_a_power_law() {
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_total_cum_rate(5.0, 8.0, 1e19, 1.0).unwrap();
        let r1 = gr.incremental_rate(6.0).unwrap();
        let r2 = gr.incremental_rate(7.0).unwrap();
        assert!(r1 > r2);
        assert_relative_eq!(r1 / r2, 10.0, max_relative = 1e-9);
    }

    #[test]
    fn moment_rate_rescale_scenario() {
        // Grid 5.0..8.0, b = 1, rescaled to 1e19 N-m/yr.
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_total_cum_rate(5.0, 8.0, 1e19, 1.0).unwrap();
        assert_relative_eq!(gr.total_moment_rate(), 1e19, max_relative = 1e-9);
        // The power-law ratio is independent of the rescale.
        assert_relative_eq!(
            gr.incremental_rate(5.0).unwrap() / gr.incremental_rate(6.0).unwrap(),
            10.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn cumulative_rescale_anchors_at_mag_lower() {
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_total_moment_rate(5.5, 7.5, 4.2, 0.9).unwrap();
        assert_relative_eq!(gr.cumulative_rate(5.5).unwrap(), 4.2, max_relative = 1e-12);
        assert_relative_eq!(gr.total_cum_rate().unwrap(), 4.2, max_relative = 1e-12);
        assert_eq!(gr.incremental_rate(5.0).unwrap(), 0.0);
        // The reported magnitude is the bin's own x value, so compare with
        // tolerance rather than exactly.
        let max_nonzero = gr.max_magnitude_with_nonzero_rate().unwrap();
        assert_relative_eq!(max_nonzero, 7.5, max_relative = 1e-12);
    }

    #[test]
    fn bounds_must_fall_on_bins_and_be_ordered() {
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        assert!(matches!(
            gr.set_all_but_total_cum_rate(5.03, 8.0, 1e19, 1.0),
            Err(MfdError::OutOfRange(_))
        ));
        assert!(matches!(
            gr.set_all_but_total_cum_rate(7.0, 6.0, 1e19, 1.0),
            Err(MfdError::InvalidRange(_))
        ));
    }

    #[test]
    fn failed_set_leaves_previous_rates() {
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_total_cum_rate(5.0, 8.0, 1e19, 1.0).unwrap();
        let before = gr.total_moment_rate();
        assert!(gr.set_all_but_total_cum_rate(5.03, 8.0, 2e19, 1.0).is_err());
        assert_relative_eq!(gr.total_moment_rate(), before, max_relative = 1e-12);
    }

    #[test]
    fn analytic_integral_limits() {
        // Point-mass limit at mag_upper == mag_lower.
        assert_relative_eq!(
            analytic_moment_rate(6.0, 6.0, 2.0, 1.0),
            2.0 * mag_to_moment(6.0),
            max_relative = 1e-12
        );
        // The b = 1.5 logarithmic limit agrees with nearby exponents.
        let near = analytic_moment_rate(5.0, 7.0, 1.0, 1.5 + 1e-7);
        let at = analytic_moment_rate(5.0, 7.0, 1.0, 1.5);
        assert_relative_eq!(near, at, max_relative = 1e-5);
    }

    #[test]
    fn mag_upper_sweep_picks_first_reaching_bin() {
        let total_cum_rate = 5.0;
        let b_value = 1.0;
        // Target the analytic moment rate just above the 7.0 candidate so the
        // sweep stops at 7.1 and the tie-break keeps whichever is closer.
        let mo_at_70 = analytic_moment_rate(5.0, 7.0, total_cum_rate, b_value);
        let mo_at_71 = analytic_moment_rate(5.0, 7.1, total_cum_rate, b_value);
        let target = mo_at_70 + 0.9 * (mo_at_71 - mo_at_70);

        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_mag_upper(5.0, target, total_cum_rate, b_value, true)
            .unwrap();
        assert_relative_eq!(gr.mag_upper(), 7.1, max_relative = 1e-12);
        // relax_total_moment = true keeps the cumulative rate exact.
        assert_relative_eq!(
            gr.total_cum_rate().unwrap(),
            total_cum_rate,
            max_relative = 1e-12
        );
    }

    #[test]
    fn mag_upper_tie_break_prefers_closer_candidate() {
        let total_cum_rate = 5.0;
        let b_value = 1.0;
        let mo_at_70 = analytic_moment_rate(5.0, 7.0, total_cum_rate, b_value);
        let mo_at_71 = analytic_moment_rate(5.0, 7.1, total_cum_rate, b_value);
        // Just above the 7.0 value: 7.1 is the first to reach it, but 7.0 is
        // closer.
        let target = mo_at_70 + 0.1 * (mo_at_71 - mo_at_70);

        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        gr.set_all_but_mag_upper(5.0, target, total_cum_rate, b_value, false)
            .unwrap();
        assert_relative_eq!(gr.mag_upper(), 7.0, max_relative = 1e-12);
        // relax_total_moment = false keeps the moment rate exact.
        assert_relative_eq!(gr.total_moment_rate(), target, max_relative = 1e-9);
    }

    #[test]
    fn unattainable_moment_rate_is_an_error() {
        let mut gr = GutenbergRichterMagFreqDist::new(5.0, 31, 0.1).unwrap();
        let top = analytic_moment_rate(5.0, 8.0, 5.0, 1.0);
        assert!(matches!(
            gr.set_all_but_mag_upper(5.0, top * 10.0, 5.0, 1.0, true),
            Err(MfdError::UnattainableMomentRate { .. })
        ));
    }
}
