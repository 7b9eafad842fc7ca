use tracing::debug;

use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// Tapered Gutenberg-Richter distribution: the pure power law rolls off
/// super-exponentially above `mag_corner`.
///
/// Bin rates are differences of an auxiliary cumulative-like curve sampled at
/// the bins' half-width offsets, so the incremental rates integrate the taper
/// across each bin.
pub struct TaperedGrMagFreqDist {
    dist: IncrementalMagFreqDist,
    mag_lower: f64,
    mag_corner: f64,
    b_value: f64,
}

pub const TAPERED_GR_NAME: &str = "Tapered GR Dist";

/// Width of the bracket the corner-magnitude search refines down to.
const CORNER_BRACKET_WIDTH: f64 = 1e-4;

impl TaperedGrMagFreqDist {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Result<TaperedGrMagFreqDist, MfdError> {
        Ok(TaperedGrMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            mag_lower: f64::NAN,
            mag_corner: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<TaperedGrMagFreqDist, MfdError> {
        Ok(TaperedGrMagFreqDist {
            dist: IncrementalMagFreqDist::with_bounds(min_mag, max_mag, num)?,
            mag_lower: f64::NAN,
            mag_corner: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn mag_lower(&self) -> f64 {
        self.mag_lower
    }

    pub fn mag_corner(&self) -> f64 {
        self.mag_corner
    }

    pub fn b_value(&self) -> f64 {
        self.b_value
    }

    /// Defines everything but the total moment rate: the tapered rates are
    /// rescaled so the cumulative rate at `mag_lower` equals
    /// `total_cum_rate`.
    pub fn set_all_but_total_moment_rate(
        &mut self,
        mag_lower: f64,
        mag_corner: f64,
        total_cum_rate: f64,
        b_value: f64,
    ) -> Result<(), MfdError> {
        let lower_index = self.set_relative_rates(mag_lower, mag_corner, b_value)?;
        self.dist
            .scale_to_cumulative_rate_at(lower_index, total_cum_rate)
    }

    /// Defines everything but the total cumulative rate: rates are rescaled
    /// to the given total moment rate.
    pub fn set_all_but_total_cum_rate(
        &mut self,
        mag_lower: f64,
        mag_corner: f64,
        total_mo_rate: f64,
        b_value: f64,
    ) -> Result<(), MfdError> {
        self.set_relative_rates(mag_lower, mag_corner, b_value)?;
        self.dist.scale_to_total_moment_rate(total_mo_rate)
    }

    /// Searches for the corner magnitude at which the distribution holding
    /// `total_cum_rate` at `mag_lower` reaches `total_mo_rate`: five
    /// sweep-and-refine rounds with steps 1 down to 1e-4, each probe a full
    /// rebuild. The reported corner magnitude is the lower end of the final
    /// bracket; the realized bins come from the upper end, so the realized
    /// total moment rate can exceed the target by the bracket-width factor.
    /// That overshoot is expected, not a defect.
    pub fn set_all_but_corner_mag(
        &mut self,
        mag_lower: f64,
        total_mo_rate: f64,
        total_cum_rate: f64,
        b_value: f64,
    ) -> Result<(), MfdError> {
        // Probes far beyond the grid cannot change any in-grid bin, so the
        // moment rate has saturated there and the sweep cannot converge.
        let probe_limit = self.max_x() + 2.0;

        self.set_all_but_total_moment_rate(mag_lower, mag_lower, total_cum_rate, b_value)?;
        if self.total_moment_rate() >= total_mo_rate {
            return Err(MfdError::CornerMagnitudeSearch(format!(
                "target total moment rate {total_mo_rate} is already reached with the corner \
                 at magLower ({mag_lower}); no corner magnitude above magLower can stay below it"
            )));
        }

        let mut mag_start = mag_lower;
        let mut step = 1.0;
        for round in 0..5 {
            let mut mag = mag_start;
            self.set_all_but_total_moment_rate(mag_lower, mag, total_cum_rate, b_value)?;
            while self.total_moment_rate() < total_mo_rate {
                mag += step;
                if mag > probe_limit {
                    return Err(MfdError::CornerMagnitudeSearch(format!(
                        "no corner magnitude up to {probe_limit} reaches the target total \
                         moment rate {total_mo_rate}; magLower ({mag_lower}) or the grid \
                         maximum ({}) is too low",
                        self.max_x()
                    )));
                }
                self.set_all_but_total_moment_rate(mag_lower, mag, total_cum_rate, b_value)?;
            }
            debug!(
                round,
                step,
                exceeded_at = mag,
                moment_rate = self.total_moment_rate(),
                "corner magnitude sweep"
            );
            mag_start = mag - step;
            step /= 10.0;
        }

        // Verify the refined bracket before accepting it.
        self.set_all_but_total_moment_rate(mag_lower, mag_start, total_cum_rate, b_value)?;
        let below = self.total_moment_rate();
        self.set_all_but_total_moment_rate(
            mag_lower,
            mag_start + CORNER_BRACKET_WIDTH,
            total_cum_rate,
            b_value,
        )?;
        let above = self.total_moment_rate();
        if !(below < total_mo_rate && total_mo_rate <= above) {
            return Err(MfdError::CornerMagnitudeSearch(format!(
                "bracket [{mag_start}, {}] does not straddle the target total moment rate \
                 {total_mo_rate} (got {below} and {above}); magLower ({mag_lower}) or the \
                 grid maximum ({}) is too low",
                mag_start + CORNER_BRACKET_WIDTH,
                self.max_x()
            )));
        }
        self.mag_corner = mag_start;
        Ok(())
    }

    /// Validates the parameters and writes the unscaled tapered rates.
    /// Returns the `mag_lower` bin index.
    fn set_relative_rates(
        &mut self,
        mag_lower: f64,
        mag_corner: f64,
        b_value: f64,
    ) -> Result<usize, MfdError> {
        let lower_index = self.dist.series().x_index(mag_lower)?;
        if mag_corner < mag_lower {
            return Err(MfdError::InvalidRange(format!(
                "magCorner ({mag_corner}) must be >= magLower ({mag_lower})"
            )));
        }
        let num = self.dist.num();
        let half = self.delta() / 2.0;
        let aux: Vec<f64> = (0..=num)
            .map(|k| {
                let m = self.min_x() + (k as f64) * self.delta() - half;
                10.0_f64.powf(-b_value * m) * (-10.0_f64.powf(1.5 * (m - mag_corner))).exp()
            })
            .collect();
        for index in 0..num {
            let rate = if index < lower_index {
                0.0
            } else {
                aux[index] - aux[index + 1]
            };
            self.dist.set_rate_at(index, rate)?;
        }
        self.mag_lower = mag_lower;
        self.mag_corner = mag_corner;
        self.b_value = b_value;
        Ok(lower_index)
    }
}

impl MagFreqDist for TaperedGrMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        TAPERED_GR_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; bValue={}; magLower={}; magCorner={}; \
             totMoRate={:.3e}; totCumRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.b_value,
            self.mag_lower,
            self.mag_corner,
            self.total_moment_rate(),
            self.dist.cumulative_rate(self.mag_lower).unwrap_or(f64::NAN)
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::TaperedGrMagFreqDist;
    use crate::magdist::magfreqdist::MagFreqDist;
    use crate::magdist::mfderror::MfdError;

    #[test]
    fn cumulative_rescale_anchors_at_mag_lower() {
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        tgr.set_all_but_total_moment_rate(0.0, 7.5, 5.0, 1.0).unwrap();
        assert_relative_eq!(tgr.cumulative_rate(0.0).unwrap(), 5.0, max_relative = 1e-12);
        assert!(tgr.incremental_rate(5.0).unwrap() > 0.0);
    }

    #[test]
    fn taper_suppresses_rates_above_the_corner() {
        let mut tapered = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        tapered.set_all_but_total_moment_rate(0.0, 6.0, 5.0, 1.0).unwrap();
        let mut untapered = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        // A corner far above the grid leaves the power law effectively
        // untapered in range.
        untapered
            .set_all_but_total_moment_rate(0.0, 20.0, 5.0, 1.0)
            .unwrap();
        let ratio_below =
            tapered.incremental_rate(3.0).unwrap() / untapered.incremental_rate(3.0).unwrap();
        let ratio_above =
            tapered.incremental_rate(8.0).unwrap() / untapered.incremental_rate(8.0).unwrap();
        assert!(ratio_below > 0.9);
        assert!(ratio_above < 1e-3);
    }

    #[test]
    fn moment_rate_rescale_hits_target() {
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        tgr.set_all_but_total_cum_rate(0.0, 7.0, 1e18, 1.0).unwrap();
        assert_relative_eq!(tgr.total_moment_rate(), 1e18, max_relative = 1e-9);
    }

    #[test]
    fn corner_below_mag_lower_is_rejected() {
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        assert!(matches!(
            tgr.set_all_but_total_cum_rate(5.0, 4.0, 1e18, 1.0),
            Err(MfdError::InvalidRange(_))
        ));
    }

    #[test]
    fn corner_magnitude_search_brackets_the_target() {
        // Grid 0.0..10.0 at 0.05 with 5 events/yr above magnitude 0; 1e14
        // N-m/yr puts the corner near magnitude 9, inside the grid.
        let total_mo_rate = 1e14;
        let total_cum_rate = 5.0;
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        tgr.set_all_but_corner_mag(0.0, total_mo_rate, total_cum_rate, 1.0)
            .unwrap();
        let corner = tgr.mag_corner();

        // Fresh rebuilds at the bracket ends straddle the target.
        let mut probe = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        probe
            .set_all_but_total_moment_rate(0.0, corner, total_cum_rate, 1.0)
            .unwrap();
        assert!(probe.total_moment_rate() < total_mo_rate);
        probe
            .set_all_but_total_moment_rate(0.0, corner + 1e-4, total_cum_rate, 1.0)
            .unwrap();
        assert!(probe.total_moment_rate() >= total_mo_rate);

        // The realized distribution keeps the cumulative rate exact and may
        // overshoot the moment-rate target by at most the bracket factor.
        assert_relative_eq!(
            tgr.cumulative_rate(0.0).unwrap(),
            total_cum_rate,
            max_relative = 1e-12
        );
        assert!(tgr.total_moment_rate() >= total_mo_rate);
        assert!(tgr.total_moment_rate() < total_mo_rate * 1.01);
    }

    #[test]
    fn unreachable_target_fails_the_search() {
        // A tiny grid cannot carry 1e19 N-m/yr at 5 events/yr.
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 41, 0.05).unwrap();
        assert!(matches!(
            tgr.set_all_but_corner_mag(0.0, 1e19, 5.0, 1.0),
            Err(MfdError::CornerMagnitudeSearch(_))
        ));
    }

    #[test]
    fn saturated_grid_fails_the_search() {
        // Even the full 0..10 grid saturates near 1.1e15 N-m/yr at 5
        // events/yr, so a 1e19 target diagnoses the grid maximum as too low
        // instead of sweeping forever.
        let mut tgr = TaperedGrMagFreqDist::new(0.0, 201, 0.05).unwrap();
        assert!(matches!(
            tgr.set_all_but_corner_mag(0.0, 1e19, 5.0, 1.0),
            Err(MfdError::CornerMagnitudeSearch(_))
        ));
    }
}
