use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::moment::{mag_to_moment, moment_to_mag};
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// A distribution concentrated in a single magnitude bin.
pub struct SingleMagFreqDist {
    dist: IncrementalMagFreqDist,
    mag: f64,
    rate: f64,
}

pub const SINGLE_NAME: &str = "Single Dist";

impl SingleMagFreqDist {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Result<SingleMagFreqDist, MfdError> {
        Ok(SingleMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            mag: f64::NAN,
            rate: f64::NAN,
        })
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<SingleMagFreqDist, MfdError> {
        Ok(SingleMagFreqDist {
            dist: IncrementalMagFreqDist::with_bounds(min_mag, max_mag, num)?,
            mag: f64::NAN,
            rate: f64::NAN,
        })
    }

    pub fn mag(&self) -> f64 {
        self.mag
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Moment release rate of the single bin.
    pub fn mo_rate(&self) -> f64 {
        self.rate * mag_to_moment(self.mag)
    }

    /// Puts `rate` at the bin matching `mag`, which must resolve to a grid
    /// bin.
    pub fn set_mag_and_rate(&mut self, mag: f64, rate: f64) -> Result<(), MfdError> {
        let index = self.dist.series().x_index(mag)?;
        self.dist.zero_all_rates();
        self.dist.set_rate_at(index, rate)?;
        self.mag = mag;
        self.rate = rate;
        Ok(())
    }

    /// Like [`set_mag_and_rate`](Self::set_mag_and_rate) with the rate
    /// derived from a moment rate.
    pub fn set_mag_and_moment_rate(&mut self, mag: f64, mo_rate: f64) -> Result<(), MfdError> {
        self.set_mag_and_rate(mag, mo_rate / mag_to_moment(mag))
    }

    /// Derives the magnitude implied by the moment/rate ratio and rounds it
    /// to the nearest bin. Rounding makes the pair inconsistent, so
    /// `relax_total_moment` chooses which of the two stays exact: the rate
    /// (`true`) or the moment rate (`false`).
    pub fn set_rate_and_moment_rate(
        &mut self,
        rate: f64,
        mo_rate: f64,
        relax_total_moment: bool,
    ) -> Result<(), MfdError> {
        let implied_mag = moment_to_mag(mo_rate / rate);
        let index = self
            .dist
            .series()
            .nearest_index(implied_mag)
            .ok_or_else(|| {
                MfdError::InvalidRange(format!(
                    "implied magnitude ({implied_mag}) falls outside the grid"
                ))
            })?;
        let mag = self.dist.series().x_at(index);
        if relax_total_moment {
            self.set_mag_and_rate(mag, rate)
        } else {
            self.set_mag_and_moment_rate(mag, mo_rate)
        }
    }
}

impl MagFreqDist for SingleMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        SINGLE_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; mag={}; rate={:.3e}; moRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.mag,
            self.rate,
            self.mo_rate()
        )
    }
}
