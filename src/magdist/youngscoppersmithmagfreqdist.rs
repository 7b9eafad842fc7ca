use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// Youngs & Coppersmith (1985) characteristic distribution: a
/// Gutenberg-Richter part from `mag_lower` to `mag_prime` plus a flat
/// characteristic plateau of width `delta_mag_char` below `mag_upper`, with
/// the plateau height pinned to the power-law rate at
/// `mag_prime - delta_mag_prime`.
pub struct YoungsCoppersmithMagFreqDist {
    dist: IncrementalMagFreqDist,
    mag_lower: f64,
    mag_upper: f64,
    delta_mag_char: f64,
    mag_prime: f64,
    delta_mag_prime: f64,
    b_value: f64,
}

pub const YOUNGS_COPPERSMITH_NAME: &str = "Youngs and Coppersmith Dist";

impl YoungsCoppersmithMagFreqDist {
    pub fn new(
        min_mag: f64,
        num: usize,
        delta: f64,
    ) -> Result<YoungsCoppersmithMagFreqDist, MfdError> {
        Ok(YoungsCoppersmithMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            mag_lower: f64::NAN,
            mag_upper: f64::NAN,
            delta_mag_char: f64::NAN,
            mag_prime: f64::NAN,
            delta_mag_prime: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn with_bounds(
        min_mag: f64,
        max_mag: f64,
        num: usize,
    ) -> Result<YoungsCoppersmithMagFreqDist, MfdError> {
        Ok(YoungsCoppersmithMagFreqDist {
            dist: IncrementalMagFreqDist::with_bounds(min_mag, max_mag, num)?,
            mag_lower: f64::NAN,
            mag_upper: f64::NAN,
            delta_mag_char: f64::NAN,
            mag_prime: f64::NAN,
            delta_mag_prime: f64::NAN,
            b_value: f64::NAN,
        })
    }

    pub fn mag_lower(&self) -> f64 {
        self.mag_lower
    }

    pub fn mag_upper(&self) -> f64 {
        self.mag_upper
    }

    pub fn delta_mag_char(&self) -> f64 {
        self.delta_mag_char
    }

    pub fn mag_prime(&self) -> f64 {
        self.mag_prime
    }

    pub fn delta_mag_prime(&self) -> f64 {
        self.delta_mag_prime
    }

    pub fn b_value(&self) -> f64 {
        self.b_value
    }

    /// Rate of characteristic events: cumulative rate at the plateau's lower
    /// edge.
    pub fn total_char_rate(&self) -> Result<f64, MfdError> {
        self.dist
            .cumulative_rate(self.mag_upper - self.delta_mag_char)
    }

    /// Defines everything but the characteristic-event rate: rates are
    /// rescaled to the given total moment rate.
    #[allow(clippy::too_many_arguments)]
    pub fn set_all_but_total_char_rate(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        delta_mag_char: f64,
        mag_prime: f64,
        delta_mag_prime: f64,
        b_value: f64,
        total_mo_rate: f64,
    ) -> Result<(), MfdError> {
        self.set_relative_rates(
            mag_lower,
            mag_upper,
            delta_mag_char,
            mag_prime,
            delta_mag_prime,
            b_value,
        )?;
        self.dist.scale_to_total_moment_rate(total_mo_rate)
    }

    /// Defines everything but the total moment rate: rates are rescaled so
    /// the cumulative rate at the plateau's lower edge equals
    /// `total_char_rate`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_all_but_total_mo_rate(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        delta_mag_char: f64,
        mag_prime: f64,
        delta_mag_prime: f64,
        b_value: f64,
        total_char_rate: f64,
    ) -> Result<(), MfdError> {
        let plateau_index = self.set_relative_rates(
            mag_lower,
            mag_upper,
            delta_mag_char,
            mag_prime,
            delta_mag_prime,
            b_value,
        )?;
        self.dist
            .scale_to_cumulative_rate_at(plateau_index, total_char_rate)
    }

    /// Validates all constraints, writes the unscaled rates, and returns the
    /// plateau's lower-edge bin index.
    fn set_relative_rates(
        &mut self,
        mag_lower: f64,
        mag_upper: f64,
        delta_mag_char: f64,
        mag_prime: f64,
        delta_mag_prime: f64,
        b_value: f64,
    ) -> Result<usize, MfdError> {
        if delta_mag_char < 0.0 {
            return Err(MfdError::InvalidRange(format!(
                "deltaMagChar must be >= 0, got {delta_mag_char}"
            )));
        }
        if delta_mag_prime < 0.0 {
            return Err(MfdError::InvalidRange(format!(
                "deltaMagPrime must be >= 0, got {delta_mag_prime}"
            )));
        }
        if mag_lower > mag_upper {
            return Err(MfdError::InvalidRange(format!(
                "magLower ({mag_lower}) must be <= magUpper ({mag_upper})"
            )));
        }
        if mag_prime < mag_lower || mag_prime > mag_upper {
            return Err(MfdError::InvalidRange(format!(
                "magPrime ({mag_prime}) must lie within [magLower, magUpper] \
                 = [{mag_lower}, {mag_upper}]"
            )));
        }
        if mag_prime - delta_mag_prime < mag_lower {
            return Err(MfdError::InvalidRange(format!(
                "magPrime - deltaMagPrime ({}) must be >= magLower ({mag_lower})",
                mag_prime - delta_mag_prime
            )));
        }
        if delta_mag_char > mag_upper - mag_prime + delta_mag_prime {
            return Err(MfdError::InvalidRange(format!(
                "deltaMagChar ({delta_mag_char}) must be <= magUpper - magPrime + \
                 deltaMagPrime ({})",
                mag_upper - mag_prime + delta_mag_prime
            )));
        }
        if mag_prime > mag_upper - delta_mag_char {
            return Err(MfdError::InvalidRange(format!(
                "magPrime ({mag_prime}) must be <= magUpper - deltaMagChar ({})",
                mag_upper - delta_mag_char
            )));
        }

        // All five defining magnitudes must land on bins.
        let series = self.dist.series();
        let lower_index = series.x_index(mag_lower)?;
        let upper_index = series.x_index(mag_upper)?;
        let prime_index = series.x_index(mag_prime)?;
        let prime_rate_index = series.x_index(mag_prime - delta_mag_prime)?;
        let plateau_index = series.x_index(mag_upper - delta_mag_char)?;

        self.dist.zero_all_rates();
        for index in lower_index..=prime_index {
            let mag = self.dist.series().x_at(index);
            self.dist
                .set_rate_at(index, 10.0_f64.powf(-b_value * mag))?;
        }
        let plateau_rate = 10.0_f64.powf(-b_value * self.dist.series().x_at(prime_rate_index));
        for index in plateau_index..=upper_index {
            self.dist.set_rate_at(index, plateau_rate)?;
        }

        self.mag_lower = mag_lower;
        self.mag_upper = mag_upper;
        self.delta_mag_char = delta_mag_char;
        self.mag_prime = mag_prime;
        self.delta_mag_prime = delta_mag_prime;
        self.b_value = b_value;
        Ok(plateau_index)
    }
}

impl MagFreqDist for YoungsCoppersmithMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        YOUNGS_COPPERSMITH_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; bValue={}; magLower={}; magUpper={}; \
             deltaMagChar={}; magPrime={}; deltaMagPrime={}; totMoRate={:.3e}; totCharRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.b_value,
            self.mag_lower,
            self.mag_upper,
            self.delta_mag_char,
            self.mag_prime,
            self.delta_mag_prime,
            self.total_moment_rate(),
            self.total_char_rate().unwrap_or(f64::NAN)
        )
    }
}
