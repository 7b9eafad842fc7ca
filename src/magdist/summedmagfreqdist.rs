use serde::Deserialize;

use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::mfderror::MfdError;
use crate::math::series::discretizedfunction::DiscretizedFunction;
use crate::math::series::evenlydiscretizedseries::EvenlyDiscretizedSeries;

/// What a summed distribution keeps about each added constituent, which in
/// turn determines whether (and how) constituents can later be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConstituentRetention {
    /// Keep each constituent's full bin series plus its name and info.
    Distributions,
    /// Keep only name and info strings.
    InfoOnly,
    /// Keep nothing; removal is impossible.
    Nothing,
}

struct ConstituentRecord {
    name: &'static str,
    info: String,
    series: Option<EvenlyDiscretizedSeries>,
}

/// A running element-wise total of constituent distributions sharing one
/// grid.
pub struct SummedMagFreqDist {
    dist: IncrementalMagFreqDist,
    retention: ConstituentRetention,
    constituents: Vec<ConstituentRecord>,
}

pub const SUMMED_NAME: &str = "Summed Dist";

impl SummedMagFreqDist {
    pub fn new(
        min_mag: f64,
        num: usize,
        delta: f64,
        retention: ConstituentRetention,
    ) -> Result<SummedMagFreqDist, MfdError> {
        Ok(SummedMagFreqDist {
            dist: IncrementalMagFreqDist::new(min_mag, num, delta)?,
            retention,
            constituents: Vec::new(),
        })
    }

    pub fn retention(&self) -> ConstituentRetention {
        self.retention
    }

    /// Adds a grid-matching distribution's bins into the running total.
    pub fn add_incremental_mag_freq_dist(
        &mut self,
        other: &dyn MagFreqDist,
    ) -> Result<(), MfdError> {
        self.check_grid(other)?;
        for index in 0..self.dist.num() {
            let rate = other.series().y_at(index)?;
            self.dist.add_rate_at(index, rate)?;
        }
        match self.retention {
            ConstituentRetention::Distributions => self.constituents.push(ConstituentRecord {
                name: other.name(),
                info: other.info(),
                series: Some(other.series().clone()),
            }),
            ConstituentRetention::InfoOnly => self.constituents.push(ConstituentRecord {
                name: other.name(),
                info: other.info(),
                series: None,
            }),
            ConstituentRetention::Nothing => {}
        }
        Ok(())
    }

    /// Folds an arbitrary external function into the running total via
    /// nearest-bin resampling. Not tracked as a removable constituent.
    pub fn add_resampled_mag_freq_dist(
        &mut self,
        source: &impl DiscretizedFunction,
        preserve_rates: bool,
    ) {
        for i in 0..source.num() {
            self.dist
                .add_resampled_mag_rate(source.x(i), source.y(i), preserve_rates);
        }
    }

    /// Subtracts a previously added constituent. The constituent is located
    /// through the retained records, so this fails with `NotFound` when the
    /// distribution was never added or nothing was retained.
    pub fn remove_incremental_mag_freq_dist(
        &mut self,
        other: &dyn MagFreqDist,
    ) -> Result<(), MfdError> {
        self.check_grid(other)?;
        let position = self
            .constituents
            .iter()
            .position(|record| {
                record.name == other.name()
                    && record.info == other.info()
                    && record
                        .series
                        .as_ref()
                        .is_none_or(|series| series == other.series())
            })
            .ok_or_else(|| MfdError::NotFound { info: other.info() })?;
        for index in 0..self.dist.num() {
            let rate = other.series().y_at(index)?;
            self.dist.add_rate_at(index, -rate)?;
        }
        self.constituents.remove(position);
        Ok(())
    }

    /// Info strings of the retained constituents, in insertion order.
    pub fn constituent_info(&self) -> Vec<&str> {
        self.constituents
            .iter()
            .map(|record| record.info.as_str())
            .collect()
    }

    /// Bin series of the retained constituents; empty unless the retention
    /// mode is `Distributions`.
    pub fn constituent_series(&self) -> Vec<&EvenlyDiscretizedSeries> {
        self.constituents
            .iter()
            .filter_map(|record| record.series.as_ref())
            .collect()
    }

    fn check_grid(&self, other: &dyn MagFreqDist) -> Result<(), MfdError> {
        if self.dist.series().same_grid(other.series()) {
            Ok(())
        } else {
            Err(MfdError::GridMismatch {
                expected_min: self.dist.min_x(),
                expected_delta: self.dist.delta(),
                expected_num: self.dist.num(),
                found_min: other.min_x(),
                found_delta: other.delta(),
                found_num: other.num(),
            })
        }
    }
}

impl MagFreqDist for SummedMagFreqDist {
    fn series(&self) -> &EvenlyDiscretizedSeries {
        self.dist.series()
    }

    fn name(&self) -> &'static str {
        SUMMED_NAME
    }

    fn info(&self) -> String {
        format!(
            "minMag={}; maxMag={}; numMag={}; constituents={}; totMoRate={:.3e}; totCumRate={:.3e}",
            self.min_x(),
            self.max_x(),
            self.num(),
            self.constituents.len(),
            self.total_moment_rate(),
            self.total_incremental_rate()
        )
    }
}
