use std::cell::{
    RefCell,
    RefMut
};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use serde::Deserialize;

use crate::magdist::gaussianmagfreqdist::GaussianMagFreqDist;
use crate::magdist::gutenbergrichtermagfreqdist::GutenbergRichterMagFreqDist;
use crate::magdist::incrementalmagfreqdist::IncrementalMagFreqDist;
use crate::magdist::magfreqdist::MagFreqDist;
use crate::magdist::singlemagfreqdist::SingleMagFreqDist;
use crate::magdist::summedmagfreqdist::{
    ConstituentRetention,
    SummedMagFreqDist
};
use crate::magdist::taperedgrmagfreqdist::TaperedGrMagFreqDist;
use crate::magdist::truncation::TruncationType;
use crate::magdist::youngscoppersmithmagfreqdist::YoungsCoppersmithMagFreqDist;
use crate::manager::manager::{
    IManager,
    Manager
};
use crate::manager::managererror::ManagerError;
use crate::manager::namedobject::NamedJsonObject;

pub type SharedMagFreqDist = Arc<dyn MagFreqDist>;

#[derive(Deserialize)]
struct ConfigurationJsonProp {
    mag_freq_dist: Vec<serde_json::Value>,
    #[serde(default)]
    summed_mag_freq_dist: Vec<serde_json::Value>
}

/// One JSON distribution definition. The grid fields are common; which
/// parameter fields must be present depends on the family and on which
/// derived total is left implied.
#[derive(Deserialize)]
#[serde(tag = "family")]
enum MagFreqDistDefinition {
    Single {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        mag: Option<f64>,
        rate: Option<f64>,
        mo_rate: Option<f64>,
        #[serde(default)]
        relax_total_moment: bool
    },
    GutenbergRichter {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        mag_lower: f64,
        mag_upper: Option<f64>,
        b_value: f64,
        total_cum_rate: Option<f64>,
        total_mo_rate: Option<f64>,
        #[serde(default)]
        relax_total_moment: bool
    },
    TaperedGutenbergRichter {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        mag_lower: f64,
        corner_mag: Option<f64>,
        b_value: f64,
        total_cum_rate: Option<f64>,
        total_mo_rate: Option<f64>
    },
    Gaussian {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        mean: f64,
        std_dev: f64,
        truncation_type: Option<TruncationType>,
        #[serde(default)]
        truncation_level: f64,
        total_cum_rate: Option<f64>,
        total_mo_rate: Option<f64>
    },
    YoungsCoppersmith {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        mag_lower: f64,
        mag_upper: f64,
        delta_mag_char: f64,
        mag_prime: f64,
        delta_mag_prime: f64,
        b_value: f64,
        total_char_rate: Option<f64>,
        total_mo_rate: Option<f64>
    },
    Incremental {
        min_mag: f64,
        num_mag: usize,
        delta_mag: f64,
        rates: Vec<f64>
    }
}

#[derive(Deserialize)]
struct SummedDefinition {
    min_mag: f64,
    num_mag: usize,
    delta_mag: f64,
    retention: Option<ConstituentRetention>,
    constituents: Vec<String>
}

fn invalid_definition(name: &str, detail: &str) -> ManagerError {
    ManagerError::InvalidDefinitionError {
        name: name.to_owned(),
        detail: detail.to_owned(),
    }
}

fn build_mag_freq_dist(json_value: serde_json::Value) -> Result<SharedMagFreqDist, ManagerError> {
    let named: NamedJsonObject = ManagerError::from_json_or_json_parse_error(json_value.clone())?;
    let name = named.name().as_str();
    let definition: MagFreqDistDefinition =
        ManagerError::from_json_or_json_parse_error(json_value)?;
    match definition {
        MagFreqDistDefinition::Single {
            min_mag,
            num_mag,
            delta_mag,
            mag,
            rate,
            mo_rate,
            relax_total_moment,
        } => {
            let mut dist = SingleMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            match (mag, rate, mo_rate) {
                (Some(mag), Some(rate), None) => dist.set_mag_and_rate(mag, rate)?,
                (Some(mag), None, Some(mo_rate)) => dist.set_mag_and_moment_rate(mag, mo_rate)?,
                (None, Some(rate), Some(mo_rate)) => {
                    dist.set_rate_and_moment_rate(rate, mo_rate, relax_total_moment)?
                }
                _ => {
                    return Err(invalid_definition(
                        name,
                        "exactly two of mag, rate, mo_rate must be given",
                    ));
                }
            }
            Ok(Arc::new(dist))
        }
        MagFreqDistDefinition::GutenbergRichter {
            min_mag,
            num_mag,
            delta_mag,
            mag_lower,
            mag_upper,
            b_value,
            total_cum_rate,
            total_mo_rate,
            relax_total_moment,
        } => {
            let mut dist = GutenbergRichterMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            match (mag_upper, total_cum_rate, total_mo_rate) {
                (Some(mag_upper), Some(total_cum_rate), None) => {
                    dist.set_all_but_total_moment_rate(
                        mag_lower,
                        mag_upper,
                        total_cum_rate,
                        b_value,
                    )?
                }
                (Some(mag_upper), None, Some(total_mo_rate)) => {
                    dist.set_all_but_total_cum_rate(mag_lower, mag_upper, total_mo_rate, b_value)?
                }
                (None, Some(total_cum_rate), Some(total_mo_rate)) => dist.set_all_but_mag_upper(
                    mag_lower,
                    total_mo_rate,
                    total_cum_rate,
                    b_value,
                    relax_total_moment,
                )?,
                _ => {
                    return Err(invalid_definition(
                        name,
                        "exactly two of mag_upper, total_cum_rate, total_mo_rate must be given",
                    ));
                }
            }
            Ok(Arc::new(dist))
        }
        MagFreqDistDefinition::TaperedGutenbergRichter {
            min_mag,
            num_mag,
            delta_mag,
            mag_lower,
            corner_mag,
            b_value,
            total_cum_rate,
            total_mo_rate,
        } => {
            let mut dist = TaperedGrMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            match (corner_mag, total_cum_rate, total_mo_rate) {
                (Some(corner_mag), Some(total_cum_rate), None) => {
                    dist.set_all_but_total_moment_rate(
                        mag_lower,
                        corner_mag,
                        total_cum_rate,
                        b_value,
                    )?
                }
                (Some(corner_mag), None, Some(total_mo_rate)) => {
                    dist.set_all_but_total_cum_rate(mag_lower, corner_mag, total_mo_rate, b_value)?
                }
                (None, Some(total_cum_rate), Some(total_mo_rate)) => dist.set_all_but_corner_mag(
                    mag_lower,
                    total_mo_rate,
                    total_cum_rate,
                    b_value,
                )?,
                _ => {
                    return Err(invalid_definition(
                        name,
                        "exactly two of corner_mag, total_cum_rate, total_mo_rate must be given",
                    ));
                }
            }
            Ok(Arc::new(dist))
        }
        MagFreqDistDefinition::Gaussian {
            min_mag,
            num_mag,
            delta_mag,
            mean,
            std_dev,
            truncation_type,
            truncation_level,
            total_cum_rate,
            total_mo_rate,
        } => {
            let truncation_type = truncation_type.unwrap_or(TruncationType::None);
            let mut dist = GaussianMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            match (total_cum_rate, total_mo_rate) {
                (Some(total_cum_rate), None) => dist.set_all_but_total_mo_rate(
                    mean,
                    std_dev,
                    total_cum_rate,
                    truncation_level,
                    truncation_type,
                )?,
                (None, Some(total_mo_rate)) => dist.set_all_but_cum_rate(
                    mean,
                    std_dev,
                    total_mo_rate,
                    truncation_level,
                    truncation_type,
                )?,
                _ => {
                    return Err(invalid_definition(
                        name,
                        "exactly one of total_cum_rate, total_mo_rate must be given",
                    ));
                }
            }
            Ok(Arc::new(dist))
        }
        MagFreqDistDefinition::YoungsCoppersmith {
            min_mag,
            num_mag,
            delta_mag,
            mag_lower,
            mag_upper,
            delta_mag_char,
            mag_prime,
            delta_mag_prime,
            b_value,
            total_char_rate,
            total_mo_rate,
        } => {
            let mut dist = YoungsCoppersmithMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            match (total_char_rate, total_mo_rate) {
                (Some(total_char_rate), None) => dist.set_all_but_total_mo_rate(
                    mag_lower,
                    mag_upper,
                    delta_mag_char,
                    mag_prime,
                    delta_mag_prime,
                    b_value,
                    total_char_rate,
                )?,
                (None, Some(total_mo_rate)) => dist.set_all_but_total_char_rate(
                    mag_lower,
                    mag_upper,
                    delta_mag_char,
                    mag_prime,
                    delta_mag_prime,
                    b_value,
                    total_mo_rate,
                )?,
                _ => {
                    return Err(invalid_definition(
                        name,
                        "exactly one of total_char_rate, total_mo_rate must be given",
                    ));
                }
            }
            Ok(Arc::new(dist))
        }
        MagFreqDistDefinition::Incremental {
            min_mag,
            num_mag,
            delta_mag,
            rates,
        } => {
            if rates.len() != num_mag {
                return Err(invalid_definition(
                    name,
                    "rates must have exactly num_mag entries",
                ));
            }
            let mut dist = IncrementalMagFreqDist::new(min_mag, num_mag, delta_mag)?;
            for (index, rate) in rates.iter().enumerate() {
                dist.set_rate_at(index, *rate)?;
            }
            Ok(Arc::new(dist))
        }
    }
}

pub struct Configuration {
    mag_freq_dist_manager_cell: RefCell<Manager<SharedMagFreqDist>>
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration {
            mag_freq_dist_manager_cell: RefCell::new(Manager::new(build_mag_freq_dist))
        }
    }

    pub fn mag_freq_dist_manager(&self) -> RefMut<'_, Manager<SharedMagFreqDist>> {
        self.mag_freq_dist_manager_cell.borrow_mut()
    }

    pub fn from_reader(&self, file_path: &str) -> Result<(), ManagerError> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        self.from_json_value(json_value)
    }

    pub fn from_json_value(&self, json_value: serde_json::Value) -> Result<(), ManagerError> {
        let json_prop: ConfigurationJsonProp =
            ManagerError::from_json_or_json_parse_error(json_value)?;
        {
            let manager = self.mag_freq_dist_manager_cell.borrow_mut();
            manager.insert_obj_from_json_vec(&json_prop.mag_freq_dist)?;
        }
        // Summed definitions refer to earlier entries by name, so they are
        // assembled here after the plain definitions are in the manager.
        for summed_json in json_prop.summed_mag_freq_dist.iter() {
            self.insert_summed_from_json(summed_json.clone())?;
        }
        Ok(())
    }

    fn insert_summed_from_json(&self, json_value: serde_json::Value) -> Result<(), ManagerError> {
        let named: NamedJsonObject =
            ManagerError::from_json_or_json_parse_error(json_value.clone())?;
        let definition: SummedDefinition =
            ManagerError::from_json_or_json_parse_error(json_value)?;
        let retention = definition
            .retention
            .unwrap_or(ConstituentRetention::Distributions);
        let mut summed = SummedMagFreqDist::new(
            definition.min_mag,
            definition.num_mag,
            definition.delta_mag,
            retention,
        )?;
        let manager = self.mag_freq_dist_manager_cell.borrow_mut();
        for constituent_name in definition.constituents.iter() {
            let constituent = manager.get(constituent_name)?;
            summed.add_incremental_mag_freq_dist(constituent.as_ref())?;
        }
        manager.map().insert(named.name().to_owned(), Arc::new(summed));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::Configuration;
    use crate::magdist::magfreqdist::MagFreqDist;
    use crate::manager::manager::IManager;
    use crate::manager::managererror::ManagerError;

    #[test]
    fn gutenberg_richter_definition_builds() {
        let config = Configuration::new();
        config
            .from_json_value(json!({
                "mag_freq_dist": [{
                    "name": "regional GR",
                    "family": "GutenbergRichter",
                    "min_mag": 5.0,
                    "num_mag": 31,
                    "delta_mag": 0.1,
                    "mag_lower": 5.0,
                    "mag_upper": 8.0,
                    "b_value": 1.0,
                    "total_cum_rate": 2.5
                }]
            }))
            .unwrap();
        let dist = config.mag_freq_dist_manager().get("regional GR").unwrap();
        assert_relative_eq!(dist.total_incremental_rate(), 2.5, max_relative = 1e-12);
    }

    #[test]
    fn every_family_is_buildable() {
        let config = Configuration::new();
        config
            .from_json_value(json!({
                "mag_freq_dist": [
                    {
                        "name": "char", "family": "Single",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mag": 7.0, "rate": 0.01
                    },
                    {
                        "name": "tapered", "family": "TaperedGutenbergRichter",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mag_lower": 5.0, "corner_mag": 7.5,
                        "b_value": 1.0, "total_cum_rate": 2.0
                    },
                    {
                        "name": "gauss", "family": "Gaussian",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mean": 6.5, "std_dev": 0.25,
                        "truncation_type": "UpperAndLower", "truncation_level": 2.0,
                        "total_cum_rate": 1.0
                    },
                    {
                        "name": "yc", "family": "YoungsCoppersmith",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mag_lower": 5.0, "mag_upper": 8.0,
                        "delta_mag_char": 0.5, "mag_prime": 6.5,
                        "delta_mag_prime": 1.0, "b_value": 1.0,
                        "total_mo_rate": 1e18
                    },
                    {
                        "name": "table", "family": "Incremental",
                        "min_mag": 5.0, "num_mag": 3, "delta_mag": 0.1,
                        "rates": [0.3, 0.2, 0.1]
                    }
                ]
            }))
            .unwrap();
        let manager = config.mag_freq_dist_manager();
        assert_eq!(manager.names(), vec!["char", "gauss", "table", "tapered", "yc"]);
        assert_relative_eq!(
            manager.get("table").unwrap().total_incremental_rate(),
            0.6,
            max_relative = 1e-12
        );
    }

    #[test]
    fn summed_definition_resolves_constituents_by_name() {
        let config = Configuration::new();
        config
            .from_json_value(json!({
                "mag_freq_dist": [
                    {
                        "name": "background", "family": "GutenbergRichter",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mag_lower": 5.0, "mag_upper": 8.0,
                        "b_value": 1.0, "total_cum_rate": 2.0
                    },
                    {
                        "name": "fault", "family": "Single",
                        "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                        "mag": 7.0, "rate": 0.01
                    }
                ],
                "summed_mag_freq_dist": [{
                    "name": "region total",
                    "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                    "retention": "InfoOnly",
                    "constituents": ["background", "fault"]
                }]
            }))
            .unwrap();
        let dist = config.mag_freq_dist_manager().get("region total").unwrap();
        assert_relative_eq!(
            dist.total_incremental_rate(),
            2.01,
            max_relative = 1e-12
        );
    }

    #[test]
    fn over_determined_definition_is_rejected() {
        let config = Configuration::new();
        let result = config.from_json_value(json!({
            "mag_freq_dist": [{
                "name": "bad GR", "family": "GutenbergRichter",
                "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                "mag_lower": 5.0, "mag_upper": 8.0,
                "b_value": 1.0,
                "total_cum_rate": 2.5, "total_mo_rate": 1e18
            }]
        }));
        assert!(matches!(
            result,
            Err(ManagerError::InvalidDefinitionError { .. })
        ));
    }

    #[test]
    fn summed_with_unknown_constituent_fails() {
        let config = Configuration::new();
        let result = config.from_json_value(json!({
            "mag_freq_dist": [],
            "summed_mag_freq_dist": [{
                "name": "orphan total",
                "min_mag": 5.0, "num_mag": 31, "delta_mag": 0.1,
                "constituents": ["missing"]
            }]
        }));
        assert!(matches!(
            result,
            Err(ManagerError::NameNotFoundError(_))
        ));
    }

    #[test]
    fn wrong_rate_table_length_is_rejected() {
        let config = Configuration::new();
        let result = config.from_json_value(json!({
            "mag_freq_dist": [{
                "name": "short table", "family": "Incremental",
                "min_mag": 5.0, "num_mag": 4, "delta_mag": 0.1,
                "rates": [0.3, 0.2]
            }]
        }));
        assert!(matches!(
            result,
            Err(ManagerError::InvalidDefinitionError { .. })
        ));
    }
}
