use crate::math::series::discretizedfunction::DiscretizedFunction;
use crate::math::series::evenlydiscretizedseries::SeriesError;

/// An ordered sequence of (x, y) points with arbitrary x spacing. This is the
/// data contract for externally supplied functions folded onto an MFD grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ArbitrarilyDiscretizedSeries {
    points: Vec<(f64, f64)>,
}

impl ArbitrarilyDiscretizedSeries {
    /// Builds a series from points whose x values must be strictly
    /// increasing.
    pub fn from_points(points: Vec<(f64, f64)>) -> Result<ArbitrarilyDiscretizedSeries, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::InvalidNum { num: 0 });
        }
        for i in 1..points.len() {
            if points[i].0 <= points[i - 1].0 {
                return Err(SeriesError::UnorderedPoints {
                    index: i,
                    x: points[i].0,
                });
            }
        }
        Ok(ArbitrarilyDiscretizedSeries { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}

impl DiscretizedFunction for ArbitrarilyDiscretizedSeries {
    fn num(&self) -> usize {
        self.points.len()
    }

    fn x(&self, index: usize) -> f64 {
        self.points[index].0
    }

    fn y(&self, index: usize) -> f64 {
        self.points[index].1
    }
}
