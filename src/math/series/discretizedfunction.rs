use crate::math::series::evenlydiscretizedseries::SeriesError;

/// Read access to an ordered sequence of (x, y) samples. The x values are
/// strictly increasing; the spacing may be arbitrary.
pub trait DiscretizedFunction {
    fn num(&self) -> usize;

    fn x(&self, index: usize) -> f64;

    fn y(&self, index: usize) -> f64;

    fn min_x(&self) -> f64 {
        self.x(0)
    }

    fn max_x(&self) -> f64 {
        self.x(self.num() - 1)
    }

    /// Interpolates the y value at `x` linearly in the log-y domain and
    /// returns it in linear space. A segment whose end point y values are
    /// both zero interpolates to zero.
    fn interpolated_y_in_log_y_domain(&self, x: f64) -> Result<f64, SeriesError> {
        let last = self.num() - 1;
        if x < self.x(0) || x > self.x(last) {
            return Err(SeriesError::InterpolationOutOfRange {
                x,
                min: self.x(0),
                max: self.x(last),
            });
        }
        if x == self.x(last) {
            return Ok(self.y(last));
        }
        let mut segment = last - 1;
        for i in 0..last {
            if x >= self.x(i) && x <= self.x(i + 1) {
                segment = i;
                break;
            }
        }
        let (x1, x2) = (self.x(segment), self.x(segment + 1));
        let (y1, y2) = (self.y(segment), self.y(segment + 1));
        if y1 == 0.0 && y2 == 0.0 {
            return Ok(0.0);
        }
        let log_y = (y2.ln() - y1.ln()) * (x - x1) / (x2 - x1) + y1.ln();
        Ok(log_y.exp())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::math::series::arbitrarilydiscretizedseries::ArbitrarilyDiscretizedSeries;
    use crate::math::series::discretizedfunction::DiscretizedFunction;

    #[test]
    fn log_interpolation_recovers_exponential() {
        // y = 10^-x is linear in log space, so interpolation is exact.
        let points: Vec<(f64, f64)> = [5.0, 6.0, 7.0]
            .iter()
            .map(|&x| (x, 10.0_f64.powf(-x)))
            .collect();
        let series = ArbitrarilyDiscretizedSeries::from_points(points).unwrap();
        assert_relative_eq!(
            series.interpolated_y_in_log_y_domain(5.5).unwrap(),
            10.0_f64.powf(-5.5),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            series.interpolated_y_in_log_y_domain(7.0).unwrap(),
            10.0_f64.powf(-7.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn zero_segment_interpolates_to_zero() {
        let series =
            ArbitrarilyDiscretizedSeries::from_points(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 5.0)])
                .unwrap();
        assert_eq!(series.interpolated_y_in_log_y_domain(0.5).unwrap(), 0.0);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let series =
            ArbitrarilyDiscretizedSeries::from_points(vec![(0.0, 1.0), (1.0, 2.0)]).unwrap();
        assert!(series.interpolated_y_in_log_y_domain(-0.1).is_err());
        assert!(series.interpolated_y_in_log_y_domain(1.1).is_err());
    }
}
