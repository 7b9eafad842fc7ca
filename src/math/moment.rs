/// Seismic moment (N-m) of an earthquake of the given moment magnitude,
/// after Hanks & Kanamori (1979).
pub fn mag_to_moment(mag: f64) -> f64 {
    10.0_f64.powf(1.5 * mag + 9.05)
}

/// Moment magnitude implied by the given seismic moment (N-m).
pub fn moment_to_mag(moment: f64) -> f64 {
    (moment.log10() - 9.05) / 1.5
}
