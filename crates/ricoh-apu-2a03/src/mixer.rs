//! Non-linear channel mixer.

/// Combine channel outputs into one sample in 0.0..~1.0.
///
/// Pulse inputs are 0-15 each, triangle and noise 0-15, DMC 0-127. Uses the
/// usual two-group approximation of the 2A03's resistor ladder.
#[must_use]
pub fn mix(pulse1: f64, pulse2: f64, triangle: f64, noise: f64, dmc: f64) -> f64 {
    let pulse_sum = pulse1 + pulse2;
    let pulse_out = if pulse_sum > 0.0 {
        95.88 / (8128.0 / pulse_sum + 100.0)
    } else {
        0.0
    };

    let tnd = triangle / 8227.0 + noise / 12241.0 + dmc / 22638.0;
    let tnd_out = if tnd > 0.0 {
        159.79 / (1.0 / tnd + 100.0)
    } else {
        0.0
    };

    pulse_out + tnd_out
}
