//! Audio pipeline settings.

use std::fmt;

/// Clock and buffering parameters for the resampler and output ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    /// CPU clock driving `Apu::tick`, in Hz.
    pub cpu_hz: f64,
    /// Host output rate, in Hz.
    pub sample_rate: f64,
    /// Ring capacity in samples.
    pub capacity: usize,
    /// Fill level the resampler steers towards, as a fraction of the
    /// sample rate (0.2 is 200 ms).
    pub target_fill: f64,
    /// Weight of each new measurement in the divisor moving average.
    /// Must lie strictly between 0 and 1.
    pub smoothing: f64,
}

/// A setting [`AudioConfig::validate`] refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioConfigError {
    /// `cpu_hz` is not a positive finite number.
    CpuClock(f64),
    /// `sample_rate` is not a positive finite number.
    SampleRate(f64),
    /// `capacity` is 0.
    ZeroCapacity,
    /// `target_fill` would not leave the ring partly full.
    TargetFill(f64),
    /// `smoothing` is outside (0, 1).
    Smoothing(f64),
}

impl fmt::Display for AudioConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CpuClock(hz) => write!(f, "CPU clock must be positive, got {hz}"),
            Self::SampleRate(hz) => write!(f, "sample rate must be positive, got {hz}"),
            Self::ZeroCapacity => write!(f, "audio ring capacity must be non-zero"),
            Self::TargetFill(fill) => {
                write!(f, "target fill {fill} must be positive and fit in the ring")
            }
            Self::Smoothing(alpha) => {
                write!(f, "divisor smoothing must lie in (0, 1), got {alpha}")
            }
        }
    }
}

impl std::error::Error for AudioConfigError {}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 1_789_773.0,
            sample_rate: 44_100.0,
            capacity: 44_100,
            target_fill: 0.2,
            smoothing: 0.000_05,
        }
    }
}

impl AudioConfig {
    /// Samples the ring should hold in steady state.
    #[must_use]
    pub fn ideal_occupancy(&self) -> f64 {
        self.sample_rate * self.target_fill
    }

    /// CPU cycles per output sample with no drift correction.
    #[must_use]
    pub fn base_divisor(&self) -> f64 {
        self.cpu_hz / self.sample_rate
    }

    /// Check that the resampler can run with these settings.
    pub fn validate(&self) -> Result<(), AudioConfigError> {
        if !(self.cpu_hz.is_finite() && self.cpu_hz > 0.0) {
            return Err(AudioConfigError::CpuClock(self.cpu_hz));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(AudioConfigError::SampleRate(self.sample_rate));
        }
        if self.capacity == 0 {
            return Err(AudioConfigError::ZeroCapacity);
        }
        let occupancy = self.ideal_occupancy();
        if !(1.0..=self.capacity as f64).contains(&occupancy) {
            return Err(AudioConfigError::TargetFill(self.target_fill));
        }
        if !(self.smoothing > 0.0 && self.smoothing < 1.0) {
            return Err(AudioConfigError::Smoothing(self.smoothing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntsc_defaults() {
        let config = AudioConfig::default();
        assert!((config.ideal_occupancy() - 8820.0).abs() < 1e-9);
        assert!((config.base_divisor() - 40.584_42).abs() < 1e-4);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn smoothing_must_be_a_proper_fraction() {
        for alpha in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
            let config = AudioConfig {
                smoothing: alpha,
                ..AudioConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(AudioConfigError::Smoothing(_))),
                "smoothing {alpha} accepted"
            );
        }
    }

    #[test]
    fn degenerate_rates_and_sizes_rejected() {
        let base = AudioConfig::default();
        assert_eq!(
            AudioConfig { sample_rate: 0.0, ..base }.validate(),
            Err(AudioConfigError::SampleRate(0.0))
        );
        assert_eq!(
            AudioConfig { cpu_hz: -1.0, ..base }.validate(),
            Err(AudioConfigError::CpuClock(-1.0))
        );
        assert_eq!(
            AudioConfig { capacity: 0, ..base }.validate(),
            Err(AudioConfigError::ZeroCapacity)
        );
        assert_eq!(
            AudioConfig { target_fill: 2.0, ..base }.validate(),
            Err(AudioConfigError::TargetFill(2.0))
        );
    }
}
