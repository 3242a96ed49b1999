//! Rabi drive channel
//!
//! Translates a dimensionless brightness ratio into the angular drive
//! strength Ω = 2π · f_max · b, and carries the channel's fixed detuning.

use rand::Rng;
use std::f64::consts::TAU;

/// Half-width of the uniform detuning draw, in the same units as Ω
pub const DETUNING_RANGE: f64 = 0.05;

/// One independent drive channel
#[derive(Debug, Clone)]
pub struct DriveConfig {
    max_angular_freq_scale: f64,
    dt: f64,
    elapsed_time: f64,
    current_amplitude: f64,
    current_omega: f64,
    detuning: f64,
}

impl DriveConfig {
    /// New channel at zero amplitude with a detuning drawn from
    /// `[-DETUNING_RANGE, DETUNING_RANGE]`.
    pub fn new<R: Rng + ?Sized>(max_angular_freq_scale: f64, dt: f64, rng: &mut R) -> Self {
        let detuning = rng.gen_range(-DETUNING_RANGE..=DETUNING_RANGE);
        Self::with_detuning(max_angular_freq_scale, dt, detuning)
    }

    /// New channel with an explicit detuning
    pub fn with_detuning(max_angular_freq_scale: f64, dt: f64, detuning: f64) -> Self {
        Self {
            max_angular_freq_scale,
            dt,
            elapsed_time: 0.0,
            current_amplitude: 0.0,
            current_omega: 0.0,
            detuning,
        }
    }

    /// Set the drive amplitude and recompute Ω.
    ///
    /// `b` is expected in [0, 1]; the range is not checked here.
    pub fn set_amplitude(&mut self, b: f64) {
        self.current_amplitude = b;
        self.current_omega = TAU * self.max_angular_freq_scale * b;
    }

    /// Instantaneous angular drive strength Ω
    pub fn omega(&self) -> f64 {
        self.current_omega
    }

    /// Drive frequency in cycles per unit time, Ω / 2π
    pub fn frequency(&self) -> f64 {
        self.current_omega / TAU
    }

    pub fn amplitude(&self) -> f64 {
        self.current_amplitude
    }

    pub fn detuning(&self) -> f64 {
        self.detuning
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn max_angular_freq_scale(&self) -> f64 {
        self.max_angular_freq_scale
    }

    pub(crate) fn advance(&mut self) {
        self.elapsed_time += self.dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_channel_is_idle() {
        let mut rng = StdRng::seed_from_u64(11);
        let drive = DriveConfig::new(20.0, 0.05, &mut rng);
        assert_eq!(drive.amplitude(), 0.0);
        assert_eq!(drive.omega(), 0.0);
        assert_eq!(drive.elapsed_time(), 0.0);
        assert_eq!(drive.dt(), 0.05);
        assert_eq!(drive.max_angular_freq_scale(), 20.0);
    }

    #[test]
    fn detuning_is_drawn_within_range() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1000 {
            let drive = DriveConfig::new(1.0, 0.01, &mut rng);
            assert!(drive.detuning().abs() <= DETUNING_RANGE);
        }
    }

    #[test]
    fn detuning_is_fixed_across_amplitude_changes() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut drive = DriveConfig::new(20.0, 0.05, &mut rng);
        let detuning = drive.detuning();
        for b in [0.1, 0.9, 0.0, 0.5] {
            drive.set_amplitude(b);
            assert_eq!(drive.detuning(), detuning);
        }
    }

    #[test]
    fn omega_derivation() {
        let mut drive = DriveConfig::with_detuning(20.0, 0.05, 0.0);
        drive.set_amplitude(0.5);
        let expected = 2.0 * std::f64::consts::PI * 20.0 * 0.5;
        assert!((drive.omega() - expected).abs() < 1e-12);
        assert!((drive.frequency() - 10.0).abs() < 1e-12);
        assert_eq!(drive.amplitude(), 0.5);
    }

    #[test]
    fn out_of_range_amplitude_is_not_clamped() {
        let mut drive = DriveConfig::with_detuning(1.0, 0.05, 0.0);
        drive.set_amplitude(2.0);
        assert_eq!(drive.amplitude(), 2.0);
        assert!((drive.omega() - 2.0 * TAU).abs() < 1e-12);
    }
}
