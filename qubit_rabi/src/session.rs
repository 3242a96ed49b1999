//! Simulation session
//!
//! Owns every (drive, qubit) pair and the random source used for detuning
//! draws and measurements. Pairs share no mutable state.

use crate::complex::Complex;
use crate::config::SimulationConfig;
use crate::drive::DriveConfig;
use crate::error::{Error, Result};
use crate::propagator;
use crate::qubit::{Measurement, Outcome, QuantumState};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One drive channel driving one qubit
#[derive(Debug, Clone)]
pub struct Channel {
    pub drive: DriveConfig,
    pub qubit: QuantumState,
}

/// Read-only view of a channel for rendering and logging
#[derive(Debug, Clone, Copy)]
pub struct ChannelTelemetry {
    pub index: u32,
    pub alpha: Complex,
    pub beta: Complex,
    pub measured: Measurement,
    pub bloch: (f64, f64, f64),
    pub omega: f64,
    pub frequency: f64,
    pub amplitude: f64,
    pub elapsed_time: f64,
}

pub struct Session {
    rng: StdRng,
    channels: Vec<Channel>,
    next_index: u32,
    ticks: u64,
}

impl Session {
    /// Empty session; `None` seeds from entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            channels: Vec::new(),
            next_index: 0,
            ticks: 0,
        }
    }

    /// Session with every configured channel created and seeded
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut session = Self::new(config.seed);
        for channel in &config.channels {
            let id = session.add_channel(channel.max_freq, channel.dt);
            if let Some((alpha, beta)) = channel.initial_state {
                session.set_custom_state(id, alpha, beta)?;
            }
        }
        Ok(session)
    }

    /// Create a drive channel with a fresh qubit; returns the channel id
    pub fn add_channel(&mut self, max_freq: f64, dt: f64) -> usize {
        let drive = DriveConfig::new(max_freq, dt, &mut self.rng);
        let qubit = QuantumState::new(self.next_index);
        self.next_index += 1;

        log::info!(
            "Channel {}: qubit #{} max_freq={} dt={} detuning={:+.4}",
            self.channels.len(),
            qubit.index(),
            max_freq,
            dt,
            drive.detuning()
        );

        self.channels.push(Channel { drive, qubit });
        self.channels.len() - 1
    }

    /// Replace a channel's qubit amplitudes before (or during) the run
    pub fn set_custom_state(&mut self, channel: usize, alpha: Complex, beta: Complex) -> Result<()> {
        let ch = self.channel_mut(channel)?;
        ch.qubit.set_amplitudes(alpha, beta)?;
        Ok(())
    }

    /// One logical tick: clamp the amplitude, set it on every drive, step
    /// every qubit.
    pub fn tick(&mut self, amplitude: f64) {
        let amplitude = if amplitude.is_nan() {
            0.0
        } else {
            amplitude.clamp(0.0, 1.0)
        };

        for ch in &mut self.channels {
            ch.drive.set_amplitude(amplitude);
            propagator::step(&mut ch.drive, &mut ch.qubit);
            log::debug!(
                "tick {} qubit #{} measured={:?} alpha={} beta={} t={:.6}",
                self.ticks,
                ch.qubit.index(),
                ch.qubit.measured(),
                ch.qubit.alpha(),
                ch.qubit.beta(),
                ch.drive.elapsed_time()
            );
        }
        self.ticks += 1;
    }

    /// Measure one channel's qubit
    pub fn measure(&mut self, channel: usize) -> Result<Outcome> {
        let ch = self
            .channels
            .get_mut(channel)
            .ok_or(Error::UnknownChannel(channel))?;
        let already = ch.qubit.is_collapsed();
        let outcome = ch.qubit.measure(&mut self.rng);
        if !already {
            log::info!("Qubit #{} measured: |{}⟩", ch.qubit.index(), outcome.bit());
        }
        Ok(outcome)
    }

    /// Measure every qubit, in channel order
    pub fn measure_all(&mut self) -> Vec<Outcome> {
        (0..self.channels.len())
            .filter_map(|i| self.measure(i).ok())
            .collect()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, channel: usize) -> Result<&Channel> {
        self.channels
            .get(channel)
            .ok_or(Error::UnknownChannel(channel))
    }

    fn channel_mut(&mut self, channel: usize) -> Result<&mut Channel> {
        self.channels
            .get_mut(channel)
            .ok_or(Error::UnknownChannel(channel))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Ticks applied so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn telemetry(&self) -> Vec<ChannelTelemetry> {
        self.channels
            .iter()
            .map(|ch| ChannelTelemetry {
                index: ch.qubit.index(),
                alpha: ch.qubit.alpha(),
                beta: ch.qubit.beta(),
                measured: ch.qubit.measured(),
                bloch: ch.qubit.bloch_vector(),
                omega: ch.drive.omega(),
                frequency: ch.drive.frequency(),
                amplitude: ch.drive.amplitude(),
                elapsed_time: ch.drive.elapsed_time(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, SignalConfig};

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(seed),
            signal: SignalConfig::Constant(0.5),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn indices_increase_monotonically() {
        let mut session = Session::new(Some(1));
        for expected in 0..4 {
            let id = session.add_channel(10.0, 0.05);
            assert_eq!(session.channel(id).unwrap().qubit.index(), expected);
        }
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn from_config_applies_custom_state() {
        let session = Session::from_config(&config(7)).unwrap();
        assert_eq!(session.len(), 2);
        let default = QuantumState::new(0);
        let first = &session.channels()[0].qubit;
        let second = &session.channels()[1].qubit;
        assert_eq!(first.alpha(), default.alpha());
        assert_ne!(second.alpha(), default.alpha());
        assert!((second.norm_sq() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_config_rejects_invalid() {
        let mut cfg = config(7);
        cfg.channels.push(ChannelConfig::new(1.0, -0.1));
        assert!(matches!(Session::from_config(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = |seed| {
            let mut session = Session::from_config(&config(seed)).unwrap();
            for i in 0..200 {
                session.tick(0.1 + 0.8 * ((i as f64) * 0.05).sin().abs());
            }
            session.measure_all();
            session.telemetry()
        };
        let a = run(99);
        let b = run(99);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.alpha, y.alpha);
            assert_eq!(x.beta, y.beta);
            assert_eq!(x.measured, y.measured);
        }
    }

    #[test]
    fn tick_clamps_amplitude() {
        let mut session = Session::from_config(&config(3)).unwrap();
        session.tick(1.7);
        assert!(session.channels().iter().all(|c| c.drive.amplitude() == 1.0));
        session.tick(-0.2);
        assert!(session.channels().iter().all(|c| c.drive.amplitude() == 0.0));
        session.tick(f64::NAN);
        assert!(session.channels().iter().all(|c| c.drive.amplitude() == 0.0));
        assert_eq!(session.ticks(), 3);
    }

    #[test]
    fn tick_advances_each_channel_by_its_own_dt() {
        let mut session = Session::from_config(&config(4)).unwrap();
        for _ in 0..10 {
            session.tick(0.5);
        }
        let t = session.telemetry();
        assert!((t[0].elapsed_time - 0.6).abs() < 1e-12);
        assert!((t[1].elapsed_time - 0.5).abs() < 1e-12);
        assert!((t[0].frequency - 10.0).abs() < 1e-12);
        assert!((t[1].frequency - 8.5).abs() < 1e-12);
    }

    #[test]
    fn measured_channel_freezes_independently() {
        let mut session = Session::from_config(&config(5)).unwrap();
        session.tick(0.5);
        session.measure(0).unwrap();
        let frozen = session.telemetry()[0];
        let other_before = session.telemetry()[1].elapsed_time;
        for _ in 0..20 {
            session.tick(0.9);
        }
        let after = session.telemetry();
        assert_eq!(after[0].alpha, frozen.alpha);
        assert_eq!(after[0].beta, frozen.beta);
        assert_eq!(after[0].elapsed_time, frozen.elapsed_time);
        assert!(after[1].elapsed_time > other_before);
        assert_eq!(after[1].measured, Measurement::Unmeasured);
    }

    #[test]
    fn unknown_channel_is_reported() {
        let mut session = Session::new(Some(0));
        assert!(matches!(session.measure(2), Err(Error::UnknownChannel(2))));
        assert!(matches!(
            session.set_custom_state(0, Complex::ONE, Complex::ZERO),
            Err(Error::UnknownChannel(0))
        ));
    }

    #[test]
    fn custom_state_after_collapse_is_refused() {
        let mut session = Session::from_config(&config(6)).unwrap();
        session.measure(1).unwrap();
        assert!(matches!(
            session.set_custom_state(1, Complex::ONE, Complex::ONE),
            Err(Error::State(_))
        ));
    }
}
