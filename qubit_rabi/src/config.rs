//! Simulation configuration.
//!
//! Configuration is resolved in two layers (later overrides earlier):
//!
//! 1. Built-in defaults (two drive channels, camera analysis script)
//! 2. Environment variables (QUBIT_*)

use crate::complex::Complex;
use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;

/// Default maximum drive frequency scale (MHz in the display)
pub const DEFAULT_MAX_FREQ: f64 = 20.0;

/// Default timestep per frame
pub const DEFAULT_DT: f64 = 0.05;

/// Default command producing `BRIGHTNESS:` lines
pub const DEFAULT_SIGNAL_COMMAND: &str = "python camera_quality.py";

/// One drive channel and the qubit it drives
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Maximum drive frequency scale
    pub max_freq: f64,
    /// Timestep per tick
    pub dt: f64,
    /// Custom starting amplitudes, replacing the default superposition
    pub initial_state: Option<(Complex, Complex)>,
}

impl ChannelConfig {
    pub fn new(max_freq: f64, dt: f64) -> Self {
        Self {
            max_freq,
            dt,
            initial_state: None,
        }
    }

    pub fn with_state(mut self, alpha: Complex, beta: Complex) -> Self {
        self.initial_state = Some((alpha, beta));
        self
    }
}

/// Where drive amplitudes come from
#[derive(Debug, Clone, PartialEq)]
pub enum SignalConfig {
    /// Spawn a process and read its line protocol
    Process(String),
    /// Hold the drive at a fixed amplitude
    Constant(f64),
}

/// Full session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub channels: Vec<ChannelConfig>,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub signal: SignalConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                ChannelConfig::new(DEFAULT_MAX_FREQ, DEFAULT_DT + 0.01),
                ChannelConfig::new(DEFAULT_MAX_FREQ - 3.0, DEFAULT_DT)
                    .with_state(Complex::new(0.3312, 0.111), Complex::new(0.992, -0.852)),
            ],
            seed: None,
            signal: SignalConfig::Process(DEFAULT_SIGNAL_COMMAND.to_string()),
        }
    }
}

impl SimulationConfig {
    /// Defaults overridden by the process environment, then validated.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply QUBIT_* overrides from `lookup`. Unparsable values are ignored
    /// with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = parsed::<u64, _>(&lookup, "QUBIT_SEED") {
            self.seed = Some(seed);
        }

        if let Some(cmd) = lookup("QUBIT_SIGNAL_CMD") {
            let cmd = cmd.trim();
            self.signal = if cmd.is_empty() {
                SignalConfig::Constant(crate::signal::DEFAULT_AMPLITUDE)
            } else {
                SignalConfig::Process(cmd.to_string())
            };
        }

        if let Some(amplitude) = parsed::<f64, _>(&lookup, "QUBIT_CONSTANT_AMPLITUDE") {
            self.signal = SignalConfig::Constant(amplitude);
        }

        if let Some(max_freq) = parsed::<f64, _>(&lookup, "QUBIT_MAX_FREQ") {
            for channel in &mut self.channels {
                channel.max_freq = max_freq;
            }
        }

        if let Some(dt) = parsed::<f64, _>(&lookup, "QUBIT_DT") {
            for channel in &mut self.channels {
                channel.dt = dt;
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(Error::Config("at least one drive channel is required".into()));
        }
        for (i, channel) in self.channels.iter().enumerate() {
            if !(channel.dt.is_finite() && channel.dt > 0.0) {
                return Err(Error::Config(format!(
                    "channel {}: dt must be positive, got {}",
                    i, channel.dt
                )));
            }
            if !(channel.max_freq.is_finite() && channel.max_freq >= 0.0) {
                return Err(Error::Config(format!(
                    "channel {}: max frequency must be non-negative, got {}",
                    i, channel.max_freq
                )));
            }
        }
        if let SignalConfig::Constant(amplitude) = self.signal {
            if !(0.0..=1.0).contains(&amplitude) {
                return Err(Error::Config(format!(
                    "constant amplitude must be within [0, 1], got {}",
                    amplitude
                )));
            }
        }
        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].max_freq, 20.0);
        assert!((config.channels[0].dt - 0.06).abs() < 1e-12);
        assert_eq!(config.channels[1].max_freq, 17.0);
        assert_eq!(config.channels[1].dt, 0.05);
        assert!(config.channels[0].initial_state.is_none());
        assert!(config.channels[1].initial_state.is_some());
        assert_eq!(config.seed, None);
        assert_eq!(
            config.signal,
            SignalConfig::Process(DEFAULT_SIGNAL_COMMAND.to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(lookup(&[
            ("QUBIT_SEED", "1234"),
            ("QUBIT_MAX_FREQ", "5.5"),
            ("QUBIT_DT", "0.01"),
            ("QUBIT_SIGNAL_CMD", "python3 other.py"),
        ]));
        assert_eq!(config.seed, Some(1234));
        assert!(config.channels.iter().all(|c| c.max_freq == 5.5 && c.dt == 0.01));
        assert_eq!(config.signal, SignalConfig::Process("python3 other.py".into()));
    }

    #[test]
    fn test_empty_command_selects_constant_signal() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(lookup(&[("QUBIT_SIGNAL_CMD", "  ")]));
        assert_eq!(
            config.signal,
            SignalConfig::Constant(crate::signal::DEFAULT_AMPLITUDE)
        );

        config.apply_overrides(lookup(&[("QUBIT_CONSTANT_AMPLITUDE", "0.8")]));
        assert_eq!(config.signal, SignalConfig::Constant(0.8));
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(lookup(&[("QUBIT_SEED", "not-a-number"), ("QUBIT_DT", "fast")]));
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig::default();
        config.channels[0].dt = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.channels[1].max_freq = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.channels.clear();
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.signal = SignalConfig::Constant(1.5);
        assert!(config.validate().is_err());
    }
}
