//! Rabi-Driven Qubit Simulation
//!
//! Propagates two-level quantum systems under an oscillating drive whose
//! strength is controlled by an external brightness signal, and renders the
//! resulting states on a Bloch sphere.
//!
//! - **Engine**: [`qubit`] state and measurement, [`drive`] channels,
//!   [`propagator`] single-step unitary evolution
//! - **Session**: explicit ownership of qubit/drive pairs and the RNG
//! - **Signal**: the `BRIGHTNESS:` line protocol of the analysis process
//! - **Visualization**: Bloch scene geometry, wgpu renderer, egui sidebar

pub mod complex;
pub mod qubit;
pub mod drive;
pub mod propagator;
pub mod session;
pub mod signal;
pub mod config;
pub mod error;
pub mod bloch;
pub mod renderer;
pub mod equations_ui;

pub use complex::Complex;
pub use config::{ChannelConfig, SignalConfig, SimulationConfig};
pub use drive::DriveConfig;
pub use error::{Error, Result, SignalError, StateError};
pub use propagator::{step, Propagator};
pub use qubit::{Measurement, Outcome, QuantumState};
pub use session::{Channel, ChannelTelemetry, Session};
pub use signal::{AmplitudeSource, ConstantSignal, LineSignal, ProcessSignal};
