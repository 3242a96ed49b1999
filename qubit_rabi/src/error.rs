//! Error types for the qubit simulation.
//!
//! Numerical degeneracies in the propagator are not errors; only the session
//! shell (configuration, the external amplitude signal, bad state input) fails.

use std::fmt;
use std::io;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration
    Config(String),
    /// External amplitude signal failure
    Signal(SignalError),
    /// Rejected custom state
    State(StateError),
    /// No channel at this index
    UnknownChannel(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Signal(e) => write!(f, "Signal error: {}", e),
            Error::State(e) => write!(f, "State error: {}", e),
            Error::UnknownChannel(i) => write!(f, "Unknown channel: {}", i),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Signal(e) => Some(e),
            Error::State(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SignalError> for Error {
    fn from(e: SignalError) -> Self {
        Error::Signal(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::State(e)
    }
}

/// Failures of the external amplitude source. All of them end the session.
#[derive(Debug)]
pub enum SignalError {
    /// The analysis process could not be started
    Spawn(io::Error),
    /// The process was started without a readable stdout
    NoStdout,
    /// The stream ended before the READY handshake
    NotReady,
    /// The stream closed after the handshake
    StreamClosed,
    /// A non-transient read failure
    Read(io::Error),
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::Spawn(e) => write!(f, "failed to start signal process: {}", e),
            SignalError::NoStdout => write!(f, "signal process has no stdout"),
            SignalError::NotReady => write!(f, "signal stream ended before READY"),
            SignalError::StreamClosed => write!(f, "signal stream closed"),
            SignalError::Read(e) => write!(f, "signal read failed: {}", e),
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignalError::Spawn(e) | SignalError::Read(e) => Some(e),
            _ => None,
        }
    }
}

/// Reasons a caller-supplied state is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// The qubit has already collapsed
    Collapsed,
    /// Both amplitudes are zero
    ZeroNorm,
    /// An amplitude is NaN or infinite
    NonFinite,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Collapsed => write!(f, "qubit is already measured"),
            StateError::ZeroNorm => write!(f, "amplitudes have zero norm"),
            StateError::NonFinite => write!(f, "amplitudes are not finite"),
        }
    }
}

impl std::error::Error for StateError {}
