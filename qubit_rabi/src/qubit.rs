//! Qubit state and projective measurement
//!
//! |ψ⟩ = α|0⟩ + β|1⟩, kept at unit norm while unmeasured and frozen on a basis
//! vector once measured.

use crate::complex::Complex;
use crate::error::StateError;
use rand::Rng;

/// Default superposition every new qubit starts from, before normalization
pub const DEFAULT_ALPHA: Complex = Complex::new(0.8, 0.3);
pub const DEFAULT_BETA: Complex = Complex::new(0.6, -0.2);

/// Result of a single projective measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Zero,
    One,
}

impl Outcome {
    pub fn bit(self) -> u8 {
        match self {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }
}

/// Measurement status. `Collapsed*` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Measurement {
    #[default]
    Unmeasured,
    Collapsed0,
    Collapsed1,
}

impl Measurement {
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Measurement::Unmeasured => None,
            Measurement::Collapsed0 => Some(Outcome::Zero),
            Measurement::Collapsed1 => Some(Outcome::One),
        }
    }
}

impl From<Outcome> for Measurement {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Zero => Measurement::Collapsed0,
            Outcome::One => Measurement::Collapsed1,
        }
    }
}

/// One two-level system
#[derive(Debug, Clone)]
pub struct QuantumState {
    pub(crate) alpha: Complex, // Coefficient of |0⟩
    pub(crate) beta: Complex,  // Coefficient of |1⟩
    measured: Measurement,
    index: u32,
    /// Reserved link to another qubit; no dynamics read it.
    partner: Option<u32>,
}

impl QuantumState {
    /// A fresh qubit in the default superposition
    pub fn new(index: u32) -> Self {
        let mut state = Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            measured: Measurement::Unmeasured,
            index,
            partner: None,
        };
        state.initialize(index);
        state
    }

    /// Reset to the default superposition with the given identity tag
    pub fn initialize(&mut self, index: u32) {
        self.alpha = DEFAULT_ALPHA;
        self.beta = DEFAULT_BETA;
        self.measured = Measurement::Unmeasured;
        self.partner = None;
        self.index = index;
        self.normalize();
    }

    /// Overwrite the amplitudes with a caller-supplied state, renormalized.
    ///
    /// Refused once the qubit has collapsed, or when the pair cannot be
    /// normalized; the state is left untouched in that case.
    pub fn set_amplitudes(&mut self, alpha: Complex, beta: Complex) -> Result<(), StateError> {
        if self.is_collapsed() {
            return Err(StateError::Collapsed);
        }
        if !alpha.is_finite() || !beta.is_finite() {
            return Err(StateError::NonFinite);
        }
        // Scale by the largest component so squaring cannot overflow or underflow
        let scale = alpha
            .re
            .abs()
            .max(alpha.im.abs())
            .max(beta.re.abs())
            .max(beta.im.abs());
        if scale == 0.0 {
            return Err(StateError::ZeroNorm);
        }
        let (alpha, beta) = (alpha / scale, beta / scale);
        let norm = (alpha.norm_sq() + beta.norm_sq()).sqrt();
        self.alpha = alpha / norm;
        self.beta = beta / norm;
        Ok(())
    }

    /// Projective measurement in the computational basis.
    ///
    /// Draws one uniform sample; |0⟩ with probability |α|². Repeated calls
    /// return the stored outcome without drawing.
    pub fn measure<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Outcome {
        if let Some(outcome) = self.measured.outcome() {
            return outcome;
        }

        let p0 = self.alpha.norm_sq();
        let r: f64 = rng.gen();
        let outcome = if r < p0 { Outcome::Zero } else { Outcome::One };

        match outcome {
            Outcome::Zero => {
                self.alpha = Complex::ONE;
                self.beta = Complex::ZERO;
            }
            Outcome::One => {
                self.alpha = Complex::ZERO;
                self.beta = Complex::ONE;
            }
        }
        self.measured = outcome.into();
        outcome
    }

    /// Rescale to unit norm; a zero vector is left alone.
    pub(crate) fn normalize(&mut self) {
        let norm = self.norm_sq().sqrt();
        if norm > 0.0 {
            self.alpha = self.alpha / norm;
            self.beta = self.beta / norm;
        }
    }

    pub fn alpha(&self) -> Complex {
        self.alpha
    }

    pub fn beta(&self) -> Complex {
        self.beta
    }

    pub fn measured(&self) -> Measurement {
        self.measured
    }

    pub fn is_collapsed(&self) -> bool {
        self.measured != Measurement::Unmeasured
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn partner(&self) -> Option<u32> {
        self.partner
    }

    /// |α|² + |β|²
    pub fn norm_sq(&self) -> f64 {
        self.alpha.norm_sq() + self.beta.norm_sq()
    }

    /// Probability of measuring |0⟩
    pub fn prob_zero(&self) -> f64 {
        self.alpha.norm_sq()
    }

    /// Probability of measuring |1⟩
    pub fn prob_one(&self) -> f64 {
        self.beta.norm_sq()
    }

    /// Bloch sphere coordinates (⟨σx⟩, ⟨σy⟩, ⟨σz⟩)
    pub fn bloch_vector(&self) -> (f64, f64, f64) {
        // x = 2 Re(α*β), y = 2 Im(α*β), z = |α|² - |β|²
        let cross = self.alpha.conj() * self.beta;
        (
            2.0 * cross.re,
            2.0 * cross.im,
            self.alpha.norm_sq() - self.beta.norm_sq(),
        )
    }
}
