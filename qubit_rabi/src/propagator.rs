//! Single-step Rabi propagator
//!
//! Over one timestep the drive is held constant, so the effective Hamiltonian
//! H = (Ω σx + Δ σz) / 2 is time-independent and the evolution is the rotation
//!
//! U = cos(θ) I − i sin(θ) (nx σx + nz σz),  θ = R·dt/2,  R = √(Ω² + Δ²)
//!
//! Time dependence comes from re-setting the drive amplitude between steps.

use crate::complex::Complex;
use crate::drive::DriveConfig;
use crate::qubit::QuantumState;

/// Below this generator magnitude the rotation axis is treated as zero
pub const AXIS_EPSILON: f64 = 1e-15;

/// 2x2 unitary acting on (α, β)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagator {
    pub u00: Complex,
    pub u01: Complex,
    pub u10: Complex,
    pub u11: Complex,
}

impl Propagator {
    /// Rotation generated by Ω (x component) and Δ (z component) over `dt`
    pub fn rabi(omega: f64, detuning: f64, dt: f64) -> Self {
        let r = (omega * omega + detuning * detuning).sqrt();
        let angle = r * dt / 2.0;
        let (nx, nz) = if r < AXIS_EPSILON {
            (0.0, 0.0)
        } else {
            (omega / r, detuning / r)
        };

        let (sin, cos) = angle.sin_cos();
        Self {
            u00: Complex::new(cos, -nz * sin),
            u01: Complex::new(0.0, -nx * sin),
            u10: Complex::new(0.0, -nx * sin),
            u11: Complex::new(cos, nz * sin),
        }
    }

    pub fn apply(&self, alpha: Complex, beta: Complex) -> (Complex, Complex) {
        (
            self.u00 * alpha + self.u01 * beta,
            self.u10 * alpha + self.u11 * beta,
        )
    }
}

/// Advance `state` by one drive timestep.
///
/// Collapsed states are frozen: nothing changes, including the drive clock,
/// and `false` is returned.
pub fn step(drive: &mut DriveConfig, state: &mut QuantumState) -> bool {
    if state.is_collapsed() {
        return false;
    }

    let u = Propagator::rabi(drive.omega(), drive.detuning(), drive.dt());
    let (alpha, beta) = u.apply(state.alpha, state.beta);
    state.alpha = alpha;
    state.beta = beta;
    state.normalize();

    drive.advance();
    true
}
