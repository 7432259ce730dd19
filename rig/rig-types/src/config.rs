//! Stepping configuration.
//!
//! Controls handed to the dynamics backend at load: gravity, the maximum
//! internal step size, and the integration accuracy target. The backend may
//! subdivide further; these are ceilings, not exact step prescriptions.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gravity configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Gravity vector in world coordinates (m/s²).
    pub vector: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity along -Z.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            vector: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// No gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            vector: Vector3::zeros(),
        }
    }

    /// Gravity from an explicit vector.
    #[must_use]
    pub const fn from_vector(vector: Vector3<f64>) -> Self {
        Self { vector }
    }

    /// Whether the configured gravity is effectively zero.
    ///
    /// Backends should treat this as "zero magnitude" rather than
    /// normalizing a zero direction vector.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.vector.norm() < 1e-12
    }
}

/// Configuration for system stepping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepConfig {
    /// Maximum internal integrator step (seconds).
    pub max_step: f64,
    /// Relative integration accuracy target.
    pub accuracy: f64,
    /// Gravity applied to the assembled system.
    pub gravity: Gravity,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            max_step: 1e-3,
            accuracy: 0.1,
            gravity: Gravity::earth(),
        }
    }
}

impl StepConfig {
    /// Create a config with the given maximum step size.
    #[must_use]
    pub fn with_max_step(max_step: f64) -> Self {
        Self {
            max_step,
            ..Default::default()
        }
    }

    /// Tighten the accuracy target for slow, precise runs.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            max_step: 1e-4,
            accuracy: 1e-3,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Gravity::zero();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn earth_gravity_points_down() {
        let g = Gravity::earth();
        assert!(g.vector.z < 0.0);
        assert!(!g.is_zero());
        assert!(Gravity::zero().is_zero());
    }

    #[test]
    fn config_builders() {
        let config = StepConfig::with_max_step(0.01).zero_gravity();
        assert_eq!(config.max_step, 0.01);
        assert!(config.gravity.is_zero());
        assert!(StepConfig::high_accuracy().accuracy < StepConfig::default().accuracy);
    }
}
