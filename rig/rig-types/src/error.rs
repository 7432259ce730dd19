//! Error types for model construction and stepping.
//!
//! Construction errors (`BuildError`) are fatal at load: the model is not
//! registered and nothing partial is exposed. Step errors (`StepError`) are
//! fatal for the running session and propagate to the step caller.
//! Unsupported collision shapes are deliberately *not* errors; they are
//! skipped with a warning at assembly.

use thiserror::Error;

/// Errors that fail model loading: graph construction or system assembly.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    /// A joint references a body name that was never registered.
    #[error("joint '{joint}' references unknown body '{body}'")]
    UnknownBody {
        /// The offending joint.
        joint: String,
        /// The missing body name.
        body: String,
    },

    /// Two links registered under the same name.
    #[error("duplicate link name: {0}")]
    DuplicateLink(String),

    /// Two joints registered under the same name.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// Two models registered under the same name.
    #[error("duplicate model name: {0}")]
    DuplicateModel(String),

    /// A joint type valid in the graph has no dynamical primitive.
    #[error("joint '{joint}' has type '{kind}' which cannot be assembled")]
    UnimplementedJoint {
        /// The offending joint.
        joint: String,
        /// The unimplemented kinematic type.
        kind: String,
    },

    /// Physically invalid mass properties on a link.
    #[error("invalid mass properties for link '{link}': {reason}")]
    InvalidMassProperties {
        /// The offending link.
        link: String,
        /// What is wrong with them.
        reason: String,
    },

    /// The generated topology could not be realized by the backend.
    #[error("topology rejected by dynamics backend: {reason}")]
    RealizeFailed {
        /// Backend-reported reason.
        reason: String,
    },
}

impl BuildError {
    /// Create an unknown-body error.
    #[must_use]
    pub fn unknown_body(joint: impl Into<String>, body: impl Into<String>) -> Self {
        Self::UnknownBody {
            joint: joint.into(),
            body: body.into(),
        }
    }

    /// Create an unimplemented-joint error.
    #[must_use]
    pub fn unimplemented_joint(joint: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnimplementedJoint {
            joint: joint.into(),
            kind: kind.into(),
        }
    }

    /// Create an invalid-mass error.
    #[must_use]
    pub fn invalid_mass(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Create a realize-failed error.
    #[must_use]
    pub fn realize_failed(reason: impl Into<String>) -> Self {
        Self::RealizeFailed {
            reason: reason.into(),
        }
    }
}

/// Errors raised while stepping or querying a running simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    /// Stepping requested before topology realization.
    #[error("system topology has not been realized")]
    NotRealized,

    /// The integrator reported a numerical failure.
    #[error("integrator failed at t={time}: {reason}")]
    IntegratorFailure {
        /// Simulation time at which the failure occurred.
        time: f64,
        /// Engine-reported reason.
        reason: String,
    },

    /// The state contains `NaN` or `Inf` values.
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// What diverged.
        reason: String,
    },

    /// No model registered under this name.
    #[error("model not found: {0}")]
    UnknownModel(String),

    /// No link registered under this name.
    #[error("link not found: {0}")]
    UnknownLink(String),

    /// No joint registered under this name.
    #[error("joint not found: {0}")]
    UnknownJoint(String),

    /// The joint exists but was assembled as a loop constraint, so it has
    /// no mobilizer coordinates to report.
    #[error("joint '{0}' is a loop constraint and carries no state")]
    JointNotMobilized(String),
}

impl StepError {
    /// Create an integrator-failure error.
    #[must_use]
    pub fn integrator_failure(time: f64, reason: impl Into<String>) -> Self {
        Self::IntegratorFailure {
            time,
            reason: reason.into(),
        }
    }

    /// Create a divergence error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_name_the_offender() {
        let err = BuildError::unknown_body("hip", "pelvis");
        assert!(err.to_string().contains("hip"));
        assert!(err.to_string().contains("pelvis"));

        let err = BuildError::unimplemented_joint("steer", "hinge2");
        assert!(err.to_string().contains("hinge2"));
    }

    #[test]
    fn step_errors_carry_time() {
        let err = StepError::integrator_failure(1.25, "step size underflow");
        assert!(err.to_string().contains("1.25"));
        assert!(err.to_string().contains("underflow"));
    }
}
