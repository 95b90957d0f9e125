use std::fmt;

use super::WorkloadError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverState {
    Uninitialized,
    Ready,
    /// A step is in flight.
    Running,
    Completed,
    /// Setup failed; the worker takes no further part in the round.
    Aborted,
}

impl DriverState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleOperation {
    Setup,
    Step,
    Teardown,
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Step => "step",
            Self::Teardown => "teardown",
        })
    }
}

/// Tracks the `Uninitialized → Ready → Running → Ready → Completed` state
/// machine shared by workload implementations.
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle {
    state: DriverState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: DriverState::Uninitialized,
        }
    }
}

impl Lifecycle {
    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Checks that `operation` is allowed now and enters its in-flight state.
    pub fn begin(&mut self, operation: LifecycleOperation) -> Result<(), WorkloadError> {
        let allowed = matches!(
            (operation, self.state),
            (LifecycleOperation::Setup, DriverState::Uninitialized)
                | (LifecycleOperation::Step, DriverState::Ready)
                | (LifecycleOperation::Teardown, DriverState::Ready)
        );
        if !allowed {
            return Err(WorkloadError::InvalidState {
                operation,
                state: self.state,
            });
        }
        if operation == LifecycleOperation::Step {
            self.state = DriverState::Running;
        }
        Ok(())
    }

    /// Records the outcome of an operation started with [`Lifecycle::begin`].
    pub fn finish(&mut self, operation: LifecycleOperation, succeeded: bool) {
        self.state = match (operation, succeeded) {
            (LifecycleOperation::Setup, true) | (LifecycleOperation::Step, _) => DriverState::Ready,
            (LifecycleOperation::Setup, false) => DriverState::Aborted,
            (LifecycleOperation::Teardown, _) => DriverState::Completed,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_before_setup_is_invalid_state() {
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle.begin(LifecycleOperation::Step).unwrap_err();
        assert!(matches!(
            err,
            WorkloadError::InvalidState {
                operation: LifecycleOperation::Step,
                state: DriverState::Uninitialized
            }
        ));
        assert_eq!(lifecycle.state(), DriverState::Uninitialized);
    }

    #[test]
    fn full_lifecycle_ends_completed() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.begin(LifecycleOperation::Setup).unwrap();
        lifecycle.finish(LifecycleOperation::Setup, true);
        assert_eq!(lifecycle.state(), DriverState::Ready);

        lifecycle.begin(LifecycleOperation::Step).unwrap();
        assert_eq!(lifecycle.state(), DriverState::Running);
        lifecycle.finish(LifecycleOperation::Step, false);
        assert_eq!(lifecycle.state(), DriverState::Ready);

        lifecycle.begin(LifecycleOperation::Teardown).unwrap();
        lifecycle.finish(LifecycleOperation::Teardown, false);
        assert_eq!(lifecycle.state(), DriverState::Completed);

        for operation in [
            LifecycleOperation::Setup,
            LifecycleOperation::Step,
            LifecycleOperation::Teardown,
        ] {
            assert!(lifecycle.begin(operation).is_err());
        }
    }

    #[test]
    fn failed_setup_is_terminal() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.begin(LifecycleOperation::Setup).unwrap();
        lifecycle.finish(LifecycleOperation::Setup, false);
        assert!(lifecycle.state().is_terminal());
        assert!(lifecycle.begin(LifecycleOperation::Teardown).is_err());
    }
}
