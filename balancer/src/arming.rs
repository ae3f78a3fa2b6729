use core::fmt;

use thiserror::Error;

/// Conditions that latch the vehicle out of the armed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultReason {
    /// The estimator kept dropping cycles on bad sensor input
    SensorFault,

    /// A periodic activity repeatedly overran its period
    DeadlineMiss,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultReason::SensorFault => write!(f, "sensor fault"),
            FaultReason::DeadlineMiss => write!(f, "deadline miss"),
        }
    }
}

/// Errors that can occur during arming operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArmingError {
    #[error("vehicle is already armed")]
    AlreadyArmed,

    #[error("vehicle is latched in a fault state ({0})")]
    Faulted(FaultReason),
}

/// Actuator gating state.
///
/// Commands reach the actuator only while `Armed`. A fault latches until an
/// operator disarm; the first fault recorded wins so the root cause is not
/// overwritten by follow-on faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
    Fault(FaultReason),
}

impl ArmState {
    pub fn arm(&mut self) -> Result<(), ArmingError> {
        match *self {
            ArmState::Disarmed => {
                *self = ArmState::Armed;
                Ok(())
            }
            ArmState::Armed => Err(ArmingError::AlreadyArmed),
            ArmState::Fault(reason) => Err(ArmingError::Faulted(reason)),
        }
    }

    /// Disarming always succeeds and clears a latched fault
    pub fn disarm(&mut self) {
        *self = ArmState::Disarmed;
    }

    pub fn fault(&mut self, reason: FaultReason) {
        if !matches!(self, ArmState::Fault(_)) {
            *self = ArmState::Fault(reason);
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, ArmState::Armed)
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmState::Disarmed => write!(f, "DISARMED"),
            ArmState::Armed => write!(f, "ARMED"),
            ArmState::Fault(reason) => write!(f, "FAULT ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_transitions() {
        let mut state = ArmState::default();
        assert!(!state.is_armed());

        state.arm().expect("arming from disarmed must succeed");
        assert!(state.is_armed());
        assert_eq!(state.arm(), Err(ArmingError::AlreadyArmed));

        state.disarm();
        assert_eq!(state, ArmState::Disarmed);
    }

    #[test]
    fn test_fault_latches_until_disarm() {
        let mut state = ArmState::Armed;
        state.fault(FaultReason::DeadlineMiss);
        assert_eq!(state, ArmState::Fault(FaultReason::DeadlineMiss));

        // The first fault wins.
        state.fault(FaultReason::SensorFault);
        assert_eq!(state, ArmState::Fault(FaultReason::DeadlineMiss));

        assert_eq!(
            state.arm(),
            Err(ArmingError::Faulted(FaultReason::DeadlineMiss))
        );

        state.disarm();
        state.arm().expect("disarm must clear the latch");
    }
}
