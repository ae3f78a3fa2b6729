use hal::{ActuatorRange, BalanceActuator};
use log::debug;

/// Logs duty-cycle writes instead of driving PWM registers
pub struct SimActuator {
    initialized: bool,
}

impl SimActuator {
    pub fn new() -> Self {
        Self { initialized: false }
    }
}

impl BalanceActuator for SimActuator {
    fn init(&mut self) -> bool {
        self.initialized = true;
        true
    }

    fn range(&self) -> ActuatorRange {
        ActuatorRange {
            min: 1000,
            max: 2000,
        }
    }

    fn write(&mut self, channel1: u16, channel2: u16) {
        debug!("duty {} / {}", channel1, channel2);
    }
}
