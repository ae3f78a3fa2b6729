use hal::ActuatorRange;

use crate::BalancerError;

/// Duty-cycle pair driving the two opposing actuation channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorCommand {
    pub channel1: u16,
    pub channel2: u16,
}

/// Maps the controller's scalar output onto the two complementary channels.
///
/// channel1 = midpoint + output, channel2 = midpoint - output, each clamped
/// to the actuator's valid range. Within the clamp range the two channels
/// always sum to twice the midpoint. Clamping events are counted for
/// tuning diagnostics.
#[derive(Debug)]
pub struct ChannelMapper {
    range: ActuatorRange,
    saturation_events: u32,
}

impl ChannelMapper {
    pub fn new(range: ActuatorRange) -> Result<Self, BalancerError> {
        if range.min >= range.max {
            return Err(BalancerError::EmptyActuatorRange {
                min: range.min,
                max: range.max,
            });
        }
        Ok(Self {
            range,
            saturation_events: 0,
        })
    }

    /// Command holding both channels at the neutral midpoint
    pub fn neutral(&self) -> ActuatorCommand {
        let mid = self.range.midpoint();
        ActuatorCommand {
            channel1: mid,
            channel2: mid,
        }
    }

    /// Map one scalar correction onto the channel pair
    pub fn map(&mut self, output: f32) -> ActuatorCommand {
        if !output.is_finite() {
            return self.neutral();
        }

        let mid = self.range.midpoint() as f32;
        let (channel1, sat1) = self.clamp_channel(mid + output);
        let (channel2, sat2) = self.clamp_channel(mid - output);
        if sat1 || sat2 {
            self.saturation_events += 1;
        }
        ActuatorCommand { channel1, channel2 }
    }

    /// Number of cycles where at least one channel hit its bound
    pub fn saturation_events(&self) -> u32 {
        self.saturation_events
    }

    pub fn range(&self) -> ActuatorRange {
        self.range
    }

    fn clamp_channel(&self, value: f32) -> (u16, bool) {
        let rounded = value.round();
        if rounded < self.range.min as f32 {
            (self.range.min, true)
        } else if rounded > self.range.max as f32 {
            (self.range.max, true)
        } else {
            (rounded as u16, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ChannelMapper {
        ChannelMapper::new(ActuatorRange {
            min: 1000,
            max: 2000,
        })
        .unwrap()
    }

    #[test]
    fn test_channels_sum_to_twice_midpoint_in_range() {
        let mut mapper = mapper();
        for output in [-500.0_f32, -123.4, -1.0, 0.0, 0.6, 250.0, 499.9] {
            let cmd = mapper.map(output);
            assert_eq!(
                cmd.channel1 as u32 + cmd.channel2 as u32,
                2 * 1500,
                "complementary channels must mirror about the midpoint for output {}",
                output
            );
        }
        assert_eq!(mapper.saturation_events(), 0);
    }

    #[test]
    fn test_out_of_range_output_clamps_to_bounds() {
        let mut mapper = mapper();
        let cmd = mapper.map(4000.0);
        assert_eq!(cmd.channel1, 2000);
        assert_eq!(cmd.channel2, 1000);

        let cmd = mapper.map(-4000.0);
        assert_eq!(cmd.channel1, 1000);
        assert_eq!(cmd.channel2, 2000);

        assert_eq!(mapper.saturation_events(), 2);
    }

    #[test]
    fn test_non_finite_output_goes_neutral() {
        let mut mapper = mapper();
        assert_eq!(mapper.map(f32::NAN), mapper.neutral());
        assert_eq!(mapper.map(f32::INFINITY), mapper.neutral());
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(ChannelMapper::new(ActuatorRange { min: 1500, max: 1500 }).is_err());
        assert!(ChannelMapper::new(ActuatorRange { min: 2000, max: 1000 }).is_err());
    }
}
