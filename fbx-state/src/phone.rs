//! Phone line state publication

use fbx_api::PhoneStatus;

use crate::bus::ChannelBus;
use crate::channel::{channel_id, ChannelValue, ONHOOK, RINGING, STATE};

/// Publish `state.onhook` and `state.ringing` for one line
pub fn publish_phone_state(bus: &dyn ChannelBus, line: &PhoneStatus) {
    bus.publish(&channel_id(STATE, ONHOOK), ChannelValue::OnOff(line.on_hook));
    bus.publish(&channel_id(STATE, RINGING), ChannelValue::OnOff(line.is_ringing));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::StoreBus;

    #[test]
    fn test_publish_phone_state() {
        let bus = StoreBus::new();
        publish_phone_state(&bus, &PhoneStatus::new(false, true));

        assert_eq!(bus.get("state.onhook"), Some(ChannelValue::OnOff(false)));
        assert_eq!(bus.get("state.ringing"), Some(ChannelValue::OnOff(true)));
    }
}
