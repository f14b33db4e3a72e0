//! Storage hub: the carousel loop owning the authoritative rack.

use std::time::Duration;

use celldock_core::{HubCommand, SlotColor, StorageRack, TokenWatcher};

use crate::motor::{ColorSensor, Motor};
use crate::radio::{broadcast_chunked, ProtocolTiming, Radio, BRAIN_CHANNEL};

/// Carousel seek speed; negative runs toward the color sensor.
const CAROUSEL_SPEED: f32 = -250.0;
/// Feeder belt duty while tracking is on.
const FEEDER_DUTY: i8 = 40;
/// Overshoot dwell after the sensor matches, before stopping.
const SLOT_SETTLE: Duration = Duration::from_millis(150);
const SENSOR_POLL: Duration = Duration::from_millis(10);

/// The storage hub's cooperative loop. Observes the brain channel at the
/// command cadence, executes, acknowledges. Runs forever; there is no
/// terminal state.
pub struct StorageHub {
    radio: Box<dyn Radio>,
    carousel: Box<dyn Motor>,
    feeder: Box<dyn Motor>,
    sensor: Box<dyn ColorSensor>,
    rack: StorageRack,
    watcher: TokenWatcher,
    timing: ProtocolTiming,
}

impl StorageHub {
    pub fn new(
        radio: Box<dyn Radio>,
        carousel: Box<dyn Motor>,
        feeder: Box<dyn Motor>,
        sensor: Box<dyn ColorSensor>,
        timing: ProtocolTiming,
    ) -> Self {
        Self {
            radio,
            carousel,
            feeder,
            sensor,
            rack: StorageRack::new(),
            watcher: TokenWatcher::new(),
            timing,
        }
    }

    /// The authoritative rack.
    pub fn rack(&self) -> &StorageRack {
        &self.rack
    }

    pub fn run(&mut self) -> ! {
        tracing::info!("storage hub loop starting");
        self.feeder.dc(FEEDER_DUTY);
        loop {
            self.step();
            std::thread::sleep(self.timing.command_poll);
        }
    }

    /// One poll of the brain channel.
    pub fn step(&mut self) {
        let observed = self.radio.observe(BRAIN_CHANNEL);
        let Some(token) = self.watcher.observe(observed.as_deref()) else {
            return;
        };
        match HubCommand::from_token(&token) {
            Some(command) => self.handle(command),
            None => tracing::debug!(%token, "ignoring unknown token"),
        }
    }

    fn handle(&mut self, command: HubCommand) {
        tracing::info!(token = command.token(), "handling");
        match command {
            HubCommand::BatteryStorage => {
                let slot = self.rack.find_empty();
                self.seek_slot(slot);
                self.ack(command);
            }
            HubCommand::BatteryReplace => {
                let slot = self.rack.find_usable();
                self.seek_slot(slot);
                self.ack(command);
            }
            HubCommand::StopBatteryTrack => {
                self.feeder.dc(0);
                self.ack(command);
            }
            HubCommand::StartBatteryTrack => {
                self.feeder.dc(FEEDER_DUTY);
                self.ack(command);
            }
            HubCommand::BatteryConvertReset => {
                self.rack.reset();
                std::thread::sleep(SLOT_SETTLE);
                self.ack(command);
            }
            HubCommand::StorageData => match self.rack.to_json() {
                Ok(json) => broadcast_chunked(&mut *self.radio, &json, &self.timing),
                Err(err) => tracing::warn!("rack snapshot serialization failed: {err}"),
            },
            // Car traffic shares the brain channel; not ours to answer.
            HubCommand::CarGrab | HubCommand::CarDrop => {}
        }
    }

    fn ack(&mut self, command: HubCommand) {
        if let Some(completion) = command.completion() {
            self.radio.broadcast(Some(completion));
        }
    }

    /// Spin the carousel until the sensor sees the slot color, dwell to
    /// center, stop. A full or exhausted rack selects nothing; the motion
    /// is skipped but the acknowledge still goes out.
    fn seek_slot(&mut self, slot: Option<SlotColor>) {
        let Some(color) = slot else {
            tracing::warn!("no slot available, skipping carousel seek");
            return;
        };
        self.carousel.run(CAROUSEL_SPEED);
        loop {
            if self.sensor.color() == Some(color) {
                std::thread::sleep(SLOT_SETTLE);
                self.carousel.stop();
                return;
            }
            std::thread::sleep(SENSOR_POLL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celldock_core::{fragment_advertisements, Slot};

    use crate::testkit::{ScriptedRadio, ScriptedSensor, SimMotor};

    fn fast() -> ProtocolTiming {
        ProtocolTiming {
            command_poll: Duration::from_millis(1),
            chunk_gap: Duration::from_millis(1),
            chunk_timeout: Duration::from_millis(50),
            observe_poll: Duration::from_millis(1),
            result_poll: Duration::from_millis(2),
            result_timeout: Duration::from_millis(10),
        }
    }

    fn hub_with(observations: Vec<Option<&str>>, sensor: ScriptedSensor) -> (StorageHub, ScriptedRadio) {
        let mut radio = ScriptedRadio::new();
        radio.script(BRAIN_CHANNEL, observations);
        let hub = StorageHub::new(
            Box::new(radio.clone()),
            Box::new(SimMotor::new()),
            Box::new(SimMotor::new()),
            Box::new(sensor),
            fast(),
        );
        (hub, radio)
    }

    fn any_sensor() -> ScriptedSensor {
        ScriptedSensor::new([
            None,
            Some(SlotColor::Blue),
            Some(SlotColor::Red),
            Some(SlotColor::Green),
        ])
    }

    #[test]
    fn battery_storage_fills_green_and_acks() {
        let (mut hub, radio) = hub_with(vec![Some("BATTERY_STORAGE")], any_sensor());
        hub.step();
        assert_eq!(
            hub.rack().slot(SlotColor::Green),
            Slot { has_battery: true, charge: 0 }
        );
        assert_eq!(
            radio.lock().broadcasts,
            vec![Some("BATTERY_STORAGED".to_owned())]
        );
    }

    #[test]
    fn battery_replace_empties_red() {
        let (mut hub, radio) = hub_with(vec![Some("BATTERY_REPLACE")], any_sensor());
        hub.step();
        assert_eq!(
            hub.rack().slot(SlotColor::Red),
            Slot { has_battery: false, charge: 0 }
        );
        assert_eq!(
            radio.lock().broadcasts,
            vec![Some("BATTERY_REPLACED".to_owned())]
        );
    }

    #[test]
    fn unchanged_command_is_not_reprocessed() {
        let (mut hub, radio) = hub_with(
            vec![Some("BATTERY_STORAGE"), Some("BATTERY_STORAGE")],
            any_sensor(),
        );
        hub.step();
        hub.step();
        hub.step();
        // Green filled once, one acknowledge.
        assert_eq!(hub.rack().slot(SlotColor::Blue), Slot { has_battery: true, charge: 60 });
        assert_eq!(radio.lock().broadcasts.len(), 1);
    }

    #[test]
    fn convert_reset_restores_defaults() {
        let (mut hub, radio) = hub_with(
            vec![Some("BATTERY_REPLACE"), Some("BATTERY_CONVERT_RESET")],
            any_sensor(),
        );
        hub.step();
        hub.step();
        assert_eq!(*hub.rack(), StorageRack::new());
        assert_eq!(
            radio.lock().broadcasts.last(),
            Some(&Some("BATTERY_CONVERT_RESETED".to_owned()))
        );
    }

    #[test]
    fn track_commands_toggle_feeder_duty() {
        let (mut hub, radio) = hub_with(
            vec![Some("STOP_BATTERY_TRACK"), Some("START_BATTERY_TRACK")],
            any_sensor(),
        );
        hub.step();
        hub.step();
        assert_eq!(
            radio.lock().broadcasts,
            vec![
                Some("STOPED_BATTERY_TRACK".to_owned()),
                Some("STARTED_BATTERY_TRACK".to_owned()),
            ]
        );
    }

    #[test]
    fn storage_data_streams_rack_chunks_then_clears() {
        let (mut hub, radio) = hub_with(vec![Some("STORAGE_DATA")], any_sensor());
        hub.step();
        let json = hub.rack().to_json().unwrap();
        let mut expected: Vec<Option<String>> =
            fragment_advertisements(&json).into_iter().map(Some).collect();
        expected.push(None);
        assert_eq!(radio.lock().broadcasts, expected);
    }

    #[test]
    fn car_traffic_on_the_shared_channel_is_ignored() {
        let (mut hub, radio) = hub_with(
            vec![Some("CAR_GRAB"), Some("junk-token"), None],
            any_sensor(),
        );
        hub.step();
        hub.step();
        hub.step();
        assert!(radio.lock().broadcasts.is_empty());
        assert_eq!(*hub.rack(), StorageRack::new());
    }
}
