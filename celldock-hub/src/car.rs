//! Transport car hub: winch grab/drop on brain command.

use celldock_core::{HubCommand, TokenWatcher};

use crate::motor::Motor;
use crate::radio::{ProtocolTiming, Radio, BRAIN_CHANNEL};

const WINCH_SPEED: f32 = 500.0;
const WINCH_DUTY_LIMIT: u8 = 75;

/// The car's cooperative loop: home the winch, then observe the brain
/// channel at the command cadence forever.
pub struct CarHub {
    radio: Box<dyn Radio>,
    winch: Box<dyn Motor>,
    watcher: TokenWatcher,
    timing: ProtocolTiming,
}

impl CarHub {
    pub fn new(radio: Box<dyn Radio>, winch: Box<dyn Motor>, timing: ProtocolTiming) -> Self {
        Self {
            radio,
            winch,
            watcher: TokenWatcher::new(),
            timing,
        }
    }

    pub fn run(&mut self) -> ! {
        tracing::info!("car hub loop starting");
        self.reset();
        loop {
            self.step();
            std::thread::sleep(self.timing.command_poll);
        }
    }

    /// Stall-home the winch against its upper stop.
    pub fn reset(&mut self) {
        self.winch.run_until_stalled(WINCH_SPEED, WINCH_DUTY_LIMIT);
    }

    /// One poll of the brain channel.
    pub fn step(&mut self) {
        let observed = self.radio.observe(BRAIN_CHANNEL);
        let Some(token) = self.watcher.observe(observed.as_deref()) else {
            return;
        };
        match HubCommand::from_token(&token) {
            Some(HubCommand::CarGrab) => {
                self.winch.run_until_stalled(WINCH_SPEED, WINCH_DUTY_LIMIT);
                self.ack(HubCommand::CarGrab);
            }
            Some(HubCommand::CarDrop) => {
                self.winch.run_until_stalled(-WINCH_SPEED, WINCH_DUTY_LIMIT);
                self.ack(HubCommand::CarDrop);
            }
            // Storage-hub traffic shares the brain channel; ignore it.
            Some(_) => {}
            None => tracing::debug!(%token, "ignoring unknown token"),
        }
    }

    fn ack(&mut self, command: HubCommand) {
        if let Some(completion) = command.completion() {
            self.radio.broadcast(Some(completion));
        }
    }
}
