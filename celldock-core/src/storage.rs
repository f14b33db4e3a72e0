//! Storage rack: the three color-keyed battery slots on the storage hub.
//!
//! Exactly one authoritative rack lives on the storage hub; the brain and
//! the host only hold read-only snapshots refreshed on protocol events.

use serde::{Deserialize, Serialize};

/// Minimum charge for a slot to count as usable for a replacement.
pub const USABLE_CHARGE_MIN: u8 = 90;

/// Slot colors, in rack scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotColor {
    Blue,
    Red,
    Green,
}

impl SlotColor {
    pub const ALL: [SlotColor; 3] = [SlotColor::Blue, SlotColor::Red, SlotColor::Green];

    /// Key used in the JSON wire form.
    pub fn key(self) -> &'static str {
        match self {
            SlotColor::Blue => "BLUE",
            SlotColor::Red => "RED",
            SlotColor::Green => "GREEN",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One battery slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub has_battery: bool,
    /// Charge percentage, 0..=100.
    pub charge: u8,
}

/// The three-slot rack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRack {
    slots: [Slot; 3],
}

impl Default for StorageRack {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageRack {
    /// Boot defaults: Blue and Red occupied at 60% and 95%, Green empty.
    pub fn new() -> Self {
        Self {
            slots: [
                Slot { has_battery: true, charge: 60 },
                Slot { has_battery: true, charge: 95 },
                Slot { has_battery: false, charge: 0 },
            ],
        }
    }

    pub fn slot(&self, color: SlotColor) -> Slot {
        self.slots[color.index()]
    }

    /// Restore boot defaults (the `BATTERY_CONVERT_RESET` action).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// First empty slot in scan order; marks it occupied with charge 0.
    pub fn find_empty(&mut self) -> Option<SlotColor> {
        for color in SlotColor::ALL {
            let slot = &mut self.slots[color.index()];
            if !slot.has_battery {
                slot.has_battery = true;
                slot.charge = 0;
                return Some(color);
            }
        }
        None
    }

    /// First occupied slot charged to at least [`USABLE_CHARGE_MIN`];
    /// empties it.
    pub fn find_usable(&mut self) -> Option<SlotColor> {
        for color in SlotColor::ALL {
            let slot = &mut self.slots[color.index()];
            if slot.has_battery && slot.charge >= USABLE_CHARGE_MIN {
                slot.has_battery = false;
                slot.charge = 0;
                return Some(color);
            }
        }
        None
    }

    /// Fixed 6-byte Storage-frame payload:
    /// `[blue.has, blue.charge, red.has, red.charge, green.has, green.charge]`.
    pub fn encode_payload(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        for (i, color) in SlotColor::ALL.iter().enumerate() {
            let slot = self.slots[color.index()];
            out[2 * i] = u8::from(slot.has_battery);
            out[2 * i + 1] = slot.charge;
        }
        out
    }

    /// Decode a Storage-frame payload. Any length other than 6 is a shape
    /// error; the caller logs and drops, leaving its cache unchanged.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, StoragePayloadError> {
        if payload.len() != 6 {
            return Err(StoragePayloadError::WrongLength(payload.len()));
        }
        let mut slots = [Slot::default(); 3];
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.has_battery = payload[2 * i] != 0;
            slot.charge = payload[2 * i + 1];
        }
        Ok(Self { slots })
    }

    /// JSON wire form for the chunked broadcast:
    /// `{"BLUE":[has,charge],"RED":[...],"GREEN":[...]}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&RackWire::from(self))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RackWire>(text).map(StorageRack::from)
    }
}

/// JSON wire form. Field order is the rack scan order.
#[derive(Serialize, Deserialize)]
struct RackWire {
    #[serde(rename = "BLUE")]
    blue: [u8; 2],
    #[serde(rename = "RED")]
    red: [u8; 2],
    #[serde(rename = "GREEN")]
    green: [u8; 2],
}

impl From<&StorageRack> for RackWire {
    fn from(rack: &StorageRack) -> Self {
        let wire = |color: SlotColor| {
            let slot = rack.slot(color);
            [u8::from(slot.has_battery), slot.charge]
        };
        Self {
            blue: wire(SlotColor::Blue),
            red: wire(SlotColor::Red),
            green: wire(SlotColor::Green),
        }
    }
}

impl From<RackWire> for StorageRack {
    fn from(wire: RackWire) -> Self {
        let slot = |pair: [u8; 2]| Slot {
            has_battery: pair[0] != 0,
            charge: pair[1],
        };
        Self {
            slots: [slot(wire.blue), slot(wire.red), slot(wire.green)],
        }
    }
}

/// Error decoding a Storage-frame payload.
#[derive(Debug, thiserror::Error)]
pub enum StoragePayloadError {
    #[error("storage payload must be 6 bytes, got {0}")]
    WrongLength(usize),
}
