//! # Locker Translators
//!
//! Decode the server's `Locker_*` frames into domain events.
//!
//! ```text
//! Locker_Open:  {BYTE x}{BYTE y}{item list}
//! Locker_Reply: {SHORT id}{INT amount}{BYTE weight}{BYTE max weight}{item list}
//! Locker_Get:   {SHORT id}{THREE amount}{BYTE weight}{BYTE max weight}{item list}
//! Locker_Buy:   {INT gold remaining}{BYTE upgrades}
//! item list:    ({SHORT id}{THREE amount})*   until the end of the payload
//! ```

use eoclient_core::{EoError, Result};
use super::{frame::PacketFrame, packets::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: u16,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerOpened {
    pub x: u8,
    pub y: u8,
    pub items: Vec<InventoryItem>,
}

/// Result of a deposit (`Reply`) or a withdrawal (`Get`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerItemsChanged {
    pub item_id: u16,
    /// Amount left in (deposit) or added to (withdrawal) the inventory
    pub amount: u32,
    pub weight: u8,
    pub max_weight: u8,
    /// `true` when `amount` is added to the existing inventory stack
    pub added_to_existing: bool,
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockerUpgraded {
    pub gold_remaining: u32,
    pub upgrades: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockerEvent {
    Opened(LockerOpened),
    ItemsChanged(LockerItemsChanged),
    Upgraded(LockerUpgraded),
}

/// Keys the locker translator understands
pub const LOCKER_KEYS: [FamilyActionKey; 4] = [
    FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open),
    FamilyActionKey::new(PacketFamily::Locker, PacketAction::Reply),
    FamilyActionKey::new(PacketFamily::Locker, PacketAction::Get),
    FamilyActionKey::new(PacketFamily::Locker, PacketAction::Buy),
];

impl LockerEvent {
    /// Translate a `Locker_*` frame
    pub fn translate(frame: &mut PacketFrame) -> Result<Self> {
        if frame.family() != PacketFamily::Locker {
            return Err(EoError::Protocol(format!("Not a locker frame: {}", frame.key())));
        }

        match frame.action() {
            PacketAction::Open => {
                let x = get_u8(frame)?;
                let y = get_u8(frame)?;
                let items = read_items(frame)?;
                Ok(LockerEvent::Opened(LockerOpened { x, y, items }))
            }
            PacketAction::Reply => read_items_changed(frame, false).map(LockerEvent::ItemsChanged),
            PacketAction::Get => read_items_changed(frame, true).map(LockerEvent::ItemsChanged),
            PacketAction::Buy => {
                let gold_remaining = frame.get_int()?;
                let upgrades = get_u8(frame)?;
                Ok(LockerEvent::Upgraded(LockerUpgraded {
                    gold_remaining,
                    upgrades,
                }))
            }
            other => Err(EoError::Protocol(format!("Unhandled locker action {:?}", other))),
        }
    }
}

fn read_items_changed(frame: &mut PacketFrame, added_to_existing: bool) -> Result<LockerItemsChanged> {
    let item_id = frame.get_short()? as u16;
    let amount = if added_to_existing {
        frame.get_three()?
    } else {
        frame.get_int()?
    };
    let weight = get_u8(frame)?;
    let max_weight = get_u8(frame)?;
    let items = read_items(frame)?;

    Ok(LockerItemsChanged {
        item_id,
        amount,
        weight,
        max_weight,
        added_to_existing,
        items,
    })
}

fn read_items(frame: &mut PacketFrame) -> Result<Vec<InventoryItem>> {
    let mut items = Vec::with_capacity(frame.remaining() / 5);
    while frame.has_more_data() {
        let id = frame.get_short()? as u16;
        let amount = frame.get_three()?;
        items.push(InventoryItem { id, amount });
    }
    Ok(items)
}

fn get_u8(frame: &mut PacketFrame) -> Result<u8> {
    let value = frame.get_byte()?;
    u8::try_from(value).map_err(|_| EoError::Protocol(format!("Byte field out of range: {}", value)))
}
