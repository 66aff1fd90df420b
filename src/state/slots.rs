//! Hourly booking slots and the operating window they live in.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Number of hourly slots in a calendar day.
pub const HOURS_PER_DAY: u8 = 24;

/// A one-hour booking unit identified by its starting hour (`"10:00"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Slot(u8);

/// Error raised when a slot label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid slot label `{label}`: expected an hour between 00:00 and 23:00")]
pub struct InvalidSlot {
    /// The label that was rejected.
    pub label: String,
}

impl Slot {
    /// Build a slot from its starting hour, rejecting hours outside `0..24`.
    pub fn from_hour(hour: u8) -> Option<Self> {
        (hour < HOURS_PER_DAY).then_some(Self(hour))
    }

    /// Starting hour of the slot.
    pub fn hour(self) -> u8 {
        self.0
    }

    /// Label of the hour right after this slot ends, `"24:00"` for the last slot of the day.
    pub fn end_label(self) -> String {
        format!("{:02}:00", self.0 + 1)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for Slot {
    type Err = InvalidSlot;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSlot {
            label: value.to_owned(),
        };

        let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
        if hours.len() != 2 || !hours.bytes().all(|b| b.is_ascii_digit()) || minutes != "00" {
            return Err(invalid());
        }
        let hour = hours.parse::<u8>().map_err(|_| invalid())?;
        Slot::from_hour(hour).ok_or_else(invalid)
    }
}

/// Parse a list of slot labels into an ordered set, rejecting duplicates.
pub fn parse_slots(labels: &[String]) -> Result<BTreeSet<Slot>, SlotListError> {
    let mut slots = BTreeSet::new();
    for label in labels {
        let slot = label.parse::<Slot>()?;
        if !slots.insert(slot) {
            return Err(SlotListError::Duplicate(slot));
        }
    }
    if slots.is_empty() {
        return Err(SlotListError::Empty);
    }
    Ok(slots)
}

/// Errors raised while validating a requested slot list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotListError {
    /// No slot was requested.
    #[error("at least one time slot is required")]
    Empty,
    /// A label could not be parsed.
    #[error(transparent)]
    Invalid(#[from] InvalidSlot),
    /// The same slot was requested twice.
    #[error("time slot {0} is listed more than once")]
    Duplicate(Slot),
    /// A slot falls outside the bookable window.
    #[error("time slot {0} is outside operating hours")]
    OutsideHours(Slot),
}

/// Bookable window of a day: `[open_hour, close_hour)` minus closed slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingHours {
    open_hour: u8,
    close_hour: u8,
    closed: BTreeSet<Slot>,
}

impl OperatingHours {
    /// Build an operating window, returning `None` when the bounds are inconsistent.
    pub fn new(open_hour: u8, close_hour: u8, closed: BTreeSet<Slot>) -> Option<Self> {
        (open_hour < close_hour && close_hour <= HOURS_PER_DAY).then_some(Self {
            open_hour,
            close_hour,
            closed,
        })
    }

    /// Every bookable slot in chronological order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (self.open_hour..self.close_hour)
            .map(Slot)
            .filter(|slot| !self.closed.contains(slot))
    }

    /// Whether the slot can be booked at all.
    pub fn contains(&self, slot: Slot) -> bool {
        (self.open_hour..self.close_hour).contains(&slot.0) && !self.closed.contains(&slot)
    }

    /// Ensure every slot of the set is bookable.
    pub fn check(&self, slots: &BTreeSet<Slot>) -> Result<(), SlotListError> {
        match slots.iter().find(|slot| !self.contains(**slot)) {
            Some(slot) => Err(SlotListError::OutsideHours(*slot)),
            None => Ok(()),
        }
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open_hour: 6,
            close_hour: HOURS_PER_DAY,
            closed: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hour_labels() {
        assert_eq!("10:00".parse::<Slot>().unwrap().hour(), 10);
        assert_eq!("00:00".parse::<Slot>().unwrap().hour(), 0);
        assert_eq!("23:00".parse::<Slot>().unwrap().to_string(), "23:00");
    }

    #[test]
    fn rejects_malformed_labels() {
        for label in [
            "24:00", "9:00", "10:30", "10", "ab:00", "", "-1:00", "+1:00",
        ] {
            assert!(label.parse::<Slot>().is_err(), "{label} should be rejected");
        }
    }

    #[test]
    fn end_label_of_last_slot_is_midnight() {
        assert_eq!(Slot::from_hour(23).unwrap().end_label(), "24:00");
    }

    #[test]
    fn parse_slots_orders_and_rejects_duplicates() {
        let slots = parse_slots(&["12:00".into(), "10:00".into()]).unwrap();
        let labels: Vec<String> = slots.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["10:00", "12:00"]);

        assert_eq!(
            parse_slots(&["10:00".into(), "10:00".into()]),
            Err(SlotListError::Duplicate(Slot(10)))
        );
        assert_eq!(parse_slots(&[]), Err(SlotListError::Empty));
    }

    #[test]
    fn operating_hours_exclude_closed_slots() {
        let closed = BTreeSet::from([Slot(12)]);
        let hours = OperatingHours::new(10, 14, closed).unwrap();
        let labels: Vec<String> = hours.slots().map(|slot| slot.to_string()).collect();
        assert_eq!(labels, vec!["10:00", "11:00", "13:00"]);
        assert!(!hours.contains(Slot(12)));
        assert!(!hours.contains(Slot(14)));
        assert_eq!(
            hours.check(&BTreeSet::from([Slot(9)])),
            Err(SlotListError::OutsideHours(Slot(9)))
        );
    }

    #[test]
    fn inconsistent_bounds_are_rejected() {
        assert!(OperatingHours::new(10, 10, BTreeSet::new()).is_none());
        assert!(OperatingHours::new(6, 25, BTreeSet::new()).is_none());
    }
}
