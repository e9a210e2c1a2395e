//! Devnet-0 slot timing.

use crate::primitives::Slot;

/// Seconds in a slot. Each slot has 4 intervals of 1 second each.
pub const SECONDS_PER_SLOT: u64 = 4;

/// Number of intervals a slot is divided into. Interval boundaries drive the
/// store's head and safe-target recomputation.
pub const INTERVALS_PER_SLOT: u64 = 4;

/// Wall-clock seconds covered by a single interval tick.
pub const SECONDS_PER_INTERVAL: u64 = SECONDS_PER_SLOT / INTERVALS_PER_SLOT;

/// Wall-clock time at which the given slot starts.
pub fn slot_to_time(slot: Slot, genesis_time: u64) -> u64 {
    genesis_time + slot * SECONDS_PER_SLOT
}

/// Slot in progress at the given wall-clock time.
///
/// Times before genesis map to slot 0.
pub fn slot_at(time: u64, genesis_time: u64) -> Slot {
    if time < genesis_time {
        return 0;
    }
    (time - genesis_time) / SECONDS_PER_SLOT
}

/// Interval within the current slot at the given wall-clock time.
pub fn interval_at(time: u64, genesis_time: u64) -> u64 {
    if time < genesis_time {
        return 0;
    }
    ((time - genesis_time) % SECONDS_PER_SLOT) / SECONDS_PER_INTERVAL
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: u64 = 1_700_000_000;

    #[test]
    fn slot_start_times() {
        assert_eq!(slot_to_time(0, GENESIS), 1_700_000_000);
        assert_eq!(slot_to_time(1, GENESIS), 1_700_000_004);
        assert_eq!(slot_to_time(100, GENESIS), 1_700_000_400);
    }

    #[test]
    fn slot_at_wall_clock() {
        assert_eq!(slot_at(GENESIS, GENESIS), 0);
        assert_eq!(slot_at(GENESIS + 4, GENESIS), 1);
        assert_eq!(slot_at(GENESIS + 7, GENESIS), 1);
        assert_eq!(slot_at(GENESIS - 1, GENESIS), 0);
    }

    #[test]
    fn interval_within_slot() {
        assert_eq!(interval_at(GENESIS, GENESIS), 0);
        assert_eq!(interval_at(GENESIS + 1, GENESIS), 1);
        assert_eq!(interval_at(GENESIS + 3, GENESIS), 3);
        assert_eq!(interval_at(GENESIS + 4, GENESIS), 0);
        assert_eq!(interval_at(GENESIS - 10, GENESIS), 0);
    }
}
