//! Helper functions for slot-indexed JustifiedSlots operations.
//!
//! The bitlist holds one bit per slot since genesis, grown in lockstep with
//! the state's historical block hashes. Bit `i` is set iff the slot-`i`
//! checkpoint is justified in the state's view.

use ethlean_types::state::JustifiedSlots;

/// `ssz::bitfield::Error` and `ssz_types::Error` have identical variants but
/// are distinct types with no `From` impl between them.
fn convert_bitfield_error(err: ssz::BitfieldError) -> ssz_types::Error {
    match err {
        ssz::BitfieldError::OutOfBounds { i, len } => ssz_types::Error::OutOfBounds { i, len },
        ssz::BitfieldError::MissingLengthInformation => {
            ssz_types::Error::MissingLengthInformation
        }
        ssz::BitfieldError::ExcessBits => ssz_types::Error::ExcessBits,
        ssz::BitfieldError::InvalidByteCount { given, expected } => {
            ssz_types::Error::InvalidByteCount { given, expected }
        }
    }
}

/// Value of the bit at `index`. Indices past the end read as false.
pub fn get(bits: &JustifiedSlots, index: u64) -> bool {
    bits.get(index as usize).unwrap_or(false)
}

/// Set the bit at `index`, which must already be within the list's length.
pub fn set(bits: &mut JustifiedSlots, index: u64, value: bool) {
    bits.set(index as usize, value)
        .expect("index is within the bitlist length");
}

/// Return a copy of `bits` with `value` appended at the end.
///
/// Fails when the list is already at its limit.
pub fn append(bits: &JustifiedSlots, value: bool) -> Result<JustifiedSlots, ssz_types::Error> {
    let mut extended = bits.union(
        &JustifiedSlots::with_capacity(bits.len() + 1).map_err(convert_bitfield_error)?,
    );
    extended
        .set(bits.len(), value)
        .expect("the appended index is within the extended length");
    Ok(extended)
}

/// Return a copy of `bits` grown with false bits until it holds at least
/// `min_len` entries. Lists already long enough are returned unchanged.
pub fn ensure_len(bits: &JustifiedSlots, min_len: u64) -> Result<JustifiedSlots, ssz_types::Error> {
    if bits.len() as u64 >= min_len {
        return Ok(bits.clone());
    }
    // Union preserves existing bits and extends the length.
    Ok(bits.union(
        &JustifiedSlots::with_capacity(min_len as usize).map_err(convert_bitfield_error)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_bools(values: &[bool]) -> JustifiedSlots {
        let mut bits = JustifiedSlots::with_capacity(values.len()).unwrap();
        for (i, value) in values.iter().enumerate() {
            bits.set(i, *value).unwrap();
        }
        bits
    }

    #[test]
    fn append_grows_length_by_one() {
        let mut bits = JustifiedSlots::with_capacity(0).unwrap();
        for expected_len in 1..=20 {
            bits = append(&bits, expected_len % 3 == 0).unwrap();
            assert_eq!(bits.len(), expected_len);
        }
    }

    #[test]
    fn append_writes_the_new_bit_and_keeps_the_old_ones() {
        let bits = from_bools(&[true, false, true]);

        let appended = append(&bits, true).unwrap();
        assert!(get(&appended, 3));
        let appended = append(&bits, false).unwrap();
        assert!(!get(&appended, 3));

        for i in 0..3 {
            assert_eq!(get(&appended, i), get(&bits, i));
        }
    }

    #[test]
    fn append_sequence_matches_wire_vectors() {
        use ssz::Encode;

        // Empty bitlist is a lone sentinel byte.
        let bits = JustifiedSlots::with_capacity(0).unwrap();
        assert_eq!(bits.as_ssz_bytes(), vec![0x01]);

        // [1] -> 0b11, [1, 0] -> 0b101, [1, 0, 1] -> 0b1101
        let bits = append(&bits, true).unwrap();
        assert_eq!(bits.as_ssz_bytes(), vec![0x03]);
        let bits = append(&bits, false).unwrap();
        assert_eq!(bits.as_ssz_bytes(), vec![0x05]);
        let bits = append(&bits, true).unwrap();
        assert_eq!(bits.as_ssz_bytes(), vec![0x0d]);
    }

    #[test]
    fn append_crosses_byte_boundaries() {
        let mut bits = from_bools(&[false; 7]);

        bits = append(&bits, true).unwrap();
        assert_eq!(bits.len(), 8);
        assert!(get(&bits, 7));

        bits = append(&bits, true).unwrap();
        assert_eq!(bits.len(), 9);
        assert!(get(&bits, 7));
        assert!(get(&bits, 8));
    }

    #[test]
    fn get_reads_false_past_the_end() {
        let bits = from_bools(&[true]);
        assert!(get(&bits, 0));
        assert!(!get(&bits, 1));
        assert!(!get(&bits, 1_000_000));
    }

    #[test]
    fn ensure_len_grows_with_false_bits() {
        let bits = from_bools(&[true, true]);

        let grown = ensure_len(&bits, 6).unwrap();
        assert_eq!(grown.len(), 6);
        assert!(get(&grown, 0));
        assert!(get(&grown, 1));
        for i in 2..6 {
            assert!(!get(&grown, i));
        }

        // Already long enough: unchanged.
        let same = ensure_len(&bits, 1).unwrap();
        assert_eq!(same.len(), 2);
    }
}
