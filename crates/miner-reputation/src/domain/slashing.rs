//! Slashed-status decoding.
//!
//! The storage miner actor answers `IsSlashed` with a CBOR boolean.

use super::value_objects::MethodNum;

/// Miner actor method number of `IsSlashed`.
pub const IS_SLASHED_METHOD: MethodNum = MethodNum(15);

/// CBOR major type 7, simple value 21.
pub const CBOR_TRUE: [u8; 1] = [0xf5];

/// CBOR major type 7, simple value 20.
pub const CBOR_FALSE: [u8; 1] = [0xf4];

/// Decode an `IsSlashed` return value.
///
/// Only the exact encoding of `true` counts as slashed; anything else,
/// including an empty return, reads as not slashed.
pub fn decode_slashed(return_data: &[u8]) -> bool {
    return_data == CBOR_TRUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_true() {
        assert!(decode_slashed(&CBOR_TRUE));
    }

    #[test]
    fn test_decode_false() {
        assert!(!decode_slashed(&CBOR_FALSE));
    }

    #[test]
    fn test_decode_garbage_is_not_slashed() {
        assert!(!decode_slashed(&[]));
        assert!(!decode_slashed(&[0xf5, 0x00]));
        assert!(!decode_slashed(&[0x01]));
    }
}
