//! Key hashing for object lookup.
//!
//! A multiply-mix hash tuned for short keys (typical JSON keys are 4-20
//! bytes). Keys of up to 8 bytes are covered by two possibly-overlapping
//! 4-byte loads, 9..=16 bytes by two 8-byte loads, and longer keys by a
//! 16-bytes-per-iteration loop with an overlapping tail. The function takes
//! raw bytes, so lookups never materialize a temporary key.

const SEED: u64 = 0xa076_1d64_78bd_642f;
const SEED2: u64 = 0xe703_7ed1_a0b4_28db;

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u64::from(u32::from_le_bytes(buf))
}

#[inline]
fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Hash a key as raw bytes.
#[inline]
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let len = bytes.len();
    let mut h = SEED ^ (len as u64).wrapping_mul(SEED2);

    if len <= 8 {
        let (a, b) = if len >= 4 {
            // 4..=8 bytes: first four and last four, possibly overlapping.
            (read_u32(bytes, 0), read_u32(bytes, len - 4))
        } else if len > 0 {
            // 1..=3 bytes packed into a single word.
            let a = u64::from(bytes[0]) << 16
                | u64::from(bytes[len >> 1]) << 8
                | u64::from(bytes[len - 1]);
            (a, 0)
        } else {
            (0, 0)
        };
        h ^= a;
        h = h.wrapping_mul(SEED2);
        h ^= b;
        h = h.wrapping_mul(SEED);
    } else if len <= 16 {
        h ^= read_u64(bytes, 0);
        h = h.wrapping_mul(SEED2);
        h ^= read_u64(bytes, len - 8);
        h = h.wrapping_mul(SEED);
    } else {
        let mut at = 0;
        while at + 16 <= len {
            h ^= read_u64(bytes, at);
            h = h.wrapping_mul(SEED2);
            h ^= read_u64(bytes, at + 8);
            h = h.wrapping_mul(SEED);
            at += 16;
        }
        // Final 1..=16 bytes, overlapping the previous iteration.
        h ^= read_u64(bytes, len - 16);
        h = h.wrapping_mul(SEED2);
        h ^= read_u64(bytes, len - 8);
        h = h.wrapping_mul(SEED);
    }

    h ^= h >> 32;
    h = h.wrapping_mul(SEED);
    h ^= h >> 29;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bytes_hash_equal() {
        let owned = String::from("timestamp");
        assert_eq!(hash_bytes(owned.as_bytes()), hash_bytes(b"timestamp"));
    }

    #[test]
    fn covers_every_length_class() {
        // 0, 1..=3, 4..=8, 9..=16, and >16 take different load schedules;
        // nearby keys must still disperse.
        let keys: Vec<String> = (0..40).map(|n| "k".repeat(n)).collect();
        let hashes: Vec<u64> = keys.iter().map(|k| hash_bytes(k.as_bytes())).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn single_byte_difference_changes_hash() {
        assert_ne!(hash_bytes(b"bssid"), hash_bytes(b"bssie"));
        assert_ne!(hash_bytes(b"channel_number_a"), hash_bytes(b"channel_number_b"));
        assert_ne!(
            hash_bytes(b"a_rather_long_object_key_x"),
            hash_bytes(b"a_rather_long_object_key_y")
        );
    }

    #[test]
    fn empty_key_is_stable() {
        assert_eq!(hash_bytes(b""), hash_bytes(b""));
    }
}
