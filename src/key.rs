use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use rand::Rng as _;

use crate::constants::KEY_BYTES;
use crate::error::Error;

/// Node identifier or lookup target under the XOR metric.
///
/// Network keys are 160 bits (20 octets). Keys of the same width compare
/// as big-endian integers, so the result of [`xor`](Key::xor) orders
/// directly by distance.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Bytes);

impl Key {
    /// Fresh 160-bit key from cryptographically random octets.
    pub fn generate() -> Key {
        let mut bytes = [0u8; KEY_BYTES];
        rand::rng().fill(&mut bytes[..]);
        Key(Bytes::copy_from_slice(&bytes))
    }

    /// Random key of `bits` width. `bits` must be a positive multiple of 8.
    pub fn random(bits: usize) -> Result<Key, Error> {
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::InvalidKeySize(bits));
        }
        let mut bytes = vec![0u8; bits / 8];
        rand::rng().fill(&mut bytes[..]);
        Ok(Key(Bytes::from(bytes)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Key {
        Key(Bytes::copy_from_slice(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bit_len(&self) -> usize {
        self.0.len() * 8
    }

    /// Byte-wise XOR with another key of the same width.
    pub fn xor(&self, other: &Key) -> Result<Key, Error> {
        if self.0.len() != other.0.len() {
            return Err(Error::SizeMismatch {
                left: self.bit_len(),
                right: other.bit_len(),
            });
        }

        let bytes: Vec<u8> = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a ^ b)
            .collect();

        Ok(Key(Bytes::from(bytes)))
    }

    /// Index of the highest-order set bit, where bit 0 is the least
    /// significant bit of the last octet. `None` for the zero key.
    ///
    /// Applied to an XOR result this is the Kademlia bucket index: the
    /// exponent of the highest bit in which two keys differ.
    pub fn leading_set_bit_index(&self) -> Option<usize> {
        let len = self.0.len();
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                let bit = 7 - byte.leading_zeros() as usize;
                return Some((len - 1 - i) * 8 + bit);
            }
        }
        None
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(")?;
        for byte in self.0.iter().take(2) {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}
