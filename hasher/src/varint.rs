//! Compact varint encoding for SPIR-V words, used by the streaming shader
//! module payload (spec §4.5/§8 property 5).
//!
//! Each 32-bit word is split into 7-bit groups, low-group first, with the
//! high bit of each byte set when another group follows.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarintError {
    #[error("varint tail truncated before decoding the expected word count")]
    Truncated,
    #[error("varint group sequence exceeded 5 bytes without terminating")]
    Malformed,
}

/// Appends the varint encoding of `word` to `out`.
pub fn encode_word(word: u32, out: &mut Vec<u8>) {
    let mut w = word;
    loop {
        let mut byte = (w & 0x7f) as u8;
        w >>= 7;
        if w != 0 {
            byte |= 0x80;
            out.push(byte);
        } else {
            out.push(byte);
            break;
        }
    }
}

/// Encodes a full slice of SPIR-V words into a fresh varint byte buffer.
pub fn encode_words(words: &[u32]) -> Vec<u8> {
    // Each word needs at most 5 groups (32 bits / 7 bits per group, rounded up).
    let mut out = Vec::with_capacity(words.len() * 2);
    for &w in words {
        encode_word(w, &mut out);
    }
    out
}

/// Decodes exactly `count` words from `data`, matching spec §4.5: "Decoding
/// produces exactly the number of words indicated by `codeSize/4`; a short
/// or malformed tail fails the parse."
pub fn decode_words(data: &[u8], count: usize) -> Result<Vec<u32>, VarintError> {
    let mut out = Vec::with_capacity(count);
    let mut pos = 0usize;
    for _ in 0..count {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = *data.get(pos).ok_or(VarintError::Truncated)?;
            pos += 1;
            result |= ((byte & 0x7f) as u32) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
            if shift >= 35 {
                return Err(VarintError::Malformed);
            }
        }
        out.push(result);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_single_words() {
        for &w in &[0u32, 1, 127, 128, 300, 0x7fff_ffff, 0xffff_ffff] {
            let encoded = encode_words(&[w]);
            let decoded = decode_words(&encoded, 1).unwrap();
            assert_eq!(decoded, vec![w], "word {:#x} round-trip failed", w);
        }
    }

    #[test]
    fn round_trip_sequence() {
        let words: Vec<u32> = (0..2000u32).map(|i| i.wrapping_mul(2654435761)).collect();
        let encoded = encode_words(&words);
        let decoded = decode_words(&encoded, words.len()).unwrap();
        assert_eq!(decoded, words);
    }

    #[test]
    fn truncated_tail_fails() {
        let encoded = encode_words(&[0xffff_ffff]);
        let short = &encoded[..encoded.len() - 1];
        assert_eq!(decode_words(short, 1), Err(VarintError::Truncated));
    }

    #[test]
    fn empty_input_zero_count() {
        assert_eq!(decode_words(&[], 0).unwrap(), Vec::<u32>::new());
    }
}
