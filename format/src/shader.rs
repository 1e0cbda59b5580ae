//! Shader module blob framing (spec §4.5): a JSON document carrying
//! `codeSize`/`varintOffset`/`varintSize`, a NUL terminator, then the
//! varint-encoded SPIR-V tail.
//!
//! `varintOffset`/`varintSize`/`codeSize` are encoded as fixed-width
//! 16-hex-digit strings (like hash strings elsewhere in the format)
//! specifically so that patching `varintOffset` in after computing the
//! JSON's own length never changes that length — a numeric JSON field
//! would grow a digit right around the boundary that matters.

use fossilize_hash::varint::{decode_words, encode_words};
use fossilize_types::shader_module::{ShaderModuleCreateFlags, ShaderModuleCreateInfo};
use fossilize_types::{FossilizeError, Result};
use serde_json::{json, Value};

fn hex16(v: u64) -> String {
    format!("{:016x}", v)
}

fn parse_hex16(value: &Value, key: &str) -> Result<u64> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FossilizeError::Corruption(format!("shader module blob missing field {:?}", key)))
        .and_then(|s| {
            u64::from_str_radix(s, 16)
                .map_err(|_| FossilizeError::Corruption(format!("shader module blob field {:?} is not hex", key)))
        })
}

/// Builds the full on-disk blob (JSON + NUL + varint tail) for a shader
/// module entity.
pub fn encode_shader_module_blob(info: &ShaderModuleCreateInfo) -> Vec<u8> {
    let varint = encode_words(&info.code);
    let code_size = (info.code.len() * 4) as u64;

    let mut value = json!({
        "flags": info.flags.bits(),
        "codeSize": hex16(code_size),
        "varintSize": hex16(varint.len() as u64),
        "varintOffset": hex16(0),
    });
    let probe = serde_json::to_vec(&value).expect("shader module json is well-formed");
    let varint_offset = (probe.len() + 1) as u64;
    value["varintOffset"] = json!(hex16(varint_offset));
    let json_bytes = serde_json::to_vec(&value).expect("shader module json is well-formed");
    debug_assert_eq!(json_bytes.len(), probe.len(), "fixed-width hex field changed JSON length");

    let mut blob = json_bytes;
    blob.push(0);
    blob.extend_from_slice(&varint);
    blob
}

/// Parses a shader module blob back into its create-info. Spec §8 property
/// 5/6: a short or malformed varint tail fails the parse rather than
/// silently truncating.
pub fn decode_shader_module_blob(blob: &[u8]) -> Result<ShaderModuleCreateInfo> {
    let nul_pos = blob
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| FossilizeError::Corruption("shader module blob missing NUL terminator".into()))?;
    let value: Value = serde_json::from_slice(&blob[..nul_pos])?;

    let flags = value
        .get("flags")
        .and_then(Value::as_u64)
        .ok_or_else(|| FossilizeError::Corruption("shader module blob missing flags".into()))? as u32;
    let code_size = parse_hex16(&value, "codeSize")?;
    let varint_offset = parse_hex16(&value, "varintOffset")? as usize;
    let varint_size = parse_hex16(&value, "varintSize")? as usize;

    let tail = blob
        .get(varint_offset..varint_offset + varint_size)
        .ok_or_else(|| FossilizeError::Corruption("shader module varint tail out of bounds".into()))?;
    let word_count = (code_size / 4) as usize;
    let code = decode_words(tail, word_count)
        .map_err(|e| FossilizeError::Corruption(format!("shader module varint tail: {}", e)))?;

    Ok(ShaderModuleCreateInfo {
        flags: ShaderModuleCreateFlags::from_bits_truncate(flags),
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let info = ShaderModuleCreateInfo {
            flags: ShaderModuleCreateFlags::empty(),
            code: vec![0x0723_0203, 1, 2, 3, 4, 0xffff_ffff],
        };
        let blob = encode_shader_module_blob(&info);
        let decoded = decode_shader_module_blob(&blob).unwrap();
        assert_eq!(decoded.code, info.code);
        assert_eq!(decoded.flags, info.flags);
    }

    #[test]
    fn truncated_tail_fails_parse() {
        let info = ShaderModuleCreateInfo {
            flags: ShaderModuleCreateFlags::empty(),
            code: vec![1, 2, 3],
        };
        let mut blob = encode_shader_module_blob(&info);
        blob.truncate(blob.len() - 1);
        assert!(decode_shader_module_blob(&blob).is_err());
    }
}
