#![allow(dead_code)]
//! Small nom-combinator helpers shared by the fixed-layout load-command parsers (§4.2).
//!
//! These operate directly on `&[u8]` in the `nom` idiom, as opposed to [`crate::cursor::Cursor`]
//! which is reserved for address-translated reads into the wider mapped buffer (§4.1).

use nom::IResult;

pub fn string_upto_null_terminator(bytes: &[u8]) -> IResult<&[u8], String> {
    let (bytes, name_bytes) = match nom::bytes::complete::take_until::<
        &str,
        &[u8],
        nom::error::Error<&[u8]>,
    >("\0")(bytes)
    {
        Ok((bytes, name_bytes)) => (bytes, name_bytes),
        Err(_) => return Ok((&[], String::from_utf8_lossy(bytes).into_owned())),
    };
    let name = String::from_utf8_lossy(name_bytes).into_owned();
    Ok((&bytes[1..], name))
}

pub fn string_upto_null_terminator_many(bytes: &[u8]) -> IResult<&[u8], Vec<String>> {
    let mut strings = Vec::new();
    let mut remaining_bytes = bytes;
    loop {
        let (bytes, name) = string_upto_null_terminator(remaining_bytes)?;
        strings.push(name);
        if bytes.is_empty() {
            break;
        }
        remaining_bytes = bytes;
    }
    Ok((&[], strings))
}

/// Formats a packed `x.y.z` version field (§4.2 `LC_VERSION_MIN`/`LC_BUILD_VERSION`).
pub fn version_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        (version >> 16) & 0xff,
        (version >> 8) & 0xff,
        version & 0xff
    )
}

/// Inverse of [`version_string`]: packs a `x.y.z` (or `x.y`) string back into the on-disk field.
pub fn reverse_version_string(version: String) -> u32 {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major << 16) | (minor << 8) | patch
}

/// ULEB128, in the `nom` combinator idiom (§4.3 imports table, dyld-info streams).
pub fn read_uleb(bytes: &[u8]) -> IResult<&[u8], u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    let mut rest = bytes;
    loop {
        let (next, byte) = nom::number::complete::u8(rest)?;
        rest = next;
        result |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok((rest, result))
}

/// SLEB128, in the `nom` combinator idiom.
pub fn read_sleb(bytes: &[u8]) -> IResult<&[u8], i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    let mut rest = bytes;
    let mut byte;
    loop {
        let (next, b) = nom::number::complete::u8(rest)?;
        rest = next;
        byte = b;
        result |= ((byte & 0x7f) as i64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
    }
    if shift < 64 && (byte & 0x40) != 0 {
        result |= -1i64 << shift;
    }
    Ok((rest, result))
}

/// Reads consecutive ULEB128 values until the input is exhausted (`LC_FUNCTION_STARTS`).
pub fn read_uleb_many(bytes: &[u8]) -> IResult<&[u8], Vec<u64>> {
    let mut values = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (next, value) = read_uleb(rest)?;
        values.push(value);
        rest = next;
    }
    Ok((rest, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_packed_version() {
        assert_eq!(version_string(0x0010_0500), "16.5.0");
        assert_eq!(reverse_version_string("16.5.0".to_string()), 0x0010_0500);
    }

    #[test]
    fn uleb_roundtrips_textbook_value() {
        let bytes = [0xe5, 0x8e, 0x26];
        let (_, value) = read_uleb(&bytes).unwrap();
        assert_eq!(value, 624485);
    }

    #[test]
    fn sleb_handles_negative_value() {
        let bytes = [0x9b, 0xf1, 0x59];
        let (_, value) = read_sleb(&bytes).unwrap();
        assert_eq!(value, -624485);
    }
}
