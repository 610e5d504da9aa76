//! Pagination cursor wire format (spec §3 "Cursor", §6 "Cursor wire
//! format"): `value0,value1,...` with URL-encoding per segment,
//! `RONIN_NULL` as the null sentinel, dates as epoch-ms integers.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

const NULL_SENTINEL: &str = "RONIN_NULL";
const ENCODE_SET: &AsciiSet = &CONTROLS.add(b',').add(b'%').add(b' ');

pub fn encode(segments: &[Option<String>]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            None => NULL_SENTINEL.to_string(),
            Some(s) => utf8_percent_encode(s, ENCODE_SET).to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode(cursor: &str) -> Vec<Option<String>> {
    if cursor.is_empty() {
        return Vec::new();
    }
    cursor
        .split(',')
        .map(|segment| {
            if segment == NULL_SENTINEL {
                None
            } else {
                Some(percent_decode_str(segment).decode_utf8_lossy().to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_segments() {
        let segments = vec![Some("elaine".to_string()), None, Some("17".to_string())];
        let cursor = encode(&segments);
        assert_eq!(decode(&cursor), segments);
    }

    #[test]
    fn encodes_commas_in_values() {
        let segments = vec![Some("a,b".to_string())];
        let cursor = encode(&segments);
        assert!(!cursor.contains(",b"));
        assert_eq!(decode(&cursor), segments);
    }
}
