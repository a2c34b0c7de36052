//! Thin wrapper over the `hex` crate for the header's hex fields
//! (`file_hash`, `fragment_hash`, `initialization_vector`, `password_salt`).
//! Centralizes the uppercase-on-encode convention and maps decode failures
//! to [`Error::Malformed`].

use crate::error::{Error, Result};

/// Encode `data` as uppercase hex, matching the case every hash and header
/// field in this workspace is stored in.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    hex::encode_upper(data)
}

/// Decode a hex string, tagging the given `field` name in the error on
/// failure so callers don't have to repeat it at every call site.
pub fn decode(field: &str, text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| Error::Malformed(format!("bad {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_upper_hex() {
        let data = [0xDEu8, 0xAD, 0xBE, 0xEF];
        let encoded = encode(data);
        assert_eq!(encoded, "DEADBEEF");
        assert_eq!(decode("test_field", &encoded).unwrap(), data);
    }

    #[test]
    fn decode_failure_names_the_field() {
        let err = decode("password_salt", "not hex").unwrap_err();
        assert!(matches!(err, Error::Malformed(msg) if msg.contains("password_salt")));
    }
}
