//! Credential parsing: region selection and session-id derivation.
//!
//! The credential is an opaque refresh token with an optional region
//! prefix marker (`US:`, `HK:`). Everything downstream — the upload
//! pipeline's endpoint selection, the quota ledger's accounting key — is
//! derived from this one parse, so it lives in its own small crate rather
//! than being re-derived ad hoc at each call site.

/// The upstream regions the gateway knows how to address.
///
/// `Hk` also covers SG/JP, which the source system groups with Hong Kong
/// for endpoint and signing purposes (see spec §6 glossary).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Cn,
    Us,
    Hk,
}

impl Region {
    /// Parses the prefix marker a raw credential may carry. Absence of a
    /// recognized marker defaults to `Cn`, matching the source system.
    fn from_prefix(credential: &str) -> Self {
        match credential.split_once(':') {
            Some(("US", _)) => Region::Us,
            Some(("HK", _)) | Some(("SG", _)) | Some(("JP", _)) => Region::Hk,
            _ => Region::Cn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Cn => "CN",
            Region::Us => "US",
            Region::Hk => "HK",
        }
    }
}

/// A parsed credential: the region it selects, the session id derived
/// from it, and the raw refresh token to present upstream.
#[derive(Clone, Debug)]
pub struct Credential {
    pub region: Region,
    pub session_id: String,
    /// The token as presented to upstream, with any region marker
    /// stripped off.
    pub refresh_token: String,
}

/// Parses a raw credential string into region, session id, and bare
/// refresh token.
///
/// The session id is `session_` followed by the first 16 hex characters
/// of the MD5 digest of the *raw* credential (including any region
/// marker), matching the source system's accounting key so that the same
/// credential always maps to the same quota-ledger row regardless of
/// region.
pub fn parse(credential: &str) -> Credential {
    let region = Region::from_prefix(credential);
    let refresh_token = match credential.split_once(':') {
        Some(("US" | "HK" | "SG" | "JP", rest)) => rest.to_string(),
        _ => credential.to_string(),
    };
    let digest = md5::compute(credential.as_bytes());
    let hex = format!("{digest:x}");
    let session_id = format!("session_{}", &hex[..16]);

    Credential {
        region,
        session_id,
        refresh_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("plain-token", Region::Cn)]
    #[test_case("US:plain-token", Region::Us)]
    #[test_case("HK:plain-token", Region::Hk)]
    #[test_case("SG:plain-token", Region::Hk)]
    #[test_case("JP:plain-token", Region::Hk)]
    fn region_prefix_selects_region(credential: &str, want: Region) {
        assert_eq!(parse(credential).region, want);
    }

    #[test]
    fn strips_region_marker_from_refresh_token() {
        let cred = parse("US:abc123");
        assert_eq!(cred.refresh_token, "abc123");
    }

    #[test]
    fn no_marker_keeps_whole_string_as_token() {
        let cred = parse("abc123");
        assert_eq!(cred.refresh_token, "abc123");
    }

    #[test]
    fn session_id_is_stable_and_shaped() {
        let a = parse("US:abc123");
        let b = parse("US:abc123");
        assert_eq!(a.session_id, b.session_id);
        assert!(a.session_id.starts_with("session_"));
        assert_eq!(a.session_id.len(), "session_".len() + 16);
    }

    #[test]
    fn session_id_depends_on_full_credential_not_just_token() {
        // Same bare token, different region marker -> different session,
        // matching the source system's per-credential-string hashing.
        let cn = parse("abc123");
        let us = parse("US:abc123");
        assert_ne!(cn.session_id, us.session_id);
    }
}
