//! AWS Signature Version 4 signing for the `imagex` apply/commit calls.
//!
//! The upstream wants header-based SigV4 (`Authorization` header plus
//! `x-amz-date`/`x-amz-security-token`), not the presigned-URL query-string
//! variant. The canonical-request construction (hashing, HMAC chain,
//! signing-key derivation) follows the same algorithm as
//! `other_examples/767f4abb_dickwu-r2__...upload.rs.rs`'s presigned-URL
//! signer; only the final assembly step differs.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Temporary SigV4 credentials, as returned by the `get_upload_token`
/// acquire step.
#[derive(Clone, Debug)]
pub struct SigningCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
}

/// The pieces of an HTTP request that participate in the canonical
/// request, independent of how the caller actually issues it.
pub struct RequestToSign<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub canonical_uri: &'a str,
    /// Already `key=value` pairs, sorted by key; callers build this from
    /// their query parameters so the signer doesn't own URL encoding
    /// policy for every caller.
    pub canonical_query_string: &'a str,
    pub body: &'a [u8],
}

/// A computed signature plus the headers a caller must attach to the
/// actual request.
#[derive(Clone, Debug)]
pub struct SignedHeaders {
    pub authorization: String,
    pub x_amz_date: String,
    pub x_amz_security_token: String,
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts a key of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Signs `request` for `region`/`service` using `credentials`, at time
/// `now`. Returns the headers the caller must attach; `x-amz-security-token`
/// is always included in the signed-headers set per spec §6.
pub fn sign(
    request: &RequestToSign<'_>,
    credentials: &SigningCredentials,
    region: &str,
    service: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let canonical_headers = format!(
        "host:{}\nx-amz-date:{}\nx-amz-security-token:{}\n",
        request.host, amz_date, credentials.session_token
    );
    let signed_headers = "host;x-amz-date;x-amz-security-token";
    let payload_hash = sha256_hex(request.body);

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        request.canonical_uri,
        request.canonical_query_string,
        canonical_headers,
        signed_headers,
        payload_hash
    );

    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(&credentials.secret_key, &date_stamp, region, service);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key
    );

    SignedHeaders {
        authorization,
        x_amz_date: amz_date,
        x_amz_security_token: credentials.session_token.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 7, 29, 12, 0, 0).unwrap()
    }

    fn creds() -> SigningCredentials {
        SigningCredentials {
            access_key: "AKIDEXAMPLE".into(),
            secret_key: "secret".into(),
            session_token: "token123".into(),
        }
    }

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let request = RequestToSign {
            method: "GET",
            host: "imagex.bytedanceapi.com",
            canonical_uri: "/",
            canonical_query_string: "Action=ApplyImageUpload&Version=2018-08-01",
            body: b"",
        };
        let a = sign(&request, &creds(), "cn-north-1", "imagex", fixed_time());
        let b = sign(&request, &creds(), "cn-north-1", "imagex", fixed_time());
        assert_eq!(a.authorization, b.authorization);
    }

    #[test]
    fn authorization_header_contains_required_fields() {
        let request = RequestToSign {
            method: "POST",
            host: "imagex.bytedanceapi.com",
            canonical_uri: "/",
            canonical_query_string: "Action=CommitImageUpload&Version=2018-08-01",
            body: br#"{"SessionKey":"abc"}"#,
        };
        let signed = sign(&request, &creds(), "cn-north-1", "imagex", fixed_time());
        assert!(signed.authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(signed.authorization.contains("SignedHeaders=host;x-amz-date;x-amz-security-token"));
        assert_eq!(signed.x_amz_security_token, "token123");
    }

    #[test]
    fn different_bodies_yield_different_signatures() {
        let creds = creds();
        let a = sign(
            &RequestToSign {
                method: "POST",
                host: "h",
                canonical_uri: "/",
                canonical_query_string: "",
                body: b"one",
            },
            &creds,
            "cn-north-1",
            "imagex",
            fixed_time(),
        );
        let b = sign(
            &RequestToSign {
                method: "POST",
                host: "h",
                canonical_uri: "/",
                canonical_query_string: "",
                body: b"two",
            },
            &creds,
            "cn-north-1",
            "imagex",
            fixed_time(),
        );
        assert_ne!(a.authorization, b.authorization);
    }
}
