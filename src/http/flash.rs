//! One-shot flash messages carried in a signed cookie.
//!
//! The submission and file endpoints redirect back to the form with a
//! user-facing message. The message rides in a short-lived cookie whose
//! value is `base64(message).hex(sha256(secret.payload))`; anything that
//! fails verification is treated as absent.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub const FLASH_COOKIE: &str = "vidfetch_flash";

fn sign(secret: &str, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// `Set-Cookie` value carrying a signed flash message.
pub fn set_cookie(secret: &str, message: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(message.as_bytes());
    let sig = sign(secret, &payload);
    format!("{FLASH_COOKIE}={payload}.{sig}; Path=/; HttpOnly; SameSite=Lax; Max-Age=60")
}

/// `Set-Cookie` value that clears the flash after it was rendered.
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Read and verify the flash message from the request cookies.
pub fn read(headers: &HeaderMap, secret: &str) -> Option<String> {
    let raw = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == FLASH_COOKIE && !value.is_empty()).then(|| value.to_string())
        })?;

    let (payload, sig) = raw.rsplit_once('.')?;
    if sign(secret, payload) != sig {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_roundtrip() {
        let set = set_cookie(SECRET, "Please enter a YouTube URL");
        let cookie_pair = set.split(';').next().unwrap();
        let headers = headers_with_cookie(cookie_pair);
        assert_eq!(
            read(&headers, SECRET).as_deref(),
            Some("Please enter a YouTube URL")
        );
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let set = set_cookie(SECRET, "original");
        let cookie_pair = set.split(';').next().unwrap();
        let tampered = cookie_pair.replace(
            &URL_SAFE_NO_PAD.encode("original"),
            &URL_SAFE_NO_PAD.encode("forged!!"),
        );
        let headers = headers_with_cookie(&tampered);
        assert_eq!(read(&headers, SECRET), None);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let set = set_cookie(SECRET, "message");
        let cookie_pair = set.split(';').next().unwrap();
        let headers = headers_with_cookie(cookie_pair);
        assert_eq!(read(&headers, "other-secret"), None);
    }

    #[test]
    fn test_absent_or_empty_cookie() {
        assert_eq!(read(&HeaderMap::new(), SECRET), None);
        let headers = headers_with_cookie("vidfetch_flash=");
        assert_eq!(read(&headers, SECRET), None);
    }
}
