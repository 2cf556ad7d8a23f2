//! Caller identification.
//!
//! Each request resolves to a hashed address (the limiter identity) and a
//! session id carried in the `vouch_sid` cookie. A session id is minted when
//! the cookie is missing and handed back with `Set-Cookie`.

use axum::http::HeaderMap;
use axum::http::header::{COOKIE, HeaderValue, SET_COOKIE};
use axum::response::Response;
use vouch_governance::hash_identity;

pub const SESSION_COOKIE: &str = "vouch_sid";
/// Thirty days.
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

const UNKNOWN_ADDRESS: &str = "unknown";

/// Who is calling, as far as governance is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Salted hash of the client address.
    pub identity: String,
    pub session_id: String,
    /// True when `session_id` was minted for this request.
    pub new_session: bool,
}

impl ClientIdentity {
    pub fn from_headers(headers: &HeaderMap, salt: &str) -> Self {
        let identity = hash_identity(salt, &client_address(headers));
        match session_cookie(headers) {
            Some(session_id) => Self {
                identity,
                session_id,
                new_session: false,
            },
            None => Self {
                identity,
                session_id: uuid::Uuid::new_v4().to_string(),
                new_session: true,
            },
        }
    }

    /// Attach the session cookie when it was minted for this request.
    pub fn apply_cookie(&self, response: &mut Response) {
        if !self.new_session {
            return;
        }
        let cookie = format!(
            "{SESSION_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; Path=/",
            self.session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

/// First `x-forwarded-for` hop, else `x-real-ip`, else `"unknown"`.
pub fn client_address(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    header("x-real-ip")
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

/// The `vouch_sid` value, if any `Cookie` header carries a non-empty one.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn forwarded_for_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_address(&h), "203.0.113.7");
    }

    #[test]
    fn real_ip_then_unknown() {
        assert_eq!(
            client_address(&headers(&[("x-real-ip", "198.51.100.2")])),
            "198.51.100.2"
        );
        assert_eq!(client_address(&headers(&[("x-forwarded-for", " , ")])), "unknown");
        assert_eq!(client_address(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn cookie_lookup() {
        let h = headers(&[("cookie", "theme=dark; vouch_sid=abc-123; other=1")]);
        assert_eq!(session_cookie(&h).as_deref(), Some("abc-123"));
        assert_eq!(session_cookie(&headers(&[("cookie", "vouch_sid=")])), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn identity_is_hashed() {
        let h = headers(&[("x-real-ip", "198.51.100.2"), ("cookie", "vouch_sid=s1")]);
        let client = ClientIdentity::from_headers(&h, "salt");
        assert_eq!(client.identity, hash_identity("salt", "198.51.100.2"));
        assert_eq!(client.identity.len(), 24);
        assert_eq!(client.session_id, "s1");
        assert!(!client.new_session);
    }

    #[test]
    fn minted_session_sets_cookie() {
        let client = ClientIdentity::from_headers(&HeaderMap::new(), "salt");
        assert!(client.new_session);
        assert!(uuid::Uuid::parse_str(&client.session_id).is_ok());

        let mut response = ().into_response();
        client.apply_cookie(&mut response);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("vouch_sid={}", client.session_id)));
        assert!(cookie.contains("HttpOnly; Secure; SameSite=Lax; Max-Age=2592000; Path=/"));
    }

    #[test]
    fn existing_session_sets_no_cookie() {
        let client = ClientIdentity::from_headers(&headers(&[("cookie", "vouch_sid=s1")]), "salt");
        let mut response = ().into_response();
        client.apply_cookie(&mut response);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
