//! HttpOnly session cookie for browser clients.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::CookieConfig;

#[derive(Debug, Clone)]
pub struct CookieHelper {
    config: CookieConfig,
    max_age_secs: i64,
}

impl CookieHelper {
    /// `max_age_secs` should match the session token lifetime.
    pub fn new(config: CookieConfig, max_age_secs: i64) -> Self {
        Self {
            config,
            max_age_secs,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn build_session_cookie(&self, token: &str) -> String {
        self.build(token, &format!("Max-Age={}", self.max_age_secs))
    }

    pub fn build_clear_cookie(&self) -> String {
        self.build("", "Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
    }

    fn build(&self, value: &str, lifetime: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; {}; HttpOnly",
            self.config.name, value, self.config.path, lifetime
        );
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.config.same_site));
        if !self.config.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.config.domain));
        }
        cookie
    }

    pub fn add_session_cookie(&self, headers: &mut HeaderMap, token: &str) {
        if !self.config.enabled {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&self.build_session_cookie(token)) {
            headers.append(SET_COOKIE, value);
        }
    }

    pub fn add_clear_cookie(&self, headers: &mut HeaderMap) {
        if !self.config.enabled {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&self.build_clear_cookie()) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Session token from the `Cookie` header, if cookies are enabled.
    pub fn session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if !self.config.enabled {
            return None;
        }
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.config.name && !value.is_empty())
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper(secure: bool, domain: &str) -> CookieHelper {
        CookieHelper::new(
            CookieConfig {
                enabled: true,
                name: "asp_session".to_string(),
                secure,
                same_site: "Lax".to_string(),
                domain: domain.to_string(),
                path: "/".to_string(),
            },
            3600,
        )
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = helper(true, "").build_session_cookie("tok");
        assert_eq!(
            cookie,
            "asp_session=tok; Path=/; Max-Age=3600; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_clear_cookie_with_domain() {
        let cookie = helper(false, "portal.example.com").build_clear_cookie();
        assert!(cookie.starts_with("asp_session=; Path=/; Max-Age=0"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.ends_with("Domain=portal.example.com"));
    }

    #[test]
    fn test_session_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; asp_session=abc.def.ghi; other=1"),
        );
        assert_eq!(helper(true, "").session_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(helper(true, "").session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("asp_session="));
        assert_eq!(helper(true, "").session_token(&headers), None);
    }

    #[test]
    fn test_disabled_helper_adds_nothing() {
        let mut config = CookieConfig::default();
        config.enabled = false;
        let helper = CookieHelper::new(config, 60);
        let mut headers = HeaderMap::new();
        helper.add_session_cookie(&mut headers, "tok");
        assert!(headers.get(SET_COOKIE).is_none());
    }
}
