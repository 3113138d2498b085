//! Per-client-IP rate limiting for the login endpoint.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{net::IpAddr, num::NonZeroU32};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::client_info::client_ip;

/// Keyed limiter shared by all requests; one bucket per client IP.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
    per_minute: u32,
}

impl LoginRateLimiter {
    /// Returns `None` when `per_minute` is 0, which disables limiting.
    pub fn new(per_minute: u32) -> Option<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute)?);
        Some(Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            per_minute,
        })
    }

    /// `Err` carries the seconds to wait, at least 1.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&ip).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    /// Drops buckets that are back to full capacity.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("per_minute", &self.per_minute)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Route layer for `POST /api/v1/auth/login`.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(limiter) = state.login_limiter.as_ref() {
        let ip = client_ip(req.headers(), req.extensions());
        if let Err(retry_after) = limiter.check(ip) {
            tracing::warn!(client_ip = %ip, retry_after, "Login rate limit exceeded");
            return ApiError::RateLimited(retry_after).into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_zero_disables_limiter() {
        assert!(LoginRateLimiter::new(0).is_none());
    }

    #[test]
    fn test_exhaustion_per_client() {
        let limiter = LoginRateLimiter::new(2).unwrap();
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_ok());

        let retry_after = limiter.check(ip(1)).unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = LoginRateLimiter::new(1).unwrap();
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(2)).is_ok());
        assert!(limiter.check(ip(1)).is_err());
        assert!(limiter.check(ip(2)).is_err());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_debug_output() {
        let limiter = LoginRateLimiter::new(5).unwrap();
        let debug = format!("{:?}", limiter);
        assert!(debug.contains("per_minute: 5"));
    }
}
