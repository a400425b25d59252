//! Rate limiting middleware using token bucket algorithm

use axum::{extract::Request, middleware::Next, response::{IntoResponse, Response}};
use draftforge_common::config::RateLimitConfig;
use draftforge_common::errors::AppError;
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide token bucket shared by all API requests
pub type GatewayRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Token bucket plus the configured limit, for error reporting
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<GatewayRateLimiter>,
    limit: u32,
}

impl RateGate {
    /// Build a gate from configuration; None when rate limiting is disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(rps);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Some(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            limit: config.requests_per_second,
        })
    }

    /// Check whether a request may proceed
    pub fn check(&self) -> Result<(), AppError> {
        self.limiter
            .check()
            .map_err(|_| AppError::RateLimited { limit: self.limit })
    }
}

/// Rate limiting middleware
pub async fn enforce(gate: RateGate, request: Request, next: Next) -> Response {
    match gate.check() {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!("Rate limit exceeded");
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: 100,
            burst: 200,
            enabled,
        }
    }

    #[test]
    fn test_gate_allows_within_quota() {
        let gate = RateGate::from_config(&config(true)).unwrap();
        assert!(gate.check().is_ok());
    }

    #[test]
    fn test_disabled_config_builds_no_gate() {
        assert!(RateGate::from_config(&config(false)).is_none());
    }

    #[test]
    fn test_exhausted_bucket_reports_limit() {
        let gate = RateGate::from_config(&RateLimitConfig {
            requests_per_second: 1,
            burst: 1,
            enabled: true,
        })
        .unwrap();

        assert!(gate.check().is_ok());
        match gate.check() {
            Err(AppError::RateLimited { limit }) => assert_eq!(limit, 1),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}
