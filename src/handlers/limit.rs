use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use super::ClientId;
use crate::error::AppError;
use crate::metrics::RATE_LIMITED;
use crate::rate_limit::{RateLimitDecision, RateLimiter, rate_limit_headers};

// Counts the request against `limiter`; denial becomes a 429
pub fn check_rate_limit(limiter: &RateLimiter, client: &str) -> Result<RateLimitDecision, AppError> {
    let decision = limiter.is_allowed(client);
    if decision.allowed {
        return Ok(decision);
    }

    RATE_LIMITED.inc();
    tracing::warn!(limiter = limiter.name(), client, "Rate limit exceeded");

    Err(AppError::RateLimited {
        message: limiter.message().to_string(),
        retry_after_secs: decision.retry_after_secs(),
        limit: limiter.limit(),
        reset_time: decision.reset_time,
    })
}

// Route layer: gate every request through one limiter
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    ClientId(client): ClientId,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let decision = check_rate_limit(&limiter, &client)?;

    let mut response = next.run(request).await;
    rate_limit_headers(
        response.headers_mut(),
        limiter.limit(),
        decision.remaining,
        decision.reset_time,
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::rate_limit::RateLimitPolicy;
    use std::time::Duration;

    fn limiter(clock: Arc<ManualClock>) -> RateLimiter {
        let policy = RateLimitPolicy {
            window: Duration::from_millis(2000),
            max_requests: 1,
            message: "slow down".to_string(),
        };
        RateLimiter::with_clock("strict", policy, clock)
    }

    fn retry_after(result: Result<RateLimitDecision, AppError>) -> u64 {
        match result {
            Err(AppError::RateLimited { retry_after_secs, .. }) => retry_after_secs,
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn retry_after_rounds_partial_seconds_up() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = limiter(clock.clone());
        assert!(check_rate_limit(&limiter, "1.2.3.4").is_ok());

        clock.advance(500);
        assert_eq!(retry_after(check_rate_limit(&limiter, "1.2.3.4")), 2);

        clock.advance(500);
        assert_eq!(retry_after(check_rate_limit(&limiter, "1.2.3.4")), 1);
    }

    #[test]
    fn rate_limited_error_carries_policy() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = limiter(clock);
        check_rate_limit(&limiter, "a").unwrap();

        match check_rate_limit(&limiter, "a") {
            Err(AppError::RateLimited { message, limit, reset_time, .. }) => {
                assert_eq!(message, "slow down");
                assert_eq!(limit, 1);
                assert_eq!(reset_time, 1_700_000_002_000);
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }
}
