//! Per-client rate limiting and progressive slow-down.
//!
//! Budgets are enforced by `governor` keyed limiters: a client may burst up
//! to `max` requests, and the budget refills one request every
//! `window / max`. The slow-down stage needs a plain count of hits in the
//! current window, so it keeps its own fixed-window counter.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::Quota as GovernorQuota;

use super::operation::OperationKind;
use super::throttle::{client_key, WindowedCounter};
use crate::config::{LimitPolicy, SecurityPolicy, SlowDownPolicy};
use crate::error::GatewayError;
use crate::state::GatewayState;

const SWEEP_INTERVAL: u64 = 100;

type KeyedLimiter = governor::RateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// Which limiter governs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterKind {
    Default,
    Graphql,
    Auth,
    Health,
}

impl LimiterKind {
    /// Route a request to its limiter by method and path.
    pub fn for_request(method: &Method, path: &str) -> Self {
        if path == "/health" {
            Self::Health
        } else if path.contains("/auth") {
            Self::Auth
        } else if path == "/" && method == Method::POST {
            Self::Graphql
        } else {
            Self::Default
        }
    }
}

/// Remaining budget after an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

impl Quota {
    /// Write the `RateLimit-*` response headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert("ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("ratelimit-reset", HeaderValue::from(self.reset_secs));
    }
}

/// A per-client budget of `max` requests per `window`.
///
/// A zero budget rejects everything.
pub struct RateLimiter {
    limiter: Option<KeyedLimiter>,
    policy: LimitPolicy,
    refill: Duration,
    max_keys: usize,
    hits: AtomicU64,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .field("refill", &self.refill)
            .field("max_keys", &self.max_keys)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(policy: LimitPolicy, max_keys: usize) -> Self {
        let burst = NonZeroU32::new(policy.max);
        let refill = burst.map_or(policy.window, |b| {
            (policy.window / b.get()).max(Duration::from_nanos(1))
        });
        let limiter = burst
            .and_then(|b| GovernorQuota::with_period(refill).map(|q| q.allow_burst(b)))
            .map(|quota| {
                governor::RateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>()
            });
        Self {
            limiter,
            policy,
            refill,
            max_keys: max_keys.max(1),
            hits: AtomicU64::new(0),
        }
    }

    /// Record a request for `key`.
    ///
    /// `Err` carries the full window length, which is what clients are told
    /// to wait.
    pub fn check(&self, key: &str) -> Result<Quota, Duration> {
        let Some(limiter) = &self.limiter else {
            return Err(self.policy.window);
        };
        self.sweep_if_due(limiter);

        let snapshot = limiter
            .check_key(&key.to_string())
            .map_err(|_| self.policy.window)?;
        let remaining = snapshot.remaining_burst_capacity().min(self.policy.max);
        let used = self.policy.max - remaining;
        Ok(Quota {
            limit: self.policy.max,
            remaining,
            reset_secs: (self.refill * used).as_millis().div_ceil(1000) as u64,
        })
    }

    /// Forget clients whose budget has fully refilled, every
    /// `SWEEP_INTERVAL` checks or whenever the table outgrows `max_keys`.
    fn sweep_if_due(&self, limiter: &KeyedLimiter) {
        let seen = self.hits.fetch_add(1, Ordering::Relaxed);
        let due = seen > 0 && seen % SWEEP_INTERVAL == 0;
        if due || limiter.len() >= self.max_keys {
            let before = limiter.len();
            limiter.retain_recent();
            limiter.shrink_to_fit();
            let after = limiter.len();
            if after < before {
                tracing::debug!(removed = before - after, remaining = after, "swept idle rate limit keys");
            }
            if after > self.max_keys {
                tracing::warn!(tracked = after, max = self.max_keys, "rate limiter is tracking more clients than configured");
            }
        }
    }
}

/// Progressive delay once a client passes `delay_after` hits in a window.
#[derive(Debug)]
pub struct SlowDown {
    counter: WindowedCounter,
    policy: SlowDownPolicy,
}

impl SlowDown {
    pub fn new(policy: SlowDownPolicy, max_keys: usize) -> Self {
        Self {
            counter: WindowedCounter::new(policy.window, max_keys),
            policy,
        }
    }

    /// Record a hit and return how long to hold the request.
    pub fn delay_for(&self, key: &str) -> Duration {
        let hit = self.counter.hit(key);
        delay_for_count(&self.policy, hit.count)
    }
}

/// `(count - delay_after) * delay_step`, capped at `max_delay`.
pub fn delay_for_count(policy: &SlowDownPolicy, count: u32) -> Duration {
    if count <= policy.delay_after {
        return Duration::ZERO;
    }
    let over = count - policy.delay_after;
    policy
        .delay_step
        .checked_mul(over)
        .map_or(policy.max_delay, |d| d.min(policy.max_delay))
}

/// Every limiter the router uses.
#[derive(Debug)]
pub struct Limiters {
    pub default: RateLimiter,
    pub graphql_queries: RateLimiter,
    pub graphql_mutations: RateLimiter,
    pub auth: RateLimiter,
    pub health: RateLimiter,
    pub slow_down: SlowDown,
}

impl Limiters {
    pub fn new(policy: &SecurityPolicy) -> Self {
        let cap = policy.max_tracked_clients;
        Self {
            default: RateLimiter::new(policy.default_limit, cap),
            graphql_queries: RateLimiter::new(policy.graphql_queries, cap),
            graphql_mutations: RateLimiter::new(policy.graphql_mutations, cap),
            auth: RateLimiter::new(policy.auth_limit, cap),
            health: RateLimiter::new(policy.health_limit, cap),
            slow_down: SlowDown::new(policy.slow_down, cap),
        }
    }

    /// Check the limiter for `kind`, returning the rejection to send if the
    /// budget is spent.
    pub fn check(
        &self,
        kind: LimiterKind,
        key: &str,
        operation: Option<OperationKind>,
    ) -> Result<Quota, GatewayError> {
        let mutation = operation.is_some_and(OperationKind::is_mutation);
        let (outcome, error, message) = match kind {
            LimiterKind::Default => (
                self.default.check(key),
                "Too many requests",
                "Too many requests from this IP, please try again later.",
            ),
            LimiterKind::Graphql if mutation => (
                self.graphql_mutations.check(key),
                "GraphQL rate limit exceeded",
                "Too many mutations, please slow down.",
            ),
            LimiterKind::Graphql => (
                self.graphql_queries.check(key),
                "GraphQL rate limit exceeded",
                "Too many queries, please slow down.",
            ),
            LimiterKind::Auth => (
                self.auth.check(key),
                "Too many authentication attempts",
                "Please wait before trying to authenticate again.",
            ),
            LimiterKind::Health => (
                self.health.check(key),
                "Too many health check requests",
                "Too many health check requests",
            ),
        };
        outcome.map_err(|window| GatewayError::RateLimited {
            error,
            message,
            retry_after: window.as_millis().div_ceil(1000) as u64,
        })
    }
}

/// Rejects clients over their budget with 429; stamps `RateLimit-*` headers
/// on everything else.
pub async fn rate_limit(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.extensions());
    let kind = LimiterKind::for_request(request.method(), request.uri().path());
    let operation = request.extensions().get::<OperationKind>().copied();

    match state.limiters.check(kind, &key, operation) {
        Ok(quota) => {
            let mut response = next.run(request).await;
            quota.apply(response.headers_mut());
            response
        }
        Err(err) => {
            tracing::warn!(client = %key, limiter = ?kind, path = %request.uri().path(), "rate limit exceeded");
            err.into_response()
        }
    }
}

/// Holds requests from clients past the slow-down threshold.
pub async fn slow_down(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.extensions());
    let delay = state.limiters.slow_down.delay_for(&key);
    if !delay.is_zero() {
        tracing::debug!(client = %key, delay_ms = delay.as_millis() as u64, "slowing down client");
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn tiny_policy() -> SecurityPolicy {
        let mut policy = SecurityPolicy::defaults(Environment::Production);
        policy.default_limit.max = 2;
        policy.graphql_queries.max = 3;
        policy.graphql_mutations.max = 1;
        policy
    }

    #[test]
    fn routes_by_path() {
        assert_eq!(LimiterKind::for_request(&Method::GET, "/health"), LimiterKind::Health);
        assert_eq!(LimiterKind::for_request(&Method::POST, "/auth/google"), LimiterKind::Auth);
        assert_eq!(LimiterKind::for_request(&Method::POST, "/"), LimiterKind::Graphql);
        assert_eq!(LimiterKind::for_request(&Method::GET, "/"), LimiterKind::Default);
        assert_eq!(LimiterKind::for_request(&Method::GET, "/other"), LimiterKind::Default);
    }

    #[test]
    fn nth_request_passes_and_next_is_rejected() {
        let limiters = Limiters::new(&tiny_policy());
        let first = limiters.check(LimiterKind::Default, "ip", None).unwrap();
        assert_eq!(first.remaining, 1);
        let second = limiters.check(LimiterKind::Default, "ip", None).unwrap();
        assert_eq!(second.remaining, 0);
        let err = limiters.check(LimiterKind::Default, "ip", None).unwrap_err();
        assert_eq!(
            err,
            GatewayError::RateLimited {
                error: "Too many requests",
                message: "Too many requests from this IP, please try again later.",
                retry_after: 900,
            }
        );
    }

    #[test]
    fn clients_are_independent() {
        let limiters = Limiters::new(&tiny_policy());
        limiters.check(LimiterKind::Default, "a", None).unwrap();
        limiters.check(LimiterKind::Default, "a", None).unwrap();
        assert!(limiters.check(LimiterKind::Default, "a", None).is_err());
        assert!(limiters.check(LimiterKind::Default, "b", None).is_ok());
    }

    #[test]
    fn mutations_have_a_smaller_budget() {
        let limiters = Limiters::new(&tiny_policy());
        let m = Some(OperationKind::Mutation);
        limiters.check(LimiterKind::Graphql, "ip", m).unwrap();
        let err = limiters.check(LimiterKind::Graphql, "ip", m).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RateLimited { message: "Too many mutations, please slow down.", .. }
        ));
        // Queries draw on their own budget.
        let q = Some(OperationKind::Query);
        for _ in 0..3 {
            assert!(limiters.check(LimiterKind::Graphql, "ip", q).is_ok());
        }
        assert!(limiters.check(LimiterKind::Graphql, "ip", q).is_err());
    }

    #[test]
    fn query_rejection_message() {
        let limiters = Limiters::new(&tiny_policy());
        for _ in 0..3 {
            limiters.check(LimiterKind::Graphql, "ip", None).unwrap();
        }
        let err = limiters.check(LimiterKind::Graphql, "ip", None).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RateLimited { message: "Too many queries, please slow down.", .. }
        ));
    }

    #[test]
    fn health_uses_its_own_window() {
        let mut policy = tiny_policy();
        policy.health_limit = LimitPolicy::new(Duration::from_secs(60), 1);
        let limiters = Limiters::new(&policy);
        limiters.check(LimiterKind::Health, "ip", None).unwrap();
        let err = limiters.check(LimiterKind::Health, "ip", None).unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited { retry_after: 60, .. }));
    }

    #[test]
    fn zero_budget_rejects_everything() {
        let limiter = RateLimiter::new(LimitPolicy::new(Duration::from_secs(30), 0), 10);
        assert_eq!(limiter.check("ip"), Err(Duration::from_secs(30)));
    }

    #[test]
    fn reset_grows_with_spent_budget() {
        let limiter = RateLimiter::new(LimitPolicy::new(Duration::from_secs(60), 3), 10);
        let first = limiter.check("ip").unwrap();
        assert_eq!(first.limit, 3);
        assert_eq!(first.reset_secs, 20);
        let second = limiter.check("ip").unwrap();
        assert_eq!(second.reset_secs, 40);
    }

    #[test]
    fn limits_hold_past_the_key_cap() {
        let limiter = RateLimiter::new(LimitPolicy::new(Duration::from_secs(60), 1), 2);
        for key in ["a", "b", "c", "d"] {
            assert!(limiter.check(key).is_ok());
        }
        // Recently seen clients are never swept, so their budget stays spent.
        assert!(limiter.check("d").is_err());
    }

    #[test]
    fn slow_down_delay_grows_and_caps() {
        let policy = SlowDownPolicy {
            window: Duration::from_secs(60),
            delay_after: 2,
            delay_step: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
        };
        assert_eq!(delay_for_count(&policy, 1), Duration::ZERO);
        assert_eq!(delay_for_count(&policy, 2), Duration::ZERO);
        assert_eq!(delay_for_count(&policy, 3), Duration::from_millis(100));
        assert_eq!(delay_for_count(&policy, 4), Duration::from_millis(200));
        assert_eq!(delay_for_count(&policy, 5), Duration::from_millis(250));
        assert_eq!(delay_for_count(&policy, u32::MAX), Duration::from_millis(250));
    }

    #[test]
    fn slow_down_counts_per_client() {
        let policy = SlowDownPolicy {
            window: Duration::from_secs(60),
            delay_after: 1,
            delay_step: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        };
        let slow = SlowDown::new(policy, 100);
        assert_eq!(slow.delay_for("a"), Duration::ZERO);
        assert_eq!(slow.delay_for("a"), Duration::from_millis(10));
        assert_eq!(slow.delay_for("b"), Duration::ZERO);
    }

    #[test]
    fn quota_headers() {
        let mut headers = HeaderMap::new();
        Quota {
            limit: 100,
            remaining: 99,
            reset_secs: 900,
        }
        .apply(&mut headers);
        assert_eq!(headers["ratelimit-limit"], "100");
        assert_eq!(headers["ratelimit-remaining"], "99");
        assert_eq!(headers["ratelimit-reset"], "900");
    }
}
