use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::config::{ApiConfig, RateLimitRule};
use crate::error::ApiError;

/// Fixed-window request counter keyed by client address. Clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    name: &'static str,
    rule: Option<RateLimitRule>,
    windows: DashMap<IpAddr, Window>,
}

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

impl RateLimiter {
    pub fn new(name: &'static str, rule: RateLimitRule) -> Self {
        Self::with_rule(name, Some(rule))
    }

    /// A limiter that admits everything
    pub fn unlimited(name: &'static str) -> Self {
        Self::with_rule(name, None)
    }

    fn with_rule(name: &'static str, rule: Option<RateLimitRule>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                rule,
                windows: DashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Count one hit for `client`; `false` once the window's budget is spent
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let Some(rule) = self.inner.rule else {
            return true;
        };

        let mut window = self.inner.windows.entry(client).or_insert(Window {
            started: now,
            hits: 0,
        });

        if now.saturating_duration_since(window.started) >= rule.window {
            *window = Window {
                started: now,
                hits: 0,
            };
        }

        if window.hits >= rule.requests {
            return false;
        }
        window.hits += 1;
        true
    }

    /// Drop windows that have fully elapsed
    pub fn purge_expired(&self) {
        if let Some(rule) = self.inner.rule {
            let now = Instant::now();
            self.inner
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < rule.window);
        }
    }

    #[cfg(test)]
    fn window(&self) -> Option<std::time::Duration> {
        self.inner.rule.map(|r| r.window)
    }
}

/// The three limiters applied to the task API
#[derive(Clone)]
pub struct RateLimits {
    pub global: RateLimiter,
    pub create: RateLimiter,
    pub update: RateLimiter,
}

impl RateLimits {
    pub fn from_config(api: &ApiConfig) -> Self {
        if !api.enable_rate_limiting {
            return Self {
                global: RateLimiter::unlimited("global"),
                create: RateLimiter::unlimited("create"),
                update: RateLimiter::unlimited("update"),
            };
        }

        Self {
            global: RateLimiter::new("global", api.global_limit),
            create: RateLimiter::new("create", api.create_limit),
            update: RateLimiter::new("update", api.update_limit),
        }
    }

    pub fn purge_expired(&self) {
        self.global.purge_expired();
        self.create.purge_expired();
        self.update.purge_expired();
    }
}

/// Rejects the request with 429 once the limiter's budget for the client
/// address is exhausted
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(&request);

    if !limiter.check(client) {
        tracing::warn!("Rate limit '{}' exceeded for {}", limiter.name(), client);
        return Err(ApiError::too_many_requests(
            "Rate limit exceeded, please try again later",
        ));
    }

    Ok(next.run(request).await)
}

/// Peer address of the connection, or loopback when the server was not
/// started with connect info
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rule(requests: u32, secs: u64) -> RateLimitRule {
        RateLimitRule {
            requests,
            window: Duration::from_secs(secs),
        }
    }

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn admits_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new("create", rule(20, 60));
        let now = Instant::now();
        for _ in 0..20 {
            assert!(limiter.check_at(A, now));
        }
        assert!(!limiter.check_at(A, now));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new("update", rule(1, 60));
        let now = Instant::now();
        assert!(limiter.check_at(A, now));
        assert!(!limiter.check_at(A, now));
        assert!(limiter.check_at(B, now));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new("global", rule(2, 60));
        let start = Instant::now();
        assert!(limiter.check_at(A, start));
        assert!(limiter.check_at(A, start + Duration::from_secs(1)));
        assert!(!limiter.check_at(A, start + Duration::from_secs(59)));
        assert!(limiter.check_at(A, start + Duration::from_secs(60)));
    }

    #[test]
    fn unlimited_never_rejects() {
        let limiter = RateLimiter::unlimited("global");
        let now = Instant::now();
        assert!((0..1000).all(|_| limiter.check_at(A, now)));
        assert_eq!(limiter.window(), None);
    }

    #[test]
    fn clones_share_counters() {
        let limiter = RateLimiter::new("create", rule(1, 60));
        let clone = limiter.clone();
        let now = Instant::now();
        assert!(limiter.check_at(A, now));
        assert!(!clone.check_at(A, now));
    }

    #[test]
    fn disabled_config_yields_unlimited_limiters() {
        let api = ApiConfig {
            enable_rate_limiting: false,
            create_limit: rule(20, 60),
            update_limit: rule(30, 60),
            global_limit: rule(100, 900),
        };
        let limits = RateLimits::from_config(&api);
        assert_eq!(limits.create.window(), None);
    }
}
