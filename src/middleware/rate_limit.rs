use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;
use crate::middleware::auth::bearer_token;
use crate::utils::crypto::fingerprint;

const WINDOW: Duration = Duration::from_secs(1);
const MAX_SUBJECTS: usize = 10_000;

/// Sliding-window log per subject: a bearer-token hash when the request
/// carries one, the peer address otherwise.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    subjects: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            subjects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn check(&self, subject: &str) -> bool {
        self.check_at(subject, Instant::now())
    }

    pub fn check_at(&self, subject: &str, now: Instant) -> bool {
        let mut subjects = self.subjects.lock().unwrap_or_else(|e| e.into_inner());

        if !subjects.contains_key(subject) && subjects.len() >= MAX_SUBJECTS {
            evict(&mut subjects, now);
        }

        let log = subjects.entry(subject.to_string()).or_default();
        while log
            .front()
            .map_or(false, |t| now.saturating_duration_since(*t) >= WINDOW)
        {
            log.pop_front();
        }
        if log.len() >= self.rps as usize {
            return false;
        }
        log.push_back(now);
        true
    }

    pub fn tracked(&self) -> usize {
        self.subjects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Drops idle subjects; if none are idle, the one seen least recently.
fn evict(subjects: &mut HashMap<String, VecDeque<Instant>>, now: Instant) {
    subjects.retain(|_, log| {
        log.back()
            .map_or(false, |t| now.saturating_duration_since(*t) < WINDOW)
    });
    if subjects.len() < MAX_SUBJECTS {
        return;
    }
    let stalest = subjects
        .iter()
        .min_by_key(|(_, log)| log.back().copied())
        .map(|(k, _)| k.clone());
    if let Some(key) = stalest {
        subjects.remove(&key);
    }
}

fn subject_of(req: &Request<Body>) -> String {
    if let Ok(Some(token)) = bearer_token(req.headers()) {
        return format!("token:{}", fingerprint(token));
    }
    match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("peer:{}", addr.ip()),
        None => "peer:unknown".to_string(),
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let subject = subject_of(&req);
    if !limiter.check(&subject) {
        tracing::warn!(subject = %subject, "rate limit exceeded");
        return Error::RateLimited("rate_limit_exceeded".to_string()).into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_slides_per_subject() {
        let limiter = RateLimiter::new(2);
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0));
        assert!(limiter.check_at("a", t0 + Duration::from_millis(100)));
        assert!(!limiter.check_at("a", t0 + Duration::from_millis(200)));
        assert!(limiter.check_at("b", t0 + Duration::from_millis(200)));
        // first entry leaves the window
        assert!(limiter.check_at("a", t0 + Duration::from_millis(1000)));
        assert!(!limiter.check_at("a", t0 + Duration::from_millis(1050)));
    }

    #[test]
    fn zero_rps_still_allows_one() {
        let limiter = RateLimiter::new(0);
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0));
        assert!(!limiter.check_at("a", t0));
    }

    #[test]
    fn subject_map_stays_bounded() {
        let limiter = RateLimiter::new(5);
        let t0 = Instant::now();
        for i in 0..MAX_SUBJECTS {
            limiter.check_at(&format!("s{}", i), t0);
        }
        assert_eq!(limiter.tracked(), MAX_SUBJECTS);
        // all idle by now
        assert!(limiter.check_at("late", t0 + Duration::from_secs(2)));
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn busy_map_evicts_the_stalest_subject() {
        let limiter = RateLimiter::new(5);
        let t0 = Instant::now();
        for i in 0..MAX_SUBJECTS {
            limiter.check_at(&format!("s{}", i), t0 + Duration::from_micros(i as u64));
        }
        assert!(limiter.check_at("late", t0 + Duration::from_millis(500)));
        assert_eq!(limiter.tracked(), MAX_SUBJECTS);
        let subjects = limiter.subjects.lock().unwrap();
        assert!(!subjects.contains_key("s0"));
        assert!(subjects.contains_key("s1"));
    }
}
