use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Budget a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Form tooling: check, validate, label and build.
    Recurrence,
    /// Sale reads and sold-item records.
    Sales,
    /// Manual status sweeps; each one scans every repeating sale.
    Sweep,
}

impl RouteClass {
    /// Classify an API path. Paths outside the limited surface return `None`.
    #[must_use]
    pub fn of(path: &str) -> Option<Self> {
        if path == "/api/v1/sales/status/sweep" {
            Some(Self::Sweep)
        } else if path.starts_with("/api/v1/recurrence/") {
            Some(Self::Recurrence)
        } else if path == "/api/v1/sales" || path.starts_with("/api/v1/sales/") {
            Some(Self::Sales)
        } else {
            None
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recurrence => write!(f, "recurrence"),
            Self::Sales => write!(f, "sales"),
            Self::Sweep => write!(f, "sweep"),
        }
    }
}

/// Requests allowed per class within one window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub recurrence: usize,
    pub sales: usize,
    pub sweep: usize,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    /// The registration form previews labels as the operator types, so the
    /// recurrence tools get the widest budget.
    fn default() -> Self {
        Self {
            recurrence: 240,
            sales: 120,
            sweep: 6,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitPolicy {
    fn limit(&self, class: RouteClass) -> usize {
        match class {
            RouteClass::Recurrence => self.recurrence,
            RouteClass::Sales => self.sales,
            RouteClass::Sweep => self.sweep,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter with one window per [`RouteClass`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    policy: RateLimitPolicy,
    windows: Arc<Mutex<HashMap<RouteClass, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request against `class` at `now`.
    ///
    /// Returns the time left in the current window when the budget is spent.
    async fn admit(&self, class: RouteClass, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        let window = windows.entry(class).or_insert(RateLimitWindow {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= self.policy.window {
            *window = RateLimitWindow {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= self.policy.limit(class) {
            return Err(self.policy.window.saturating_sub(elapsed));
        }
        window.count += 1;
        Ok(())
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is inserted into request
/// extensions as [`RequestId`] and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the per-class request budget.
///
/// Rejections use the API error envelope and carry `Retry-After` in whole
/// seconds.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(class) = RouteClass::of(req.uri().path()) else {
        return next.run(req).await;
    };

    let Err(retry_after) = rate_limit.admit(class, Instant::now()).await else {
        return next.run(req).await;
    };

    let req_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    tracing::warn!(class = %class, request_id = %req_id, "rate limit exceeded");

    let mut res = ApiError::new(
        req_id,
        "rate_limited",
        format!("{class} rate limit exceeded"),
    )
    .into_response();
    let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    res.headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(seconds.max(1)));
    res
}
