//! # Custom HTTP middleware

use axum::http::{HeaderValue, header::CACHE_CONTROL};
use chrono::Duration;
use tower_http::set_header::SetResponseHeaderLayer;

/// # `Cache-Control` middleware layer
///
/// Sets the `Cache-Control` header on responses which do not already carry one. Used for the
/// upload store, whose files never change once written.
///
/// ```text
/// CacheControlLayer::new()
///     .public()
///     .max_age(Duration::days(1))
///     .immutable(true)
///     .finish()
/// ```
/// adds `Cache-Control: public, max-age=86400, immutable`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControlLayer {
    max_age: Option<Duration>,
    public: bool,
    immutable: bool,
}

impl CacheControlLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `max-age` directive, truncated to second precision.
    pub fn max_age(mut self, value: Duration) -> Self {
        self.max_age = Some(value);
        self
    }

    /// Sets the `public` directive, allowing shared caches to store the response.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Sets the `immutable` directive.
    pub fn immutable(mut self, value: bool) -> Self {
        self.immutable = value;
        self
    }

    fn header_value(&self) -> String {
        let mut directives = Vec::new();
        if self.public {
            directives.push("public".to_string());
        }
        if let Some(ma) = self.max_age {
            directives.push(format!("max-age={}", ma.num_seconds()));
        }
        if self.immutable {
            directives.push("immutable".to_string());
        }
        directives.join(", ")
    }

    /// Finishes the builder, returning a [`SetResponseHeaderLayer`] which adds the header.
    pub fn finish(self) -> SetResponseHeaderLayer<HeaderValue> {
        // Directives are built from ASCII only
        let value = HeaderValue::from_str(&self.header_value())
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));
        SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, value)
    }
}
