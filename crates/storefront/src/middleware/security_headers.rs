//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! The policy is locked down except where storefront content needs more:
//! product images come from the backend origin, CMS video blocks embed
//! YouTube and Vimeo players, the card payment step loads the Stripe
//! payment element, and the browser-side scripts call the same-origin
//! `/api` proxy.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Pinned HTMX build loaded by `base.html`.
pub const HTMX_SCRIPT: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

/// Script served by the payment provider for the card payment step.
pub const STRIPE_SCRIPT: &str = "https://js.stripe.com";

/// Payment provider API called by the payment element.
const STRIPE_API: &str = "https://api.stripe.com";

/// Frame sources for embedded video players.
const VIDEO_FRAME_SOURCES: &str = "https://www.youtube-nocookie.com https://www.youtube.com https://player.vimeo.com";

/// Build the Content-Security-Policy for a backend origin.
///
/// ```text
/// default-src 'none';
/// script-src 'self' <htmx> <stripe>;
/// style-src 'self' 'unsafe-inline';
/// font-src 'self';
/// img-src 'self' data: https: <backend>;
/// media-src 'self' https:;
/// connect-src 'self' <stripe api>;
/// frame-src <video players> <stripe>;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none'
/// ```
///
/// Inline styles are needed by CMS blocks that carry colors and spacing in
/// their configuration.
#[must_use]
pub fn content_security_policy(backend_origin: &str) -> String {
    let backend = backend_origin.trim_end_matches('/');
    format!(
        "default-src 'none'; \
         script-src 'self' {HTMX_SCRIPT} {STRIPE_SCRIPT}; \
         style-src 'self' 'unsafe-inline'; \
         font-src 'self'; \
         img-src 'self' data: https: {backend}; \
         media-src 'self' https:; \
         connect-src 'self' {STRIPE_API}; \
         frame-src {VIDEO_FRAME_SOURCES} {STRIPE_SCRIPT}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (video embeds need an origin)
/// - `Content-Security-Policy` (see [`content_security_policy`])
/// - `Permissions-Policy` denying sensitive features
/// - `Cache-Control: no-store` unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin`
/// - `X-DNS-Prefetch-Control: off`
///
/// No `Cross-Origin-Embedder-Policy`: `require-corp` would block backend
/// images and third-party video frames that send no CORP header.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let csp = content_security_policy(state.config().backend.origin.as_str());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             hid=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(self), \
             serial=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_backend_images() {
        let csp = content_security_policy("https://api.rinosbike.eu/");
        assert!(csp.contains("img-src 'self' data: https: https://api.rinosbike.eu;"));
    }

    #[test]
    fn test_csp_allows_video_frames_only() {
        let csp = content_security_policy("http://localhost:8000");
        assert!(csp.contains("frame-src https://www.youtube-nocookie.com"));
        assert!(csp.contains("player.vimeo.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(csp.contains("object-src 'none'"));
    }

    #[test]
    fn test_csp_scripts_limited_to_self_htmx_and_payment() {
        let csp = content_security_policy("http://localhost:8000");
        assert!(csp.contains(&format!("script-src 'self' {HTMX_SCRIPT} {STRIPE_SCRIPT};")));
        assert!(!csp.contains("'unsafe-eval'"));
    }

    #[test]
    fn test_csp_allows_payment_element() {
        let csp = content_security_policy("http://localhost:8000");
        assert!(csp.contains("connect-src 'self' https://api.stripe.com;"));
        assert!(csp.contains("player.vimeo.com https://js.stripe.com;"));
    }
}
