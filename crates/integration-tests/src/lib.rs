//! Integration tests for the RINOS Bikes storefront.
//!
//! The storefront router is driven in-process with `tower::ServiceExt`
//! against a `wiremock` server standing in for the backend API. No socket
//! is bound and no real backend is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rinos-integration-tests
//! ```

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, Response, header},
};
use rinos_storefront::{
    backend::BackendClient,
    blocks::BlockRegistry,
    build_router,
    config::{BackendConfig, StorefrontConfig},
    content::ContentStore,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

/// Client address sent on every request; the rate limiters key on it.
pub const CLIENT_IP: &str = "203.0.113.7";

/// A storefront router wired to a mock backend.
pub struct TestApp {
    pub backend: MockServer,
    router: Router,
}

impl TestApp {
    /// Start a mock backend and build the storefront in front of it.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Like [`TestApp::spawn`], with the configuration adjusted first.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let backend = MockServer::start().await;
        let router = router_with(&backend.uri(), configure);
        Self { backend, router }
    }

    /// Send a request through a fresh clone of the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails, which axum routers never do.
    #[allow(clippy::expect_used)]
    pub async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        request
            .headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static(CLIENT_IP));
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(get_request(path, cookie)).await
    }

    /// `POST path` with a url-encoded form body.
    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(form_request(path, form, cookie)).await
    }

    /// Mount a successful backend login for anna@example.de (token
    /// `token-anna`) and log in. Returns the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect with a session cookie.
    pub async fn log_in(&self) -> String {
        self.log_in_user(
            "token-anna",
            json!({
                "user_id": 17,
                "email": "anna@example.de",
                "first_name": "Anna",
                "last_name": "Berg"
            }),
        )
        .await
    }

    /// Log in as the shop administrator redaktion@rinos.de (token
    /// `token-admin`). Returns the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect with a session cookie.
    pub async fn log_in_admin(&self) -> String {
        self.log_in_user(
            "token-admin",
            json!({
                "user_id": 1,
                "email": "redaktion@rinos.de",
                "first_name": "Redaktion",
                "is_admin": true
            }),
        )
        .await
    }

    #[allow(clippy::expect_used)]
    async fn log_in_user(&self, token: &str, user: Value) -> String {
        let email = user["email"].as_str().expect("user has an email").to_string();
        Mock::given(method("POST"))
            .and(path("/api/auth/login/json"))
            .and(body_partial_json(json!({ "email": email })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "user": user
            })))
            .mount(&self.backend)
            .await;

        let form = format!("email={}&password=Sattel2025", email.replace('@', "%40"));
        let response = self.post_form("/login", &form, None).await;
        assert_eq!(location(&response).as_deref(), Some("/profil"));
        session_cookie(&response).expect("login sets a session cookie")
    }
}

/// Storefront router for a backend at `origin`.
///
/// # Panics
///
/// Panics if `origin` is not a valid URL or the content pages cannot be
/// loaded.
#[must_use]
pub fn router_for(origin: &str) -> Router {
    router_with(origin, |_| {})
}

/// Storefront router for a backend at `origin` with adjusted configuration.
///
/// # Panics
///
/// Panics if `origin` is not a valid URL or the content pages cannot be
/// loaded.
#[allow(clippy::expect_used)]
pub fn router_with(origin: &str, configure: impl FnOnce(&mut StorefrontConfig)) -> Router {
    let mut config = StorefrontConfig::for_backend(
        BackendConfig::new(origin).expect("mock server uri is a valid origin"),
    );
    configure(&mut config);
    let backend = BackendClient::new(&config.backend).expect("HTTP client builds");
    let content = ContentStore::load(&config.content_dir).expect("bundled content pages load");
    build_router(AppState::with_parts(
        config,
        backend,
        content,
        BlockRegistry::default(),
    ))
}

/// Build a GET request.
///
/// # Panics
///
/// Panics if `path` is not a valid URI.
#[allow(clippy::expect_used)]
#[must_use]
pub fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// Build a url-encoded form POST.
///
/// # Panics
///
/// Panics if `path` is not a valid URI.
#[allow(clippy::expect_used)]
#[must_use]
pub fn form_request(path: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).expect("valid request")
}

/// Response body as UTF-8 text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
#[allow(clippy::expect_used)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

/// `Location` header of a redirect.
#[must_use]
pub fn location<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `name=value` of the session cookie set by a response, ready to be sent
/// back in a `Cookie` header.
#[must_use]
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("rinos_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
