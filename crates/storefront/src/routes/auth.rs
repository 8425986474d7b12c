//! Authentication route handlers.
//!
//! Login and registration go through the backend, which issues a bearer
//! token. The token and the user profile are kept in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rinos_core::{Email, User};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{AuthResponse, BackendError, RegisterRequest};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::layout::Layout;
use crate::session::{AuthSession, clear_auth, is_local_path, store_auth};
use crate::state::AppState;

/// Where customers land after logging in without a `next` target.
const DEFAULT_LANDING: &str = "/profil";

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters of the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub error: Option<String>,
    pub next: Option<String>,
    pub expired: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

// =============================================================================
// Validation
// =============================================================================

/// Why a password was rejected at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordProblem {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
}

impl PasswordProblem {
    /// Error code carried in the redirect query.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TooShort => "password_too_short",
            Self::MissingUppercase => "password_uppercase",
            Self::MissingLowercase => "password_lowercase",
            Self::MissingDigit => "password_digit",
        }
    }
}

/// Check the password rules: length, upper and lower case letter, digit.
///
/// # Errors
///
/// Returns the first rule the password breaks.
pub fn validate_password(password: &str) -> Result<(), PasswordProblem> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordProblem::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordProblem::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordProblem::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordProblem::MissingDigit);
    }
    Ok(())
}

/// German message for an error code from the query string.
#[must_use]
pub fn error_message(code: &str) -> String {
    match code {
        "credentials" => "Anmeldung fehlgeschlagen. Bitte überprüfen Sie Ihre Zugangsdaten.",
        "invalid_email" => "Bitte geben Sie eine gültige E-Mail-Adresse ein.",
        "password_too_short" => "Passwort muss mindestens 8 Zeichen lang sein",
        "password_uppercase" => "Passwort muss mindestens einen Großbuchstaben enthalten",
        "password_lowercase" => "Passwort muss mindestens einen Kleinbuchstaben enthalten",
        "password_digit" => "Passwort muss mindestens eine Ziffer enthalten",
        "email_taken" => "Diese E-Mail-Adresse ist bereits registriert",
        "server" => "Serverfehler. Bitte versuchen Sie es später erneut.",
        "session" => "Die Anmeldung konnte nicht gespeichert werden. Bitte versuchen Sie es erneut.",
        _ => "Ein Fehler ist aufgetreten",
    }
    .to_string()
}

/// Post-login target: `next` when it is a local path, else the profile.
fn landing_page(next: Option<&str>) -> String {
    next.map(str::trim)
        .filter(|n| is_local_path(n) && *n != "/login")
        .unwrap_or(DEFAULT_LANDING)
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the user of a fresh token and store both in the session.
async fn start_session(
    state: &AppState,
    session: &Session,
    auth: AuthResponse,
) -> Result<User, &'static str> {
    let token = SecretString::from(auth.access_token);
    let user = match auth.user {
        Some(user) => user,
        None => state.backend().current_user(&token).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch user after login");
            "server"
        })?,
    };

    store_auth(session, &token, &user).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store login in session");
        "session"
    })?;
    set_sentry_user(&user.user_id, Some(&user.email));
    Ok(user)
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Logged-in customers are sent straight on.
#[instrument(skip(layout, auth))]
pub async fn login_page(
    layout: Layout,
    auth: AuthSession,
    Query(query): Query<AuthQuery>,
) -> Response {
    if auth.is_authenticated() {
        return Redirect::to(&landing_page(query.next.as_deref())).into_response();
    }

    LoginTemplate {
        layout,
        error: query.error.as_deref().map(error_message),
        notice: query
            .expired
            .is_some()
            .then(|| "Ihre Sitzung ist abgelaufen. Bitte melden Sie sich erneut an.".to_string()),
        next: query
            .next
            .filter(|n| is_local_path(n))
            .unwrap_or_default(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = form.next.as_deref().filter(|n| is_local_path(n));
    let failure = |code: &str| {
        let mut url = format!("/login?error={code}");
        if let Some(next) = next {
            url.push_str("&next=");
            url.push_str(&urlencoding::encode(next));
        }
        Redirect::to(&url).into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return failure("invalid_email");
    };
    let password = SecretString::from(form.password);

    let auth = match state.backend().login(email.as_str(), &password).await {
        Ok(auth) => auth,
        Err(BackendError::Unauthorized) => return failure("credentials"),
        Err(e) if e.client_message().is_some() => {
            tracing::info!(error = %e, "Login rejected");
            return failure("credentials");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return failure("server");
        }
    };

    match start_session(&state, &session, auth).await {
        Ok(user) => {
            tracing::info!(user_id = %user.user_id, "User logged in");
            add_breadcrumb("auth", "Logged in", None);
            Redirect::to(&landing_page(next)).into_response()
        }
        Err(code) => failure(code),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(layout, auth))]
pub async fn register_page(
    layout: Layout,
    auth: AuthSession,
    Query(query): Query<AuthQuery>,
) -> Response {
    if auth.is_authenticated() {
        return Redirect::to(DEFAULT_LANDING).into_response();
    }

    RegisterTemplate {
        layout,
        error: query.error.as_deref().map(error_message),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        phone: String::new(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The backend logs the new customer in right away, so a successful
/// registration ends on the profile page.
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/register?error=invalid_email").into_response();
    };
    if let Err(problem) = validate_password(&form.password) {
        return Redirect::to(&format!("/register?error={}", problem.code())).into_response();
    }

    let request = RegisterRequest {
        email: email.into_inner(),
        password: form.password,
        first_name: non_empty(form.first_name),
        last_name: non_empty(form.last_name),
        phone: non_empty(form.phone),
    };

    let auth = match state.backend().register(&request).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let message = match e.client_message() {
                Some(detail)
                    if detail.contains("already registered") || detail.contains("Email already") =>
                {
                    error_message("email_taken")
                }
                Some(detail) => detail.to_string(),
                None => error_message("server"),
            };
            // Re-render so the customer keeps what they typed.
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                RegisterTemplate {
                    layout,
                    error: Some(message),
                    email: request.email,
                    first_name: request.first_name.unwrap_or_default(),
                    last_name: request.last_name.unwrap_or_default(),
                    phone: request.phone.unwrap_or_default(),
                },
            )
                .into_response();
        }
    };

    match start_session(&state, &session, auth).await {
        Ok(user) => {
            tracing::info!(user_id = %user.user_id, "User registered");
            add_breadcrumb("auth", "Registered", None);
            Redirect::to(DEFAULT_LANDING).into_response()
        }
        // The account exists now; logging in again picks it up.
        Err(code) => Redirect::to(&format!("/login?error={code}")).into_response(),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The backend is told to revoke the token; the local session is cleared
/// even if that call fails. The guest cart survives.
#[instrument(skip(state, session, auth))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    auth: AuthSession,
) -> Redirect {
    if let Some(token) = auth.bearer()
        && let Err(e) = state.backend().logout(token).await
    {
        tracing::warn!(error = %e, "Backend logout failed");
    }

    if let Err(e) = clear_auth(&session).await {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();
    add_breadcrumb("auth", "Logged out", None);

    Redirect::to("/")
}

/// `/anmelden` is the old login URL.
pub async fn legacy_login() -> Redirect {
    Redirect::permanent("/login")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(validate_password("Ab1"), Err(PasswordProblem::TooShort));
        assert_eq!(
            validate_password("abcdefg1"),
            Err(PasswordProblem::MissingUppercase)
        );
        assert_eq!(
            validate_password("ABCDEFG1"),
            Err(PasswordProblem::MissingLowercase)
        );
        assert_eq!(
            validate_password("Abcdefgh"),
            Err(PasswordProblem::MissingDigit)
        );
        assert_eq!(validate_password("Radfahren2024"), Ok(()));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert_eq!(validate_password("Ärger1ü"), Err(PasswordProblem::TooShort));
        assert_eq!(validate_password("Ärger12üX"), Ok(()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            error_message(PasswordProblem::MissingDigit.code()),
            "Passwort muss mindestens eine Ziffer enthalten"
        );
        assert_eq!(
            error_message("email_taken"),
            "Diese E-Mail-Adresse ist bereits registriert"
        );
        assert_eq!(error_message("unbekannt"), "Ein Fehler ist aufgetreten");
    }

    #[test]
    fn test_landing_page() {
        assert_eq!(landing_page(None), "/profil");
        assert_eq!(landing_page(Some("/cart")), "/cart");
        assert_eq!(landing_page(Some("https://evil.example")), "/profil");
        assert_eq!(landing_page(Some("/login")), "/profil");
    }
}
