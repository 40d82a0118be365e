use crate::parser::{ParseError, parse_calendar_list};
use crate::types::{Calendar, DateRange, Reservations};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode, Url};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Shown on the login page when the username or password is wrong.
const INVALID_CREDENTIALS_MARKER: &str = "Väärä käyttäjätunnus tai salasana";

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Unexpected page structure: {0}")]
    UnexpectedPageStructure(#[from] ParseError),
    /// The portal answers 404 both for unknown calendars and for requests
    /// without a valid session.
    #[error("Calendar '{0}' not found or not logged in.")]
    CalendarNotFound(String),
    /// Transport failures only. HTTP error statuses other than the range
    /// endpoint's 404 are handed to the parser or JSON decoder.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials,
}

/// The portal has no positive success signal, so any login response without
/// the failure marker counts as a success.
pub fn classify_login_response(body: &str) -> LoginOutcome {
    if body.contains(INVALID_CREDENTIALS_MARKER) {
        LoginOutcome::InvalidCredentials
    } else {
        LoginOutcome::Success
    }
}

/// Cookie jar that can be emptied while clients built on it keep using it.
#[derive(Debug, Default)]
struct SessionJar(RwLock<Jar>);

impl SessionJar {
    fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}

/// Cookie-session client for the Lokitime resident portal.
///
/// Only [`PortalClient::authenticate`] establishes a session. The other calls
/// assume one exists and do not check; an expired or missing session shows up
/// as [`PortalError::UnexpectedPageStructure`], [`PortalError::CalendarNotFound`]
/// or an undecodable body.
///
/// Clones share the same cookie store. The client is meant for sequential use.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    jar: Arc<SessionJar>,
    base_url: String,
}

impl PortalClient {
    pub fn new() -> Result<Self, PortalError> {
        Self::with_base_url(crate::BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PortalError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let jar = Arc::new(SessionJar::default());
        Ok(Self {
            client: build_http_client(jar.clone())?,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, PortalError> {
        let url = self.endpoint("admin/login/doLogin");
        log::info!("Logging in as {}...", username);

        let body = self
            .client
            .post(&url)
            .form(&[("user_name", username), ("password", password)])
            .send()
            .await?
            .text()
            .await?;

        match classify_login_response(&body) {
            LoginOutcome::Success => {
                log::debug!("Login accepted for {}", username);
                Ok(true)
            }
            LoginOutcome::InvalidCredentials => {
                // drop whatever cookies the rejected attempt left behind
                self.jar.clear();
                Err(PortalError::InvalidCredentials)
            }
        }
    }

    pub async fn list_calendars(&self) -> Result<Vec<Calendar>, PortalError> {
        let url = self.endpoint("fi/resident/reservation_calendars");
        log::info!("Fetching reservation calendars...");

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .text()
            .await?;

        Ok(parse_calendar_list(&html)?)
    }

    /// Dates are sent exactly as given.
    pub async fn fetch_calendar_range(
        &self,
        calendar_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Reservations, PortalError> {
        let url = self.endpoint("fi/resident/get_calendar_reservations");
        log::info!(
            "Fetching reservations for calendar {} ({} - {})...",
            calendar_id,
            start_date,
            end_date
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("calendar_id", calendar_id),
                ("start_date", start_date),
                ("end_date", end_date),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortalError::CalendarNotFound(calendar_id.to_string()));
        }

        let status = response.status();
        let body = response.text().await?;
        log::debug!("Reservations response: {} ({} bytes)", status, body.len());

        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_reservations(
        &self,
        calendar_id: &str,
        range: DateRange,
    ) -> Result<Reservations, PortalError> {
        self.fetch_calendar_range(calendar_id, &range.start_iso(), &range.end_iso())
            .await
    }

    pub async fn fetch_calendar_today(&self, calendar_id: &str) -> Result<Reservations, PortalError> {
        self.fetch_reservations(calendar_id, DateRange::today()).await
    }

    /// Monday through Sunday of the current local week.
    pub async fn fetch_calendar_this_week(
        &self,
        calendar_id: &str,
    ) -> Result<Reservations, PortalError> {
        self.fetch_reservations(calendar_id, DateRange::this_week()).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn build_http_client(jar: Arc<SessionJar>) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .cookie_provider(jar)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rejected_login() {
        let body = r#"
            <div class="alert alert-danger">Väärä käyttäjätunnus tai salasana</div>
            <form action="/kiinteisto/admin/login/doLogin" method="post"></form>
        "#;
        assert_eq!(
            classify_login_response(body),
            LoginOutcome::InvalidCredentials
        );
    }

    #[test]
    fn test_classify_accepted_login() {
        assert_eq!(
            classify_login_response("<h1>Tervetuloa</h1>"),
            LoginOutcome::Success
        );
        assert_eq!(classify_login_response(""), LoginOutcome::Success);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(
            classify_login_response("väärä käyttäjätunnus tai salasana"),
            LoginOutcome::Success
        );
    }

    #[test]
    fn test_cleared_jar_forgets_cookies() {
        let jar = SessionJar::default();
        let url: Url = "http://localhost:8080/kiinteisto/admin/login/doLogin"
            .parse()
            .unwrap();
        let set_cookie = HeaderValue::from_static("lokitime_session=guest; Path=/");

        jar.set_cookies(&mut std::iter::once(&set_cookie), &url);
        assert_eq!(
            jar.cookies(&url),
            Some(HeaderValue::from_static("lokitime_session=guest"))
        );

        jar.clear();
        assert_eq!(jar.cookies(&url), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = PortalClient::with_base_url("http://localhost:8080/kiinteisto/")
            .expect("Failed to build client");

        assert_eq!(client.base_url(), "http://localhost:8080/kiinteisto");
        assert_eq!(
            client.endpoint("admin/login/doLogin"),
            "http://localhost:8080/kiinteisto/admin/login/doLogin"
        );
    }

    #[test]
    fn test_default_base_url() {
        let client = PortalClient::new().expect("Failed to build client");
        assert_eq!(client.base_url(), "https://www.lokitime.com/kiinteisto");
    }
}
