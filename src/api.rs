use log::{debug, info, warn};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Url};
use serde::Serialize;
use serde_json::Value;

use crate::credentials::{Credentials, Password, PhoneNumber, SessionCookie};

const BOT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.6 Safari/605.1.15";
const LANGUAGE_COOKIE: &str = "wp-wpml_current_language=en;";

/// The two requests the tool makes against the carrier's site.
#[allow(async_fn_in_trait)]
pub trait AccountPortal {
    async fn login(&self, credentials: &Credentials) -> Result<SessionCookie, AuthError>;

    /// Body of the account page, or `None` if the request failed in any way.
    async fn fetch_account_page(&self, session: &SessionCookie) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{message}")]
    Rejected { message: String },
    #[error("Auth error")]
    Transport(#[from] reqwest::Error),
    #[error("Auth error: the server did not set any session cookie")]
    NoSessionCookie,
    #[error("Auth error: invalid domain {domain:?}: {source}")]
    InvalidDomain {
        domain: String,
        source: url::ParseError,
    },
}

pub struct LycaClient {
    login_client: reqwest::Client,
    client: reqwest::Client,
    login_url: Url,
    account_url: Url,
    domain: String,
}

impl LycaClient {
    pub fn new(domain: &str) -> Result<Self, AuthError> {
        let endpoint = |path: &str| {
            Url::parse(&format!("https://{domain}{path}")).map_err(|source| {
                AuthError::InvalidDomain {
                    domain: domain.to_owned(),
                    source,
                }
            })
        };
        let login_client = reqwest::Client::builder()
            .connection_verbose(true)
            .redirect(redirect::Policy::limited(1))
            .build()?;
        let client = reqwest::Client::builder()
            .connection_verbose(true)
            .build()?;
        Ok(Self {
            login_client,
            client,
            login_url: endpoint("/wp-admin/admin-ajax.php")?,
            account_url: endpoint("/en/my-account/")?,
            domain: domain.to_owned(),
        })
    }

    fn login_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-us"),
        );
        headers.insert(header::COOKIE, HeaderValue::from_static(LANGUAGE_COOKIE));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(BOT_USER_AGENT));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let referer = format!("https://{}/en/", self.domain);
        let origin = format!("https://{}/en/bundles/", self.domain);
        for (name, value) in [(header::REFERER, referer), (header::ORIGIN, origin)] {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(e) => warn!("Skipping header {name}: {e}"),
            }
        }
        headers
    }

    fn login_request(&self, credentials: &Credentials) -> reqwest::RequestBuilder {
        self.login_client
            .post(self.login_url.clone())
            .headers(self.login_headers())
            .form(&LoginForm::new(credentials))
    }

    fn account_headers(&self, session: &SessionCookie) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-us"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(DESKTOP_USER_AGENT),
        );
        let account_url = self.account_url.as_str();
        for (name, value) in [
            (header::COOKIE, session.as_str()),
            (header::REFERER, account_url),
            (header::ORIGIN, account_url),
        ] {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(e) => warn!("Skipping header {name}: {e}"),
            }
        }
        headers
    }
}

impl AccountPortal for LycaClient {
    async fn login(&self, credentials: &Credentials) -> Result<SessionCookie, AuthError> {
        info!("Logging in as {}.", credentials.phone);
        let response = self
            .login_request(credentials)
            .send()
            .await?
            .error_for_status()?;
        let session = join_set_cookies(response.headers());
        let body = response.text().await?;
        check_login_response(&body)?;
        let session = session.ok_or(AuthError::NoSessionCookie)?;
        info!("Successfully logged in.");
        Ok(session)
    }

    async fn fetch_account_page(&self, session: &SessionCookie) -> Option<String> {
        let body = async {
            self.client
                .get(self.account_url.clone())
                .headers(self.account_headers(session))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        };
        match body.await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Failed to fetch the account page: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    action: &'static str,
    method: &'static str,
    mobile_no: &'a PhoneNumber,
    pass: &'a Password,
}
impl<'a> LoginForm<'a> {
    fn new(credentials: &'a Credentials) -> Self {
        Self {
            action: "lyca_login_ajax",
            method: "login",
            mobile_no: &credentials.phone,
            pass: &credentials.password,
        }
    }
}

/// Fails if the login endpoint flagged an application-level error.
/// Bodies that are not JSON carry no such flag and are accepted.
fn check_login_response(body: &str) -> Result<(), AuthError> {
    let response = match serde_json::from_str::<Value>(body) {
        Ok(response) => response,
        Err(e) => {
            debug!("Login response is not JSON ({e}); assuming success");
            return Ok(());
        }
    };
    if response["is_error"] != true {
        return Ok(());
    }
    let message = match &response["message"] {
        Value::Null => String::new(),
        Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    Err(AuthError::Rejected {
        message: if message.is_empty() {
            "Unknown error".to_owned()
        } else {
            message
        },
    })
}

fn join_set_cookies(headers: &HeaderMap) -> Option<SessionCookie> {
    let cookies = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>();
    (!cookies.is_empty()).then(|| cookies.join("; ").into())
}
