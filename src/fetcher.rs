use std::future::Future;

use log::{debug, info, warn};
use scraper::Html;

use crate::parser::is_account_page;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Max number of tries exhausted: the account page was not reached after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },
}

/// Fetches until the body turns out to be the account page.
///
/// `max_attempts` counts every fetch, including the first one.
/// The site tends to answer with the login page or an empty body for a
/// while after logging in, so such bodies are silently refetched.
pub async fn fetch_until_valid<F, Fut>(max_attempts: u32, mut fetch: F) -> Result<Html, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let mut attempts = 0;
    while attempts < max_attempts {
        attempts += 1;
        debug!("Fetching the account page (attempt {attempts}/{max_attempts})");
        let Some(body) = fetch().await else {
            continue;
        };
        let html = Html::parse_document(&body);
        if is_account_page(&html) {
            info!("Reached the account page after {attempts} attempt(s).");
            return Ok(html);
        }
        warn!("Attempt {attempts}: the response was not the account page.");
    }
    Err(FetchError::RetriesExhausted { attempts })
}
