use itertools::Itertools;
use joinery::JoinableIterator;
use log::debug;
use scraper::{ElementRef, Html};

use crate::schema::{AccountSnapshot, UNKNOWN};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Parsing error: `{field}` was not found in the account page")]
    FieldNotFound { field: &'static str },
}

pub fn parse_account_page(html: &Html) -> Result<AccountSnapshot, ScrapeError> {
    let phone = parse_phone(html)?;
    let balance = parse_balance(html)?;
    let internet = parse_internet(html).unwrap_or_else(fall_back_to_unknown);
    let expiration = parse_expiration(html).unwrap_or_else(fall_back_to_unknown);
    Ok(AccountSnapshot::builder()
        .phone(phone)
        .balance(balance)
        .internet(internet)
        .expiration(expiration)
        .build())
}

/// Whether the document is the account page rather than a login form or an error page.
pub fn is_account_page(html: &Html) -> bool {
    html.select(selector!("title"))
        .next()
        .is_some_and(|title| text_of(title).to_lowercase().contains("account"))
}

fn fall_back_to_unknown(error: ScrapeError) -> String {
    debug!("{error}");
    UNKNOWN.to_owned()
}

fn text_of(element: ElementRef) -> String {
    element.text().collect()
}

fn parse_phone(html: &Html) -> Result<String, ScrapeError> {
    let element = html
        .select(selector!(".bdl-msisdn"))
        .next()
        .ok_or(ScrapeError::FieldNotFound { field: "phone" })?;
    Ok(text_of(element).trim().to_owned())
}

fn parse_balance(html: &Html) -> Result<String, ScrapeError> {
    let element = html
        .select(selector!("span.myaccount-lowbalance"))
        .next()
        .ok_or(ScrapeError::FieldNotFound { field: "balance" })?;
    let text = text_of(element);
    let text = text.trim();
    Ok(text.strip_suffix("Topup").unwrap_or(text).trim_end().to_owned())
}

/// Remaining allowances, skipping unlimited and exhausted ones.
fn parse_internet(html: &Html) -> Result<String, ScrapeError> {
    let values = html
        .select(selector!("div.bdl-mins"))
        .map(|element| text_of(element).replace('\n', "").trim().to_owned())
        .filter(|value| !is_unlimited_or_empty(value))
        .collect_vec();
    if values.is_empty() {
        return Err(ScrapeError::FieldNotFound { field: "internet" });
    }
    Ok(values.iter().join_with(", ").to_string())
}

fn is_unlimited_or_empty(value: &str) -> bool {
    value == "U"
        || value == "Unlimited"
        || value.is_empty()
        || value.parse::<f64>().is_ok_and(|x| x == 0.)
}

/// Expiration dates of each bundle.
///
/// Spans under `p.bdl-balance` come in label/value pairs, e.g.
/// `Valid until` / `| 01-01-2025 23:59`.
fn parse_expiration(html: &Html) -> Result<String, ScrapeError> {
    let spans = html
        .select(selector!("p.bdl-balance > span"))
        .map(|span| {
            regex!(r"\s\s+")
                .replace_all(&text_of(span).replace("| ", ""), " ")
                .into_owned()
        })
        .collect_vec();
    let dates = spans
        .iter()
        .tuples()
        .filter(|(label, value)| !label.is_empty() && !value.is_empty())
        .filter_map(|(_, value)| regex!(r"\b\d{2}-\d{2}-\d{4}\b").find(value))
        .map(|date| date.as_str())
        .collect_vec();
    if dates.is_empty() {
        return Err(ScrapeError::FieldNotFound {
            field: "expiration",
        });
    }
    Ok(dates.iter().join_with(", ").to_string())
}
