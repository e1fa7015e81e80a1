use anyhow::Context;
use chrono::Utc;
use log::{info, warn};

use crate::{
    api::AccountPortal,
    config::RunConfig,
    credentials::Credentials,
    fetcher::fetch_until_valid,
    parser::parse_account_page,
    printer::Report,
    usage_tracker::{track_usage, CacheStore},
};

/// Logs in, reads the account page and, if requested, compares it with the previous run.
pub async fn run<P, C>(
    portal: &P,
    cache: &C,
    credentials: &Credentials,
    config: &RunConfig,
) -> anyhow::Result<Report>
where
    P: AccountPortal,
    C: CacheStore,
{
    let session = portal.login(credentials).await?;
    let html = fetch_until_valid(config.max_retries, || portal.fetch_account_page(&session)).await?;

    if let Some(path) = &config.save_html {
        match fs_err::write(path, html.html()) {
            Ok(()) => info!("Saved the account page to {path:?}"),
            Err(e) => warn!("Failed to save the account page: {e}"),
        }
    }

    let snapshot = parse_account_page(&html)
        .with_context(|| format!("While reading the account page of {}", credentials.phone))?;
    info!("Parsed account data: {snapshot:?}");

    let usage = if config.track_internet {
        track_usage(cache, &credentials.phone, &snapshot, Utc::now())
    } else {
        cache.remove(&credentials.phone);
        None
    };
    Ok(Report { snapshot, usage })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::{Duration, Utc};

    use super::run;
    use crate::{
        api::{AccountPortal, AuthError},
        config::RunConfig,
        credentials::{Credentials, SessionCookie},
        fetcher::FetchError,
        parser::{tests::ACCOUNT_PAGE, ScrapeError},
        printer::format_report,
        schema::{AccountSnapshot, CachedSnapshot},
        usage_tracker::{memory::MemoryCacheStore, CacheStore, UsageChange},
    };

    const LOGIN_PAGE: &str = "<html><head><title>Login</title></head><body></body></html>";

    /// Serves `pages` in order, repeating the last one.
    struct FakePortal {
        login_error: Option<&'static str>,
        pages: Vec<Option<&'static str>>,
        fetches: Cell<usize>,
    }

    impl FakePortal {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                login_error: None,
                pages,
                fetches: Cell::new(0),
            }
        }
    }

    impl AccountPortal for FakePortal {
        async fn login(&self, credentials: &Credentials) -> Result<SessionCookie, AuthError> {
            match self.login_error {
                Some(message) => Err(AuthError::Rejected {
                    message: message.to_owned(),
                }),
                None => Ok(format!("PHPSESSID={}", credentials.phone).into()),
            }
        }

        async fn fetch_account_page(&self, session: &SessionCookie) -> Option<String> {
            assert_eq!(session.as_str(), "PHPSESSID=33600000000");
            let i = self.fetches.get();
            self.fetches.set(i + 1);
            self.pages[i.min(self.pages.len() - 1)].map(str::to_owned)
        }
    }

    fn credentials() -> Credentials {
        Credentials::builder()
            .phone("33600000000".to_owned().into())
            .password("secret".to_owned().into())
            .build()
    }

    fn expected_snapshot() -> AccountSnapshot {
        AccountSnapshot::builder()
            .phone("33600000000")
            .balance("€5.00")
            .internet("2GB")
            .expiration("01-01-2025")
            .build()
    }

    #[tokio::test]
    async fn end_to_end_without_tracking() {
        let portal = FakePortal::new(vec![Some(ACCOUNT_PAGE)]);
        let cache = MemoryCacheStore::default();
        cache
            .save(
                &credentials().phone,
                &CachedSnapshot::new(expected_snapshot(), Utc::now()),
            )
            .unwrap();

        let report = run(&portal, &cache, &credentials(), &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(portal.fetches.get(), 1);
        assert_eq!(report.snapshot, expected_snapshot());
        assert_eq!(report.usage, None);
        assert!(!format_report(&report).contains("GB "));
        // Turning tracking off forgets the previous data.
        assert!(!cache.contains(&credentials().phone));
    }

    #[tokio::test]
    async fn tracking_compares_with_previous_run() {
        let portal = FakePortal::new(vec![None, Some(LOGIN_PAGE), Some(ACCOUNT_PAGE)]);
        let cache = MemoryCacheStore::default();
        let previous = AccountSnapshot::builder()
            .phone("33600000000")
            .balance("€5.00")
            .internet("3.5GB")
            .expiration("01-01-2025")
            .build();
        cache
            .save(
                &credentials().phone,
                &CachedSnapshot::new(previous, Utc::now() - Duration::days(2)),
            )
            .unwrap();
        let config = RunConfig {
            track_internet: true,
            ..Default::default()
        };

        let report = run(&portal, &cache, &credentials(), &config).await.unwrap();
        assert_eq!(portal.fetches.get(), 3);
        let usage = report.usage.unwrap();
        assert_eq!(usage.change, UsageChange::Consumed(1.5));
        assert_eq!(usage.since, "2 days ago");
        assert_eq!(
            cache.load(&credentials().phone).unwrap().snapshot(),
            &expected_snapshot()
        );
    }

    #[tokio::test]
    async fn login_rejection_is_fatal() {
        let mut portal = FakePortal::new(vec![Some(ACCOUNT_PAGE)]);
        portal.login_error = Some("Invalid credentials");
        let error = run(
            &portal,
            &MemoryCacheStore::default(),
            &credentials(),
            &RunConfig::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "Invalid credentials");
        assert_eq!(portal.fetches.get(), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal() {
        let portal = FakePortal::new(vec![Some(LOGIN_PAGE)]);
        let config = RunConfig {
            max_retries: 4,
            ..Default::default()
        };
        let error = run(&portal, &MemoryCacheStore::default(), &credentials(), &config)
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<FetchError>(),
            Some(FetchError::RetriesExhausted { attempts: 4 })
        ));
        assert_eq!(portal.fetches.get(), 4);
    }

    #[tokio::test]
    async fn structural_mismatch_is_a_parsing_error() {
        let portal = FakePortal::new(vec![Some(
            "<html><head><title>My account</title></head><body></body></html>",
        )]);
        let error = run(
            &portal,
            &MemoryCacheStore::default(),
            &credentials(),
            &RunConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::FieldNotFound { field: "phone" })
        ));
        assert!(format!("{error:#}").contains("Parsing error"));
    }

    #[tokio::test]
    async fn account_page_can_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.html");
        let portal = FakePortal::new(vec![Some(ACCOUNT_PAGE)]);
        let config = RunConfig {
            save_html: Some(path.clone()),
            ..Default::default()
        };
        run(&portal, &MemoryCacheStore::default(), &credentials(), &config)
            .await
            .unwrap();
        assert!(fs_err::read_to_string(path).unwrap().contains("bdl-msisdn"));
    }
}
