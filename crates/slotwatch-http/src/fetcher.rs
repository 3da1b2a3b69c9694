//! Paged availability fetcher

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use futures::future::try_join_all;
use slotwatch_core::{MonitoredTarget, Snapshot, DAYS_PER_PAGE};
use slotwatch_engine::{FetchError, Fetcher};
use std::time::Duration;
use tracing::debug;

use crate::availability::parse_availabilities;
use crate::error::SetupError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:138.0) Gecko/20100101 Firefox/138.0";

/// First day of every page needed to cover `days_to_check` days from `today`
pub fn page_starts(today: NaiveDate, days_to_check: u32) -> Vec<NaiveDate> {
    (0..days_to_check.div_ceil(DAYS_PER_PAGE))
        .filter_map(|page| today.checked_add_days(Days::new(u64::from(page * DAYS_PER_PAGE))))
        .collect()
}

/// Queries every page of the availability window concurrently and
/// concatenates the results in page order
pub struct AvailabilityFetcher {
    client: reqwest::Client,
    days_to_check: u32,
    request_timeout: Duration,
}

impl AvailabilityFetcher {
    /// `request_timeout` bounds each page request
    pub fn new(days_to_check: u32, request_timeout: Duration) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(client, days_to_check, request_timeout))
    }

    fn with_client(client: reqwest::Client, days_to_check: u32, request_timeout: Duration) -> Self {
        Self {
            client,
            days_to_check,
            request_timeout,
        }
    }

    /// Fetch the window starting at `today`. Any failed page fails the whole fetch.
    pub async fn fetch_window(
        &self,
        target: &MonitoredTarget,
        today: NaiveDate,
    ) -> Result<Snapshot, FetchError> {
        let pages = page_starts(today, self.days_to_check)
            .into_iter()
            .map(|start| async move {
                let url = target.query.url_for(start);
                let page = self.fetch_page(&url).await?;
                debug!(target = %target.name(), start = %start, slots = page.len(), "fetched page");
                Ok::<_, FetchError>(page)
            });

        let pages = try_join_all(pages).await?;
        Ok(pages.into_iter().flatten().collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<Snapshot, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        parse_availabilities(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.request_timeout)
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Fetcher for AvailabilityFetcher {
    async fn fetch(&self, target: &MonitoredTarget) -> Result<Snapshot, FetchError> {
        self.fetch_window(target, Local::now().date_naive()).await
    }
}
