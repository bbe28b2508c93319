//! Credit operations.

use futures_util::Stream;

use crate::cancellation::CancellationSignal;
use crate::credits::types::{CreditBalance, DailyUsage, DailyUsageListOptions};
use crate::error::ClientResult;
use crate::rest::{paginate, RestClient, RestRequest};

const BALANCE_RESOURCE: &str = "credits/balance";
const DAILY_USAGE_RESOURCE: &str = "credits/daily-usage";

/// Balance and usage of the account's credits.
#[derive(Debug, Clone, Copy)]
pub struct Credits<'a> {
    rest: &'a RestClient,
}

impl<'a> Credits<'a> {
    pub fn new(rest: &'a RestClient) -> Self {
        Self { rest }
    }

    pub async fn get_balance(
        &self,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<CreditBalance> {
        let outcome = self
            .rest
            .invoke(&RestRequest::get(BALANCE_RESOURCE), signal)
            .await?;
        if !outcome.is_success() {
            return Err(outcome.into_error().await);
        }
        outcome.deserialize().await
    }

    /// Lazily list daily credit usage.
    pub fn list_daily_usages(
        &self,
        options: &DailyUsageListOptions,
        signal: Option<&CancellationSignal>,
    ) -> impl Stream<Item = ClientResult<DailyUsage>> + Send + 'a {
        let request = match &options.cursor {
            Some(cursor) => RestRequest::get(DAILY_USAGE_RESOURCE).query("cursor", cursor),
            None => RestRequest::get(DAILY_USAGE_RESOURCE)
                .query_opt("date:since", options.since.as_deref())
                .query_opt("date:until", options.until.as_deref()),
        }
        .query_opt("limit", options.limit);
        paginate(self.rest, request, signal.cloned())
    }
}
