//! Email validation operations.

use std::future::Future;
use std::time::Duration;

use futures_util::{Stream, TryStreamExt};
use reqwest::StatusCode;
use uuid::Uuid;

use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;
use crate::polling::{JobCompletionWaiter, WaitPolicy};
use crate::rest::pagination::{next_page, paginate};
use crate::rest::{MultipartPayload, RestClient, RestOutcome, RestRequest};
use crate::validations::types::{
    Direction, EntryListOptions, FileSettings, FileValidationRequest, Validation,
    ValidationEntry, ValidationListOptions, ValidationOverview, ValidationRequest,
    ValidationSnapshot,
};

const RESOURCE: &str = "email-validations";

/// Anything the poll loop can inspect between two fetches.
trait JobSnapshot {
    fn overview(&self) -> &ValidationOverview;
}

impl JobSnapshot for ValidationSnapshot {
    fn overview(&self) -> &ValidationOverview {
        &self.overview
    }
}

impl JobSnapshot for ValidationOverview {
    fn overview(&self) -> &ValidationOverview {
        self
    }
}

/// Submit, poll, list and delete email validation jobs.
#[derive(Debug, Clone, Copy)]
pub struct EmailValidations<'a> {
    rest: &'a RestClient,
    waiter: &'a JobCompletionWaiter,
}

impl<'a> EmailValidations<'a> {
    pub fn new(rest: &'a RestClient, waiter: &'a JobCompletionWaiter) -> Self {
        Self { rest, waiter }
    }

    /// Submit addresses for validation.
    ///
    /// With a waiting policy this resolves once the job is terminal; `None`
    /// means the job vanished (deleted or expired) while being polled.
    pub async fn submit(
        &self,
        request: &ValidationRequest,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<Validation>> {
        if request.entries.is_empty() {
            return Err(ClientError::InvalidRequest(
                "a validation job needs at least one entry".into(),
            ));
        }

        let rest_request = RestRequest::post(RESOURCE)
            .json(request)?
            .query_opt("waitTime", wait_time(policy, policy.submission_wait_time));
        self.submit_and_wait(rest_request, policy, signal).await
    }

    /// Submit a file of addresses (CSV, TSV, plain text or spreadsheet).
    pub async fn submit_file(
        &self,
        request: &FileValidationRequest,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<Validation>> {
        if request.content.is_empty() {
            return Err(ClientError::InvalidRequest("the input file is empty".into()));
        }

        let payload = MultipartPayload::new()
            .part(
                "inputFile",
                request.content.clone(),
                Some(request.file_name.clone()),
                Some(request.content_type.clone()),
            )
            .json(
                "settings",
                &FileSettings {
                    options: &request.options,
                    settings: &request.settings,
                },
            )?;

        let rest_request = RestRequest::post(RESOURCE)
            .multipart(payload)
            .query_opt("waitTime", wait_time(policy, policy.submission_wait_time));
        self.submit_and_wait(rest_request, policy, signal).await
    }

    async fn submit_and_wait(
        &self,
        rest_request: RestRequest,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<Validation>> {
        let outcome = self.rest.invoke(&rest_request, signal).await?;
        let snapshot: ValidationSnapshot = match outcome.status() {
            StatusCode::OK | StatusCode::ACCEPTED => outcome.deserialize().await?,
            _ => return Err(outcome.into_error().await),
        };
        tracing::info!(
            job_id = %snapshot.overview.id,
            entries = snapshot.overview.no_of_entries,
            status = %snapshot.overview.status,
            "Validation job submitted"
        );

        let id = snapshot.overview.id;
        let finished = self
            .poll_until_done(snapshot, policy, signal, || {
                self.fetch_snapshot(id, policy, signal)
            })
            .await?;
        match finished {
            Some(snapshot) => self.assemble(snapshot, signal).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetch a job with its entries. `None` if the job does not exist.
    pub async fn get(
        &self,
        id: Uuid,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<Validation>> {
        let Some(snapshot) = self.fetch_snapshot(id, policy, signal).await? else {
            return Ok(None);
        };
        let finished = self
            .poll_until_done(snapshot, policy, signal, || {
                self.fetch_snapshot(id, policy, signal)
            })
            .await?;
        match finished {
            Some(snapshot) => self.assemble(snapshot, signal).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetch only the job summary. `None` if the job does not exist.
    pub async fn get_overview(
        &self,
        id: Uuid,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<ValidationOverview>> {
        let Some(overview) = self.fetch_overview(id, policy, signal).await? else {
            return Ok(None);
        };
        self.poll_until_done(overview, policy, signal, || {
            self.fetch_overview(id, policy, signal)
        })
        .await
    }

    /// Delete a job. Deleting a job that is already gone succeeds.
    pub async fn delete(&self, id: Uuid, signal: Option<&CancellationSignal>) -> ClientResult<()> {
        let request = RestRequest::delete(format!("{RESOURCE}/{id}"));
        let outcome = self.rest.invoke(&request, signal).await?;
        match outcome.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::GONE => {
                tracing::info!(job_id = %id, "Validation job deleted");
                Ok(())
            }
            _ => Err(outcome.into_error().await),
        }
    }

    /// Lazily list the jobs of the account.
    pub fn list(
        &self,
        options: &ValidationListOptions,
        signal: Option<&CancellationSignal>,
    ) -> impl Stream<Item = ClientResult<ValidationOverview>> + Send + 'a {
        let request = match &options.cursor {
            Some(cursor) => resume(RESOURCE, cursor, options.limit),
            None => {
                let statuses = options
                    .statuses
                    .iter()
                    .filter_map(|status| status.wire_name())
                    .collect::<Vec<_>>();
                RestRequest::get(RESOURCE)
                    .query_opt("createdOn:since", options.created_since.as_deref())
                    .query_opt("createdOn:until", options.created_until.as_deref())
                    .query_opt(
                        "status",
                        (!statuses.is_empty()).then(|| statuses.join(",")),
                    )
                    .query_opt("owner", options.owner.as_deref())
                    .query_opt(
                        "sort",
                        options.direction.map(|direction| match direction {
                            Direction::Forward => "createdOn",
                            Direction::Backward => "-createdOn",
                        }),
                    )
                    .query_opt("limit", options.limit)
            }
        };
        paginate(self.rest, request, signal.cloned())
    }

    /// Lazily list the entries of a job.
    pub fn list_entries(
        &self,
        id: Uuid,
        options: &EntryListOptions,
        signal: Option<&CancellationSignal>,
    ) -> impl Stream<Item = ClientResult<ValidationEntry>> + Send + 'a {
        let resource = format!("{RESOURCE}/{id}/entries");
        let request = match &options.cursor {
            Some(cursor) => resume(&resource, cursor, options.limit),
            None => RestRequest::get(resource)
                .query_opt(
                    "status",
                    (!options.statuses.is_empty()).then(|| options.statuses.join(",")),
                )
                .query_opt("limit", options.limit),
        };
        paginate(self.rest, request, signal.cloned())
    }

    /// Poll until the job is terminal, the policy says stop, or it vanishes.
    async fn poll_until_done<S, F, Fut>(
        &self,
        mut current: S,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
        fetch: F,
    ) -> ClientResult<Option<S>>
    where
        S: JobSnapshot,
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<Option<S>>>,
    {
        loop {
            let overview = current.overview();
            if overview.status.is_terminal() || !policy.wait_for_completion {
                return Ok(Some(current));
            }
            if let Some(progress) = &policy.progress {
                progress(overview);
            }
            self.waiter.wait(overview, signal).await?;

            match fetch().await? {
                Some(next) => {
                    metrics::record_poll(next.overview().status.as_str());
                    current = next;
                }
                None => {
                    metrics::record_poll("gone");
                    tracing::info!(job_id = %overview.id, "Validation job vanished while polling");
                    return Ok(None);
                }
            }
        }
    }

    async fn fetch_snapshot(
        &self,
        id: Uuid,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<ValidationSnapshot>> {
        let request = RestRequest::get(format!("{RESOURCE}/{id}"))
            .query_opt("waitTime", wait_time(policy, policy.poll_wait_time));
        let outcome = self.rest.invoke(&request, signal).await?;
        read_job(outcome).await
    }

    async fn fetch_overview(
        &self,
        id: Uuid,
        policy: &WaitPolicy,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Option<ValidationOverview>> {
        let request = RestRequest::get(format!("{RESOURCE}/{id}/overview"))
            .query_opt("waitTime", wait_time(policy, policy.poll_wait_time));
        let outcome = self.rest.invoke(&request, signal).await?;
        read_job(outcome).await
    }

    /// Follow the entry cursor of a completed job until every entry is in.
    async fn assemble(
        &self,
        snapshot: ValidationSnapshot,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<Validation> {
        let ValidationSnapshot { overview, entries } = snapshot;
        let Some(segment) = entries else {
            return Ok(Validation {
                overview,
                entries: Vec::new(),
            });
        };

        let cursor = segment.next_cursor().map(str::to_owned);
        let mut collected = segment.data;
        if let Some(cursor) = cursor {
            let first = RestRequest::get(format!("{RESOURCE}/{}/entries", overview.id));
            let rest_of: Vec<ValidationEntry> =
                paginate(self.rest, next_page(&first, &cursor), signal.cloned())
                    .try_collect()
                    .await?;
            tracing::debug!(
                job_id = %overview.id,
                fetched = rest_of.len(),
                "Fetched remaining entries"
            );
            collected.extend(rest_of);
        }

        Ok(Validation {
            overview,
            entries: collected,
        })
    }
}

/// Milliseconds the service may hold the response, when the policy waits.
fn wait_time(policy: &WaitPolicy, wait: Duration) -> Option<u128> {
    (policy.wait_for_completion && !wait.is_zero()).then(|| wait.as_millis())
}

fn resume(resource: &str, cursor: &str, limit: Option<u32>) -> RestRequest {
    RestRequest::get(resource)
        .query("cursor", cursor)
        .query_opt("limit", limit)
}

/// 200/202 carry the job; 404/410 mean it is gone.
async fn read_job<T: serde::de::DeserializeOwned>(outcome: RestOutcome) -> ClientResult<Option<T>> {
    match outcome.status() {
        StatusCode::OK | StatusCode::ACCEPTED => outcome.deserialize().await.map(Some),
        StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
        _ => Err(outcome.into_error().await),
    }
}
