//! Repeated, strictly sequential probing and the statistics reduced from it.
use crate::client::{millis_since, Connector, RequestOutcome, Requester};
use crate::error::{Error, Result};
use crate::url::RequestTarget;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing::{debug, warn};

/// What a profile run does when a dial or TLS handshake fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialFailurePolicy {
    /// Abort the whole run with the connection error.
    FailFast,
    /// Record a failed outcome and carry on with the next request.
    RecordAndContinue,
}

impl Default for DialFailurePolicy {
    fn default() -> Self {
        DialFailurePolicy::FailFast
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub count: usize,
    pub fastest_millis: u64,
    pub slowest_millis: u64,
    /// Truncating integer mean.
    pub mean_millis: u64,
    /// `sorted[count / 2]`, no interpolation for even counts.
    pub median_millis: u64,
    pub smallest_bytes: usize,
    pub largest_bytes: usize,
    pub success_percent: f64,
    /// One entry per request in request order, empty for successes.
    pub error_codes: Vec<String>,
}

impl ProfileSummary {
    /// Returns `None` for an empty slice.
    pub fn from_outcomes(outcomes: &[RequestOutcome]) -> Option<Self> {
        let first = outcomes.first()?;
        let mut fastest_millis = first.elapsed_millis;
        let mut slowest_millis = first.elapsed_millis;
        let mut smallest_bytes = first.body_byte_count;
        let mut largest_bytes = first.body_byte_count;
        let mut total_millis: u128 = 0;
        let mut successes = 0usize;

        for outcome in outcomes {
            fastest_millis = fastest_millis.min(outcome.elapsed_millis);
            slowest_millis = slowest_millis.max(outcome.elapsed_millis);
            smallest_bytes = smallest_bytes.min(outcome.body_byte_count);
            largest_bytes = largest_bytes.max(outcome.body_byte_count);
            total_millis += u128::from(outcome.elapsed_millis);
            if outcome.succeeded {
                successes += 1;
            }
        }

        let count = outcomes.len();
        let mut sorted: Vec<u64> = outcomes.iter().map(|o| o.elapsed_millis).collect();
        sorted.sort_unstable();

        Some(ProfileSummary {
            count,
            fastest_millis,
            slowest_millis,
            mean_millis: (total_millis / count as u128) as u64,
            median_millis: sorted[count / 2],
            smallest_bytes,
            largest_bytes,
            success_percent: successes as f64 / count as f64 * 100.0,
            error_codes: outcomes
                .iter()
                .map(|o| o.error_code().to_owned())
                .collect(),
        })
    }
}

/// Sends `count` requests to `target` one after another and summarizes them.
///
/// With [`DialFailurePolicy::FailFast`] the first connection error is returned
/// and nothing is summarized.
pub fn profile<C: Connector>(
    requester: &Requester<C>,
    target: &RequestTarget,
    count: NonZeroUsize,
    policy: DialFailurePolicy,
) -> Result<ProfileSummary> {
    let mut outcomes = Vec::with_capacity(count.get());
    for index in 0..count.get() {
        let start = Instant::now();
        let outcome = match requester.execute(target, false) {
            Ok(outcome) => outcome,
            Err(e) => match policy {
                DialFailurePolicy::FailFast => return Err(e),
                DialFailurePolicy::RecordAndContinue => {
                    warn!(request = index, error = %e, "recording failed dial");
                    RequestOutcome::dial_failure(millis_since(start), &e)
                }
            },
        };
        debug!(
            request = index,
            elapsed_millis = outcome.elapsed_millis,
            bytes = outcome.body_byte_count,
            succeeded = outcome.succeeded,
            "request finished"
        );
        outcomes.push(outcome);
    }

    ProfileSummary::from_outcomes(&outcomes)
        .ok_or_else(|| Error::UnexpectedEof("profile finished without any requests".into()))
}
