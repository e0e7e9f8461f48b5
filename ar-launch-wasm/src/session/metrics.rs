use super::SessionState;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Snapshot returned by [`ArSession::get_metrics`](super::ArSession::get_metrics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub state: SessionState,
    pub duration_ms: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub features_used: BTreeSet<String>,
}

/// Milliseconds from `start` to `end` (or `now` while running), rounded up.
///
/// Zero only when the session never became active. Once it has, the result is
/// at least 1 so that coarse clocks and clock skew cannot report an empty run.
pub(crate) fn duration_ms(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    let Some(start) = start else {
        return 0;
    };
    let elapsed = end.unwrap_or(now) - start;
    let whole = elapsed.num_milliseconds();
    let partial = elapsed - TimeDelta::milliseconds(whole) > TimeDelta::zero();
    (whole + i64::from(partial)).max(1)
}
