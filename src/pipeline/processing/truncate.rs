//! As-of truncation.
//!
//! At the real time of `run_date` the figures for `run_date` itself are not yet
//! published, so a backtest run "as of" `run_date` may only see dates up to and
//! including the day before.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::CanonicalPanel;
use crate::observability::metrics;

/// Last date visible to a run as of `run_date`, or `None` if nothing can be visible
pub fn visibility_cutoff(run_date: NaiveDate) -> Option<NaiveDate> {
    run_date.pred_opt()
}

/// Keep exactly the rows with `date <= run_date - 1 day`, for every region.
///
/// An empty result is valid (e.g. a run date before the feed starts).
pub fn truncate(panel: &CanonicalPanel, run_date: NaiveDate) -> CanonicalPanel {
    let truncated = match visibility_cutoff(run_date) {
        Some(cutoff) => panel.filter(|key, _| key.date <= cutoff),
        None => CanonicalPanel::new(),
    };

    let dropped = panel.len() - truncated.len();
    metrics::truncate::rows_dropped(dropped);
    debug!(%run_date, kept = truncated.len(), dropped, "applied as-of truncation");
    truncated
}
