use std::collections::HashMap;

use crate::models::{AnalysisRecord, IndicatorDelta, IndicatorScore};

/// Pairs each current indicator with the score it had in the previous analysis,
/// matching by name rather than position. With no previous record every
/// previous/delta is `None`.
pub fn compute_deltas(
    current: &[IndicatorScore],
    previous: Option<&[IndicatorScore]>,
) -> Vec<IndicatorDelta> {
    let previous_by_name: HashMap<&str, i32> = previous
        .unwrap_or(&[])
        .iter()
        .map(|item| (item.name.as_str(), item.score))
        .collect();

    current
        .iter()
        .map(|item| {
            let prior = previous_by_name.get(item.name.as_str()).copied();
            IndicatorDelta {
                name: item.name.clone(),
                score: item.score,
                previous: prior,
                delta: prior.map(|previous_score| item.score - previous_score),
            }
        })
        .collect()
}

/// Overall-score movement between the latest two records, newest first.
pub fn overall_delta(records: &[AnalysisRecord]) -> Option<i32> {
    match records {
        [current, previous, ..] => Some(current.overall - previous.overall),
        _ => None,
    }
}
