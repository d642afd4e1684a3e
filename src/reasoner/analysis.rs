use std::collections::HashSet;

use crate::core::types::{CaseEvent, ChronologyAnalysis};
use crate::reasoner::assembler::dedupe_parties;

/// Consecutive dated events further apart than this are flagged as a gap.
pub const GAP_THRESHOLD_DAYS: i64 = 30;

/// Deterministic findings computed from sorted events.
pub fn analyze(events: &[CaseEvent]) -> ChronologyAnalysis {
    let mut analysis = ChronologyAnalysis::default();

    let dated: Vec<_> = events.iter().filter_map(|event| event.date).collect();
    for pair in dated.windows(2) {
        let gap_days = (pair[1] - pair[0]).num_days();
        if gap_days > GAP_THRESHOLD_DAYS {
            analysis.potential_gaps.push(format!(
                "Gap of {gap_days} days between events on {} and {}",
                pair[0].format("%Y-%m-%d"),
                pair[1].format("%Y-%m-%d")
            ));
        }
    }

    let undated = events.iter().filter(|event| event.date.is_none()).count();
    if undated > 0 {
        analysis.recommendations.push(format!(
            "Found {undated} events with missing dates. Consider reviewing source documents."
        ));
    }

    let mut parties = dedupe_parties(events.iter().flat_map(|event| event.parties.iter()));
    parties.sort_by_key(|name| name.to_lowercase());
    if !parties.is_empty() {
        analysis
            .key_observations
            .push(format!("Key parties involved: {}", parties.join(", ")));
    }

    analysis
}

/// Model findings first, local findings appended, exact repeats dropped.
pub fn merge_analysis(model: ChronologyAnalysis, local: ChronologyAnalysis) -> ChronologyAnalysis {
    ChronologyAnalysis {
        key_observations: merge_lists(model.key_observations, local.key_observations),
        potential_gaps: merge_lists(model.potential_gaps, local.potential_gaps),
        recommendations: merge_lists(model.recommendations, local.recommendations),
    }
}

fn merge_lists(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
