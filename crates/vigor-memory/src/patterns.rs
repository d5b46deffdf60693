//! Pattern analysis over aggregated user profiles.
//!
//! Summaries are recomputed from the aggregate on every request. Ties for
//! "most frequent" resolve to the lexicographically smallest key so the
//! projection is deterministic.

use std::collections::BTreeMap;
use vigor_core::{PatternSummary, UserProfile};

/// Project a profile into the summary handed to agents as context.
///
/// `trend_window` bounds how many of the newest score observations feed
/// the moving average.
pub fn compute_patterns(profile: &UserProfile, trend_window: usize) -> PatternSummary {
    PatternSummary {
        total_interactions: profile.total_interactions(),
        exercise_frequency: profile.exercise_frequency.clone(),
        favorite_exercise: most_frequent(&profile.exercise_frequency),
        score_trend: moving_average(profile, trend_window),
        common_mood: most_frequent(&profile.mood_counts),
    }
}

/// Highest-count key; first in key order wins a tie.
fn most_frequent(counts: &BTreeMap<String, u32>) -> Option<String> {
    counts
        .iter()
        .fold(None::<(&String, u32)>, |best, (key, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((key, count)),
        })
        .map(|(key, _)| key.clone())
}

fn moving_average(profile: &UserProfile, trend_window: usize) -> Option<f64> {
    if profile.score_trend.is_empty() || trend_window == 0 {
        return None;
    }
    let start = profile.score_trend.len().saturating_sub(trend_window);
    let window = &profile.score_trend[start..];
    Some(window.iter().map(|p| p.score).sum::<f64>() / window.len() as f64)
}
