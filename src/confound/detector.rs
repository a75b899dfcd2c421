// The three confound detection strategies

use super::keywords::KeywordMatcher;
use super::{ConfoundType, Confounder};
use crate::model::{DailyNote, DateRange, Protocol};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pre-extracted confound on a given day, e.g. from a wearable's tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfoundEvent {
    pub date: NaiveDate,
    pub confound_type: ConfoundType,
}

/// Pre-period start, protocol start and end of observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub pre_start: NaiveDate,
    pub protocol_start: NaiveDate,
    pub end: NaiveDate,
}

impl ObservationWindow {
    pub fn full(&self) -> DateRange {
        DateRange::new(self.pre_start, self.end)
    }

    pub fn post_period(&self) -> DateRange {
        DateRange::new(self.protocol_start, self.end)
    }
}

/// Runs every detection strategy over one observation window
#[derive(Debug, Clone)]
pub struct ConfoundDetector {
    matcher: KeywordMatcher,
}

impl ConfoundDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: KeywordMatcher::new()?,
        })
    }

    pub fn with_matcher(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }

    /// Run all strategies and concatenate their findings
    pub fn detect(
        &self,
        window: &ObservationWindow,
        protocol_id: &str,
        notes: &[DailyNote],
        events: &[ConfoundEvent],
        protocols: &[Protocol],
    ) -> Vec<Confounder> {
        let mut confounders = self.detect_annotated(window, notes, events);
        confounders.extend(detect_seasonal_shift(window));
        confounders.extend(detect_protocol_overlap(window, protocol_id, protocols));

        tracing::debug!(
            count = confounders.len(),
            "confound detection complete"
        );
        confounders
    }

    /// Keyword strategy: one category per day, first assignment wins
    ///
    /// Notes are scanned in date order before pre-extracted events.
    pub fn detect_annotated(
        &self,
        window: &ObservationWindow,
        notes: &[DailyNote],
        events: &[ConfoundEvent],
    ) -> Vec<Confounder> {
        let range = window.full();
        let mut assigned: BTreeMap<NaiveDate, ConfoundType> = BTreeMap::new();

        let mut ordered_notes: Vec<&DailyNote> =
            notes.iter().filter(|n| range.contains(n.date)).collect();
        ordered_notes.sort_by_key(|n| n.date);

        for note in ordered_notes {
            if assigned.contains_key(&note.date) {
                continue;
            }
            if let Some(category) = self.matcher.classify(&note.text) {
                assigned.insert(note.date, category);
            }
        }

        for event in events.iter().filter(|e| range.contains(e.date)) {
            assigned.entry(event.date).or_insert(event.confound_type);
        }

        let mut by_category: BTreeMap<ConfoundType, Vec<NaiveDate>> = BTreeMap::new();
        for (date, category) in assigned {
            by_category.entry(category).or_default().push(date);
        }

        by_category
            .into_iter()
            .map(|(category, days)| Confounder::new(category_label(category), category, days))
            .collect()
    }
}

fn category_label(category: ConfoundType) -> String {
    match category {
        ConfoundType::Illness => "Illness".to_string(),
        ConfoundType::Travel => "Travel".to_string(),
        ConfoundType::Alcohol => "Alcohol".to_string(),
        ConfoundType::Stress => "Stress".to_string(),
        ConfoundType::Seasonal => "Seasonal shift".to_string(),
        ConfoundType::ProtocolOverlap => "Overlapping protocol".to_string(),
    }
}

/// Quarter bucket of the year: 0 = Jan-Mar ... 3 = Oct-Dec
pub fn season_index(date: NaiveDate) -> u32 {
    date.month0() / 3
}

/// Seasonal strategy: flags a season change between pre and post starts
///
/// The whole post-period is marked as affected.
pub fn detect_seasonal_shift(window: &ObservationWindow) -> Option<Confounder> {
    let before = season_index(window.pre_start);
    let after = season_index(window.protocol_start);
    if before == after {
        return None;
    }

    Some(Confounder::spanning(
        format!("Seasonal shift (Q{} to Q{})", before + 1, after + 1),
        ConfoundType::Seasonal,
        window.post_period(),
    ))
}

/// Overlap strategy: other protocols starting inside the observation window
pub fn detect_protocol_overlap(
    window: &ObservationWindow,
    protocol_id: &str,
    protocols: &[Protocol],
) -> Vec<Confounder> {
    let range = window.full();
    protocols
        .iter()
        .filter(|p| p.id != protocol_id && range.contains(p.start_date))
        .map(|p| {
            let end = p.end_date.map_or(window.end, |e| e.min(window.end));
            Confounder::spanning(
                format!("{}: {}", category_label(ConfoundType::ProtocolOverlap), p.name),
                ConfoundType::ProtocolOverlap,
                DateRange::new(p.start_date, end),
            )
        })
        .collect()
}
