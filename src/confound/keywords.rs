// Keyword tables for free-text note classification
//
// Plain data evaluated by one loop. Categories are tried in table order and
// the first hit wins, so a note mentioning both a flight and a hangover is
// counted once, as travel.

use super::ConfoundType;
use regex::{Regex, RegexBuilder};

/// Category keyword lists in evaluation order
pub const KEYWORD_TABLE: &[(ConfoundType, &[&str])] = &[
    (
        ConfoundType::Illness,
        &[
            "sick",
            "ill",
            "illness",
            "flu",
            "fever",
            "cold",
            "covid",
            "infection",
            "virus",
            "nausea",
            "migraine",
            "sore throat",
            "food poisoning",
        ],
    ),
    (
        ConfoundType::Travel,
        &[
            "travel",
            "traveling",
            "travelling",
            "flight",
            "flew",
            "red-eye",
            "jet lag",
            "jetlag",
            "jet-lagged",
            "airport",
            "hotel",
            "time zone",
            "road trip",
        ],
    ),
    (
        ConfoundType::Alcohol,
        &[
            "alcohol",
            "drinks",
            "drinking",
            "drank",
            "beer",
            "wine",
            "cocktail",
            "cocktails",
            "hungover",
            "hangover",
            "tipsy",
            "drunk",
        ],
    ),
    (
        ConfoundType::Stress,
        &[
            "stress",
            "stressed",
            "stressful",
            "anxious",
            "anxiety",
            "deadline",
            "overwhelmed",
            "argument",
            "panic",
            "burnout",
        ],
    ),
];

/// Compiled, case-insensitive, word-bounded matchers for [`KEYWORD_TABLE`]
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    categories: Vec<(ConfoundType, Regex)>,
}

impl KeywordMatcher {
    /// Compile the built-in table
    pub fn new() -> Result<Self, regex::Error> {
        Self::from_table(KEYWORD_TABLE)
    }

    /// Compile a custom table; order is preserved as the tie-break order
    pub fn from_table(table: &[(ConfoundType, &[&str])]) -> Result<Self, regex::Error> {
        let categories = table
            .iter()
            .map(|(category, words)| {
                let alternation = words
                    .iter()
                    .map(|w| regex::escape(w))
                    .collect::<Vec<_>>()
                    .join("|");
                let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
                    .case_insensitive(true)
                    .build()?;
                Ok((*category, regex))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { categories })
    }

    /// First category whose keywords appear in `text`
    pub fn classify(&self, text: &str) -> Option<ConfoundType> {
        self.categories
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(category, _)| *category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_category_notes() {
        let matcher = KeywordMatcher::new().unwrap();
        assert_eq!(matcher.classify("woke up hungover"), Some(ConfoundType::Alcohol));
        assert_eq!(matcher.classify("down with the flu"), Some(ConfoundType::Illness));
        assert_eq!(matcher.classify("red-eye flight to Boston"), Some(ConfoundType::Travel));
        assert_eq!(matcher.classify("big deadline at work"), Some(ConfoundType::Stress));
        assert_eq!(matcher.classify("great workout, slept well"), None);
    }

    #[test]
    fn test_classify_is_case_insensitive_and_word_bounded() {
        let matcher = KeywordMatcher::new().unwrap();
        assert_eq!(matcher.classify("FLU again"), Some(ConfoundType::Illness));
        // "fluid" and "billing" must not trigger illness
        assert_eq!(matcher.classify("drank more fluid"), Some(ConfoundType::Alcohol));
        assert_eq!(matcher.classify("billing day"), None);
    }

    #[test]
    fn test_first_category_in_table_order_wins() {
        let matcher = KeywordMatcher::new().unwrap();
        // Mentions travel, alcohol and stress; travel comes first in the table
        assert_eq!(
            matcher.classify("stressful flight, two beers at the airport"),
            Some(ConfoundType::Travel)
        );
        // Illness outranks everything
        assert_eq!(
            matcher.classify("hangover or flu, not sure"),
            Some(ConfoundType::Illness)
        );
    }

    #[test]
    fn test_custom_table_order() {
        let table: &[(ConfoundType, &[&str])] = &[
            (ConfoundType::Stress, &["work"]),
            (ConfoundType::Travel, &["work trip"]),
        ];
        let matcher = KeywordMatcher::from_table(table).unwrap();
        assert_eq!(matcher.classify("work trip"), Some(ConfoundType::Stress));
    }
}
