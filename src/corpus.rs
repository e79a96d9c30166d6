use serde::{Deserialize, Serialize};

const VOCAB_KO: &str = include_str!("../assets/vocab-ko.json");

/// Frequency ranks are sliced into 1000-rank bands over the 6000-word list.
pub const FREQUENCY_BANDS: usize = 6;
const BAND_WIDTH: u32 = 1000;

/// Ordered complexity tier from the TOPIK classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::A, Tier::B, Tier::C];

    pub fn index(self) -> usize {
        match self {
            Tier::A => 0,
            Tier::B => 1,
            Tier::C => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        }
    }
}

/// One vocabulary entry. Immutable once loaded; the word's hangul form is
/// its identity throughout the store and the learning sets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(alias = "korean")]
    pub hangul: String,
    #[serde(alias = "en")]
    pub gloss_en: String,
    #[serde(default, alias = "zh")]
    pub gloss_zh: Option<String>,
    #[serde(default)]
    pub hanja: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub frequency: Option<u32>,
    #[serde(default)]
    pub complexity: Option<Tier>,
}

impl Item {
    pub fn id(&self) -> &str {
        &self.hangul
    }

    pub fn frequency_band(&self) -> Option<usize> {
        self.frequency
            .map(|f| ((f.saturating_sub(1) / BAND_WIDTH) as usize).min(FREQUENCY_BANDS - 1))
    }
}

pub struct Corpus {
    items: Vec<Item>,
}

impl Corpus {
    pub fn load() -> Self {
        // The corpus is embedded at compile time; a parse failure is a build
        // defect, not a runtime condition to soften.
        let items: Vec<Item> =
            serde_json::from_str(VOCAB_KO).expect("embedded vocabulary corpus is valid JSON");
        // An entry without a typable form can never be presented.
        let items = items.into_iter().filter(|i| !i.hangul.is_empty()).collect();
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Distinct classification tags in first-seen (corpus) order.
    pub fn classifications(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            if let Some(ref tag) = item.classification
                && !seen.contains(tag)
            {
                seen.push(tag.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_loads_and_preserves_order() {
        let corpus = Corpus::load();
        assert!(!corpus.items().is_empty());
        // Embedded list is frequency-ordered; loading must not reorder it.
        let freqs: Vec<u32> = corpus
            .items()
            .iter()
            .take(10)
            .filter_map(|i| i.frequency)
            .collect();
        let mut sorted = freqs.clone();
        sorted.sort_unstable();
        assert_eq!(freqs, sorted);
    }

    #[test]
    fn frequency_band_slices_by_thousand() {
        let mut item = Item {
            hangul: "물".to_string(),
            gloss_en: "water".to_string(),
            gloss_zh: None,
            hanja: None,
            classification: None,
            frequency: Some(1),
            complexity: None,
        };
        assert_eq!(item.frequency_band(), Some(0));
        item.frequency = Some(1000);
        assert_eq!(item.frequency_band(), Some(0));
        item.frequency = Some(1001);
        assert_eq!(item.frequency_band(), Some(1));
        item.frequency = Some(9999);
        assert_eq!(item.frequency_band(), Some(FREQUENCY_BANDS - 1));
        item.frequency = None;
        assert_eq!(item.frequency_band(), None);
    }

    #[test]
    fn classifications_distinct_in_corpus_order() {
        let corpus = Corpus::load();
        let tags = corpus.classifications();
        assert!(tags.contains(&"noun".to_string()));
        let mut deduped = tags.clone();
        deduped.dedup();
        assert_eq!(tags, deduped);
    }

    #[test]
    fn tier_order_matches_index() {
        assert!(Tier::A < Tier::B && Tier::B < Tier::C);
        assert_eq!(Tier::C.index(), 2);
    }
}
