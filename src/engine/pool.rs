use std::collections::HashSet;

use crate::corpus::{FREQUENCY_BANDS, Item, Tier};

/// Active filter dimensions. `None` means "all" for that dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub classification: Option<String>,
    pub complexity: Option<Tier>,
    pub frequency_band: Option<usize>,
}

impl FilterCriteria {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(ref tag) = self.classification
            && item.classification.as_deref() != Some(tag.as_str())
        {
            return false;
        }
        if let Some(tier) = self.complexity
            && item.complexity != Some(tier)
        {
            return false;
        }
        if let Some(band) = self.frequency_band
            && item.frequency_band() != Some(band)
        {
            return false;
        }
        true
    }
}

/// Filter the corpus, preserving source order. Same criteria over the same
/// corpus always yield the same sequence; nothing is shuffled.
pub fn filtered_pool(items: &[Item], criteria: &FilterCriteria) -> Vec<Item> {
    items
        .iter()
        .filter(|i| criteria.matches(i))
        .cloned()
        .collect()
}

/// Resolve the cursor to a presentable item. The cursor is normalized with
/// modulo; when `skip_mastered` is set, a circular linear probe of at most
/// `pool.len()` steps finds the first unmastered item. `None` means the pool
/// is empty or every item in it is mastered, a reportable state rather than a
/// fault. Returns the normalized pool position alongside the item.
pub fn next_valid<'a>(
    cursor: usize,
    pool: &'a [Item],
    mastered: &HashSet<String>,
    skip_mastered: bool,
) -> Option<(usize, &'a Item)> {
    if pool.is_empty() {
        return None;
    }
    let start = cursor % pool.len();
    if !skip_mastered {
        return Some((start, &pool[start]));
    }
    for step in 0..pool.len() {
        let pos = (start + step) % pool.len();
        if !mastered.contains(pool[pos].id()) {
            return Some((pos, &pool[pos]));
        }
    }
    None
}

/// Level implied by the filter criteria: tier index × band count + band
/// index + 1. Undefined when either dimension is "all" or nothing matches.
pub fn level_for(criteria: &FilterCriteria, pool_len: usize) -> Option<u32> {
    let tier = criteria.complexity?;
    let band = criteria.frequency_band?;
    if pool_len == 0 {
        return None;
    }
    Some((tier.index() * FREQUENCY_BANDS + band) as u32 + 1)
}
