//! Ordered, short-circuiting item filters.

use crate::harvest::HarvestStats;

/// A keep/discard predicate over raw items.
pub trait ItemFilter<T>: Send + Sync {
    /// Name used when counting discards.
    fn name(&self) -> &str;

    /// Returns true if the item should be kept.
    fn keep(&self, item: &T) -> bool;
}

/// Discards items whose field contains a keyword, ignoring case.
pub struct ExcludeKeyword<T> {
    name: String,
    keyword: String,
    field: fn(&T) -> &str,
}

impl<T> ExcludeKeyword<T> {
    pub fn new(name: impl Into<String>, keyword: &str, field: fn(&T) -> &str) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.to_uppercase(),
            field,
        }
    }
}

impl<T> ItemFilter<T> for ExcludeKeyword<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn keep(&self, item: &T) -> bool {
        self.keyword.is_empty() || !(self.field)(item).to_uppercase().contains(&self.keyword)
    }
}

/// Keeps only items whose field contains a substring (case-sensitive).
pub struct RequireSubstring<T> {
    name: String,
    needle: String,
    field: fn(&T) -> &str,
}

impl<T> RequireSubstring<T> {
    pub fn new(name: impl Into<String>, needle: &str, field: fn(&T) -> &str) -> Self {
        Self {
            name: name.into(),
            needle: needle.to_string(),
            field,
        }
    }
}

impl<T> ItemFilter<T> for RequireSubstring<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn keep(&self, item: &T) -> bool {
        (self.field)(item).contains(&self.needle)
    }
}

/// Filters evaluated in insertion order; the first failing filter discards
/// the item and the rest are skipped.
pub struct FilterChain<T> {
    filters: Vec<Box<dyn ItemFilter<T>>>,
}

impl<T> FilterChain<T> {
    /// A chain that keeps everything.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn with(mut self, filter: impl ItemFilter<T> + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Name of the first filter rejecting the item, or `None` if it survives.
    pub fn rejected_by(&self, item: &T) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| !filter.keep(item))
            .map(|filter| filter.name())
    }

    /// Apply the chain to a batch, counting discards in `stats`.
    pub fn apply(&self, items: Vec<T>, stats: &mut HarvestStats) -> Vec<T> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            stats.items_seen += 1;
            match self.rejected_by(&item) {
                Some(name) => stats.record_filtered(name),
                None => {
                    stats.items_kept += 1;
                    kept.push(item);
                }
            }
        }
        kept
    }
}

impl<T> Default for FilterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchItem;

    fn item(title: &str, road: &str) -> SearchItem {
        SearchItem {
            title: title.into(),
            road_address: road.into(),
            point: None,
        }
    }

    fn chain() -> FilterChain<SearchItem> {
        FilterChain::new()
            .with(ExcludeKeyword::new("atm", "ATM", |i: &SearchItem| {
                i.title.as_str()
            }))
            .with(RequireSubstring::new("region", "서울", |i: &SearchItem| {
                i.road_address.as_str()
            }))
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        let chain = chain();
        assert_eq!(
            chain.rejected_by(&item("신한은행 atm 코너", "서울 중구")),
            Some("atm")
        );
        assert_eq!(
            chain.rejected_by(&item("Atm 365", "서울 중구")),
            Some("atm")
        );
    }

    #[test]
    fn test_first_failing_filter_wins() {
        let chain = chain();
        let mut stats = HarvestStats::default();
        let kept = chain.apply(vec![item("ATM", "경기도 성남시")], &mut stats);

        assert!(kept.is_empty());
        assert_eq!(stats.filtered_by("atm"), 1);
        assert_eq!(stats.filtered_by("region"), 0);
    }

    #[test]
    fn test_region_filter() {
        let chain = chain();
        let mut stats = HarvestStats::default();
        let kept = chain.apply(
            vec![
                item("국민은행 강남점", "서울특별시 강남구 테헤란로 1"),
                item("국민은행 분당점", "경기도 성남시 분당구"),
                item("국민은행 무주소점", ""),
            ],
            &mut stats,
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "국민은행 강남점");
        assert_eq!(stats.items_seen, 3);
        assert_eq!(stats.items_kept, 1);
        assert_eq!(stats.filtered_by("region"), 2);
    }

    #[test]
    fn test_empty_chain_keeps_all() {
        let chain: FilterChain<SearchItem> = FilterChain::default();
        let mut stats = HarvestStats::default();
        assert_eq!(chain.apply(vec![item("a", "b")], &mut stats).len(), 1);
    }
}
