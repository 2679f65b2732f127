use std::collections::{BTreeMap, BTreeSet};

use super::model::{CampaignDimension, Dataset, Dimension, TabularRecord};
use super::month::Month;

// ---------------------------------------------------------------------------
// MonthRange – inclusive, optionally open-ended
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthRange {
    pub start: Option<Month>,
    pub end: Option<Month>,
}

impl MonthRange {
    pub fn new(start: Option<Month>, end: Option<Month>) -> Self {
        MonthRange { start, end }
    }

    pub fn contains(&self, month: Month) -> bool {
        self.start.map_or(true, |s| s <= month) && self.end.map_or(true, |e| month <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Start after end: no month is contained.
    pub fn is_reversed(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

// ---------------------------------------------------------------------------
// FilterState – which values are allowed per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection state plus a month range.
///
/// A dimension that is absent, or whose set is empty, is unrestricted.
/// Active dimensions are combined with logical AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<D: Ord> {
    pub selected: BTreeMap<D, BTreeSet<String>>,
    pub months: MonthRange,
}

impl<D: Ord> Default for FilterState<D> {
    fn default() -> Self {
        FilterState {
            selected: BTreeMap::new(),
            months: MonthRange::default(),
        }
    }
}

pub type ListeningFilter = FilterState<Dimension>;
pub type CampaignFilter = FilterState<CampaignDimension>;

impl<D: Ord + Copy> FilterState<D> {
    /// Whether `record` passes every active predicate.
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: TabularRecord<Dimension = D>,
    {
        self.months.contains(record.month())
            && self.selected.iter().all(|(dim, allowed)| {
                allowed.is_empty() || allowed.contains(&*record.key(*dim))
            })
    }

    /// Whether no predicate is active at all.
    pub fn is_unrestricted(&self) -> bool {
        self.months.is_unbounded() && self.selected.values().all(BTreeSet::is_empty)
    }

    pub fn is_selected(&self, dimension: D, value: &str) -> bool {
        self.selected
            .get(&dimension)
            .is_some_and(|set| set.contains(value))
    }

    /// The allowed values of `dimension`; empty means unrestricted.
    pub fn selection(&self, dimension: D) -> impl Iterator<Item = &str> {
        self.selected
            .get(&dimension)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Add `value` to the selection if absent, remove it otherwise.
    pub fn toggle(&mut self, dimension: D, value: &str) {
        let set = self.selected.entry(dimension).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    pub fn select(&mut self, dimension: D, values: impl IntoIterator<Item = impl Into<String>>) {
        self.selected
            .entry(dimension)
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Drop every selection in `dimension`, which lifts its restriction.
    pub fn clear(&mut self, dimension: D) {
        self.selected.remove(&dimension);
    }

    pub fn set_months(&mut self, months: MonthRange) {
        self.months = months;
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.months = MonthRange::default();
    }
}

// ---------------------------------------------------------------------------
// Applying a filter
// ---------------------------------------------------------------------------

/// The records that pass `filter`, in input order.
///
/// Pure and idempotent: `apply(apply(x, f), f) == apply(x, f)`.
pub fn apply<'a, R, I>(records: I, filter: &FilterState<R::Dimension>) -> Vec<&'a R>
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records.into_iter().filter(|r| filter.matches(*r)).collect()
}

/// Indices into `dataset.records` of every record that passes `filter`.
pub fn filtered_indices<R: TabularRecord>(
    dataset: &Dataset<R>,
    filter: &FilterState<R::Dimension>,
) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| filter.matches(*r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::listen;
    use crate::data::model::{ListeningRecord, SubscriptionTier::*};

    fn sample() -> Vec<ListeningRecord> {
        vec![
            listen("Nova", "Pop", "Europe", Free, "2024-01", 10),
            listen("Nova", "Pop", "LATAM", Premium, "2024-02", 20),
            listen("Dune", "Rock", "Europe", Premium, "2024-03", 5),
        ]
    }

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn genre_filter_keeps_matching_rows() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Genre, ["Pop"]);

        let pop = apply(&records, &filter);
        assert_eq!(pop.len(), 2);
        assert!(pop.iter().all(|r| r.genre == "Pop"));
    }

    #[test]
    fn empty_selection_is_no_restriction() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        assert!(filter.is_unrestricted());
        assert_eq!(apply(&records, &filter).len(), 3);

        filter.select(Dimension::Region, Vec::<String>::new());
        assert!(filter.is_unrestricted());
        assert_eq!(apply(&records, &filter).len(), 3);

        filter.toggle(Dimension::Region, "Europe");
        filter.toggle(Dimension::Region, "Europe");
        assert_eq!(apply(&records, &filter).len(), 3);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Region, ["Europe"]);
        filter.select(Dimension::Tier, ["Premium"]);

        let hits = apply(&records, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].artist, "Dune");
    }

    #[test]
    fn month_range_is_inclusive() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        filter.set_months(MonthRange::new(Some(month("2024-02")), Some(month("2024-03"))));
        assert_eq!(apply(&records, &filter).len(), 2);

        filter.set_months(MonthRange::new(None, Some(month("2024-01"))));
        assert_eq!(apply(&records, &filter).len(), 1);

        let reversed = MonthRange::new(Some(month("2024-03")), Some(month("2024-01")));
        assert!(reversed.is_reversed());
        assert!(!MonthRange::new(Some(month("2024-01")), None).is_reversed());
        filter.set_months(reversed);
        assert!(apply(&records, &filter).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Genre, ["Pop", "Rock"]);
        filter.select(Dimension::Tier, ["Premium"]);
        filter.set_months(MonthRange::new(Some(month("2024-02")), None));

        let once = apply(&records, &filter);
        let twice = apply(once.iter().copied(), &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_match_is_an_empty_view() {
        let records = sample();
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Genre, ["Jazz"]);
        assert!(apply(&records, &filter).is_empty());
    }

    #[test]
    fn indices_follow_dataset_order() {
        let ds = Dataset::from_records(sample());
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Artist, ["Nova"]);
        assert_eq!(filtered_indices(&ds, &filter), [0, 1]);

        filter.clear(Dimension::Artist);
        assert_eq!(filtered_indices(&ds, &filter), [0, 1, 2]);
    }
}
