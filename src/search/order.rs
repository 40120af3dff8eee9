use std::ops::Range;

use ordered_float::OrderedFloat;

use crate::reader::SegmentReader;
use crate::DocId;

/// Scalar multiplier carried by a filter into the scores of its matches.
pub type Boost = f32;

/// The boost of a filter nobody boosted.
pub const NO_BOOST: Boost = 0.0;

/// Features a scorer asks the index to provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub frequency: bool,
    pub position: bool,
}

impl Features {
    pub const NONE: Features = Features { frequency: false, position: false };
}

/// Emits one score into a caller-owned byte slot.
pub trait Scorer: Send {
    fn score(&mut self, doc: DocId, out: &mut [u8]);
}

/// Per-query hook fed with the terms a query resolved during prepare;
/// frequency-style sorts gather their corpus statistics here.
pub trait Collector: Send {
    fn collect_term(&mut self, segment: &SegmentReader, field: &str, term: &[u8]);
}

/// A prepared scorer descriptor: the capability set one sort contributes to
/// a prepared order.
pub trait PreparedSort: Send + Sync {
    fn features(&self) -> Features {
        Features::NONE
    }

    /// Per-query statistics hook; `None` when the sort needs none.
    fn collector(&self) -> Option<Box<dyn Collector>> {
        None
    }

    /// Builds the per-segment scorer. `boost` is the prepared query's boost.
    fn scorer(&self, segment: &SegmentReader, boost: Boost) -> Box<dyn Scorer>;

    /// Bytes this sort occupies inside a score slot.
    fn score_size(&self) -> usize;

    /// Strict weak order over two slots of this sort.
    fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool;
}

/// A sort descriptor as added by the user; `prepare` derives the runnable
/// form.
pub trait Sort: Send + Sync {
    fn prepare(&self) -> Box<dyn PreparedSort>;
}

/// An ordered composition of sorts. Empty means unordered: execution skips
/// scoring entirely.
#[derive(Default)]
pub struct Order {
    sorts: Vec<Box<dyn Sort>>,
}

impl Order {
    pub fn new() -> Order {
        Order::default()
    }

    pub fn add<S: Sort + Default + 'static>(&mut self) -> &mut Order {
        self.sorts.push(Box::<S>::default());
        self
    }

    pub fn add_sort(&mut self, sort: Box<dyn Sort>) -> &mut Order {
        self.sorts.push(sort);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    pub fn prepare(&self) -> PreparedOrder {
        let sorts: Vec<Box<dyn PreparedSort>> =
            self.sorts.iter().map(|sort| sort.prepare()).collect();
        let mut offsets = Vec::with_capacity(sorts.len());
        let mut size = 0;
        for sort in &sorts {
            offsets.push(size..size + sort.score_size());
            size += sort.score_size();
        }
        PreparedOrder { sorts, offsets, size }
    }
}

/// A scorer bound to its byte range within the composite score slot.
pub struct ScorerSlot {
    pub scorer: Box<dyn Scorer>,
    pub range: Range<usize>,
}

/// The runnable form of an [`Order`]: prepared sorts with their slot
/// layout.
pub struct PreparedOrder {
    sorts: Vec<Box<dyn PreparedSort>>,
    offsets: Vec<Range<usize>>,
    size: usize,
}

impl PreparedOrder {
    /// The empty order: scoring disabled.
    pub fn unordered() -> PreparedOrder {
        PreparedOrder { sorts: Vec::new(), offsets: Vec::new(), size: 0 }
    }

    pub fn is_unordered(&self) -> bool {
        self.sorts.is_empty()
    }

    /// Total bytes of one score slot: the sum of the sort sizes.
    pub fn score_size(&self) -> usize {
        self.size
    }

    pub fn sorts(&self) -> &[Box<dyn PreparedSort>] {
        &self.sorts
    }

    /// Compares two composite slots; the first sort that differs decides.
    pub fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool {
        for (sort, range) in self.sorts.iter().zip(&self.offsets) {
            let (l, r) = (&lhs[range.clone()], &rhs[range.clone()]);
            if sort.less(l, r) {
                return true;
            }
            if sort.less(r, l) {
                return false;
            }
        }
        false
    }

    /// Instantiates every sort's scorer for one segment.
    pub(crate) fn scorers(&self, segment: &SegmentReader, boost: Boost) -> Vec<ScorerSlot> {
        self.sorts
            .iter()
            .zip(&self.offsets)
            .map(|(sort, range)| ScorerSlot {
                scorer: sort.scorer(segment, boost),
                range: range.clone(),
            })
            .collect()
    }

    /// Feeds a resolved `(field, term)` pair to every collecting sort.
    pub(crate) fn collect_term(&self, segment: &SegmentReader, field: &str, term: &[u8]) {
        for sort in &self.sorts {
            if let Some(mut collector) = sort.collector() {
                collector.collect_term(segment, field, term);
            }
        }
    }
}

/// Scores every match with the query's boost; the sort used to check boost
/// propagation end to end.
#[derive(Debug, Default)]
pub struct BoostSort;

struct PreparedBoostSort;

struct BoostScorer {
    boost: Boost,
}

impl Sort for BoostSort {
    fn prepare(&self) -> Box<dyn PreparedSort> {
        Box::new(PreparedBoostSort)
    }
}

impl PreparedSort for PreparedBoostSort {
    fn scorer(&self, _segment: &SegmentReader, boost: Boost) -> Box<dyn Scorer> {
        Box::new(BoostScorer { boost })
    }

    fn score_size(&self) -> usize {
        std::mem::size_of::<Boost>()
    }

    fn less(&self, lhs: &[u8], rhs: &[u8]) -> bool {
        OrderedFloat(read_score(lhs)) < OrderedFloat(read_score(rhs))
    }
}

impl Scorer for BoostScorer {
    fn score(&mut self, _doc: DocId, out: &mut [u8]) {
        out.copy_from_slice(&self.boost.to_le_bytes());
    }
}

/// Reads an f32 score back out of its slot.
pub fn read_score(slot: &[u8]) -> f32 {
    f32::from_le_bytes(slot.try_into().expect("score slot is 4 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_is_empty() {
        let prepared = PreparedOrder::unordered();
        assert!(prepared.is_unordered());
        assert_eq!(0, prepared.score_size());

        let mut order = Order::new();
        order.add::<BoostSort>();
        let prepared = order.prepare();
        assert!(!prepared.is_unordered());
        assert_eq!(4, prepared.score_size());
    }

    #[test]
    fn composite_less_uses_first_differing_sort() {
        let mut order = Order::new();
        order.add::<BoostSort>().add::<BoostSort>();
        let prepared = order.prepare();
        assert_eq!(8, prepared.score_size());

        let mut lhs = [0u8; 8];
        let mut rhs = [0u8; 8];
        lhs[0..4].copy_from_slice(&1.0f32.to_le_bytes());
        rhs[0..4].copy_from_slice(&1.0f32.to_le_bytes());
        lhs[4..8].copy_from_slice(&2.0f32.to_le_bytes());
        rhs[4..8].copy_from_slice(&5.0f32.to_le_bytes());

        assert!(prepared.less(&lhs, &rhs));
        assert!(!prepared.less(&rhs, &lhs));
        assert!(!prepared.less(&lhs, &lhs));
    }
}
