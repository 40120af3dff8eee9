use std::ops::Bound;

use crate::reader::{SegmentReader, Searcher};
use crate::util::BitSet;

use super::doc_iterator::{BitSetDocIterator, DocIterator, EmptyDocIterator};
use super::filter::{attach_scorers, FilterClause, PreparedQuery};
use super::order::{Boost, PreparedOrder};

/// Matches the documents holding at least one term of `field` within the
/// requested byte range. Each endpoint is independently inclusive,
/// exclusive or absent.
#[derive(Debug, Clone, Default)]
pub struct ByRange {
    field: String,
    lower: TermBound,
    upper: TermBound,
    boost: Boost,
}

/// Range filters are equal when field and bounds agree; boost does not take
/// part in a filter's identity.
impl PartialEq for ByRange {
    fn eq(&self, other: &ByRange) -> bool {
        self.field == other.field && self.lower == other.lower && self.upper == other.upper
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TermBound {
    #[default]
    Unbounded,
    Inclusive(Vec<u8>),
    Exclusive(Vec<u8>),
}

impl TermBound {
    fn as_bound(&self) -> Bound<&[u8]> {
        match self {
            TermBound::Unbounded => Bound::Unbounded,
            TermBound::Inclusive(term) => Bound::Included(term.as_slice()),
            TermBound::Exclusive(term) => Bound::Excluded(term.as_slice()),
        }
    }
}

impl ByRange {
    pub fn new() -> ByRange {
        ByRange::default()
    }

    pub fn field(mut self, field: impl Into<String>) -> ByRange {
        self.field = field.into();
        self
    }

    /// `term < x`
    pub fn gt(mut self, term: impl Into<Vec<u8>>) -> ByRange {
        self.lower = TermBound::Exclusive(term.into());
        self
    }

    /// `term <= x`
    pub fn ge(mut self, term: impl Into<Vec<u8>>) -> ByRange {
        self.lower = TermBound::Inclusive(term.into());
        self
    }

    /// `x < term`
    pub fn lt(mut self, term: impl Into<Vec<u8>>) -> ByRange {
        self.upper = TermBound::Exclusive(term.into());
        self
    }

    /// `x <= term`
    pub fn le(mut self, term: impl Into<Vec<u8>>) -> ByRange {
        self.upper = TermBound::Inclusive(term.into());
        self
    }

    pub fn with_boost(mut self, boost: Boost) -> ByRange {
        self.boost = boost;
        self
    }
}

impl FilterClause for ByRange {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        _searcher: &Searcher,
        _order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        Ok(Box::new(RangeQuery {
            field: self.field.clone(),
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            boost: self.boost,
        }))
    }
}

struct RangeQuery {
    field: String,
    lower: TermBound,
    upper: TermBound,
    boost: Boost,
}

impl PreparedQuery for RangeQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        if self.field.is_empty() {
            return Box::new(EmptyDocIterator);
        }
        let Some(field) = segment.field(&self.field) else {
            return Box::new(EmptyDocIterator);
        };
        if let (
            TermBound::Exclusive(lower) | TermBound::Inclusive(lower),
            TermBound::Exclusive(upper) | TermBound::Inclusive(upper),
        ) = (&self.lower, &self.upper)
        {
            let both_inclusive = matches!(
                (&self.lower, &self.upper),
                (TermBound::Inclusive(_), TermBound::Inclusive(_))
            );
            // BTreeMap::range rejects inverted and degenerate bounds
            if lower > upper || (lower == upper && !both_inclusive) {
                return Box::new(EmptyDocIterator);
            }
        }

        // collapse the postings of every in-range term into one document set
        let mut bits = BitSet::new(segment.docs_count() as usize + 1);
        for (_term, postings) in field.terms_range(self.lower.as_bound(), self.upper.as_bound()) {
            for &doc in postings {
                bits.set(doc as usize);
            }
        }
        let it = Box::new(BitSetDocIterator::new(bits));
        attach_scorers(it, segment, order, self.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_default_to_unbounded() {
        let range = ByRange::new().field("name");
        assert_eq!(TermBound::Unbounded, range.lower);
        assert_eq!(TermBound::Unbounded, range.upper);
    }

    #[test]
    fn equality_over_field_and_bounds() {
        let a = ByRange::new().field("name").gt(b"A".to_vec()).le(b"C".to_vec());
        let b = ByRange::new().field("name").gt(b"A".to_vec()).le(b"C".to_vec());
        assert_eq!(a, b);
        assert_ne!(a, ByRange::new().field("name").ge(b"A".to_vec()).le(b"C".to_vec()));
    }

    mod sequential {
        use crate::search::branch::{BranchBuilders, RangeOperands};
        use crate::search::range_filter::ByRange;
        use crate::search::term_filter::ByTerm;
        use crate::test_fixtures::{check_query, open_simple_sequential};
        use crate::DocId;

        #[test]
        fn endpoint_inclusivity() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();

            // (A, C) -> B
            check_query(
                &searcher,
                &ByRange::new().field("name").gt(b"A".to_vec()).lt(b"C".to_vec()).into(),
                &[2],
            );
            // (A, B] -> B
            check_query(
                &searcher,
                &ByRange::new().field("name").gt(b"A".to_vec()).le(b"B".to_vec()).into(),
                &[2],
            );
            // [A, B) -> A
            check_query(
                &searcher,
                &ByRange::new().field("name").ge(b"A".to_vec()).lt(b"B".to_vec()).into(),
                &[1],
            );
            // [A, B] -> A, B
            check_query(
                &searcher,
                &ByRange::new().field("name").ge(b"A".to_vec()).le(b"B".to_vec()).into(),
                &[1, 2],
            );
        }

        #[test]
        fn half_open_ranges() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();

            // name > M: N..Z (the symbol names sort below the letters)
            let expected: Vec<DocId> = (14..=26).collect();
            check_query(&searcher, &ByRange::new().field("name").gt(b"M".to_vec()).into(), &expected);

            // name >= M: M..Z
            let expected: Vec<DocId> = (13..=26).collect();
            check_query(&searcher, &ByRange::new().field("name").ge(b"M".to_vec()).into(), &expected);

            // name <= N: A..N plus every symbol name
            let mut expected: Vec<DocId> = (1..=14).collect();
            expected.extend(27..=32);
            check_query(&searcher, &ByRange::new().field("name").le(b"N".to_vec()).into(), &expected);

            // name < N: A..M plus every symbol name
            let mut expected: Vec<DocId> = (1..=13).collect();
            expected.extend(27..=32);
            check_query(&searcher, &ByRange::new().field("name").lt(b"N".to_vec()).into(), &expected);
        }

        #[test]
        fn degenerate_ranges_are_empty() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();

            check_query(
                &searcher,
                &ByRange::new().field("name").gt(b"C".to_vec()).lt(b"A".to_vec()).into(),
                &[],
            );
            check_query(
                &searcher,
                &ByRange::new().field("name").gt(b"A".to_vec()).lt(b"A".to_vec()).into(),
                &[],
            );
            check_query(
                &searcher,
                &ByRange::new().field("missing").ge(b"A".to_vec()).le(b"Z".to_vec()).into(),
                &[],
            );
        }

        #[test]
        fn default_branch_builders_drive_ranges() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();
            let builders = BranchBuilders::new();

            let operands = RangeOperands { min: b"A", max: b"C" };
            let filter = builders.build_range("name", &operands, false, false).unwrap();
            check_query(&searcher, &filter, &[2]);

            let operands = RangeOperands { min: b"A", max: b"B" };
            let filter = builders.build_range("name", &operands, true, true).unwrap();
            check_query(&searcher, &filter, &[1, 2]);
        }

        #[test]
        fn custom_branch_builder_overrides_outcome() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();

            let mut builders = BranchBuilders::new();
            builders.range_open_open = std::sync::Arc::new(|field, operands| {
                Some(ByTerm::new().field(field).term(operands.min.to_vec()).into())
            });

            // (A, B) now matches A instead of the open range
            let operands = RangeOperands { min: b"A", max: b"B" };
            let filter = builders.build_range("name", &operands, false, false).unwrap();
            check_query(&searcher, &filter, &[1]);
        }

        #[test]
        fn similar_operator_matches_term() {
            let fixture = open_simple_sequential();
            let searcher = fixture.searcher();
            let builders = BranchBuilders::new();

            let filter = builders.build_similar("name", b"B").unwrap();
            check_query(&searcher, &filter, &[2]);
        }
    }
}
