use crate::reader::{SegmentReader, Searcher};

use super::doc_iterator::{DocIterator, EmptyDocIterator, PostingsDocIterator};
use super::filter::{attach_scorers, FilterClause, PreparedQuery};
use super::order::{Boost, PreparedOrder, NO_BOOST};

/// Matches the documents whose `field` contains exactly `term`.
///
/// An empty field name, an empty term, an unknown field or an unknown term
/// all execute as the empty iterator; none of these is an error.
#[derive(Debug, Clone, Default)]
pub struct ByTerm {
    field: String,
    term: Vec<u8>,
    boost: Boost,
}

impl ByTerm {
    pub fn new() -> ByTerm {
        ByTerm::default()
    }

    pub fn field(mut self, field: impl Into<String>) -> ByTerm {
        self.field = field.into();
        self
    }

    pub fn term(mut self, term: impl Into<Vec<u8>>) -> ByTerm {
        self.term = term.into();
        self
    }

    pub fn with_boost(mut self, boost: Boost) -> ByTerm {
        self.boost = boost;
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn term_bytes(&self) -> &[u8] {
        &self.term
    }
}

/// Term filters are equal when field and term agree; boost does not take
/// part in a filter's identity.
impl PartialEq for ByTerm {
    fn eq(&self, other: &ByTerm) -> bool {
        self.field == other.field && self.term == other.term
    }
}

impl FilterClause for ByTerm {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        if !self.field.is_empty() && !self.term.is_empty() {
            // feed term statistics to any collecting sorts
            for segment in searcher {
                if segment.field(&self.field).and_then(|f| f.postings(&self.term)).is_some() {
                    order.collect_term(segment, &self.field, &self.term);
                }
            }
        }
        Ok(Box::new(TermQuery {
            field: self.field.clone(),
            term: self.term.clone(),
            boost: self.boost,
        }))
    }
}

pub(crate) struct TermQuery {
    field: String,
    term: Vec<u8>,
    boost: Boost,
}

impl PreparedQuery for TermQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        if self.field.is_empty() || self.term.is_empty() {
            return Box::new(EmptyDocIterator);
        }
        let Some(field) = segment.field(&self.field) else {
            return Box::new(EmptyDocIterator);
        };
        let Some(postings) = field.postings(&self.term) else {
            return Box::new(EmptyDocIterator);
        };
        let it = Box::new(PostingsDocIterator::new(postings));
        attach_scorers(it, segment, order, self.boost)
    }
}
