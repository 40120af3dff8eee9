use std::fmt;
use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use once_cell::sync::Lazy;

use crate::reader::{SegmentReader, Searcher};

use super::boolean_filter::{And, Not, Or};
use super::doc_iterator::{AllDocIterator, DocIterator, EmptyDocIterator, ScoredDocIterator};
use super::order::{Boost, PreparedOrder, NO_BOOST};
use super::range_filter::ByRange;
use super::term_filter::ByTerm;

static UNORDERED: Lazy<PreparedOrder> = Lazy::new(PreparedOrder::unordered);

/// A filter compiled against one reader snapshot and one prepared order,
/// ready to execute against each of the snapshot's sub-readers.
///
/// Preparing is pure with respect to the reader: preparing the same filter
/// twice against the same snapshot yields equivalent prepared queries, and
/// iterators obtained from the same prepared query are independent of each
/// other.
pub trait PreparedQuery: Send + Sync {
    /// The query-level boost attribute.
    fn boost(&self) -> Boost;

    /// Runs the query over one segment without scoring.
    fn execute<'a>(&'a self, segment: &'a SegmentReader) -> Box<dyn DocIterator + 'a> {
        self.execute_with_order(segment, &UNORDERED)
    }

    /// Runs the query over one segment, scoring through `order` (which must
    /// be the order the filter was prepared with).
    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a>;
}

/// Attaches the order's scorers to `it` unless scoring is disabled.
pub(crate) fn attach_scorers<'a>(
    it: Box<dyn DocIterator + 'a>,
    segment: &SegmentReader,
    order: &PreparedOrder,
    boost: Boost,
) -> Box<dyn DocIterator + 'a> {
    if order.is_unordered() {
        it
    } else {
        Box::new(ScoredDocIterator::new(it, order.scorers(segment, boost)))
    }
}

/// Behavior shared by every filter kind.
#[enum_dispatch]
pub trait FilterClause {
    /// The filter's own boost; [`NO_BOOST`] unless set.
    fn boost(&self) -> Boost;

    /// Compiles the filter against a reader snapshot.
    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>>;
}

/// A user-constructed description of "which documents match".
///
/// The closed set of variants covers the built-in query shapes; [`Proxy`]
/// carries user extensions. Two filters of the same kind compare equal when
/// their matching criteria do (boost is not part of a filter's identity).
#[enum_dispatch(FilterClause)]
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    ByTerm,
    ByRange,
    And,
    Or,
    Not,
    All,
    Empty,
    Proxy,
}

/// Matches every document of every segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct All {
    boost: Boost,
}

impl All {
    pub fn new() -> All {
        All::default()
    }

    pub fn with_boost(mut self, boost: Boost) -> All {
        self.boost = boost;
        self
    }
}

impl FilterClause for All {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        _searcher: &Searcher,
        _order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        Ok(Box::new(AllQuery { boost: self.boost }))
    }
}

struct AllQuery {
    boost: Boost,
}

impl PreparedQuery for AllQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        let it = Box::new(AllDocIterator::new(segment.docs_count()));
        attach_scorers(it, segment, order, self.boost)
    }
}

/// Matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Empty;

impl Empty {
    pub fn new() -> Empty {
        Empty
    }
}

impl FilterClause for Empty {
    fn boost(&self) -> Boost {
        NO_BOOST
    }

    fn prepare(
        &self,
        _searcher: &Searcher,
        _order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        Ok(Box::new(EmptyQuery))
    }
}

pub(crate) struct EmptyQuery;

impl PreparedQuery for EmptyQuery {
    fn boost(&self) -> Boost {
        NO_BOOST
    }

    fn execute_with_order<'a>(
        &'a self,
        _segment: &'a SegmentReader,
        _order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        Box::new(EmptyDocIterator)
    }
}

/// A user-supplied filter implementation, dispatched through a shared
/// handle.
pub trait CustomFilter: Send + Sync + fmt::Debug {
    fn boost(&self) -> Boost {
        NO_BOOST
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>>;
}

/// Adapter hooking a [`CustomFilter`] into the closed filter set.
#[derive(Debug, Clone)]
pub struct Proxy {
    inner: Arc<dyn CustomFilter>,
}

impl Proxy {
    pub fn new(inner: Arc<dyn CustomFilter>) -> Proxy {
        Proxy { inner }
    }
}

/// Proxies are equal when they share the same underlying filter instance.
impl PartialEq for Proxy {
    fn eq(&self, other: &Proxy) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl FilterClause for Proxy {
    fn boost(&self) -> Boost {
        self.inner.boost()
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        self.inner.prepare(searcher, order)
    }
}
