//! The filter runtime: user filter → prepared query → per-segment document
//! iterator, with optional scoring through a prepared order.

pub mod boolean_filter;
pub mod branch;
pub mod doc_iterator;
mod error;
mod filter;
pub mod order;
pub mod range_filter;
pub mod term_filter;

pub use boolean_filter::{And, Not, Or};
pub use branch::{BranchBuilders, RangeBranchBuilder, RangeOperands, SimilarBranchBuilder};
pub use doc_iterator::{DocIterator, EmptyDocIterator};
pub use error::{QueryError, QueryErrorKind};
pub use filter::{All, CustomFilter, Empty, Filter, FilterClause, PreparedQuery, Proxy};
pub use order::{
    read_score, Boost, BoostSort, Collector, Features, Order, PreparedOrder, PreparedSort, Scorer,
    Sort, NO_BOOST,
};
pub use range_filter::{ByRange, TermBound};
pub use term_filter::ByTerm;
