use std::sync::Arc;

use super::error::QueryError;
use super::filter::Filter;
use super::range_filter::ByRange;
use super::term_filter::ByTerm;

/// Accessors over the two endpoint operands of a range expression.
pub struct RangeOperands<'a> {
    pub min: &'a [u8],
    pub max: &'a [u8],
}

/// Converts one range node into a filter. Returning `None` declines the
/// conversion and surfaces as a filter-conversion error naming the node.
pub type RangeBranchBuilder = Arc<dyn Fn(&str, &RangeOperands<'_>) -> Option<Filter> + Send + Sync>;

/// Converts one `~=` (similar) node into a filter.
pub type SimilarBranchBuilder = Arc<dyn Fn(&str, &[u8]) -> Option<Filter> + Send + Sync>;

/// The customization points a query front end may override: one builder per
/// endpoint-inclusivity combination, plus the similar operator.
///
/// The defaults produce range filters with the matching inclusivity and a
/// term filter for `~=`; a custom builder may substitute term filters or
/// arbitrary composites.
#[derive(Clone)]
pub struct BranchBuilders {
    /// `(a, b)`
    pub range_open_open: RangeBranchBuilder,
    /// `(a, b]`
    pub range_open_closed: RangeBranchBuilder,
    /// `[a, b)`
    pub range_closed_open: RangeBranchBuilder,
    /// `[a, b]`
    pub range_closed_closed: RangeBranchBuilder,
    /// `~=`
    pub similar: SimilarBranchBuilder,
}

impl Default for BranchBuilders {
    fn default() -> BranchBuilders {
        BranchBuilders {
            range_open_open: Arc::new(|field, operands| {
                Some(
                    ByRange::new()
                        .field(field)
                        .gt(operands.min.to_vec())
                        .lt(operands.max.to_vec())
                        .into(),
                )
            }),
            range_open_closed: Arc::new(|field, operands| {
                Some(
                    ByRange::new()
                        .field(field)
                        .gt(operands.min.to_vec())
                        .le(operands.max.to_vec())
                        .into(),
                )
            }),
            range_closed_open: Arc::new(|field, operands| {
                Some(
                    ByRange::new()
                        .field(field)
                        .ge(operands.min.to_vec())
                        .lt(operands.max.to_vec())
                        .into(),
                )
            }),
            range_closed_closed: Arc::new(|field, operands| {
                Some(
                    ByRange::new()
                        .field(field)
                        .ge(operands.min.to_vec())
                        .le(operands.max.to_vec())
                        .into(),
                )
            }),
            similar: Arc::new(|field, value| {
                Some(ByTerm::new().field(field).term(value.to_vec()).into())
            }),
        }
    }
}

impl BranchBuilders {
    pub fn new() -> BranchBuilders {
        BranchBuilders::default()
    }

    /// Builds the filter for a range node, dispatching on endpoint
    /// inclusivity. A declining builder produces a conversion error that
    /// names the node.
    pub fn build_range(
        &self,
        field: &str,
        operands: &RangeOperands<'_>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Filter, QueryError> {
        let builder = match (min_inclusive, max_inclusive) {
            (false, false) => &self.range_open_open,
            (false, true) => &self.range_open_closed,
            (true, false) => &self.range_closed_open,
            (true, true) => &self.range_closed_closed,
        };
        builder(field, operands).ok_or_else(|| {
            QueryError::filter_conversion(&range_node(field, operands, min_inclusive, max_inclusive))
        })
    }

    /// Builds the filter for a `field ~= value` node.
    pub fn build_similar(&self, field: &str, value: &[u8]) -> Result<Filter, QueryError> {
        (self.similar)(field, value).ok_or_else(|| {
            QueryError::filter_conversion(&format!(
                "('{field}' ~= '{}')",
                String::from_utf8_lossy(value)
            ))
        })
    }
}

fn range_node(
    field: &str,
    operands: &RangeOperands<'_>,
    min_inclusive: bool,
    max_inclusive: bool,
) -> String {
    format!(
        "('{field}' == {}'{}', '{}'{})",
        if min_inclusive { '[' } else { '(' },
        String::from_utf8_lossy(operands.min),
        String::from_utf8_lossy(operands.max),
        if max_inclusive { ']' } else { ')' },
    )
}
