use crate::reader::{SegmentReader, Searcher};
use crate::util::BitSet;
use crate::{DocId, DOC_EOF};

use super::doc_iterator::{BitSetDocIterator, DocIterator, EmptyDocIterator};
use super::filter::{attach_scorers, Filter, FilterClause, PreparedQuery};
use super::order::{Boost, PreparedOrder};

/// Intersection of its children: a document matches when every child
/// matches it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct And {
    filters: Vec<Filter>,
    boost: Boost,
}

impl And {
    pub fn new() -> And {
        And::default()
    }

    pub fn add(mut self, filter: impl Into<Filter>) -> And {
        self.filters.push(filter.into());
        self
    }

    pub fn with_boost(mut self, boost: Boost) -> And {
        self.boost = boost;
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FilterClause for And {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        let children = self
            .filters
            .iter()
            .map(|filter| filter.prepare(searcher, order))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Box::new(AndQuery { children, boost: self.boost }))
    }
}

/// Union of its children: a document matches when any child matches it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Or {
    filters: Vec<Filter>,
    boost: Boost,
}

impl Or {
    pub fn new() -> Or {
        Or::default()
    }

    pub fn add(mut self, filter: impl Into<Filter>) -> Or {
        self.filters.push(filter.into());
        self
    }

    pub fn with_boost(mut self, boost: Boost) -> Or {
        self.boost = boost;
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FilterClause for Or {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        let children = self
            .filters
            .iter()
            .map(|filter| filter.prepare(searcher, order))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Box::new(OrQuery { children, boost: self.boost }))
    }
}

/// Complement of its child within each sub-reader's document universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    filter: Box<Filter>,
    boost: Boost,
}

impl Not {
    pub fn new(filter: impl Into<Filter>) -> Not {
        Not { filter: Box::new(filter.into()), boost: Boost::default() }
    }

    pub fn with_boost(mut self, boost: Boost) -> Not {
        self.boost = boost;
        self
    }
}

impl FilterClause for Not {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn prepare(
        &self,
        searcher: &Searcher,
        order: &PreparedOrder,
    ) -> crate::Result<Box<dyn PreparedQuery>> {
        let child = self.filter.prepare(searcher, order)?;
        Ok(Box::new(NotQuery { child, boost: self.boost }))
    }
}

struct AndQuery {
    children: Vec<Box<dyn PreparedQuery>>,
    boost: Boost,
}

impl PreparedQuery for AndQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        if self.children.is_empty() {
            return Box::new(EmptyDocIterator);
        }
        let children: Vec<Box<dyn DocIterator + 'a>> =
            self.children.iter().map(|child| child.execute(segment)).collect();
        let it = Box::new(ConjunctionDocIterator::new(children));
        attach_scorers(it, segment, order, self.boost)
    }
}

struct OrQuery {
    children: Vec<Box<dyn PreparedQuery>>,
    boost: Boost,
}

impl PreparedQuery for OrQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        if self.children.is_empty() {
            return Box::new(EmptyDocIterator);
        }
        let children: Vec<Box<dyn DocIterator + 'a>> =
            self.children.iter().map(|child| child.execute(segment)).collect();
        let it = Box::new(DisjunctionDocIterator::new(children));
        attach_scorers(it, segment, order, self.boost)
    }
}

struct NotQuery {
    child: Box<dyn PreparedQuery>,
    boost: Boost,
}

impl PreparedQuery for NotQuery {
    fn boost(&self) -> Boost {
        self.boost
    }

    fn execute_with_order<'a>(
        &'a self,
        segment: &'a SegmentReader,
        order: &'a PreparedOrder,
    ) -> Box<dyn DocIterator + 'a> {
        // materialize the excluded set, then walk the complement
        let universe = segment.docs_count() as usize;
        let mut excluded = BitSet::new(universe + 1);
        let mut child = self.child.execute(segment);
        while child.next() {
            excluded.set(child.value() as usize);
        }

        let mut complement = BitSet::new(universe + 1);
        for doc in 1..=universe {
            if !excluded.test(doc) {
                complement.set(doc);
            }
        }
        let it = Box::new(BitSetDocIterator::new(complement));
        attach_scorers(it, segment, order, self.boost)
    }
}

/// Union in doc-id order; children advance through `seek`.
pub struct DisjunctionDocIterator<'a> {
    children: Vec<Box<dyn DocIterator + 'a>>,
    current: DocId,
}

impl<'a> DisjunctionDocIterator<'a> {
    pub fn new(children: Vec<Box<dyn DocIterator + 'a>>) -> DisjunctionDocIterator<'a> {
        DisjunctionDocIterator { children, current: 0 }
    }
}

impl DocIterator for DisjunctionDocIterator<'_> {
    fn next(&mut self) -> bool {
        if self.current == DOC_EOF {
            return false;
        }
        self.seek(self.current + 1) != DOC_EOF
    }

    fn value(&self) -> DocId {
        self.current
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.current >= target && self.current != 0 {
            return self.current;
        }
        let mut min = DOC_EOF;
        for child in &mut self.children {
            let doc = if child.value() >= target && child.value() != 0 {
                child.value()
            } else {
                child.seek(target)
            };
            min = min.min(doc);
        }
        self.current = min;
        self.current
    }

    fn cost(&self) -> u64 {
        self.children.iter().map(|child| child.cost()).sum()
    }
}

/// Intersection in doc-id order; children leapfrog each other.
pub struct ConjunctionDocIterator<'a> {
    children: Vec<Box<dyn DocIterator + 'a>>,
    current: DocId,
}

impl<'a> ConjunctionDocIterator<'a> {
    pub fn new(children: Vec<Box<dyn DocIterator + 'a>>) -> ConjunctionDocIterator<'a> {
        ConjunctionDocIterator { children, current: 0 }
    }

    fn align(&mut self, mut candidate: DocId) -> DocId {
        'outer: loop {
            if candidate == DOC_EOF {
                break;
            }
            for child in &mut self.children {
                let doc = if child.value() >= candidate && child.value() != 0 {
                    child.value()
                } else {
                    child.seek(candidate)
                };
                if doc != candidate {
                    candidate = doc;
                    continue 'outer;
                }
            }
            break;
        }
        self.current = candidate;
        self.current
    }
}

impl DocIterator for ConjunctionDocIterator<'_> {
    fn next(&mut self) -> bool {
        if self.current == DOC_EOF {
            return false;
        }
        self.align(self.current + 1) != DOC_EOF
    }

    fn value(&self) -> DocId {
        self.current
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.current >= target && self.current != 0 {
            return self.current;
        }
        self.align(target.max(1))
    }

    fn cost(&self) -> u64 {
        self.children.iter().map(|child| child.cost()).min().unwrap_or(0)
    }
}
