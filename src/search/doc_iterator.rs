use crate::util::BitSet;
use crate::{DocId, DOC_EOF};

use super::order::ScorerSlot;

/// Single-pass, seekable cursor over the doc ids a query matches within one
/// segment. Ids come out strictly increasing.
///
/// `value()` is 0 before the first successful `next`/`seek` and [`DOC_EOF`]
/// once the iterator is exhausted.
pub trait DocIterator {
    /// Advances to the next matching document; false at the end.
    fn next(&mut self) -> bool;

    /// The current doc id.
    fn value(&self) -> DocId;

    /// Advances to the smallest matching doc id `>= target` and returns it,
    /// or [`DOC_EOF`]. Seeking at or behind the current position is a no-op
    /// returning the current id.
    fn seek(&mut self, target: DocId) -> DocId;

    /// Upper bound on the number of documents this iterator can produce.
    /// Exact for term postings; composites estimate from their children and
    /// fall back to the sub-reader's doc count.
    fn cost(&self) -> u64;

    /// Writes the current document's score into `out` (of the prepared
    /// order's size). A no-op unless the iterator was executed with an
    /// order.
    fn score(&mut self, out: &mut [u8]) {
        let _ = out;
    }
}

/// Matches nothing. The result of looking up an unknown field or term.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDocIterator;

impl DocIterator for EmptyDocIterator {
    fn next(&mut self) -> bool {
        false
    }

    fn value(&self) -> DocId {
        DOC_EOF
    }

    fn seek(&mut self, _target: DocId) -> DocId {
        DOC_EOF
    }

    fn cost(&self) -> u64 {
        0
    }
}

/// Cursor over one posting list.
#[derive(Debug, Clone)]
pub struct PostingsDocIterator<'a> {
    postings: &'a [DocId],
    cursor: usize,
    current: DocId,
}

impl<'a> PostingsDocIterator<'a> {
    pub fn new(postings: &'a [DocId]) -> PostingsDocIterator<'a> {
        PostingsDocIterator { postings, cursor: 0, current: 0 }
    }
}

impl DocIterator for PostingsDocIterator<'_> {
    fn next(&mut self) -> bool {
        if self.cursor >= self.postings.len() {
            self.current = DOC_EOF;
            return false;
        }
        self.current = self.postings[self.cursor];
        self.cursor += 1;
        true
    }

    fn value(&self) -> DocId {
        self.current
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.current >= target && self.current != 0 {
            return self.current;
        }
        // binary search over the not-yet-consumed suffix
        let ahead = &self.postings[self.cursor..];
        let offset = ahead.partition_point(|&doc| doc < target);
        self.cursor += offset;
        if self.cursor >= self.postings.len() {
            self.current = DOC_EOF;
        } else {
            self.current = self.postings[self.cursor];
            self.cursor += 1;
        }
        self.current
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}

/// Cursor over every document of a segment: `1..=docs_count`.
#[derive(Debug, Clone)]
pub struct AllDocIterator {
    docs_count: u64,
    current: DocId,
}

impl AllDocIterator {
    pub fn new(docs_count: u64) -> AllDocIterator {
        AllDocIterator { docs_count, current: 0 }
    }
}

impl DocIterator for AllDocIterator {
    fn next(&mut self) -> bool {
        if self.current == DOC_EOF {
            return false;
        }
        if u64::from(self.current) >= self.docs_count {
            self.current = DOC_EOF;
            return false;
        }
        self.current += 1;
        true
    }

    fn value(&self) -> DocId {
        self.current
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.current >= target && self.current != 0 {
            return self.current;
        }
        let target = target.max(1);
        if u64::from(target) > self.docs_count {
            self.current = DOC_EOF;
        } else {
            self.current = target;
        }
        self.current
    }

    fn cost(&self) -> u64 {
        self.docs_count
    }
}

/// Cursor over the set bits of a materialized document set. Used where a
/// query collapses many posting lists into one set (ranges, negation).
#[derive(Debug)]
pub struct BitSetDocIterator {
    bits: BitSet,
    cost: u64,
    current: DocId,
}

impl BitSetDocIterator {
    /// `bits` is indexed by doc id; bit 0 stays unused.
    pub fn new(bits: BitSet) -> BitSetDocIterator {
        let cost = bits.count() as u64;
        BitSetDocIterator { bits, cost, current: 0 }
    }

    fn scan_from(&mut self, mut candidate: usize) -> DocId {
        while candidate < self.bits.size() {
            if self.bits.test(candidate) {
                self.current = candidate as DocId;
                return self.current;
            }
            candidate += 1;
        }
        self.current = DOC_EOF;
        self.current
    }
}

impl DocIterator for BitSetDocIterator {
    fn next(&mut self) -> bool {
        if self.current == DOC_EOF {
            return false;
        }
        self.scan_from(self.current as usize + 1) != DOC_EOF
    }

    fn value(&self) -> DocId {
        self.current
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.current >= target && self.current != 0 {
            return self.current;
        }
        self.scan_from((target.max(1)) as usize)
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}

/// Decorates an iterator with the scorers of a prepared order.
pub struct ScoredDocIterator<'a> {
    inner: Box<dyn DocIterator + 'a>,
    scorers: Vec<ScorerSlot>,
}

impl<'a> ScoredDocIterator<'a> {
    pub fn new(inner: Box<dyn DocIterator + 'a>, scorers: Vec<ScorerSlot>) -> ScoredDocIterator<'a> {
        ScoredDocIterator { inner, scorers }
    }
}

impl DocIterator for ScoredDocIterator<'_> {
    fn next(&mut self) -> bool {
        self.inner.next()
    }

    fn value(&self) -> DocId {
        self.inner.value()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.inner.seek(target)
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }

    fn score(&mut self, out: &mut [u8]) {
        let doc = self.inner.value();
        for slot in &mut self.scorers {
            slot.scorer.score(doc, &mut out[slot.range.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_iterator() {
        let mut it = EmptyDocIterator;
        assert!(!it.next());
        assert_eq!(DOC_EOF, it.seek(1));
        assert_eq!(0, it.cost());
    }

    #[test]
    fn postings_next_and_value() {
        let postings = vec![1, 4, 9, 12];
        let mut it = PostingsDocIterator::new(&postings);
        assert_eq!(0, it.value());
        let mut seen = Vec::new();
        while it.next() {
            seen.push(it.value());
        }
        assert_eq!(postings, seen);
        assert_eq!(DOC_EOF, it.value());
        assert!(!it.next());
        assert_eq!(4, it.cost());
    }

    #[test]
    fn postings_seek() {
        let postings = vec![1, 4, 9, 12];

        let mut it = PostingsDocIterator::new(&postings);
        assert_eq!(4, it.seek(2));
        // seeking backwards or to the current position is a no-op
        assert_eq!(4, it.seek(4));
        assert_eq!(4, it.seek(1));
        assert_eq!(12, it.seek(10));
        assert_eq!(DOC_EOF, it.seek(13));

        // a fresh iterator seeked to the same target lands identically
        let mut fresh = PostingsDocIterator::new(&postings);
        assert_eq!(9, fresh.seek(5));
        assert!(fresh.next());
        assert_eq!(12, fresh.value());
    }

    #[test]
    fn seek_to_first_doc_from_fresh_iterator() {
        let postings = vec![1];
        let mut it = PostingsDocIterator::new(&postings);
        assert_eq!(1, it.seek(1));
        assert!(!it.next());
    }

    #[test]
    fn seek_then_next_matches_sibling() {
        let postings = vec![2, 3, 5, 8, 13, 21];
        for target in 0..23u32 {
            let mut seeked = PostingsDocIterator::new(&postings);
            seeked.seek(target);

            let mut stepped = PostingsDocIterator::new(&postings);
            while stepped.next() && stepped.value() < target {}
            let expected = if stepped.value() >= target { stepped.value() } else { DOC_EOF };
            assert_eq!(expected, seeked.value(), "target {target}");

            // and the tails agree
            let mut a = Vec::new();
            while seeked.next() {
                a.push(seeked.value());
            }
            let mut b = Vec::new();
            while stepped.next() {
                b.push(stepped.value());
            }
            assert_eq!(b, a, "target {target}");
        }
    }

    #[test]
    fn all_iterator_covers_universe() {
        let mut it = AllDocIterator::new(3);
        let mut seen = Vec::new();
        while it.next() {
            seen.push(it.value());
        }
        assert_eq!(vec![1, 2, 3], seen);

        let mut it = AllDocIterator::new(3);
        assert_eq!(2, it.seek(2));
        assert_eq!(DOC_EOF, it.seek(4));
    }

    #[test]
    fn bitset_iterator() {
        let mut bits = BitSet::new(11);
        for doc in [1usize, 5, 7, 9, 10] {
            bits.set(doc);
        }
        let mut it = BitSetDocIterator::new(bits);
        assert_eq!(5, it.cost());

        assert!(it.next());
        assert_eq!(1, it.value());
        assert_eq!(7, it.seek(6));
        assert_eq!(7, it.seek(2));
        assert!(it.next());
        assert_eq!(9, it.value());
        assert!(it.next());
        assert_eq!(10, it.value());
        assert!(!it.next());
        assert_eq!(DOC_EOF, it.value());
    }
}
