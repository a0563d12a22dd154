use super::alphabet::{ALPHABET_SIZE, AminoAcid};
use super::sequence::{PointMutation, Sequence};
use std::sync::Arc;

/// A sequence together with everything the builtin features need to update
/// cheaply after a single substitution.
///
/// The `charged` and `procharged` index sets are shared with the predecessor
/// whenever a mutation leaves their membership unchanged, so deep chains of
/// derivations do not copy them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedSequence {
    sequence: Sequence,
    counts: [usize; ALPHABET_SIZE],
    charged: Arc<Vec<usize>>,
    procharged: Arc<Vec<usize>>,
    memo: Vec<Option<f64>>,
}

impl ExtendedSequence {
    /// Builds a fresh cache with `slots` empty feature slots.
    pub fn new(sequence: Sequence, slots: usize) -> Self {
        let counts = sequence.counts();
        let charged = scan(&sequence, AminoAcid::is_charged);
        let procharged = scan(&sequence, AminoAcid::is_pro_or_charged);
        Self {
            sequence,
            counts,
            charged: Arc::new(charged),
            procharged: Arc::new(procharged),
            memo: vec![None; slots],
        }
    }

    #[inline]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[inline]
    pub fn counts(&self) -> &[usize; ALPHABET_SIZE] {
        &self.counts
    }

    #[inline]
    pub fn count(&self, aa: AminoAcid) -> usize {
        self.counts[aa.index()]
    }

    /// Sorted positions of D, E, K and R.
    #[inline]
    pub fn charged(&self) -> &[usize] {
        &self.charged
    }

    /// Sorted positions of D, E, K, R and P.
    #[inline]
    pub fn procharged(&self) -> &[usize] {
        &self.procharged
    }

    #[inline]
    pub fn slots(&self) -> usize {
        self.memo.len()
    }

    #[inline]
    pub fn cached(&self, slot: usize) -> Option<f64> {
        self.memo.get(slot).copied().flatten()
    }

    pub(crate) fn store(&mut self, slot: usize, value: f64) {
        self.memo[slot] = Some(value);
    }

    /// The memo as a feature vector, if every slot is filled.
    pub fn feature_vector(&self) -> Option<Vec<f64>> {
        self.memo.iter().copied().collect()
    }

    /// Shares or clones the index sets of `self`, then applies `mutation` to
    /// sequence, counts and index sets. The memo starts empty.
    fn mutated(&self, mutation: &PointMutation) -> Self {
        let mut counts = self.counts;
        counts[mutation.from().index()] -= 1;
        counts[mutation.to().index()] += 1;
        let position = mutation.position();
        Self {
            sequence: self.sequence.apply(mutation),
            counts,
            charged: update_index_set(
                &self.charged,
                position,
                mutation.from().is_charged(),
                mutation.to().is_charged(),
            ),
            procharged: update_index_set(
                &self.procharged,
                position,
                mutation.from().is_pro_or_charged(),
                mutation.to().is_pro_or_charged(),
            ),
            memo: vec![None; self.memo.len()],
        }
    }
}

fn scan(sequence: &Sequence, member: fn(AminoAcid) -> bool) -> Vec<usize> {
    sequence
        .residues()
        .iter()
        .enumerate()
        .filter(|&(_, &aa)| member(aa))
        .map(|(i, _)| i)
        .collect()
}

fn update_index_set(
    previous: &Arc<Vec<usize>>,
    position: usize,
    was_member: bool,
    is_member: bool,
) -> Arc<Vec<usize>> {
    match (was_member, is_member) {
        (true, false) => {
            let mut set = previous.as_ref().clone();
            if let Ok(i) = set.binary_search(&position) {
                set.remove(i);
            }
            Arc::new(set)
        }
        (false, true) => {
            let mut set = previous.as_ref().clone();
            if let Err(i) = set.binary_search(&position) {
                set.insert(i, position);
            }
            Arc::new(set)
        }
        _ => Arc::clone(previous),
    }
}

/// A lightweight description of a sequence: either an existing cache, or an
/// existing cache plus one substitution.
#[derive(Debug, Clone, Copy)]
pub struct SeqRepr<'a> {
    pub inner: &'a ExtendedSequence,
    pub mutation: Option<PointMutation>,
}

impl<'a> SeqRepr<'a> {
    pub fn identity(inner: &'a ExtendedSequence) -> Self {
        Self {
            inner,
            mutation: None,
        }
    }

    pub fn mutated(inner: &'a ExtendedSequence, mutation: PointMutation) -> Self {
        Self {
            inner,
            mutation: Some(mutation),
        }
    }

    /// Materializes the represented sequence. Without a mutation the memo is
    /// carried over; with one it starts empty.
    pub fn derive(&self) -> ExtendedSequence {
        match &self.mutation {
            None => self.inner.clone(),
            Some(m) => self.inner.mutated(m),
        }
    }

    pub fn sequence(&self) -> Sequence {
        match &self.mutation {
            None => self.inner.sequence().clone(),
            Some(m) => self.inner.sequence().apply(m),
        }
    }
}
