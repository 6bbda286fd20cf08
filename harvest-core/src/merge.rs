use std::collections::{BTreeMap, btree_map::Entry};

use crate::record::Record;

/// What [`MergedSet::insert`] did with an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The key was new.
    Inserted,
    /// The incoming record was strictly more recent and replaced the stored one.
    Replaced,
    /// The stored record was at least as recent; the incoming one was dropped.
    Kept,
}

/// Records keyed by identity, holding the most recent version of each.
///
/// On equal recency the first-seen record stays. Iteration follows key order,
/// so the result does not depend on which source finished first.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSet<R: Record> {
    entries: BTreeMap<R::Key, R>,
}

impl<R: Record> Default for MergedSet<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R: Record> MergedSet<R> {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one record.
    pub fn insert(&mut self, record: R) -> MergeOutcome {
        match self.entries.entry(record.identity_key()) {
            Entry::Vacant(v) => {
                v.insert(record);
                MergeOutcome::Inserted
            }
            Entry::Occupied(mut o) => {
                if record.recency() > o.get().recency() {
                    o.insert(record);
                    MergeOutcome::Replaced
                } else {
                    MergeOutcome::Kept
                }
            }
        }
    }

    /// Fold another merged set into this one.
    pub fn absorb(&mut self, other: Self) {
        self.extend(other.entries.into_values());
    }

    /// Look up the stored record for `key`.
    #[must_use]
    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.entries.get(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no record has been merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in key order.
    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    /// Consume the set, yielding records in key order.
    #[must_use]
    pub fn into_vec(self) -> Vec<R> {
        self.entries.into_values().collect()
    }
}

impl<R: Record> Extend<R> for MergedSet<R> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        for r in iter {
            self.insert(r);
        }
    }
}

impl<R: Record> FromIterator<R> for MergedSet<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<R: Record> IntoIterator for MergedSet<R> {
    type Item = R;
    type IntoIter = std::collections::btree_map::IntoValues<R::Key, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Merge batches of records in the order given.
///
/// - Records are keyed by [`Record::identity_key`].
/// - A later record replaces a stored one only when its recency is strictly greater.
/// - Output is keyed, so iteration order is deterministic.
pub fn merge<R, B, I>(batches: B) -> MergedSet<R>
where
    R: Record,
    B: IntoIterator<Item = I>,
    I: IntoIterator<Item = R>,
{
    let mut set = MergedSet::new();
    for batch in batches {
        set.extend(batch);
    }
    set
}
