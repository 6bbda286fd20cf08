use std::fmt::Debug;

/// A normalized upstream item that can be merged across pages and sources.
///
/// Two records with equal [`identity_key`](Record::identity_key) describe the
/// same logical item; the one with the greater [`recency`](Record::recency)
/// is kept.
pub trait Record {
    /// Identity key type; ordering fixes the iteration order of merged output.
    type Key: Ord + Clone + Debug;

    /// Key identifying the logical item, e.g. `(symbol, side, open_time)`.
    fn identity_key(&self) -> Self::Key;

    /// Comparable freshness value, typically an update timestamp in epoch millis.
    fn recency(&self) -> i64;
}
