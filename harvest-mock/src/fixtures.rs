use harvest_core::{Page, Record, SourceId};

/// Minimal record with a string identity and a numeric recency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRecord {
    /// Identity key, e.g. `"ORD-1"`.
    pub key: String,
    /// Update timestamp used for most-recent-wins merging.
    pub recency: i64,
    /// Source that produced the record.
    pub source: SourceId,
}

impl MockRecord {
    /// Record without a meaningful source.
    pub fn new(key: impl Into<String>, recency: i64) -> Self {
        Self {
            key: key.into(),
            recency,
            source: SourceId::from("mock"),
        }
    }

    /// Attribute the record to `source`.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<SourceId>) -> Self {
        self.source = source.into();
        self
    }
}

impl Record for MockRecord {
    type Key = String;

    fn identity_key(&self) -> String {
        self.key.clone()
    }

    fn recency(&self) -> i64 {
        self.recency
    }
}

/// `len` records unique to `(source, page)`, keyed `"{source}-p{page}-{i}"`.
pub fn page_records(source: &str, page: u32, len: usize) -> Vec<MockRecord> {
    (0..len)
        .map(|i| {
            MockRecord::new(format!("{source}-p{page}-{i}"), i64::from(page) * 1_000)
                .with_source(source)
        })
        .collect()
}

/// Pages of the given sizes for `source`, each carrying a cursor naming the next page.
///
/// Every page has a next cursor, including the last one, so the walker has to
/// rely on the short page to stop.
pub fn cursor_pages(source: &str, sizes: &[usize]) -> Vec<Page<MockRecord>> {
    sizes
        .iter()
        .zip(1u32..)
        .map(|(&len, page)| {
            Page::new(page_records(source, page, len)).with_next_cursor(format!("c{}", page + 1))
        })
        .collect()
}
