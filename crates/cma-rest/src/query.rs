//! Collection query parameters.

/// Query string for collection endpoints.
///
/// Parameters are kept in insertion order; setting a named parameter twice
/// replaces the earlier value.
///
/// ```
/// use cma_rest::Query;
///
/// let query = Query::new()
///     .content_type("blogPost")
///     .where_eq("fields.slug", "hello-world")
///     .limit(10);
/// assert_eq!(query.get("content_type"), Some("blogPost"));
/// assert_eq!(query.get("fields.slug"), Some("hello-world"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page size. The API caps this at 1000.
    pub fn limit(self, limit: u64) -> Self {
        self.set("limit", limit.to_string())
    }

    pub fn skip(self, skip: u64) -> Self {
        self.set("skip", skip.to_string())
    }

    /// Sort order, e.g. `sys.createdAt` or `-fields.title`.
    pub fn order(self, order: impl Into<String>) -> Self {
        self.set("order", order.into())
    }

    /// Restrict entries to one content type.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set("content_type", content_type.into())
    }

    /// Comma-separated list of paths to return.
    pub fn select<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = paths
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.set("select", joined)
    }

    /// Equality filter on any path, such as `fields.slug` or `sys.id`.
    pub fn where_eq(self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(path.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn page_size(&self) -> Option<u64> {
        self.get("limit").and_then(|v| v.parse().ok())
    }

    pub(crate) fn start(&self) -> u64 {
        self.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    fn set(mut self, key: impl Into<String>, value: String) -> Self {
        let key = key.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let query = Query::new().order("-sys.createdAt").skip(20).limit(10);
        let keys: Vec<_> = query.pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["order", "skip", "limit"]);
    }

    #[test]
    fn later_value_replaces_earlier() {
        let query = Query::new().limit(10).limit(25);
        assert_eq!(query.pairs().len(), 1);
        assert_eq!(query.page_size(), Some(25));
    }

    #[test]
    fn select_joins_paths() {
        let query = Query::new().select(["sys.id", "fields.title"]);
        assert_eq!(query.get("select"), Some("sys.id,fields.title"));
    }

    #[test]
    fn start_defaults_to_zero() {
        assert_eq!(Query::new().start(), 0);
        assert_eq!(Query::new().skip(5).start(), 5);
        assert!(Query::new().is_empty());
    }
}
