/// Substring filter applied to list labels.
///
/// An empty query matches everything. Matching ignores case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextFilter {
    query: String,
}

impl TextFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn set(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn push(&mut self, c: char) {
        self.query.push(c);
    }

    /// Remove the last character; returns false when the query was already empty.
    pub fn pop(&mut self) -> bool {
        self.query.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.query.clear();
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.query.is_empty() {
            return true;
        }
        text.to_lowercase().contains(&self.query.to_lowercase())
    }

    /// Indices of `labels` that match, in their original order.
    pub fn matching_indices<'a, I>(&self, labels: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels
            .into_iter()
            .enumerate()
            .filter(|(_, label)| self.matches(label))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_ignores_case() {
        let mut filter = TextFilter::new();
        filter.set("login");
        assert!(filter.matches("Fix LOGIN page"));
        assert!(!filter.matches("Fix logout"));

        filter.set("Login");
        assert!(filter.matches("login page"));
    }

    #[test]
    fn test_empty_query_matches_all() {
        let filter = TextFilter::new();
        assert!(filter.matches(""));
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_matching_indices_preserve_order() {
        let mut filter = TextFilter::new();
        filter.set("api");
        let labels = ["api-gateway", "web", "billing-API", "worker"];
        assert_eq!(filter.matching_indices(labels), vec![0, 2]);
    }

    #[test]
    fn test_push_pop() {
        let mut filter = TextFilter::new();
        filter.push('a');
        filter.push('b');
        assert_eq!(filter.query(), "ab");
        assert!(filter.pop());
        assert!(filter.pop());
        assert!(!filter.pop());
        assert!(filter.is_empty());
    }
}
