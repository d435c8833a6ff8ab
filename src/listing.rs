/// The listing's current parameter set: free-text filter plus 1-based
/// page. There is no history; updates replace the parameters in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub query: Option<String>,
    pub page: u32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            query: None,
            page: 1,
        }
    }
}

impl ListingQuery {
    /// A committed search restarts pagination. A non-empty term replaces
    /// the query parameter; an empty term removes it entirely.
    pub fn apply_search(&mut self, term: &str) {
        self.page = 1;
        self.query = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
    }

    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// Move to `page`, clamped to the known page range.
    pub fn set_page(&mut self, page: u32, total_pages: u32) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Canonical query-string rendering, shown in the listing header.
    pub fn query_string(&self) -> String {
        match &self.query {
            Some(query) => format!("?query={}&page={}", query, self.page),
            None => format!("?page={}", self.page),
        }
    }
}
