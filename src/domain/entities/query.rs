/// Filter combination requested by the UI.
///
/// `None` means the dimension was not given. Blank strings are treated the
/// same as `None` by every accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Bypass the query cache and bust intermediate caches.
    pub refresh: bool,
}

fn normalized(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl FeedQuery {
    /// Creates an unfiltered first-page query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a first-page query for a single category.
    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            category: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a continuation query that keeps the currently applied filters.
    #[must_use]
    pub fn next_page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Marks the query as a forced refresh.
    #[must_use]
    pub const fn refreshed(mut self) -> Self {
        self.refresh = true;
        self
    }

    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        normalized(self.search.as_ref())
    }

    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        normalized(self.category.as_ref())
    }

    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        normalized(self.location.as_ref())
    }

    /// Returns true if any of search, category, or location is given.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.search_term().is_some() || self.category_name().is_some() || self.location_name().is_some()
    }

    /// Returns true for page 1 or an unspecified page.
    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.page.is_none_or(|page| page <= 1)
    }

    /// Returns the requested page, defaulting to 1.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Copies the given filters into this query, replacing its own.
    #[must_use]
    pub fn with_filters_of(mut self, search: Option<&str>, category: Option<&str>, location: Option<&str>) -> Self {
        self.search = search.map(str::to_owned);
        self.category = category.map(str::to_owned);
        self.location = location.map(str::to_owned);
        self
    }

    /// Query-string parameters in a stable order, without any cache-busting token.
    #[must_use]
    pub fn query_pairs(&self, default_limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(search) = self.search_term() {
            pairs.push(("search", search.to_string()));
        }
        if let Some(category) = self.category_name() {
            pairs.push(("category", category.to_string()));
        }
        if let Some(location) = self.location_name() {
            pairs.push(("location", location.to_string()));
        }
        pairs.push(("page", self.page_number().to_string()));
        pairs.push(("limit", self.limit.unwrap_or(default_limit).to_string()));
        pairs
    }
}
