//! Query builder: list-page control state and its canonical request form.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, order: SortOrder) -> Self {
        Self { key: key.into(), order }
    }
}

/// Inclusive `date_from`/`date_to` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Control state of one list page.
///
/// Every mutator that changes what is being listed (search, filters, sort,
/// date range) moves back to page 1. Page number and page size are owned by
/// the pagination controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    sort: Option<SortSpec>,
    default_order: SortOrder,
    search: String,
    filters: BTreeMap<String, String>,
    date_range: DateRange,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            default_order: SortOrder::Asc,
            search: String::new(),
            filters: BTreeMap::new(),
            date_range: DateRange::default(),
        }
    }

    /// Initial sort; also the direction a newly chosen key starts with.
    pub fn with_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec::new(key, order));
        self.default_order = order;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_filter(name, value);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.set_date_range(range);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters.get(name).map(String::as_str)
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    /// Returns whether anything changed.
    pub fn set_search(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if term == self.search {
            return false;
        }
        self.search = term;
        self.page = 1;
        true
    }

    /// Sets one filter. An empty value or `all` clears it.
    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        let changed = if value.is_empty() || value.eq_ignore_ascii_case("all") {
            self.filters.remove(&name).is_some()
        } else {
            self.filters.insert(name, value.clone()).as_deref() != Some(value.as_str())
        };
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Column-header style: the current key flips direction, a new key starts
    /// at the default direction.
    pub fn sort_by(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.sort = Some(match self.sort.take() {
            Some(current) if current.key == key => SortSpec::new(key, current.order.toggled()),
            _ => SortSpec::new(key, self.default_order),
        });
        self.page = 1;
    }

    /// Dropdown style: change the key and keep the direction.
    pub fn set_sort_key(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        let order = self.sort.as_ref().map_or(self.default_order, |s| s.order);
        if self.sort.as_ref().map(|s| s.key.as_str()) == Some(key.as_str()) {
            return false;
        }
        self.sort = Some(SortSpec::new(key, order));
        self.page = 1;
        true
    }

    pub fn toggle_sort_order(&mut self) {
        if let Some(sort) = self.sort.as_mut() {
            sort.order = sort.order.toggled();
        } else {
            self.default_order = self.default_order.toggled();
        }
        self.page = 1;
    }

    pub fn set_date_range(&mut self, range: DateRange) -> bool {
        if range == self.date_range {
            return false;
        }
        self.date_range = range;
        self.page = 1;
        true
    }

    /// Restores search, filters, date range and sort to their initial values.
    pub fn clear(&mut self, initial: &ListQuery) {
        self.search.clear();
        self.filters = initial.filters.clone();
        self.date_range = initial.date_range;
        self.sort = initial.sort.clone();
        self.default_order = initial.default_order;
        self.page = 1;
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical request parameters, in a fixed order.
    ///
    /// An empty search is omitted entirely, as are empty filters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push(("sortBy".into(), sort.key.clone()));
            params.push(("sortOrder".into(), sort.order.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search".into(), search.to_string()));
        }
        params.extend(self.filter_params());
        params
    }

    /// Filters and date range only, for endpoints that return the whole
    /// result set and treat `limit` as a row cap.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for (name, value) in &self.filters {
            if !value.is_empty() {
                params.push((name.clone(), value.clone()));
            }
        }
        if let Some(from) = self.date_range.from {
            params.push(("date_from".into(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_range.to {
            params.push(("date_to".into(), to.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_page(page: u32) -> ListQuery {
        let mut q = ListQuery::new().with_sort("id", SortOrder::Asc);
        q.page = page;
        q
    }

    #[test]
    fn search_change_resets_page() {
        let mut q = on_page(4);
        assert!(q.set_search("dela cruz"));
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn same_search_keeps_page() {
        let mut q = on_page(4);
        q.search = "x".into();
        assert!(!q.set_search("x"));
        assert_eq!(q.page(), 4);
    }

    #[test]
    fn filter_and_sort_changes_reset_page() {
        let mut q = on_page(3);
        q.set_filter("disease", "Dengue");
        assert_eq!(q.page(), 1);

        q.page = 3;
        q.sort_by("full_name");
        assert_eq!(q.page(), 1);
        assert_eq!(q.sort(), Some(&SortSpec::new("full_name", SortOrder::Asc)));

        q.page = 3;
        q.toggle_sort_order();
        assert_eq!(q.page(), 1);
        assert_eq!(q.sort().unwrap().order, SortOrder::Desc);
    }

    #[test]
    fn sort_by_same_key_toggles() {
        let mut q = on_page(1);
        q.sort_by("id");
        assert_eq!(q.sort().unwrap().order, SortOrder::Desc);
        q.sort_by("id");
        assert_eq!(q.sort().unwrap().order, SortOrder::Asc);
    }

    #[test]
    fn new_sort_key_keeps_direction_in_dropdown_style() {
        let mut q = ListQuery::new().with_sort("updated_at", SortOrder::Desc);
        assert!(q.set_sort_key("full_name"));
        assert_eq!(q.sort(), Some(&SortSpec::new("full_name", SortOrder::Desc)));
        assert!(!q.set_sort_key("full_name"));
    }

    #[test]
    fn empty_search_is_not_serialized() {
        let q = ListQuery::new();
        let params = q.to_params();
        assert!(params.iter().all(|(k, _)| k != "search"));
        assert!(params.iter().all(|(_, v)| v != "undefined"));
        assert_eq!(
            params,
            vec![("page".to_string(), "1".to_string()), ("limit".to_string(), "25".to_string())]
        );
    }

    #[test]
    fn all_clears_a_filter() {
        let mut q = ListQuery::new().with_filter("disease", "Dengue");
        assert!(q.set_filter("disease", "all"));
        assert_eq!(q.filter("disease"), None);
        assert!(!q.set_filter("disease", "All"));
    }

    #[test]
    fn filter_params_skip_paging() {
        let mut q = ListQuery::new().with_sort("created_at", SortOrder::Desc);
        q.set_search("admin");
        q.set_filter("user_type", "staff");
        q.set_date_range(DateRange { from: NaiveDate::from_ymd_opt(2025, 3, 1), to: None });
        assert_eq!(
            q.filter_params(),
            vec![
                ("user_type".to_string(), "staff".to_string()),
                ("date_from".to_string(), "2025-03-01".to_string()),
            ]
        );
    }

    #[test]
    fn params_are_canonical() {
        let mut q = ListQuery::new()
            .with_sort("created_at", SortOrder::Desc)
            .with_filter("user_type", "admin");
        q.set_search("  login ");
        q.set_filter("action", "LOGIN");
        q.set_filter("user_type", "");
        q.set_date_range(DateRange {
            from: NaiveDate::from_ymd_opt(2025, 1, 1),
            to: NaiveDate::from_ymd_opt(2025, 1, 31),
        });
        let params: Vec<String> = q.to_params().into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(
            params,
            vec![
                "page=1",
                "limit=25",
                "sortBy=created_at",
                "sortOrder=desc",
                "search=login",
                "action=LOGIN",
                "date_from=2025-01-01",
                "date_to=2025-01-31",
            ]
        );
    }

    #[test]
    fn builders_start_on_page_one_with_search_and_dates() {
        let range = DateRange { from: NaiveDate::from_ymd_opt(2025, 3, 1), to: None };
        let q = ListQuery::new().with_search("dela cruz").with_date_range(range);
        assert_eq!(q.page(), 1);
        assert_eq!(q.search(), "dela cruz");
        assert_eq!(q.date_range(), range);

        let mut cleared = q.clone();
        cleared.clear(&q);
        assert_eq!(cleared.search(), "");
        assert_eq!(cleared.date_range(), range);
    }
}
