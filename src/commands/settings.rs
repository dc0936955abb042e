// Settings commands - theme preference and view filters
// Filters are session-only; the theme is the one preference kept in local storage

use crate::app::AppState;
use crate::models::{Category, Priority, Theme};
use crate::sync::RemoteSync;
use crate::view::{Completion, FilterState, SortBy};

/// Partial filter update; absent fields keep their current value
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    #[serde(default, with = "double_option")]
    pub priority: Option<Option<Priority>>,
    #[serde(default, with = "double_option")]
    pub category: Option<Option<Category>>,
    pub starred_only: Option<bool>,
    pub completion: Option<Completion>,
    pub sort_by: Option<SortBy>,
    pub search_query: Option<String>,
}

/// Distinguishes an absent field from an explicit `null` (clear the filter)
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

impl FilterInput {
    fn apply(self, filters: &mut FilterState) {
        if let Some(priority) = self.priority {
            filters.priority = priority;
        }
        if let Some(category) = self.category {
            filters.category = category;
        }
        if let Some(starred_only) = self.starred_only {
            filters.starred_only = starred_only;
        }
        if let Some(completion) = self.completion {
            filters.completion = completion;
        }
        if let Some(sort_by) = self.sort_by {
            filters.sort_by = sort_by;
        }
        if let Some(query) = self.search_query {
            filters.search_query = query;
        }
    }
}

impl<R: RemoteSync> AppState<R> {
    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        tracing::info!(theme = theme.as_str(), "theme changed");
        self.theme = theme;
        self.store.write_theme(theme);
        self.request_render(true);
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.request_render(false);
    }

    pub fn update_filters(&mut self, input: FilterInput) {
        input.apply(&mut self.filters);
        tracing::debug!(filters = ?self.filters, "filters updated");
        self.request_render(false);
    }

    /// Typing in the search box; renders coalesce to one per frame
    pub fn set_search_query(&mut self, query: &str) {
        self.filters.search_query = query.to_string();
        self.request_render(false);
    }
}
