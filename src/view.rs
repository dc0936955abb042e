// Derived views over the task collection: stats, today's list, upcoming list
// Pure functions plus a signature-keyed cache for the upcoming view

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::collection::TaskCollection;
use crate::models::{Category, Priority, Snapshot, Task, date_key, parse_date_key};

pub use crate::models::DEFAULT_UPCOMING_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Priority,
    Category,
    Text,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    #[default]
    All,
    Pending,
    Completed,
}

impl Completion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

/// Projection parameters for the derived views. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub starred_only: bool,
    pub completion: Completion,
    pub sort_by: SortBy,
    pub search_query: String,
}

impl FilterState {
    pub fn matches(&self, task: &Task) -> bool {
        self.priority.is_none_or(|p| task.priority == p)
            && self.category.is_none_or(|c| task.category == c)
            && (!self.starred_only || task.starred)
            && match self.completion {
                Completion::All => true,
                Completion::Pending => !task.completed,
                Completion::Completed => task.completed,
            }
            && task.matches_query(&self.search_query.trim().to_lowercase())
    }

    /// Cache key for the upcoming view
    fn signature(&self, revision: u64, today: NaiveDate, limit: usize) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            revision,
            self.priority.map(|p| p.as_str()).unwrap_or_default(),
            self.category.map(|c| c.as_str()).unwrap_or_default(),
            if self.starred_only { "starred" } else { "" },
            self.completion.as_str(),
            self.sort_by.as_str(),
            self.search_query.trim().to_lowercase(),
            date_key(today),
            limit,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// A task in the upcoming view with its day and its position in that day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingEntry {
    pub date: String,
    pub task: Task,
    pub index: usize,
}

pub fn stats_of(snapshot: &Snapshot) -> Stats {
    snapshot.values().flatten().fold(Stats::default(), |mut stats, task| {
        stats.total += 1;
        if task.completed {
            stats.completed += 1;
        } else {
            stats.pending += 1;
        }
        stats
    })
}

/// Today's tasks passing the filters, in insertion order
pub fn due_today(snapshot: &Snapshot, filters: &FilterState, today: NaiveDate) -> Vec<Task> {
    snapshot
        .get(&date_key(today))
        .into_iter()
        .flatten()
        .filter(|task| filters.matches(task))
        .cloned()
        .collect()
}

/// Incomplete tasks on or after `today` passing the filters, sorted by `filters.sort_by`
/// and truncated to `limit`
pub fn upcoming(
    snapshot: &Snapshot,
    filters: &FilterState,
    today: NaiveDate,
    limit: usize,
) -> Vec<UpcomingEntry> {
    let mut days: Vec<(NaiveDate, &String, &Vec<Task>)> = snapshot
        .iter()
        .filter_map(|(key, tasks)| parse_date_key(key).map(|date| (date, key, tasks)))
        .filter(|(date, _, _)| *date >= today)
        .collect();
    days.sort_by_key(|(date, _, _)| *date);

    let mut entries: Vec<(NaiveDate, UpcomingEntry)> = days
        .into_iter()
        .flat_map(|(date, key, tasks)| {
            tasks.iter().enumerate().filter_map(move |(index, task)| {
                (!task.completed && filters.matches(task)).then(|| {
                    (
                        date,
                        UpcomingEntry {
                            date: key.clone(),
                            task: task.clone(),
                            index,
                        },
                    )
                })
            })
        })
        .collect();

    // Stable sorts: ties keep chronological order
    match filters.sort_by {
        SortBy::Date => {}
        SortBy::Priority => entries.sort_by(|a, b| b.1.task.priority.rank().cmp(&a.1.task.priority.rank())),
        SortBy::Category => entries.sort_by(|a, b| a.1.task.category.as_str().cmp(b.1.task.category.as_str())),
        SortBy::Text => entries.sort_by(|a, b| a.1.task.text.cmp(&b.1.task.text)),
    }

    entries.into_iter().take(limit).map(|(_, entry)| entry).collect()
}

/// Day numbers of a month that carry at least one task (calendar view)
pub fn dates_with_tasks(snapshot: &Snapshot, year: i32, month: u32) -> Vec<u32> {
    let mut days: Vec<u32> = snapshot
        .iter()
        .filter(|(_, tasks)| !tasks.is_empty())
        .filter_map(|(key, _)| parse_date_key(key))
        .filter(|date| date.year() == year && date.month() == month)
        .map(|date| date.day())
        .collect();
    days.sort_unstable();
    days.dedup();
    days
}

// ============================================
// VIEW CACHE
// ============================================

/// Memoized upcoming view, valid while its signature matches
/// (revision, filters, query, today, limit)
#[derive(Debug, Default)]
pub struct ViewCache {
    signature: String,
    data: Vec<UpcomingEntry>,
    misses: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        collection: &TaskCollection,
        filters: &FilterState,
        today: NaiveDate,
        limit: usize,
    ) -> &[UpcomingEntry] {
        let signature = filters.signature(collection.revision(), today, limit);
        if signature != self.signature {
            tracing::trace!(%signature, "upcoming view cache miss");
            self.data = upcoming(collection.snapshot(), filters, today, limit);
            self.signature = signature;
            self.misses += 1;
        }
        &self.data
    }

    /// Number of recomputations so far
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn invalidate(&mut self) {
        self.signature.clear();
        self.data.clear();
    }
}
