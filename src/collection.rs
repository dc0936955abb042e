// In-memory task collection keyed by date
// Every successful mutation bumps the revision; empty days never stay in the map

use crate::error::TaskError;
use crate::models::{
    Category, Priority, Snapshot, Task, TaskId, date_key, normalize_snapshot, parse_date_key,
};

/// Optional field changes for [`TaskCollection::edit`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub text: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    days: Snapshot,
    revision: u64,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Date keys are stored zero-padded; see [`normalize_snapshot`]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            days: normalize_snapshot(snapshot),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.days
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tasks_on(&self, date: &str) -> &[Task] {
        self.days.get(&canonical_key(date)).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn find(&self, date: &str, id: &str) -> Option<(usize, &Task)> {
        self.tasks_on(date).iter().enumerate().find(|(_, t)| t.id == id)
    }

    /// Add a task to the end of a day; returns the new task's id
    pub fn add(
        &mut self,
        date: &str,
        text: &str,
        category: Category,
        priority: Priority,
    ) -> Result<TaskId, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }
        let date = normalize_date(date)?;

        let task = Task::new(text, category, priority);
        let id = task.id.clone();
        self.days.entry(date).or_default().push(task);
        self.bump();
        Ok(id)
    }

    /// Apply an edit; a changed date moves the task to the end of the new day.
    /// Returns the affected dates (old first, then new when moved).
    pub fn edit(&mut self, date: &str, id: &str, edit: TaskEdit) -> Result<Vec<String>, TaskError> {
        let (index, _) = self.find(date, id).ok_or_else(|| not_found(date, id))?;
        let date = canonical_key(date);

        let new_text = match &edit.text {
            Some(text) if text.trim().is_empty() => return Err(TaskError::EmptyText),
            Some(text) => Some(text.trim().to_string()),
            None => None,
        };
        let new_date = match &edit.date {
            Some(target) => Some(normalize_date(target)?).filter(|target| *target != date),
            None => None,
        };

        let Some(tasks) = self.days.get_mut(&date) else {
            return Err(not_found(&date, id));
        };
        let task = &mut tasks[index];
        if let Some(text) = new_text {
            task.text = text;
        }
        if let Some(category) = edit.category {
            task.category = category;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }

        let mut affected = vec![date];
        if let Some(target) = new_date {
            let moved = tasks.remove(index);
            self.days.entry(target.clone()).or_default().push(moved);
            affected.push(target);
        }

        self.clean_empty_dates();
        self.bump();
        Ok(affected)
    }

    pub fn delete(&mut self, date: &str, id: &str) -> Result<Task, TaskError> {
        let (index, _) = self.find(date, id).ok_or_else(|| not_found(date, id))?;
        let Some(tasks) = self.days.get_mut(&canonical_key(date)) else {
            return Err(not_found(date, id));
        };
        let removed = tasks.remove(index);
        self.clean_empty_dates();
        self.bump();
        Ok(removed)
    }

    /// Flip completion; returns the new value
    pub fn toggle_completed(&mut self, date: &str, id: &str) -> Result<bool, TaskError> {
        let task = self.task_mut(date, id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.bump();
        Ok(completed)
    }

    /// Flip the star; returns the new value
    pub fn toggle_starred(&mut self, date: &str, id: &str) -> Result<bool, TaskError> {
        let task = self.task_mut(date, id)?;
        task.starred = !task.starred;
        let starred = task.starred;
        self.bump();
        Ok(starred)
    }

    /// Replace the whole mapping (load, import)
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.days = normalize_snapshot(snapshot);
        self.bump();
    }

    pub fn clean_empty_dates(&mut self) {
        self.days.retain(|_, tasks| !tasks.is_empty());
    }

    fn task_mut(&mut self, date: &str, id: &str) -> Result<&mut Task, TaskError> {
        self.days
            .get_mut(&canonical_key(date))
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == id))
            .ok_or_else(|| not_found(date, id))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

fn not_found(date: &str, id: &str) -> TaskError {
    TaskError::NotFound {
        date: date.to_string(),
        id: id.to_string(),
    }
}

/// The stored key for a date: zero-padded when it parses, unchanged otherwise
pub fn canonical_key(date: &str) -> String {
    normalize_date(date).unwrap_or_else(|_| date.to_string())
}

/// Validate a date key and return it zero-padded
pub fn normalize_date(date: &str) -> Result<String, TaskError> {
    parse_date_key(date)
        .map(date_key)
        .ok_or_else(|| TaskError::InvalidDate(date.to_string()))
}
