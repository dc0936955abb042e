// Application state for the task tracker client
// One owner mutates the collection; local writes, scoped pushes and renders follow every change

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::collection::TaskCollection;
use crate::merge::merge_snapshots;
use crate::models::{Snapshot, Task, Theme, date_key};
use crate::render::{Frame, RenderRequest, RenderScheduler, Renderer};
use crate::storage::LocalSnapshotStore;
use crate::sync::RemoteSync;
use crate::view::{self, DEFAULT_UPCOMING_LIMIT, FilterState, Stats, UpcomingEntry, ViewCache};

/// Everything the UI layer talks to. Mutating operations live in `commands`.
pub struct AppState<R: RemoteSync> {
    pub(crate) collection: TaskCollection,
    pub(crate) store: LocalSnapshotStore,
    pub(crate) remote: R,
    pub(crate) user_id: Option<String>,
    pub(crate) filters: FilterState,
    pub(crate) theme: Theme,
    cache: ViewCache,
    scheduler: RenderScheduler,
    renderer: Box<dyn Renderer>,
    today_override: Option<NaiveDate>,
    upcoming_limit: usize,
}

impl<R: RemoteSync> AppState<R> {
    /// Start a session: read the local snapshot and, when a user identity is known,
    /// reconcile it with the remote one. An unreachable remote leaves local state in charge.
    pub async fn load(
        store: LocalSnapshotStore,
        remote: R,
        user_id: Option<String>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let local = store.read();
        let theme = store.read_theme();
        tracing::info!(dates = local.len(), user = ?user_id, "loaded local snapshot");

        let mut state = Self {
            collection: TaskCollection::from_snapshot(local.clone()),
            store,
            remote,
            user_id,
            filters: FilterState::default(),
            theme,
            cache: ViewCache::new(),
            scheduler: RenderScheduler::new(),
            renderer,
            today_override: None,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        };

        if let Some(user) = state.user_id.clone() {
            match state.remote.fetch(&user).await {
                Ok(remote_snapshot) => state.reconcile(&user, &remote_snapshot, &local).await,
                Err(e) => tracing::warn!(error = %e, "remote snapshot unavailable, using local snapshot"),
            }
        }

        state.request_render(true);
        state
    }

    /// Merge remote (primary) with local (secondary), store the result and push
    /// the dates the server does not have in merged form yet
    async fn reconcile(&mut self, user: &str, remote_snapshot: &Snapshot, local: &Snapshot) {
        let merged = merge_snapshots(remote_snapshot, local);
        let stale: Vec<String> = merged
            .iter()
            .filter(|(date, tasks)| remote_snapshot.get(*date) != Some(*tasks))
            .map(|(date, _)| date.clone())
            .collect();
        tracing::info!(
            remote_dates = remote_snapshot.len(),
            merged_dates = merged.len(),
            stale = stale.len(),
            "reconciled remote and local snapshots"
        );

        self.collection.replace(merged);
        self.store.write(self.collection.snapshot());
        for date in &stale {
            self.push_date(user, date).await;
        }
    }

    /// Persist after a mutation: full local write, then one scoped push per affected date
    pub(crate) async fn sync_dates(&mut self, dates: &[String]) {
        self.store.write(self.collection.snapshot());

        if let Some(user) = self.user_id.clone() {
            for date in dates {
                self.push_date(&user, date).await;
            }
        }

        self.request_render(false);
    }

    /// Push one date; a pruned date is deleted remotely instead
    async fn push_date(&self, user: &str, date: &str) {
        let result = match self.collection.snapshot().get(date) {
            Some(tasks) => self.remote.push(user, date, tasks).await,
            None => self.remote.delete(user, date).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, date, "remote write failed, local snapshot keeps the change");
        }
    }

    // ============================================
    // READS
    // ============================================

    pub fn snapshot(&self) -> &Snapshot {
        self.collection.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.collection.revision()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn tasks_on(&self, date: &str) -> &[Task] {
        self.collection.tasks_on(date)
    }

    pub fn stats(&self) -> Stats {
        view::stats_of(self.collection.snapshot())
    }

    pub fn due_today(&self) -> Vec<Task> {
        view::due_today(self.collection.snapshot(), &self.filters, self.today())
    }

    /// Cached upcoming view for the current filters
    pub fn upcoming(&mut self) -> &[UpcomingEntry] {
        let today = self.today();
        self.cache.get(&self.collection, &self.filters, today, self.upcoming_limit)
    }

    pub fn calendar_days(&self, year: i32, month: u32) -> Vec<u32> {
        view::dates_with_tasks(self.collection.snapshot(), year, month)
    }

    pub fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Pin "today" (tests, or a UI showing another day); `None` follows the clock
    pub fn set_today(&mut self, today: Option<NaiveDate>) {
        self.today_override = today;
        self.request_render(false);
    }

    pub fn set_upcoming_limit(&mut self, limit: usize) {
        self.upcoming_limit = limit;
        self.request_render(false);
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache.misses()
    }

    // ============================================
    // RENDERING
    // ============================================

    pub fn request_render(&mut self, immediate: bool) {
        if self.scheduler.request(immediate) == RenderRequest::Now {
            self.render_frame();
        }
    }

    /// Render the pending frame, if any; returns whether a frame was drawn
    pub fn on_tick(&mut self) -> bool {
        if self.scheduler.take_pending() {
            self.render_frame();
            true
        } else {
            false
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.scheduler.frames()
    }

    fn render_frame(&mut self) {
        let today = self.today();
        let today_key = date_key(today);
        let due = view::due_today(self.collection.snapshot(), &self.filters, today);
        let stats = view::stats_of(self.collection.snapshot());
        let upcoming = self
            .cache
            .get(&self.collection, &self.filters, today, self.upcoming_limit);

        let frame = Frame {
            theme: self.theme,
            today: &today_key,
            stats,
            due_today: &due,
            upcoming,
        };
        self.renderer.render(&frame);
    }
}

/// Drive coalesced renders at a fixed frame period until cancelled
pub async fn run_frame_loop<R: RemoteSync>(
    state: Arc<Mutex<AppState<R>>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                state.lock().await.on_tick();
            }
        }
    }
    tracing::debug!("frame loop stopped");
}
