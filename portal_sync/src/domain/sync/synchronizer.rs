use super::error::SyncError;
use super::state::{SyncOptions, SyncState, SyncStrategy};
use crate::domain::broadcast::Broadcaster;
use crate::domain::events::{AppEvent, AppEventBus};
use crate::domain::subscription::Subscription;
use crate::platform::Platform;
use crate::ports::{ChangeCallback, LostCallback, SchedulerPort};
use crate::time_it;
use futures::future::{abortable, AbortHandle, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type FetchFuture<T> = LocalBoxFuture<'static, Result<Vec<T>, SyncError>>;
pub type SnapshotFetcher<T> = Rc<dyn Fn() -> FetchFuture<T>>;

type Observer<T> = Rc<dyn Fn(&SyncState<T>)>;

struct SnapshotCache<T> {
    key: String,
    encode: fn(&[T]) -> Result<String, SyncError>,
    decode: fn(&str) -> Result<Vec<T>, SyncError>,
}

enum Trigger {
    Realtime(Subscription),
    Polling(AbortHandle),
}

struct Shared<T> {
    resource: String,
    platform: Platform,
    fetch: SnapshotFetcher<T>,
    poll_interval: Duration,
    state: RefCell<SyncState<T>>,
    generation: Cell<u64>,
    /// The current generation has not resolved yet.
    in_flight: Cell<bool>,
    refetch_pending: Cell<bool>,
    fetch_count: Cell<u64>,
    mounted: Cell<bool>,
    strategy: Cell<SyncStrategy>,
    trigger: RefCell<Option<Trigger>>,
    observers: RefCell<Vec<(u64, Observer<T>)>>,
    next_observer: Cell<u64>,
    cache: Option<SnapshotCache<T>>,
}

impl<T: 'static> Shared<T> {
    /// Asks for a fresh snapshot. While a fetch is running the request is folded
    /// into a single follow-up fetch started once it resolves.
    fn request(self: &Rc<Self>, reason: &str) {
        if !self.mounted.get() {
            return;
        }
        if self.in_flight.get() {
            self.refetch_pending.set(true);
            return;
        }
        self.fetch_now(reason);
    }

    /// Starts a fetch right away. Only the most recent fetch's resolution is applied.
    fn fetch_now(self: &Rc<Self>, reason: &str) {
        if !self.mounted.get() {
            return;
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.in_flight.set(true);
        self.refetch_pending.set(false);
        self.fetch_count.set(self.fetch_count.get() + 1);
        self.state.borrow_mut().loading = true;

        let pending = (self.fetch)();
        let weak = Rc::downgrade(self);
        let label = format!("sync:{}#{}:{}", self.resource, generation, reason);
        self.platform.scheduler().spawn(Box::pin(async move {
            let result = time_it!(&label, pending.await);
            if let Some(shared) = weak.upgrade() {
                shared.resolve(generation, result);
            }
        }));
        self.notify();
    }

    fn resolve(self: &Rc<Self>, generation: u64, result: Result<Vec<T>, SyncError>) {
        let logger = self.platform.logger();
        if !self.mounted.get() {
            logger.log(&format!(
                "Discarding '{}' snapshot resolved after unmount",
                self.resource
            ));
            return;
        }
        if generation != self.generation.get() {
            logger.warn(&format!(
                "Discarding stale '{}' snapshot #{} (current #{})",
                self.resource,
                generation,
                self.generation.get()
            ));
            return;
        }
        self.in_flight.set(false);

        match result {
            Ok(snapshot) => {
                self.write_cache(&snapshot);
                let mut state = self.state.borrow_mut();
                state.data = Rc::new(snapshot);
                state.loading = false;
                state.error = None;
                state.last_updated = Some(self.platform.clock().now());
            }
            Err(err) => {
                logger.error(&format!("Error fetching '{}': {}", self.resource, err));
                let mut state = self.state.borrow_mut();
                state.loading = false;
                state.error = Some(err);
            }
        }
        self.notify();

        if self.refetch_pending.replace(false) {
            self.fetch_now("coalesced");
        }
    }

    /// Replaces a realtime channel that went away with polling, fetching once
    /// right away to pick up changes missed meanwhile.
    fn fall_back_to_polling(self: &Rc<Self>, err: SyncError) {
        if !self.mounted.get() {
            return;
        }
        let previous = self.trigger.borrow_mut().take();
        let subscription = match previous {
            Some(Trigger::Realtime(subscription)) => subscription,
            other => {
                *self.trigger.borrow_mut() = other;
                return;
            }
        };
        subscription.unsubscribe();
        self.platform.logger().warn(&format!(
            "Realtime channel for '{}' lost, polling every {}ms instead: {}",
            self.resource,
            self.poll_interval.as_millis(),
            err
        ));
        *self.trigger.borrow_mut() = Some(start_polling(self, self.poll_interval));
        self.strategy.set(SyncStrategy::Polling);
        self.request("downgrade");
    }

    fn notify(&self) {
        let state = self.state.borrow().clone();
        let observers: Vec<Observer<T>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&state);
        }
    }

    fn hydrate_from_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let cached = match self.platform.store().get(&cache.key) {
            Ok(Some(raw)) => (cache.decode)(&raw),
            Ok(None) => return,
            Err(err) => Err(err),
        };
        match cached {
            Ok(snapshot) => self.state.borrow_mut().data = Rc::new(snapshot),
            Err(err) => self.platform.logger().warn(&format!(
                "Ignoring cached '{}' snapshot: {}",
                self.resource, err
            )),
        }
    }

    fn write_cache(&self, snapshot: &[T]) {
        let Some(cache) = &self.cache else {
            return;
        };
        let written = (cache.encode)(snapshot).and_then(|raw| self.platform.store().set(&cache.key, &raw));
        if let Err(err) = written {
            self.platform.logger().warn(&format!(
                "Could not cache '{}' snapshot: {}",
                self.resource, err
            ));
        }
    }
}

async fn poll_loop<T: 'static>(
    shared: Weak<Shared<T>>,
    scheduler: &'static dyn SchedulerPort,
    interval: Duration,
) {
    loop {
        scheduler.sleep(interval).await;
        match shared.upgrade() {
            // A tick that finds a fetch still running is skipped.
            Some(shared) if shared.in_flight.get() => {}
            Some(shared) => shared.fetch_now("poll"),
            None => return,
        }
    }
}

/// Keeps one resource's snapshot in step with its source of truth.
///
/// On mount the snapshot is fetched once, then refreshed either on every realtime
/// change notification (when a realtime backend is configured) or on a fixed
/// polling interval. Exactly one of the two is active per mount and it is released
/// on [`Synchronizer::unmount`] or drop. A realtime channel that is lost after
/// opening is replaced by polling. Fetch failures keep the previous data and
/// never stop the refresh loop.
pub struct Synchronizer<T: 'static> {
    shared: Rc<Shared<T>>,
    extra: RefCell<Vec<Subscription>>,
}

impl<T: 'static> Synchronizer<T> {
    pub fn mount<F, Fut>(
        platform: &Platform,
        resource: impl Into<String>,
        fetch: F,
        options: SyncOptions,
    ) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Vec<T>, SyncError>> + 'static,
    {
        Self::mount_with(platform, resource.into(), boxed_fetcher(fetch), options, None)
    }

    /// Like [`Synchronizer::mount`], additionally persisting every snapshot under
    /// `<cache_prefix><resource>` in the shared store and starting from the cached
    /// copy while the first fetch is in flight.
    pub fn mount_cached<F, Fut>(
        platform: &Platform,
        resource: impl Into<String>,
        fetch: F,
        options: SyncOptions,
        cache_prefix: &str,
    ) -> Self
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Vec<T>, SyncError>> + 'static,
    {
        let resource = resource.into();
        let cache = SnapshotCache {
            key: format!("{cache_prefix}{resource}"),
            encode: |snapshot| serde_json::to_string(snapshot).map_err(SyncError::from),
            decode: |raw| serde_json::from_str(raw).map_err(SyncError::from),
        };
        Self::mount_with(platform, resource, boxed_fetcher(fetch), options, Some(cache))
    }

    fn mount_with(
        platform: &Platform,
        resource: String,
        fetch: SnapshotFetcher<T>,
        options: SyncOptions,
        cache: Option<SnapshotCache<T>>,
    ) -> Self {
        let shared = Rc::new(Shared {
            resource: resource.clone(),
            platform: platform.clone(),
            fetch,
            poll_interval: options.poll_interval,
            state: RefCell::new(SyncState::default()),
            generation: Cell::new(0),
            in_flight: Cell::new(false),
            refetch_pending: Cell::new(false),
            fetch_count: Cell::new(0),
            mounted: Cell::new(true),
            strategy: Cell::new(SyncStrategy::Polling),
            trigger: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(0),
            cache,
        });
        shared.hydrate_from_cache();
        shared.fetch_now("mount");

        let logger = platform.logger();
        let realtime = platform.realtime();
        let trigger = if realtime.is_configured() {
            let weak = Rc::downgrade(&shared);
            let on_change: ChangeCallback = Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.request("realtime");
                }
            });
            let weak = Rc::downgrade(&shared);
            let scheduler = platform.scheduler();
            // Deferred so the adapter is not re-entered from its own callback.
            let on_lost: LostCallback = Rc::new(move |err: SyncError| {
                let weak = weak.clone();
                scheduler.spawn(Box::pin(async move {
                    if let Some(shared) = weak.upgrade() {
                        shared.fall_back_to_polling(err);
                    }
                }));
            });
            match realtime.subscribe(&resource, on_change, on_lost) {
                Ok(subscription) => Trigger::Realtime(subscription),
                Err(err) => {
                    logger.warn(&format!(
                        "Realtime unavailable for '{}', polling every {}ms instead: {}",
                        resource,
                        options.poll_interval.as_millis(),
                        err
                    ));
                    start_polling(&shared, options.poll_interval)
                }
            }
        } else {
            start_polling(&shared, options.poll_interval)
        };

        let strategy = match trigger {
            Trigger::Realtime(_) => SyncStrategy::Realtime,
            Trigger::Polling(_) => SyncStrategy::Polling,
        };
        logger.log(&format!("Mounted '{}' sync ({:?})", resource, strategy));
        shared.strategy.set(strategy);
        *shared.trigger.borrow_mut() = Some(trigger);

        Self {
            shared,
            extra: RefCell::new(Vec::new()),
        }
    }

    /// Also refetch when another context signals a data update for this resource.
    pub fn listen_to(&self, broadcaster: &Broadcaster) -> &Self {
        let weak = Rc::downgrade(&self.shared);
        let resource = self.shared.resource.clone();
        let subscription = broadcaster.on_data_update(move |update| {
            if update.resource != resource {
                return;
            }
            if let Some(shared) = weak.upgrade() {
                shared.request("broadcast");
            }
        });
        self.keep(subscription);
        self
    }

    /// Also refetch whenever `event` is emitted on `bus`.
    pub fn refresh_on(&self, bus: &AppEventBus, event: AppEvent) -> &Self {
        let weak = Rc::downgrade(&self.shared);
        let subscription = bus.on(event, move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.request("event");
            }
            Ok(())
        });
        self.keep(subscription);
        self
    }

    fn keep(&self, subscription: Subscription) {
        if self.shared.mounted.get() {
            self.extra.borrow_mut().push(subscription);
        } else {
            subscription.unsubscribe();
        }
    }

    /// Fetches immediately, outside the polling/push cadence. A fetch already
    /// running is superseded and its result discarded.
    pub fn refresh(&self) {
        self.shared.fetch_now("refresh");
    }

    /// Registers `observer`, called after every state change (fetch started,
    /// snapshot applied, fetch failed).
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SyncState<T>) + 'static,
    {
        let id = self.shared.next_observer.get();
        self.shared.next_observer.set(id + 1);
        self.shared
            .observers
            .borrow_mut()
            .push((id, Rc::new(observer)));

        let weak = Rc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.observers.borrow_mut().retain(|(oid, _)| *oid != id);
            }
        })
    }

    pub fn state(&self) -> SyncState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn data(&self) -> Rc<Vec<T>> {
        Rc::clone(&self.shared.state.borrow().data)
    }

    pub fn loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn error(&self) -> Option<SyncError> {
        self.shared.state.borrow().error.clone()
    }

    pub fn resource(&self) -> &str {
        &self.shared.resource
    }

    /// `Realtime` until the channel fails, `Polling` from then on.
    pub fn strategy(&self) -> SyncStrategy {
        self.shared.strategy.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.get()
    }

    /// How many times the fetch function has been invoked.
    pub fn fetch_count(&self) -> u64 {
        self.shared.fetch_count.get()
    }

    /// Releases the realtime channel or polling timer plus any extra triggers.
    /// In-flight fetches are not cancelled but their results are discarded.
    pub fn unmount(&self) {
        if !self.shared.mounted.replace(false) {
            return;
        }
        let trigger = self.shared.trigger.borrow_mut().take();
        match trigger {
            Some(Trigger::Realtime(subscription)) => subscription.unsubscribe(),
            Some(Trigger::Polling(handle)) => handle.abort(),
            None => {}
        }
        let extra: Vec<Subscription> = self.extra.borrow_mut().drain(..).collect();
        for subscription in extra {
            subscription.unsubscribe();
        }
        self.shared.observers.borrow_mut().clear();
        self.shared
            .platform
            .logger()
            .log(&format!("Unmounted '{}' sync", self.shared.resource));
    }
}

impl<T: 'static> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn boxed_fetcher<T, F, Fut>(fetch: F) -> SnapshotFetcher<T>
where
    T: 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<Vec<T>, SyncError>> + 'static,
{
    Rc::new(move || -> FetchFuture<T> { Box::pin(fetch()) })
}

fn start_polling<T: 'static>(shared: &Rc<Shared<T>>, interval: Duration) -> Trigger {
    let scheduler = shared.platform.scheduler();
    let (task, handle) = abortable(poll_loop(Rc::downgrade(shared), scheduler, interval));
    scheduler.spawn(Box::pin(async move {
        let _ = task.await;
    }));
    Trigger::Polling(handle)
}
