use crate::config::SyncConfig;
use crate::domain::broadcast::Broadcaster;
use crate::domain::events::{AppEvent, AppEventBus, Resource};
use crate::domain::notifications::NotificationCenter;
use crate::domain::sync::{SyncError, Synchronizer};
use crate::platform::Platform;
use crate::ports::NotificationStorePort;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::rc::Rc;

/// Application-root scope. Owns the one event bus and broadcaster of an execution
/// context and hands them to every component that publishes or synchronizes.
pub struct AppContext {
    platform: Platform,
    config: SyncConfig,
    bus: AppEventBus,
    broadcaster: Broadcaster,
}

impl AppContext {
    pub fn new(config: SyncConfig) -> Self {
        let platform = Platform::from_config(&config);
        Self::with_platform(platform, config)
    }

    pub fn with_platform(platform: Platform, config: SyncConfig) -> Self {
        let bus = AppEventBus::new(platform.logger());
        let broadcaster =
            Broadcaster::new(&platform).with_update_key(config.data_update_key.clone());
        Self {
            platform,
            config,
            bus,
            broadcaster,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn bus(&self) -> &AppEventBus {
        &self.bus
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Mounts a synchronizer for `resource` that also refetches on bus events
    /// touching the resource and on data-update signals from other contexts.
    pub fn mount<T, F, Fut>(&self, resource: &str, fetch: F) -> Synchronizer<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Vec<T>, SyncError>> + 'static,
    {
        let options = self.config.sync_options();
        let sync = if self.config.cache_snapshots {
            Synchronizer::mount_cached(
                &self.platform,
                resource,
                fetch,
                options,
                &self.config.cache_prefix,
            )
        } else {
            Synchronizer::mount(&self.platform, resource, fetch, options)
        };

        if options.listen_for_broadcasts {
            sync.listen_to(&self.broadcaster);
        }
        for event in AppEvent::invalidating(resource) {
            sync.refresh_on(&self.bus, event);
        }
        sync
    }

    /// Announces a local mutation: synchronously to this context's listeners, and
    /// to other contexts through the broadcaster. Returns how many local listeners ran.
    pub fn publish(&self, event: AppEvent, payload: serde_json::Value) -> usize {
        let delivered = self.bus.emit(&event, &payload);
        match event.resource() {
            Some(resource) => {
                self.broadcaster.notify_data_update(resource.as_str());
            }
            None => {
                for resource in Resource::ALL {
                    self.broadcaster.notify_data_update(resource.as_str());
                }
            }
        }
        delivered
    }

    pub fn notification_center(
        &self,
        user_id: impl Into<String>,
        store: Rc<dyn NotificationStorePort>,
    ) -> Rc<NotificationCenter> {
        Rc::new(
            NotificationCenter::new(&self.platform, user_id, store)
                .with_bus(self.bus.clone())
                .with_broadcaster(self.broadcaster.clone()),
        )
    }
}
