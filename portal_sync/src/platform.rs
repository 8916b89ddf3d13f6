/// Platform - Dependency injection container for all ports.
///
/// Hybrid approach:
/// - Stateless ports: `&'static` references (logger, clock, scheduler)
/// - Stateful ports: `Rc<dyn Trait>` (shared store, realtime backend); the whole
///   subsystem runs on one event loop so nothing here is `Send`.
use crate::adapters::shared::DisabledRealtime;
use crate::config::SyncConfig;
use crate::ports::{ClockPort, KeyValueStorePort, LoggerPort, RealtimePort, SchedulerPort};
use std::rc::Rc;

#[derive(Clone)]
pub struct Platform {
    logger: &'static dyn LoggerPort,
    clock: &'static dyn ClockPort,
    scheduler: &'static dyn SchedulerPort,
    store: Rc<dyn KeyValueStorePort>,
    realtime: Rc<dyn RealtimePort>,
}

impl Platform {
    /// Creates a new Platform with default adapters for the current target and no
    /// realtime backend.
    pub fn new() -> Self {
        let logger = crate::adapters::logger();
        Self {
            logger,
            clock: crate::adapters::clock(),
            scheduler: crate::adapters::scheduler(),
            store: default_store(logger),
            realtime: Rc::new(DisabledRealtime),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_config(config: &SyncConfig) -> Self {
        use crate::adapters::wasm::WebSocketRealtime;

        Self::new().with_realtime(Rc::new(WebSocketRealtime::new(config.realtime_url.clone())))
    }

    /// Native builds have no socket client; a realtime port must be injected with
    /// [`Platform::with_realtime`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &SyncConfig) -> Self {
        let platform = Self::new();
        if let Some(url) = &config.realtime_url {
            platform.logger.warn(&format!(
                "Ignoring realtime URL {url}: no native realtime adapter, polling instead"
            ));
        }
        platform
    }

    pub fn with_store(mut self, store: Rc<dyn KeyValueStorePort>) -> Self {
        self.store = store;
        self
    }

    pub fn with_realtime(mut self, realtime: Rc<dyn RealtimePort>) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn with_logger(mut self, logger: &'static dyn LoggerPort) -> Self {
        self.logger = logger;
        self
    }

    #[inline]
    pub fn logger(&self) -> &'static dyn LoggerPort {
        self.logger
    }

    #[inline]
    pub fn clock(&self) -> &'static dyn ClockPort {
        self.clock
    }

    #[inline]
    pub fn scheduler(&self) -> &'static dyn SchedulerPort {
        self.scheduler
    }

    pub fn store(&self) -> Rc<dyn KeyValueStorePort> {
        Rc::clone(&self.store)
    }

    pub fn realtime(&self) -> Rc<dyn RealtimePort> {
        Rc::clone(&self.realtime)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
fn default_store(logger: &'static dyn LoggerPort) -> Rc<dyn KeyValueStorePort> {
    use crate::adapters::shared::SharedMemoryStore;
    use crate::adapters::wasm::LocalStorageStore;

    match LocalStorageStore::new() {
        Ok(store) => Rc::new(store),
        Err(err) => {
            logger.warn(&format!(
                "localStorage unavailable ({err}), cross-tab signals are disabled"
            ));
            Rc::new(SharedMemoryStore::new().context())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_store(_logger: &'static dyn LoggerPort) -> Rc<dyn KeyValueStorePort> {
    Rc::new(crate::adapters::shared::SharedMemoryStore::new().context())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::shared::{MemoryRealtime, SharedMemoryStore};

    #[test]
    fn test_platform_defaults_to_polling() {
        let platform = Platform::new();
        assert!(!platform.realtime().is_configured());
        platform.logger().log("test");
    }

    #[test]
    fn test_platform_store_round_trip() {
        let platform = Platform::default();
        platform.store().set("k", "v").unwrap();
        assert_eq!(platform.store().get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_platform_clone_shares_stateful_ports() {
        let origin = SharedMemoryStore::new();
        let platform = Platform::new().with_store(Rc::new(origin.context()));
        let cloned = platform.clone();

        platform.store().set("shared", "yes").unwrap();
        assert_eq!(cloned.store().get("shared").unwrap().as_deref(), Some("yes"));
    }

    #[test]
    fn test_with_realtime() {
        let platform = Platform::new().with_realtime(Rc::new(MemoryRealtime::new()));
        assert!(platform.realtime().is_configured());
    }

    #[test]
    fn test_from_config_without_native_realtime() {
        let config = SyncConfig::default().with_realtime_url("ws://localhost:8080/ws");
        let platform = Platform::from_config(&config);
        assert!(!platform.realtime().is_configured());
    }
}
