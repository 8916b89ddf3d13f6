use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use std::rc::Rc;

/// A value changed in the shared store by another execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
}

pub type ChangeListener = Rc<dyn Fn(&StorageChange)>;

/// Port for the synchronous key/value store shared by every context of one origin.
///
/// Listeners registered through `subscribe` are only told about writes made by
/// *other* contexts; a context never observes its own `set` or `remove`.
pub trait KeyValueStorePort {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;

    fn remove(&self, key: &str) -> Result<(), SyncError>;

    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription, SyncError>;
}
