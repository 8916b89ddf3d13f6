pub mod converters;
pub mod portal;
pub mod watch;

pub use portal::{PortalSync, SubscriptionHandle};
pub use watch::ResourceWatch;
