pub mod broadcast;
pub mod events;
pub mod notifications;
pub mod subscription;
pub mod sync;
