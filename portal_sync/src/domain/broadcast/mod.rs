pub mod broadcaster;

pub use broadcaster::{Broadcaster, DataUpdate, DATA_UPDATE_KEY};
