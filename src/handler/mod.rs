pub mod channel;
pub mod runner;
pub(crate) mod subscribers;

pub type SubscriptionId = u64;

pub use channel::{ChannelSink, channel};
pub use runner::TickHandler;
