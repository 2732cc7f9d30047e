pub mod broadcaster;
pub mod subscriber;
pub mod types;


pub use broadcaster::Broadcaster;
pub use subscriber::ChannelSubscriber;
pub use types::*;
