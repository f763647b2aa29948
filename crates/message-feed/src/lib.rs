//! In-memory notification feed.
//!
//! Decodes Gotify push messages, derives their display fields (priority
//! tier, relative age, application label) and keeps them in an observable,
//! newest-first feed.

pub mod age;
pub mod feed;
pub mod item;
pub mod message;
pub mod priority;

pub use feed::{Feed, FeedCallback, FeedChange, FeedEvent, SubscriptionId};
pub use item::FeedItem;
pub use message::{DecodeError, Message};
pub use priority::PriorityTier;
