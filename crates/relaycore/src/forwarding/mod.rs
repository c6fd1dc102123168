//! Forwarding decisions derived from task settings

pub mod plan;
pub mod recent;

pub use plan::{contains_link, pick_delay, plan_forward, ForwardDecision, IncomingMessage, SkipReason};
pub use recent::RecentMessages;
