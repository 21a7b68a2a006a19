//! Contracts for the platform services the core drives.
//!
//! The timer never reaches for a global audio player or notification
//! centre; it is handed implementations of these traits at construction.
//! Every call is idempotent from the caller's side (stop before start,
//! cancel before schedule), so a late reply to an earlier request cannot
//! leave a sound playing or a notification pending.

mod audio;
mod entitlement;
mod notify;
pub mod recording;

pub use audio::AudioGateway;
pub use entitlement::{
    Entitlement, EntitlementGateway, EntitlementListener, MockEntitlementGateway, Product,
    PRODUCTS,
};
pub use notify::{completion_message, NotificationAction, NotificationGateway, NotificationHandle};
