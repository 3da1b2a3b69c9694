//! HTTP adapters: availability fetcher and notification dispatchers

mod availability;
mod error;
mod fetcher;
mod notify;

pub use availability::parse_availabilities;
pub use error::SetupError;
pub use fetcher::{page_starts, AvailabilityFetcher};
pub use notify::{
    build_dispatcher, build_dispatcher_with, notification_text, LogDispatcher, TwilioDispatcher,
    WebhookDispatcher,
};
