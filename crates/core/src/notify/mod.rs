//! Outbound notification contract.
//!
//! The orchestrator reports progress as bare [`StackEvent`] kinds through a
//! [`Notifier`]. Transports decide how to deliver them: [`ChannelNotifier`]
//! forwards timestamped envelopes over an mpsc channel, [`LogNotifier`] writes
//! them to the tracing log.

mod events;
mod handle;

pub use events::StackEvent;
pub use handle::{ChannelNotifier, LogNotifier, Notification, Notifier};
