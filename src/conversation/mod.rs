//! Conversation State Reconciler
//!
//! Keeps the ordered transcript, applies optimistic local updates, and merges
//! server responses or error fallbacks back in. Network failures never escape
//! this layer: they become notices and, for chat sends, transcript entries.

pub mod notice;
pub mod reconciler;

pub use notice::{Notice, NoticeLevel, NoticeQueue};
pub use reconciler::{ConversationReconciler, PendingSend, SendOutcome, SendResolution};
