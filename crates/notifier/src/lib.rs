//! Reminder delivery for the habit tracker.
//!
//! This crate sends reminder messages through the Telegram Bot API and
//! suppresses duplicate deliveries with idempotency keys.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use notifier::{
//!     DispatchConfig, Dispatcher, MemoryDedupStore, ReminderJob, TelegramClient, TelegramConfig,
//! };
//!
//! # async fn example() -> Result<(), notifier::NotifyError> {
//! let client = TelegramClient::new(TelegramConfig::new("123:abc"))?;
//! let dispatcher = Dispatcher::new(
//!     Arc::new(client),
//!     Arc::new(MemoryDedupStore::new()),
//!     DispatchConfig::default(),
//! );
//!
//! dispatcher
//!     .deliver(&ReminderJob {
//!         chat_id: 555,
//!         text: "Time to do your habit: <b>Read</b>".to_string(),
//!         keys: vec!["42_2026-10-19_0900".to_string()],
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod sender;

pub use client::{SentMessage, TelegramClient};
pub use config::{TelegramConfig, DEFAULT_API_URL};
pub use dedup::{DedupStore, MemoryDedupStore, DEFAULT_DEDUP_TTL};
pub use dispatch::{DeliveryOutcome, DispatchConfig, Dispatcher, ReminderJob};
pub use error::{NotifyError, Result};
pub use sender::{LoggingNotifier, Notifier, RecordingNotifier, SentNotification};
