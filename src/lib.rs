//! # Coursework
//!
//! A learning management backend: courses and lessons with owner-based
//! access control, course subscriptions, Stripe checkout, a manual payments
//! ledger and email notifications to subscribers. Usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! coursework = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use coursework::checkout::OfflineGateway;
//! use coursework::notify::{LogMailer, NotificationDispatcher, NotificationQueue, spawn_worker};
//! use coursework::server::{AppState, create_router};
//! use coursework::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/coursework.db")).unwrap();
//! store.initialize().unwrap();
//! let store: Arc<dyn Store> = Arc::new(store);
//!
//! let (queue, rx) = NotificationQueue::new(256);
//! let dispatcher = NotificationDispatcher::new(
//!     store.clone(),
//!     Arc::new(LogMailer),
//!     "noreply@example.com".to_string(),
//! );
//! spawn_worker(rx, Arc::new(dispatcher));
//!
//! let state = Arc::new(AppState::new(store, Arc::new(OfflineGateway::new()), queue));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
pub mod checkout;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod ledger;
pub mod notify;
pub mod policy;
pub mod server;
pub mod store;
pub mod types;
