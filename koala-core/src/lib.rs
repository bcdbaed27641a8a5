//! # koala-core
//!
//! Core library for koala - a semantic analytics event emitter.
//!
//! This library provides:
//! - [`EventTracker`], with one method per tracked application moment
//! - The [`TrackingBackend`] seam events are handed to
//! - Device/app default properties read from the host
//! - An HTTP backend, configuration and logging infrastructure
//!
//! ## Flow
//!
//! A tracking call builds an event name and its own properties, overlays
//! them on the cached default properties (event keys win), and calls the
//! backend once. Nothing is queued, retried or persisted here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use koala_core::{Config, EventTracker, KoalaClient, SystemHost};
//!
//! let config = Config::load().expect("failed to load config");
//! let client = KoalaClient::new(&config.client).expect("invalid client config");
//!
//! let tracker = EventTracker::with_host(client, SystemHost::new(config.device));
//! tracker.app_open();
//! ```

// Re-export commonly used items at the crate root
pub use backend::{LogBackend, RecordingBackend, TrackingBackend};
pub use client::KoalaClient;
pub use config::Config;
pub use device::{DefaultProperties, DeviceIdiom, HostEnvironment, StaticHost, SystemHost};
pub use error::{Error, Result};
pub use tracker::{EventTracker, TrackedEvent};
pub use types::*;

// Public modules
pub mod backend;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod tracker;
pub mod types;
