//! Earnwatch Core - Video watch-progress guard
//!
//! The policy half of the guard:
//! - Watch sessions and violation counters
//! - Obfuscated, best-effort progress persistence
//! - The playback monitor state machine (high-water-mark, skip and
//!   rate tampering detection, completion)
//!
//! Nothing here talks to the network or owns a timer. The monitor is fed
//! ticks and player readings by a driver (see `earnwatch-player`).
//!
//! # Example
//!
//! ```rust,ignore
//! use earnwatch_core::{GuardConfig, MemoryStorage, PlaybackMonitor, ProgressStore, VideoId};
//!
//! let store = ProgressStore::new(MemoryStorage::new());
//! let video = VideoId::new("abc123");
//! let restored = store.load(&video);
//!
//! let mut monitor = PlaybackMonitor::new(video, GuardConfig::default(), restored);
//! monitor.on_ready(&mut player);
//! monitor.on_play(Instant::now());
//! let event = monitor.tick(&mut player, Instant::now());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod media;
pub mod monitor;
pub mod storage;
pub mod store;
pub mod types;

pub use config::GuardConfig;
pub use error::{ConfigError, StoreError};
pub use media::MediaPlayer;
pub use monitor::{
    MonitorEvent, MonitorState, PlaybackMonitor, ResetReason, SeekDecision,
};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::ProgressStore;
pub use types::{VideoId, ViolationCounter, WatchSession};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the watch guard
    pub use crate::{
        GuardConfig, MediaPlayer, MonitorEvent, MonitorState, PlaybackMonitor, ProgressStore,
        SessionStorage, VideoId, WatchSession,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
