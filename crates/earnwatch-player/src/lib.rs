//! Earnwatch Player - shell and session driver
//!
//! Everything between the guard's policy and a screen:
//! - `PlayerShell` / `PlayerView`: controls, progress bar, popups, notices
//! - `ShareAction`: native share with clipboard fallback
//! - `TaskSchedule`: the four named periodic tasks of a session
//! - `WatchGuard`: the single task that owns monitor, store and player
//! - `SimulatedPlayer`: a clock-driven player for the CLI and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use earnwatch_player::prelude::*;
//!
//! let (guard, views) = WatchGuard::new(video, config.guard, player, store, reporter);
//! let (commands, rx) = tokio::sync::mpsc::channel(16);
//! let session = tokio::spawn(guard.run(rx));
//! commands.send(GuardCommand::Play).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod notice;
pub mod popup;
pub mod schedule;
pub mod share;
pub mod shell;
pub mod sim;

pub use config::EarnwatchConfig;
pub use driver::{GuardCommand, SessionReport, WatchGuard};
pub use error::ShareError;
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use popup::{PopupEvent, PopupKind, PopupQueue};
pub use schedule::{ScheduledTask, TaskSchedule};
pub use share::{Clipboard, NativeShare, ShareAction, ShareOutcome, SharePayload, TerminalClipboard};
pub use shell::{render_text, CompletionStatus, PlayButton, PlayerShell, PlayerView};
pub use sim::SimulatedPlayer;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a watch session
    pub use crate::{
        EarnwatchConfig, GuardCommand, PlayerView, SessionReport, ShareAction, SharePayload,
        SimulatedPlayer, WatchGuard,
    };
    pub use earnwatch_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
