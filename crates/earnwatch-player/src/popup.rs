//! Skip-button popups
//!
//! Each press of rewind or forward shows a short-lived popup. Presses of
//! the same button while its popup is still visible fold into it and bump
//! its count ("-30s" after three rewinds).

use serde::Serialize;
use std::time::{Duration, Instant};

/// Which button produced the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupKind {
    /// Rewind button
    Rewind,
    /// Forward button
    Forward,
}

impl PopupKind {
    /// Sign applied to the step in labels
    #[inline]
    #[must_use]
    pub fn sign(self) -> char {
        match self {
            Self::Rewind => '-',
            Self::Forward => '+',
        }
    }
}

/// One visible popup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupEvent {
    /// Button
    pub kind: PopupKind,
    /// Presses folded into this popup
    pub count: u32,
    /// Playhead after the last press
    pub position: f64,
    /// Unique key for the renderer
    pub key: u64,
}

impl PopupEvent {
    /// Label such as `+20s`
    #[must_use]
    pub fn label(&self, step_secs: f64) -> String {
        format!(
            "{}{:.0}s",
            self.kind.sign(),
            step_secs * f64::from(self.count)
        )
    }
}

/// Popups currently on screen
#[derive(Debug)]
pub struct PopupQueue {
    ttl: Duration,
    next_key: u64,
    visible: Vec<(PopupEvent, Instant)>,
}

impl PopupQueue {
    /// Create queue whose popups live for `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_key: 0,
            visible: Vec::new(),
        }
    }

    /// Record a button press
    ///
    /// Returns the popup now showing for that button.
    pub fn push(&mut self, kind: PopupKind, position: f64, now: Instant) -> &PopupEvent {
        self.expire(now);

        let expires = now + self.ttl;
        if let Some(idx) = self.visible.iter().position(|(p, _)| p.kind == kind) {
            let (popup, deadline) = &mut self.visible[idx];
            popup.count += 1;
            popup.position = position;
            *deadline = expires;
            return &self.visible[idx].0;
        }

        let key = self.next_key;
        self.next_key += 1;
        self.visible.push((
            PopupEvent {
                kind,
                count: 1,
                position,
                key,
            },
            expires,
        ));
        &self.visible[self.visible.len() - 1].0
    }

    /// Drop popups whose time is up
    pub fn expire(&mut self, now: Instant) {
        self.visible.retain(|(_, deadline)| *deadline > now);
    }

    /// Popups still visible at `now`
    #[must_use]
    pub fn active(&self, now: Instant) -> Vec<PopupEvent> {
        self.visible
            .iter()
            .filter(|(_, deadline)| *deadline > now)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.visible.clear();
    }
}
