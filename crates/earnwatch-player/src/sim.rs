//! Simulated media player
//!
//! Plays in (tokio) real time at the current rate. Clones share one
//! playhead, so a test or the CLI can hold a handle and poke the player
//! behind the driver's back the way browser devtools would.

use earnwatch_core::MediaPlayer;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug)]
struct SimState {
    duration: Option<f64>,
    anchor_position: f64,
    anchor_at: Instant,
    rate: f64,
    playing: bool,
}

impl SimState {
    fn position(&self, now: Instant) -> f64 {
        let mut position = self.anchor_position;
        if self.playing {
            position += now.duration_since(self.anchor_at).as_secs_f64() * self.rate;
        }
        match self.duration {
            Some(d) => position.clamp(0.0, d),
            None => position.max(0.0),
        }
    }

    fn reanchor(&mut self, now: Instant) {
        self.anchor_position = self.position(now);
        self.anchor_at = now;
    }

    fn ended(&self, now: Instant) -> bool {
        self.duration.is_some_and(|d| self.position(now) >= d)
    }
}

/// Clock-driven player
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlayer {
    /// Player for a video of `duration` seconds, paused at 0
    #[must_use]
    pub fn new(duration: f64) -> Self {
        let player = Self::unloaded();
        player.load(duration);
        player
    }

    /// Player whose metadata has not arrived yet
    #[must_use]
    pub fn unloaded() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                duration: None,
                anchor_position: 0.0,
                anchor_at: Instant::now(),
                rate: 1.0,
                playing: false,
            })),
        }
    }

    /// Metadata arrived
    pub fn load(&self, duration: f64) {
        let mut state = self.state.lock();
        state.reanchor(Instant::now());
        state.duration = Some(duration.max(0.0));
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.state.lock().position(Instant::now())
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn is_playing(&self) -> bool {
        let state = self.state.lock();
        state.playing && !state.ended(Instant::now())
    }

    fn seek_to(&mut self, position: f64) {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.reanchor(now);
        state.anchor_position = match state.duration {
            Some(d) => position.clamp(0.0, d),
            None => position.max(0.0),
        };
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let mut state = self.state.lock();
        state.reanchor(Instant::now());
        state.rate = rate;
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        if state.duration.is_none() || state.ended(now) {
            return;
        }
        state.reanchor(now);
        state.playing = true;
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.reanchor(Instant::now());
        state.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn advances_with_time_and_rate() {
        let mut player = SimulatedPlayer::new(100.0);
        player.play();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!((player.current_time() - 4.0).abs() < 1e-6);

        player.set_playback_rate(2.0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!((player.current_time() - 10.0).abs() < 1e-6);

        player.pause();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!((player.current_time() - 10.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_the_end() {
        let mut player = SimulatedPlayer::new(5.0);
        player.play();
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(player.current_time(), 5.0);
        assert!(!player.is_playing());

        player.play();
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_the_playhead() {
        let mut player = SimulatedPlayer::new(100.0);
        let mut devtools = player.clone();
        player.play();
        devtools.seek_to(80.0);
        assert_eq!(player.current_time(), 80.0);
        assert!(player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn unloaded_player_cannot_play() {
        let mut player = SimulatedPlayer::unloaded();
        assert_eq!(player.duration(), None);
        player.play();
        assert!(!player.is_playing());

        player.load(30.0);
        player.play();
        assert!(player.is_playing());
    }
}
