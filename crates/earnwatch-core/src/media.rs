//! Media player seam
//!
//! The embedded video player is an external collaborator. The monitor
//! reads its position and rate and issues corrective commands through
//! this trait; it never decides anything based on UI state.

/// Controls the guard needs from a video player
pub trait MediaPlayer {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Video duration in seconds, `None` until metadata is loaded
    fn duration(&self) -> Option<f64>;

    /// Current playback rate (1.0 is normal speed)
    fn playback_rate(&self) -> f64;

    /// Whether the player is currently playing
    fn is_playing(&self) -> bool;

    /// Move the playhead
    fn seek_to(&mut self, position: f64);

    /// Change the playback rate
    fn set_playback_rate(&mut self, rate: f64);

    /// Start playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);
}

impl<P: MediaPlayer + ?Sized> MediaPlayer for Box<P> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn duration(&self) -> Option<f64> {
        (**self).duration()
    }

    fn playback_rate(&self) -> f64 {
        (**self).playback_rate()
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }

    fn seek_to(&mut self, position: f64) {
        (**self).seek_to(position);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        (**self).set_playback_rate(rate);
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn pause(&mut self) {
        (**self).pause();
    }
}
