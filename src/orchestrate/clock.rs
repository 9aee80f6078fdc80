use serde::Deserialize;

use crate::foundation::error::{ScrollError, ScrollResult};
use crate::foundation::ids::TimelineId;

/// How many times a clock-driven timeline plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    /// One play.
    #[default]
    Once,
    /// One play plus `n` repeats.
    Times(u32),
    /// Loop forever.
    Infinite,
}

impl Repeat {
    fn cycles(self) -> Option<u64> {
        match self {
            Self::Once => Some(1),
            Self::Times(n) => Some(u64::from(n) + 1),
            Self::Infinite => None,
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match i64::deserialize(deserializer)? {
            -1 => Ok(Self::Infinite),
            0 => Ok(Self::Once),
            n if n > 0 => u32::try_from(n)
                .map(Self::Times)
                .map_err(serde::de::Error::custom),
            n => Err(serde::de::Error::custom(format!(
                "repeat must be -1 (infinite) or >= 0, got {n}"
            ))),
        }
    }
}

/// Real-time playback parameters for a timeline not bound to scroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockPlayback {
    /// Repeat policy.
    pub repeat: Repeat,
    /// Alternate direction on every repeat.
    pub yoyo: bool,
    /// Seconds before the first play starts.
    pub delay: f64,
}

impl ClockPlayback {
    /// Loop forever.
    pub fn infinite() -> Self {
        Self {
            repeat: Repeat::Infinite,
            ..Self::default()
        }
    }

    /// Set the repeat policy.
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Enable yoyo.
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Set the start delay.
    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }
}

/// Frame-clock driver of one timeline; ignores scroll.
#[derive(Clone, Debug)]
pub struct ClockDriver {
    timeline: TimelineId,
    playback: ClockPlayback,
    duration: f64,
    elapsed: f64,
    rendered: Option<f64>,
    finished: bool,
}

impl ClockDriver {
    pub(crate) fn new(
        timeline: TimelineId,
        duration: f64,
        playback: ClockPlayback,
    ) -> ScrollResult<Self> {
        if !playback.delay.is_finite() || playback.delay < 0.0 {
            return Err(ScrollError::configuration(format!(
                "clock delay must be >= 0 (got {})",
                playback.delay
            )));
        }
        if playback.repeat == Repeat::Infinite && duration <= 0.0 {
            return Err(ScrollError::configuration(
                "an infinite timeline needs a positive duration",
            ));
        }
        Ok(Self {
            timeline,
            playback,
            duration,
            elapsed: 0.0,
            rendered: None,
            finished: false,
        })
    }

    /// Driven timeline.
    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }

    /// Seconds since playback started, including the delay.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Return `true` once a finite playback reached its final state and rendered it.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Normalized progress at `elapsed` seconds and whether playback has ended.
    pub fn progress_at(&self, elapsed: f64) -> (f64, bool) {
        let t = (elapsed - self.playback.delay).max(0.0);
        if self.duration <= 0.0 {
            return (1.0, true);
        }
        if let Some(cycles) = self.playback.repeat.cycles()
            && t >= cycles as f64 * self.duration
        {
            let last_reversed = self.playback.yoyo && (cycles - 1) % 2 == 1;
            return (if last_reversed { 0.0 } else { 1.0 }, true);
        }
        let iteration = (t / self.duration).floor();
        let local = (t - iteration * self.duration) / self.duration;
        let reversed = self.playback.yoyo && iteration % 2.0 == 1.0;
        (if reversed { 1.0 - local } else { local }, false)
    }

    /// Advance by `dt` seconds; returns the progress to render when it changed.
    pub(crate) fn advance(&mut self, dt: f64) -> Option<f64> {
        if self.finished {
            return None;
        }
        self.elapsed += dt;
        let (progress, done) = self.progress_at(self.elapsed);
        self.finished = done;
        if self.rendered == Some(progress) {
            return None;
        }
        self.rendered = Some(progress);
        Some(progress)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/clock.rs"]
mod tests;
