//! Animation tables and the clock that walks through them.

use std::fs;
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use wolf_mds::FrameInfo;

use crate::error::{CharacterError, Result};

/// Marker line after which animation rows start.
pub const START_MARKER: &str = "STARTANIMS";

/// One row of an animation table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationEntry {
    pub name: String,
    pub first_frame: usize,
    pub length: usize,
    pub looping: i32,
    pub fps: u32,
    pub move_speed: f32,
}

/// Parsed animation table, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationTable {
    entries: Vec<AnimationEntry>,
}

impl AnimationTable {
    /// Parses table text.
    ///
    /// Lines up to the one containing `STARTANIMS` are ignored. After it,
    /// each row holds `name first_frame length looping fps move_speed`;
    /// rows with fewer fields are skipped and extra fields are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut started = false;

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            if !started {
                started = line.contains(START_MARKER);
                continue;
            }

            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            let [name, first_frame, length, looping, fps, move_speed, ..] = tokens[..] else {
                log::warn!("Skipping animation row {line_number}: {trimmed:?}");
                continue;
            };

            entries.push(AnimationEntry {
                name: name.to_string(),
                first_frame: field(first_frame, "first frame", line_number)?,
                length: field(length, "length", line_number)?,
                looping: field(looping, "looping", line_number)?,
                fps: field(fps, "fps", line_number)?,
                move_speed: field(move_speed, "move speed", line_number)?,
            });
        }

        if !started {
            log::warn!("No {START_MARKER} line found, animation table is empty");
        }
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::parse(&fs::read_to_string(path)?)?;
        log::debug!("Animation table {}: {} entries", path.display(), table.len());
        Ok(table)
    }

    /// First entry named `name`.
    pub fn find(&self, name: &str) -> Option<&AnimationEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&AnimationEntry> {
        self.find(name)
            .ok_or_else(|| CharacterError::AnimationNotFound(name.to_string()))
    }

    pub fn entries(&self) -> &[AnimationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnimationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a AnimationTable {
    type Item = &'a AnimationEntry;
    type IntoIter = std::slice::Iter<'a, AnimationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn field<T: FromStr>(token: &str, what: &str, line: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    token.parse().map_err(|e| CharacterError::Parse {
        line,
        message: format!("invalid {what} {token:?}: {e}"),
    })
}

/// Plays one animation at its own frame rate, looping.
///
/// Each [`update`](Self::update) returns the pose for the current time and
/// then advances the clock, so the first update after
/// [`set_animation`](Self::set_animation) shows the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    start_frame: usize,
    frame_count: usize,
    fps: f32,
    current_frame: f32,
    time: f32,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            start_frame: 0,
            frame_count: 1,
            fps: 15.0,
            current_frame: 0.0,
            time: 0.0,
        }
    }
}

impl AnimationClock {
    pub fn new(entry: &AnimationEntry) -> Self {
        let mut clock = Self::default();
        clock.set_animation(entry);
        clock
    }

    /// Switches to `entry` and rewinds to its first frame.
    ///
    /// Elapsed time carries over; it wraps at the new animation's length on
    /// the next update.
    pub fn set_animation(&mut self, entry: &AnimationEntry) {
        self.start_frame = entry.first_frame;
        self.frame_count = entry.length;
        self.fps = entry.fps as f32;
        self.current_frame = 0.0;
    }

    /// Length of one loop in seconds; zero for a static animation.
    pub fn duration(&self) -> f32 {
        if self.is_static() {
            0.0
        } else {
            self.frame_count as f32 / self.fps
        }
    }

    /// Fractional frame within the animation.
    pub fn current_frame(&self) -> f32 {
        self.current_frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the pose for the current time, then advances by `dt`
    /// seconds.
    pub fn update(&mut self, dt: f32) -> FrameInfo {
        let pose = self.pose();
        if self.is_static() {
            return pose;
        }

        let duration = self.duration();
        self.time += dt;
        if self.time >= duration {
            self.time = 0.0;
        }
        self.current_frame = self.frame_count as f32 * (self.time / duration);
        pose
    }

    /// Frame pair and blend for the current fractional frame.
    pub fn pose(&self) -> FrameInfo {
        if self.is_static() {
            return FrameInfo::single(self.start_frame);
        }

        let current = (self.current_frame.max(0.0) as usize).min(self.frame_count - 1);
        let next = (current + 1) % self.frame_count;
        let lerp = self.current_frame.fract();
        FrameInfo::blend(self.start_frame + next, self.start_frame + current, lerp)
    }

    fn is_static(&self) -> bool {
        self.frame_count == 0 || self.fps <= 0.0
    }
}
