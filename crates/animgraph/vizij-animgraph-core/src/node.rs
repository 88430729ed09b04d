//! Clip leaves of a blend tree and their coordinates in parameter space.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::track::AnimTrack;

/// Coordinate of a child in its parent's parameter space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Point {
    Scalar(f32),
    Vec2([f32; 2]),
}

impl Default for Point {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

impl Point {
    /// 1D coordinate (x for 2D points).
    #[inline]
    pub fn scalar(&self) -> f32 {
        match *self {
            Self::Scalar(v) => v,
            Self::Vec2([x, _]) => x,
        }
    }

    /// 2D coordinate (scalars lie on the x axis).
    #[inline]
    pub fn vec2(&self) -> [f32; 2] {
        match *self {
            Self::Scalar(v) => [v, 0.0],
            Self::Vec2(p) => p,
        }
    }

    /// Distance from the origin; scalars keep their sign.
    #[inline]
    pub fn length(&self) -> f32 {
        match *self {
            Self::Scalar(v) => v,
            Self::Vec2([x, y]) => (x * x + y * y).sqrt(),
        }
    }
}

/// Leaf wrapping one clip. The per-frame weight and synchronised speed are kept
/// on the owning [`TreeNode`](crate::blend::TreeNode).
#[derive(Clone, Debug, PartialEq)]
pub struct AnimNode {
    track: Option<Arc<AnimTrack>>,
    speed: f32,
}

impl AnimNode {
    pub fn new(speed: f32) -> Self {
        Self { track: None, speed }
    }

    /// `None` while the clip has not been assigned or is still loading.
    pub fn track(&self) -> Option<&Arc<AnimTrack>> {
        self.track.as_ref()
    }

    pub(crate) fn set_track(&mut self, track: Option<Arc<AnimTrack>>) {
        self.track = track;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn absolute_speed(&self) -> f32 {
        self.speed.abs()
    }

    /// Wall time of one loop at this node's own speed, if it is knowable.
    pub fn cycle_duration(&self) -> Option<f32> {
        let track = self.track.as_ref()?;
        let speed = self.absolute_speed();
        (track.duration > 0.0 && speed > 0.0).then(|| track.duration / speed)
    }
}
