//! Clip handles handed through to the evaluator.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque clip handle. The weighting core only looks at its name and duration;
/// keyframe data lives with the evaluator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimTrack {
    pub name: String,
    /// Duration in seconds.
    pub duration: f32,
}

impl AnimTrack {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }

    pub fn shared(name: impl Into<String>, duration: f32) -> Arc<Self> {
        Arc::new(Self::new(name, duration))
    }
}

/// Untyped asset as delivered by an asset system.
pub type AssetRef = Arc<dyn Any + Send + Sync>;

/// Recover an [`AnimTrack`] from an untyped asset, handing the asset back on mismatch.
pub fn downcast_track(asset: AssetRef) -> Result<Arc<AnimTrack>, AssetRef> {
    asset.downcast::<AnimTrack>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_accepts_tracks_and_returns_others() {
        let ok: AssetRef = AnimTrack::shared("walk", 1.0);
        assert_eq!(downcast_track(ok).unwrap().name, "walk");

        let wrong: AssetRef = Arc::new(String::from("texture"));
        let back = downcast_track(wrong).unwrap_err();
        assert!(back.downcast_ref::<String>().is_some());
    }
}
