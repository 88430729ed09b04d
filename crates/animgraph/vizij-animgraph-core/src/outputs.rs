//! Output contracts for the evaluator.
//!
//! Each tick produces, per layer, the clips to sample together with their
//! blend weight and local time, plus a list of state-machine events. Sampling
//! tracks into poses and compositing layers happen outside this crate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::layer::AnimLayerBlendType;
use crate::track::AnimTrack;

/// One `(track, weight, local time)` tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSample {
    pub state: String,
    /// Dot path of the clip inside its state, e.g. `"Move.Run"`.
    pub node_path: String,
    pub track: Arc<AnimTrack>,
    /// Within-tree weight including the cross-fade factor, in `[0, 1]`.
    pub weight: f32,
    pub local_time: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerOutput {
    pub layer: String,
    pub blend_type: AnimLayerBlendType,
    /// Layer weight, already normalised across layers when enabled.
    pub weight: f32,
    pub samples: Vec<ClipSample>,
}

/// State-machine signals emitted while updating a controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimEvent {
    StateEntered {
        state: String,
    },
    TransitionStarted {
        from: String,
        to: String,
    },
    TransitionEnded {
        state: String,
    },
    /// A transition towards `interrupted` was replaced by one towards `to`.
    TransitionInterrupted {
        interrupted: String,
        to: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerEvent {
    pub layer: String,
    pub event: AnimEvent,
}

/// Outputs returned by `AnimComponent::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub layers: Vec<LayerOutput>,
    #[serde(default)]
    pub events: Vec<LayerEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.layers.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, layer: &str, event: AnimEvent) {
        self.events.push(LayerEvent {
            layer: layer.to_string(),
            event,
        });
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.samples.is_empty()) && self.events.is_empty()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerOutput> {
        self.layers.iter().find(|l| l.layer == name)
    }
}
