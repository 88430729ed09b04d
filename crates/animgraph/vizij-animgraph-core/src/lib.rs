//! Vizij Animation Graph Core (engine-agnostic)
//!
//! Decides, every frame, how much each animation clip contributes to a pose.
//! Blend trees turn live parameters into per-clip weights, controllers run the
//! state machine and its cross-fades, and layers add a ramped weight, a blend
//! mode and an optional mask on top. The result of a tick is a list of
//! `(track, weight, local time)` samples per layer; sampling tracks into bone
//! transforms is left to the evaluator.

pub mod blend;
pub mod component;
pub mod config;
pub mod controller;
pub mod definition;
pub mod error;
pub mod ids;
pub mod layer;
pub mod mask;
pub mod node;
pub mod outputs;
pub mod parameters;
pub mod state;
pub mod track;
pub mod transition;

// Re-exports for consumers (adapters)
pub use blend::{AnimTree, BlendKind, BlendTree, TreeNode, TreeNodeKind};
pub use component::AnimComponent;
pub use config::Config;
pub use controller::AnimController;
pub use definition::{BlendChildDef, BlendTreeDef, LayerDef, ParameterDef, StateDef, StateGraphDef};
pub use error::{AnimGraphError, Result};
pub use ids::{NodeIndex, StateIndex};
pub use layer::{AnimComponentLayer, AnimLayerBlendType};
pub use mask::{LayerMask, MaskEntry};
pub use node::{AnimNode, Point};
pub use outputs::{AnimEvent, ClipSample, LayerEvent, LayerOutput, Outputs};
pub use parameters::{ParamValue, Parameter, ParameterResolver, ParameterStore, ParameterType};
pub use state::{AnimState, ANIM_STATE_ANY, ANIM_STATE_END, ANIM_STATE_START, CONTROL_STATES};
pub use track::{downcast_track, AnimTrack, AssetRef};
pub use transition::{AnimTransition, Condition, InterruptionSource, Predicate};
