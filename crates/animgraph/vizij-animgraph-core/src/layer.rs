//! A weighted, optionally masked stream wrapping one controller.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::controller::AnimController;
use crate::definition::LayerDef;
use crate::error::{AnimGraphError, Result};
use crate::mask::LayerMask;
use crate::outputs::{AnimEvent, ClipSample};
use crate::parameters::ParameterResolver;
use crate::state::{AnimState, ANIM_STATE_START};
use crate::track::{downcast_track, AnimTrack, AssetRef};
use crate::transition::AnimTransition;

/// How a layer composites onto the layers below it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnimLayerBlendType {
    #[default]
    Overwrite,
    Additive,
}

/// Linear ramp of the layer weight.
#[derive(Copy, Clone, Debug, PartialEq)]
struct WeightBlend {
    starting: f32,
    target: f32,
    duration: f32,
    elapsed: f32,
}

#[derive(Clone, Debug)]
pub struct AnimComponentLayer {
    name: String,
    controller: AnimController,
    weight: f32,
    blend_type: AnimLayerBlendType,
    mask: Option<LayerMask>,
    weight_blend: Option<WeightBlend>,
    normalize_weights: bool,
    targets_dirty: bool,
    rebind_generation: u64,
}

impl AnimComponentLayer {
    pub fn new(
        name: impl Into<String>,
        controller: AnimController,
        weight: f32,
        blend_type: AnimLayerBlendType,
        normalize_weights: bool,
    ) -> Self {
        Self {
            name: name.into(),
            controller,
            weight,
            blend_type,
            mask: None,
            weight_blend: None,
            normalize_weights,
            targets_dirty: true,
            rebind_generation: 0,
        }
    }

    pub fn from_def(def: &LayerDef, activate: bool, normalize_weights: bool) -> Result<Self> {
        let controller = AnimController::from_layer_def(def, activate)?;
        let mut layer = Self::new(
            def.name.clone(),
            controller,
            def.weight,
            def.blend_type,
            normalize_weights,
        );
        layer.mask = def.mask.clone();
        Ok(layer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controller(&self) -> &AnimController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimController {
        &mut self.controller
    }

    // --- Weight -----------------------------------------------------------------

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Unclamped; normalisation across layers is the component's job.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
        self.targets_dirty = true;
    }

    /// Ramp linearly from the current weight to `weight` over `time` seconds,
    /// driven by subsequent updates.
    pub fn blend_to_weight(&mut self, weight: f32, time: f32) {
        self.weight_blend = Some(WeightBlend {
            starting: self.weight,
            target: weight,
            duration: time.max(0.0),
            elapsed: 0.0,
        });
    }

    /// Duration of the ramp in progress, 0 when idle.
    pub fn blend_time(&self) -> f32 {
        self.weight_blend.map_or(0.0, |b| b.duration)
    }

    pub fn blending(&self) -> bool {
        self.weight_blend.is_some()
    }

    /// Whether a weight was written since the last call.
    pub fn take_targets_dirty(&mut self) -> bool {
        std::mem::take(&mut self.targets_dirty)
    }

    pub fn update(&mut self, dt: f32, params: &mut dyn ParameterResolver) {
        if let Some(blend) = &mut self.weight_blend {
            blend.elapsed += dt;
            let weight = if blend.elapsed >= blend.duration {
                let target = blend.target;
                self.weight_blend = None;
                target
            } else {
                let t = blend.elapsed / blend.duration;
                blend.starting + (blend.target - blend.starting) * t
            };
            self.set_weight(weight);
        }
        self.controller.update(dt, params);
    }

    // --- Blending mode & mask ---------------------------------------------------

    pub fn blend_type(&self) -> AnimLayerBlendType {
        self.blend_type
    }

    pub fn set_blend_type(&mut self, blend_type: AnimLayerBlendType) {
        if blend_type != self.blend_type {
            self.blend_type = blend_type;
            if self.normalize_weights {
                self.rebind();
            }
        }
    }

    pub fn mask(&self) -> Option<&LayerMask> {
        self.mask.as_ref()
    }

    /// Replace the mask. Returns whether the bindings need to be rebuilt.
    pub fn set_mask(&mut self, mask: Option<LayerMask>) -> bool {
        if !self.controller.playable() {
            log::warn!(
                "mask assigned to layer '{}' before all of its animations are assigned",
                self.name
            );
        }
        if self.mask == mask {
            return false;
        }
        self.mask = mask;
        self.rebind();
        true
    }

    /// Request that bone-to-track wiring be rebuilt.
    pub fn rebind(&mut self) {
        self.rebind_generation += 1;
    }

    /// Bumped whenever bindings must be rebuilt.
    pub fn rebind_generation(&self) -> u64 {
        self.rebind_generation
    }

    // --- Playback ---------------------------------------------------------------

    pub fn play(&mut self, name: Option<&str>) -> Result<()> {
        self.controller.play(name)
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn playing(&self) -> bool {
        self.controller.playing()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.controller.set_playing(playing);
    }

    pub fn playable(&self) -> bool {
        self.controller.playable()
    }

    pub fn active_state(&self) -> &str {
        self.controller.active_state_name()
    }

    pub fn previous_state(&self) -> Option<&str> {
        self.controller.previous_state_name()
    }

    pub fn active_state_progress(&self) -> f32 {
        self.controller.active_state_progress()
    }

    pub fn active_state_duration(&self) -> f32 {
        self.controller.active_state_duration()
    }

    pub fn active_state_current_time(&self) -> f32 {
        self.controller.active_state_current_time()
    }

    pub fn set_active_state_current_time(&mut self, time: f32) {
        self.controller.set_active_state_current_time(time);
    }

    pub fn transitioning(&self) -> bool {
        self.controller.transitioning()
    }

    pub fn transition_progress(&self) -> Option<f32> {
        self.controller.transition_progress()
    }

    pub fn states(&self) -> Vec<&str> {
        self.controller.state_names()
    }

    pub fn find_state(&self, name: &str) -> Option<&AnimState> {
        self.controller.find_state(name)
    }

    /// Cross-fade from the active state to `to` over `time` seconds, starting
    /// the destination at the normalised `offset`.
    pub fn transition(&mut self, to: &str, time: f32, offset: Option<f32>) -> Result<()> {
        let transition = AnimTransition::new(self.controller.active_state_name(), to)
            .with_time(time)
            .with_offset(offset);
        self.controller.update_state_from_transition(&transition)
    }

    // --- Assets -----------------------------------------------------------------

    /// Assign an untyped asset to the clip at `node_path`. Anything other than
    /// an [`AnimTrack`] is rejected and nothing is attached.
    pub fn assign_animation(
        &mut self,
        node_path: &str,
        asset: AssetRef,
        speed: Option<f32>,
        looping: Option<bool>,
    ) -> Result<()> {
        match downcast_track(asset) {
            Ok(track) => self.assign_track(node_path, track, speed, looping),
            Err(other) => {
                let found = format!("{:?}", (*other).type_id());
                log::error!(
                    "layer '{}': asset assigned to '{node_path}' is not an AnimTrack",
                    self.name
                );
                Err(AnimGraphError::TrackTypeMismatch {
                    path: node_path.to_string(),
                    found,
                })
            }
        }
    }

    pub fn assign_track(
        &mut self,
        node_path: &str,
        track: Arc<AnimTrack>,
        speed: Option<f32>,
        looping: Option<bool>,
    ) -> Result<()> {
        self.controller
            .assign_animation(node_path, track, speed, looping)?;
        if self.controller.transitions().is_empty() {
            let state = node_path.split('.').next().unwrap_or(node_path);
            self.controller
                .add_transition(AnimTransition::new(ANIM_STATE_START, state))?;
        }
        self.targets_dirty = true;
        Ok(())
    }

    /// Drop every track of `state` and stop playback.
    pub fn remove_node_animations(&mut self, state: &str) -> Result<()> {
        if self.controller.remove_node_animations(state)? {
            self.controller.pause();
        }
        Ok(())
    }

    // --- Evaluator contract -----------------------------------------------------

    pub fn collect_samples(&self, out: &mut Vec<ClipSample>) {
        self.controller.collect_samples(out);
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, AnimEvent> {
        self.controller.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterStore;

    fn layer() -> AnimComponentLayer {
        let controller =
            AnimController::new(vec![AnimState::new("Idle", 1.0, true)], Vec::new(), true)
                .unwrap();
        AnimComponentLayer::new("Base", controller, 0.0, AnimLayerBlendType::Overwrite, false)
    }

    #[test]
    fn weight_ramp_snaps_to_target() {
        let mut layer = layer();
        let mut params = ParameterStore::new();
        layer.blend_to_weight(1.0, 2.0);
        assert_eq!(layer.blend_time(), 2.0);
        layer.update(1.0, &mut params);
        assert!((layer.weight() - 0.5).abs() < 1e-6);
        layer.update(1.0, &mut params);
        assert_eq!(layer.weight(), 1.0);
        assert_eq!(layer.blend_time(), 0.0);
        assert!(!layer.blending());
    }

    #[test]
    fn zero_time_ramp_applies_on_next_update() {
        let mut layer = layer();
        let mut params = ParameterStore::new();
        layer.blend_to_weight(0.8, 5.0);
        layer.update(1.0, &mut params);
        layer.blend_to_weight(0.3, -1.0);
        assert_eq!(layer.blend_time(), 0.0);
        layer.update(0.0, &mut params);
        assert_eq!(layer.weight(), 0.3);
    }

    #[test]
    fn set_weight_marks_targets_dirty() {
        let mut layer = layer();
        assert!(layer.take_targets_dirty());
        assert!(!layer.take_targets_dirty());
        layer.set_weight(2.0);
        assert_eq!(layer.weight(), 2.0);
        assert!(layer.take_targets_dirty());
    }

    #[test]
    fn rejects_assets_that_are_not_tracks() {
        let mut layer = layer();
        let asset: AssetRef = Arc::new(String::from("not a track"));
        let err = layer
            .assign_animation("Idle", asset, None, None)
            .unwrap_err();
        assert!(matches!(err, AnimGraphError::TrackTypeMismatch { .. }));
        assert!(!layer.playable());
        assert!(layer.find_state("Idle").unwrap().animations().next().is_none());
    }

    #[test]
    fn first_assignment_adds_start_transition() {
        let controller = AnimController::new(Vec::new(), Vec::new(), true).unwrap();
        let mut layer =
            AnimComponentLayer::new("Base", controller, 1.0, AnimLayerBlendType::Overwrite, false);
        let asset: AssetRef = AnimTrack::shared("wave", 1.0);
        layer.assign_animation("Wave", asset, Some(2.0), None).unwrap();
        assert_eq!(layer.controller().transitions().len(), 1);
        assert_eq!(layer.controller().transitions()[0].to, "Wave");
        assert!(layer.playing());

        let mut params = ParameterStore::new();
        layer.update(0.25, &mut params);
        assert_eq!(layer.active_state(), "Wave");
        assert_eq!(layer.find_state("Wave").unwrap().speed(), 2.0);
    }

    #[test]
    fn mask_changes_bump_rebind_generation() {
        let mut layer = layer();
        let mask = LayerMask::new().with_path("root/arm", true);
        assert!(layer.set_mask(Some(mask.clone())));
        assert!(!layer.set_mask(Some(mask)));
        assert_eq!(layer.rebind_generation(), 1);

        layer.set_blend_type(AnimLayerBlendType::Additive);
        assert_eq!(layer.rebind_generation(), 1, "only rebinds under normalisation");
    }

    #[test]
    fn remove_node_animations_stops_playback() {
        let mut layer = layer();
        layer
            .assign_track("Idle", AnimTrack::shared("idle", 1.0), None, None)
            .unwrap();
        assert!(layer.playing());
        layer.remove_node_animations("Idle").unwrap();
        assert!(!layer.playing());
        assert!(layer.remove_node_animations("Nope").is_err());
    }
}
