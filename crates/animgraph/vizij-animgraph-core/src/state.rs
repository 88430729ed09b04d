//! States of the graph: a name bound to one blend tree (or a single clip).

use std::sync::Arc;

use crate::blend::AnimTree;
use crate::definition::StateDef;
use crate::error::{AnimGraphError, Result};
use crate::ids::NodeIndex;
use crate::track::AnimTrack;

pub const ANIM_STATE_START: &str = "START";
pub const ANIM_STATE_END: &str = "END";
pub const ANIM_STATE_ANY: &str = "ANY";

/// Pseudo-states present in every controller. They never hold clips.
pub const CONTROL_STATES: [&str; 3] = [ANIM_STATE_START, ANIM_STATE_END, ANIM_STATE_ANY];

pub fn is_control_state(name: &str) -> bool {
    CONTROL_STATES.contains(&name)
}

#[derive(Clone, Debug)]
pub struct AnimState {
    name: String,
    speed: f32,
    looping: bool,
    tree: AnimTree,
}

impl AnimState {
    /// A state playing a single clip.
    pub fn new(name: impl Into<String>, speed: f32, looping: bool) -> Self {
        let name = name.into();
        Self {
            tree: AnimTree::single(&name),
            name,
            speed,
            looping,
        }
    }

    pub fn control(name: &str) -> Self {
        Self::new(name, 1.0, true)
    }

    pub fn from_def(def: &StateDef) -> Result<Self> {
        let tree = match &def.blend_tree {
            Some(blend) => AnimTree::from_def(&def.name, blend)?,
            None => AnimTree::single(&def.name),
        };
        Ok(Self {
            name: def.name.clone(),
            speed: def.speed,
            looping: def.looping,
            tree,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn tree(&self) -> &AnimTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut AnimTree {
        &mut self.tree
    }

    pub fn is_control(&self) -> bool {
        is_control_state(&self.name)
    }

    /// Attach `track` to the clip at `path`, whose first segment is this state's name.
    pub fn assign_animation(&mut self, path: &[&str], track: Arc<AnimTrack>) -> Result<NodeIndex> {
        let unknown = || AnimGraphError::UnknownNode {
            state: self.name.clone(),
            path: path.join("."),
        };
        let (head, rest) = path.split_first().ok_or_else(unknown)?;
        if *head != self.name {
            return Err(unknown());
        }
        let index = self.tree.find(rest).ok_or_else(unknown)?;
        if !self.tree.set_track(index, Some(track)) {
            return Err(unknown());
        }
        Ok(index)
    }

    pub fn remove_animations(&mut self) {
        let clips: Vec<NodeIndex> = self.tree.clips().collect();
        for clip in clips {
            self.tree.set_track(clip, None);
        }
    }

    /// Clips that currently have a track.
    pub fn animations(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.tree.clips().filter(|c| self.tree.track(*c).is_some())
    }

    /// Every clip leaf has a track assigned.
    pub fn has_animations(&self) -> bool {
        self.node_count() > 0 && self.animations().count() == self.node_count()
    }

    pub fn playable(&self) -> bool {
        self.is_control() || self.has_animations()
    }

    pub fn node_count(&self) -> usize {
        self.tree.clip_count()
    }

    /// Longest assigned track, in seconds.
    pub fn timeline_duration(&self) -> f32 {
        self.animations()
            .filter_map(|c| self.tree.track(c))
            .map(|t| t.duration)
            .fold(0.0, f32::max)
    }

    /// Sum of effective weights over clips that have a track.
    pub fn total_weight(&self) -> f32 {
        self.animations().map(|c| self.tree.effective_weight(c)).sum()
    }

    /// Effective weight of `index` relative to [`total_weight`](Self::total_weight).
    pub fn normalized_weight(&self, index: NodeIndex) -> f32 {
        let total = self.total_weight();
        if total > 0.0 {
            self.tree.effective_weight(index) / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendKind;
    use crate::definition::{BlendChildDef, BlendTreeDef};
    use crate::node::Point;
    use crate::parameters::{ParamValue, ParameterStore, ParameterType};

    fn move_state() -> AnimState {
        let def = StateDef::new("Move").with_blend_tree(BlendTreeDef::new(
            BlendKind::OneD,
            &["speed"],
            vec![
                BlendChildDef::clip("Walk", Point::Scalar(0.0)),
                BlendChildDef::clip("Run", Point::Scalar(1.0)),
            ],
        ));
        AnimState::from_def(&def).unwrap()
    }

    #[test]
    fn control_states_are_always_playable() {
        let start = AnimState::control(ANIM_STATE_START);
        assert!(start.is_control());
        assert!(start.playable());
        assert!(!AnimState::new("Idle", 1.0, true).playable());
    }

    #[test]
    fn assignment_resolves_dot_paths_from_the_state_name() {
        let mut state = move_state();
        state
            .assign_animation(&["Move", "Walk"], AnimTrack::shared("walk", 1.0))
            .unwrap();
        assert!(!state.has_animations());
        state
            .assign_animation(&["Move", "Run"], AnimTrack::shared("run", 0.5))
            .unwrap();
        assert!(state.has_animations());
        assert!(state.playable());
        assert_eq!(state.timeline_duration(), 1.0);

        let err = state
            .assign_animation(&["Move", "Jog"], AnimTrack::shared("jog", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            AnimGraphError::UnknownNode {
                state: "Move".into(),
                path: "Move.Jog".into()
            }
        );
        assert!(state
            .assign_animation(&["Idle"], AnimTrack::shared("idle", 1.0))
            .is_err());

        state.remove_animations();
        assert_eq!(state.animations().count(), 0);
        assert_eq!(state.node_count(), 2);
    }

    #[test]
    fn normalized_weights_cover_assigned_clips() {
        let mut state = move_state();
        let walk = state
            .assign_animation(&["Move", "Walk"], AnimTrack::shared("walk", 1.0))
            .unwrap();
        let run = state
            .assign_animation(&["Move", "Run"], AnimTrack::shared("run", 1.0))
            .unwrap();
        let mut params = ParameterStore::new();
        params.define("speed", ParameterType::Float, ParamValue::Float(0.25));
        state.tree_mut().calculate_weights(&params);
        assert_eq!(state.total_weight(), 1.0);
        assert_eq!(state.normalized_weight(walk), 0.75);
        assert_eq!(state.normalized_weight(run), 0.25);
    }

    #[test]
    fn single_clip_state_is_addressed_by_its_name() {
        let mut state = AnimState::new("Idle", 1.0, false);
        let root = state
            .assign_animation(&["Idle"], AnimTrack::shared("idle", 2.0))
            .unwrap();
        assert_eq!(root, NodeIndex::ROOT);
        assert_eq!(state.normalized_weight(root), 1.0);
    }
}
