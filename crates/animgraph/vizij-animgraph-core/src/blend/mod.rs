//! Blend trees: per-state arenas of clip leaves and blend nodes.
//!
//! Nodes live in a flat `Vec` built top-down from a definition. Each node keeps
//! the index of its parent, so effective weights and synchronised speeds are
//! found by walking towards the root instead of through owning back-pointers.
//!
//! - [`one_d`] sweeps sorted 1D points and interpolates the bracketing pair.
//! - [`cartesian`] and [`directional`] are gradient-band kernels for 2D points.
//! - [`direct`] maps one parameter to each child.
//!
//! All kernels share the same contract: given the children and the current
//! parameter values, overwrite every child's local weight.

mod cartesian;
mod direct;
mod directional;
mod one_d;


use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::definition::{BlendChildDef, BlendTreeDef};
use crate::error::{AnimGraphError, Result};
use crate::ids::NodeIndex;
use crate::node::{AnimNode, Point};
use crate::parameters::ParameterResolver;
use crate::track::AnimTrack;

#[inline]
pub(crate) fn sub(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub(crate) fn dot(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

/// Scale weights to sum to 1; an all-zero set stays zero.
pub(crate) fn normalize(weights: &mut [f32]) {
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    } else {
        weights.fill(0.0);
    }
}

/// Weight kernel used by a blend node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendKind {
    #[default]
    #[serde(rename = "1D")]
    OneD,
    #[serde(rename = "2D_CARTESIAN")]
    Cartesian2D,
    #[serde(rename = "2D_DIRECTIONAL")]
    Directional2D,
    #[serde(rename = "DIRECT")]
    Direct,
}

impl BlendKind {
    /// Number of parameters the kernel reads for `child_count` children.
    pub fn parameter_count(self, child_count: usize) -> usize {
        match self {
            Self::OneD => 1,
            Self::Cartesian2D | Self::Directional2D => 2,
            Self::Direct => child_count,
        }
    }
}

/// Internal node: ordered children plus the parameters driving their weights.
#[derive(Clone, Debug)]
pub struct BlendTree {
    kind: BlendKind,
    parameters: Vec<String>,
    children: Vec<NodeIndex>,
    sync_animations: bool,
    /// Parameter values seen by the last computation.
    parameter_values: Vec<Option<f32>>,
    /// Forces the next computation (construction, track changes).
    dirty: bool,
    /// Weighted cycle length of this subtree from the last computation.
    weighted_duration: f32,
}

impl BlendTree {
    pub fn kind(&self) -> BlendKind {
        self.kind
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn sync_animations(&self) -> bool {
        self.sync_animations
    }

    /// Σ cycle × weight over the children, as of the last computation.
    pub fn weighted_duration(&self) -> f32 {
        self.weighted_duration
    }
}

#[derive(Clone, Debug)]
pub enum TreeNodeKind {
    Clip(AnimNode),
    Blend(BlendTree),
}

/// One slot of the arena.
#[derive(Clone, Debug)]
pub struct TreeNode {
    name: String,
    point: Point,
    parent: Option<NodeIndex>,
    /// Local weight assigned by the parent (root is always 1).
    weight: f32,
    /// Speed factor assigned by a synchronising parent.
    weighted_speed: f32,
    kind: TreeNodeKind,
}

impl TreeNode {
    fn new(name: &str, point: Point, parent: Option<NodeIndex>, kind: TreeNodeKind) -> Self {
        Self {
            name: name.to_string(),
            point,
            parent,
            weight: 1.0,
            weighted_speed: 1.0,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn weighted_speed(&self) -> f32 {
        self.weighted_speed
    }

    pub fn kind(&self) -> &TreeNodeKind {
        &self.kind
    }

    pub fn as_clip(&self) -> Option<&AnimNode> {
        match &self.kind {
            TreeNodeKind::Clip(clip) => Some(clip),
            TreeNodeKind::Blend(_) => None,
        }
    }

    pub fn as_blend(&self) -> Option<&BlendTree> {
        match &self.kind {
            TreeNodeKind::Blend(tree) => Some(tree),
            TreeNodeKind::Clip(_) => None,
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self.kind, TreeNodeKind::Clip(_))
    }
}

/// All nodes of one state. The root sits at [`NodeIndex::ROOT`] and is either
/// a single clip or a blend node.
#[derive(Clone, Debug)]
pub struct AnimTree {
    nodes: Vec<TreeNode>,
}

impl AnimTree {
    /// A tree holding exactly one clip named after the state.
    pub fn single(name: &str) -> Self {
        Self {
            nodes: vec![TreeNode::new(
                name,
                Point::default(),
                None,
                TreeNodeKind::Clip(AnimNode::new(1.0)),
            )],
        }
    }

    pub fn from_def(name: &str, def: &BlendTreeDef) -> Result<Self> {
        let mut tree = Self { nodes: Vec::new() };
        tree.push_blend(
            name,
            Point::default(),
            None,
            def.kind,
            def.parameter_names(),
            def.sync_animations,
            &def.children,
        )?;
        Ok(tree)
    }

    #[allow(clippy::too_many_arguments)]
    fn push_blend(
        &mut self,
        name: &str,
        point: Point,
        parent: Option<NodeIndex>,
        kind: BlendKind,
        parameters: Vec<String>,
        sync_animations: bool,
        children: &[BlendChildDef],
    ) -> Result<NodeIndex> {
        let needed = kind.parameter_count(children.len());
        if children.len() > 1 && parameters.len() < needed {
            return Err(AnimGraphError::InvalidDefinition {
                reason: format!(
                    "blend tree '{name}' needs {needed} parameter(s), got {}",
                    parameters.len()
                ),
            });
        }

        let index = NodeIndex::from_usize(self.nodes.len());
        self.nodes.push(TreeNode::new(
            name,
            point,
            parent,
            TreeNodeKind::Blend(BlendTree {
                kind,
                parameter_values: vec![None; parameters.len()],
                parameters,
                children: Vec::with_capacity(children.len()),
                sync_animations,
                dirty: true,
                weighted_duration: 0.0,
            }),
        ));

        // The 1D sweep relies on ascending points; the sort is stable so equal
        // points keep their authored order. Direct trees pair children with
        // parameters by position and must not be reordered.
        let mut ordered: Vec<&BlendChildDef> = children.iter().collect();
        if kind == BlendKind::OneD {
            ordered.sort_by(|a, b| a.point.scalar().total_cmp(&b.point.scalar()));
        }

        let mut child_indices = Vec::with_capacity(ordered.len());
        for child in ordered {
            let child_index = if child.is_tree() {
                self.push_blend(
                    &child.name,
                    child.point,
                    Some(index),
                    child.kind.unwrap_or_default(),
                    child.parameter_names(),
                    child.sync_animations.unwrap_or(true),
                    &child.children,
                )?
            } else {
                let clip_index = NodeIndex::from_usize(self.nodes.len());
                self.nodes.push(TreeNode::new(
                    &child.name,
                    child.point,
                    Some(index),
                    TreeNodeKind::Clip(AnimNode::new(child.speed)),
                ));
                clip_index
            };
            child_indices.push(child_index);
        }
        if let TreeNodeKind::Blend(tree) = &mut self.nodes[index.index()].kind {
            tree.children = child_indices;
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex::ROOT
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index.index())
    }

    /// Whether the root is a blend node rather than a single clip.
    pub fn is_blend_tree(&self) -> bool {
        self.nodes.first().is_some_and(|n| !n.is_clip())
    }

    /// Clip leaves in arena order.
    pub fn clips(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_clip())
            .map(|(i, _)| NodeIndex::from_usize(i))
    }

    pub fn clip_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_clip()).count()
    }

    /// Resolve child names below the root, e.g. `["Strafe", "Left"]`.
    pub fn find(&self, path: &[&str]) -> Option<NodeIndex> {
        let mut current = self.root();
        for segment in path {
            let tree = self.node(current)?.as_blend()?;
            current = *tree
                .children
                .iter()
                .find(|c| self.nodes[c.index()].name == *segment)?;
        }
        Some(current)
    }

    /// Child by name directly below `index`.
    pub fn child(&self, index: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.find_from(index, name)
    }

    fn find_from(&self, index: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.node(index)?
            .as_blend()?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.index()].name == name)
    }

    fn ancestry(&self, index: NodeIndex) -> impl Iterator<Item = &TreeNode> + '_ {
        std::iter::successors(self.nodes.get(index.index()), move |node| {
            node.parent.and_then(|p| self.nodes.get(p.index()))
        })
    }

    /// Dot-joined names from the root, e.g. `"Locomotion.Strafe.Left"`.
    pub fn path_of(&self, index: NodeIndex) -> String {
        let mut names: Vec<&str> = self.ancestry(index).map(|n| n.name.as_str()).collect();
        names.reverse();
        names.join(".")
    }

    /// Local weight multiplied by every ancestor's local weight.
    pub fn effective_weight(&self, index: NodeIndex) -> f32 {
        self.ancestry(index).map(|n| n.weight).product()
    }

    /// Clip speed scaled by every synchronisation factor on the way to the root.
    pub fn playback_speed(&self, index: NodeIndex) -> f32 {
        let own = self
            .node(index)
            .and_then(TreeNode::as_clip)
            .map(AnimNode::speed)
            .unwrap_or(1.0);
        own * self.ancestry(index).map(|n| n.weighted_speed).product::<f32>()
    }

    pub fn track(&self, index: NodeIndex) -> Option<&Arc<AnimTrack>> {
        self.node(index)?.as_clip()?.track()
    }

    /// Attach (or detach) a clip. Returns `false` when `index` is not a clip.
    pub fn set_track(&mut self, index: NodeIndex, track: Option<Arc<AnimTrack>>) -> bool {
        let Some(TreeNodeKind::Clip(clip)) = self.nodes.get_mut(index.index()).map(|n| &mut n.kind)
        else {
            return false;
        };
        clip.set_track(track);

        // Cycle lengths changed; synchronised ancestors must recompute.
        let mut current = self.nodes[index.index()].parent;
        while let Some(parent) = current {
            let node = &mut self.nodes[parent.index()];
            if let TreeNodeKind::Blend(tree) = &mut node.kind {
                tree.dirty = true;
            }
            current = node.parent;
        }
        true
    }

    /// Recompute local weights (and synchronised speeds) of every blend node.
    ///
    /// Subtrees whose parameters did not change since the previous call are
    /// skipped. Returns whether anything was recomputed.
    pub fn calculate_weights(&mut self, params: &dyn ParameterResolver) -> bool {
        if !self.is_blend_tree() {
            return false;
        }
        self.calculate_node(self.root(), params)
    }

    fn calculate_node(&mut self, index: NodeIndex, params: &dyn ParameterResolver) -> bool {
        let children = match &mut self.nodes[index.index()].kind {
            TreeNodeKind::Blend(tree) => std::mem::take(&mut tree.children),
            TreeNodeKind::Clip(_) => return false,
        };

        // Children first: a parent's sync sum depends on nested cycle lengths.
        let mut changed = false;
        for &child in &children {
            changed |= self.calculate_node(child, params);
        }
        changed |= self.refresh_parameters(index, params);

        if changed {
            self.apply_kernel(index, &children);
            self.synchronize(index, &children);
        } else {
            log::trace!(
                "blend tree '{}' unchanged; skipping weights",
                self.nodes[index.index()].name
            );
        }

        if let TreeNodeKind::Blend(tree) = &mut self.nodes[index.index()].kind {
            tree.children = children;
            tree.dirty = false;
        }
        changed
    }

    fn refresh_parameters(&mut self, index: NodeIndex, params: &dyn ParameterResolver) -> bool {
        let TreeNodeKind::Blend(tree) = &mut self.nodes[index.index()].kind else {
            return false;
        };
        let mut changed = tree.dirty;
        for (name, cached) in tree.parameters.iter().zip(tree.parameter_values.iter_mut()) {
            let value = params.value_of(name);
            if *cached != Some(value) {
                *cached = Some(value);
                changed = true;
            }
        }
        changed
    }

    fn points_2d(&self, children: &[NodeIndex]) -> Vec<[f32; 2]> {
        children
            .iter()
            .map(|c| self.nodes[c.index()].point.vec2())
            .collect()
    }

    fn apply_kernel(&mut self, index: NodeIndex, children: &[NodeIndex]) {
        let TreeNodeKind::Blend(tree) = &self.nodes[index.index()].kind else {
            return;
        };
        let kind = tree.kind;
        let values: Vec<f32> = tree
            .parameter_values
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        let value = |i: usize| values.get(i).copied().unwrap_or(0.0);

        let mut weights = vec![0.0f32; children.len()];
        if children.len() <= 1 {
            weights.fill(1.0);
        } else {
            match kind {
                BlendKind::OneD => {
                    let points: Vec<f32> = children
                        .iter()
                        .map(|c| self.nodes[c.index()].point.scalar())
                        .collect();
                    one_d::weights(&points, value(0), &mut weights);
                }
                BlendKind::Cartesian2D => {
                    let points = self.points_2d(children);
                    cartesian::weights(&points, [value(0), value(1)], &mut weights);
                }
                BlendKind::Directional2D => {
                    let points = self.points_2d(children);
                    directional::weights(&points, [value(0), value(1)], &mut weights);
                }
                BlendKind::Direct => {
                    let driven: Vec<f32> = (0..children.len()).map(value).collect();
                    direct::weights(&driven, &mut weights);
                }
            }
        }

        for (child, weight) in children.iter().zip(weights) {
            self.nodes[child.index()].weight = weight;
        }
    }

    fn cycle_duration(&self, index: NodeIndex) -> Option<f32> {
        match &self.nodes[index.index()].kind {
            TreeNodeKind::Clip(clip) => clip.cycle_duration(),
            TreeNodeKind::Blend(tree) => {
                (tree.weighted_duration > 0.0).then_some(tree.weighted_duration)
            }
        }
    }

    /// Rescale children so every weighted clip completes a loop in the same
    /// wall time: `weighted_speed = cycle / Σ(cycle × weight)`.
    fn synchronize(&mut self, index: NodeIndex, children: &[NodeIndex]) {
        let weighted_duration: f32 = children
            .iter()
            .filter_map(|c| {
                self.cycle_duration(*c)
                    .map(|cycle| cycle * self.nodes[c.index()].weight)
            })
            .sum();

        let sync = match &mut self.nodes[index.index()].kind {
            TreeNodeKind::Blend(tree) => {
                tree.weighted_duration = weighted_duration;
                tree.sync_animations
            }
            TreeNodeKind::Clip(_) => return,
        };
        if !sync {
            return;
        }

        for &child in children {
            let speed = match self.cycle_duration(child) {
                Some(cycle) if weighted_duration > 0.0 => cycle / weighted_duration,
                _ => 1.0,
            };
            self.nodes[child.index()].weighted_speed = speed;
        }
    }
}
