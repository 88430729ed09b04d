//! Serialized state-graph definitions.
//!
//! These mirror the JSON written by the authoring tools and are consumed once,
//! when states, controllers and layers are constructed.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::blend::BlendKind;
use crate::error::Result;
use crate::layer::AnimLayerBlendType;
use crate::mask::LayerMask;
use crate::node::Point;
use crate::parameters::{ParamValue, ParameterType};
use crate::transition::AnimTransition;

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// A full graph: layers plus the parameters they read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateGraphDef {
    #[serde(default)]
    pub layers: Vec<LayerDef>,
    #[serde(default)]
    pub parameters: HashMap<String, ParameterDef>,
}

impl StateGraphDef {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDef {
    pub name: String,
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<AnimTransition>,
    #[serde(default)]
    pub blend_type: AnimLayerBlendType,
    #[serde(default = "one")]
    pub weight: f32,
    #[serde(default)]
    pub mask: Option<LayerMask>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDef {
    pub name: String,
    #[serde(default = "one")]
    pub speed: f32,
    #[serde(default = "yes", rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub blend_tree: Option<BlendTreeDef>,
}

impl StateDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            speed: 1.0,
            looping: true,
            blend_tree: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_blend_tree(mut self, tree: BlendTreeDef) -> Self {
        self.blend_tree = Some(tree);
        self
    }
}

/// Root blend tree of a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendTreeDef {
    #[serde(rename = "type", default)]
    pub kind: BlendKind,
    /// Single parameter shorthand used by 1D trees.
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "yes")]
    pub sync_animations: bool,
    #[serde(default)]
    pub children: Vec<BlendChildDef>,
}

impl BlendTreeDef {
    pub fn new(kind: BlendKind, parameters: &[&str], children: Vec<BlendChildDef>) -> Self {
        Self {
            kind,
            parameter: None,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            sync_animations: true,
            children,
        }
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync_animations = sync;
        self
    }

    pub fn parameter_names(&self) -> Vec<String> {
        match &self.parameter {
            Some(p) => vec![p.clone()],
            None => self.parameters.clone(),
        }
    }
}

/// Child of a blend tree: a clip leaf, or a nested tree when `children` is non-empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendChildDef {
    pub name: String,
    #[serde(default)]
    pub point: Point,
    #[serde(default = "one")]
    pub speed: f32,
    #[serde(rename = "type", default)]
    pub kind: Option<BlendKind>,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub sync_animations: Option<bool>,
    #[serde(default)]
    pub children: Vec<BlendChildDef>,
}

impl BlendChildDef {
    pub fn clip(name: impl Into<String>, point: Point) -> Self {
        Self {
            name: name.into(),
            point,
            speed: 1.0,
            kind: None,
            parameter: None,
            parameters: Vec::new(),
            sync_animations: None,
            children: Vec::new(),
        }
    }

    pub fn tree(name: impl Into<String>, point: Point, tree: BlendTreeDef) -> Self {
        Self {
            name: name.into(),
            point,
            speed: 1.0,
            kind: Some(tree.kind),
            parameter: tree.parameter,
            parameters: tree.parameters,
            sync_animations: Some(tree.sync_animations),
            children: tree.children,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn is_tree(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        match &self.parameter {
            Some(p) => vec![p.clone()],
            None => self.parameters.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(default)]
    pub value: ParamValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_graph_with_defaults() {
        let json = r#"{
            "layers": [{
                "name": "Base",
                "states": [
                    { "name": "START" },
                    { "name": "Move", "blendTree": {
                        "type": "1D",
                        "parameter": "speed",
                        "children": [
                            { "name": "Walk", "point": 0.0 },
                            { "name": "Run", "point": 1.0, "speed": 1.5 }
                        ]
                    } }
                ],
                "transitions": [{ "from": "START", "to": "Move" }]
            }],
            "parameters": { "speed": { "type": "FLOAT", "value": 0.25 } }
        }"#;
        let def = StateGraphDef::from_json(json).unwrap();
        let layer = &def.layers[0];
        assert_eq!(layer.weight, 1.0);
        assert_eq!(layer.blend_type, AnimLayerBlendType::Overwrite);
        let tree = layer.states[1].blend_tree.as_ref().unwrap();
        assert_eq!(tree.kind, BlendKind::OneD);
        assert!(tree.sync_animations);
        assert_eq!(tree.parameter_names(), vec!["speed".to_string()]);
        assert_eq!(tree.children[1].speed, 1.5);
        assert!(layer.states[0].looping);
        assert_eq!(layer.transitions[0].time, 0.0);
        assert_eq!(def.parameters["speed"].value, ParamValue::Float(0.25));
    }

    #[test]
    fn nested_children_are_trees() {
        let child: BlendChildDef = serde_json::from_str(
            r#"{ "name": "Strafe", "point": [1.0, 0.0], "type": "2D_CARTESIAN",
                 "parameters": ["x", "y"],
                 "children": [{ "name": "Left", "point": [-1.0, 0.0] }] }"#,
        )
        .unwrap();
        assert!(child.is_tree());
        assert_eq!(child.kind, Some(BlendKind::Cartesian2D));
        assert_eq!(child.point, Point::Vec2([1.0, 0.0]));
    }
}
