//! Owner of the parameter store and the ordered layer stack.
//!
//! `update` ticks layers in insertion order. Later layers may composite on
//! top of earlier ones, so that order is preserved in the outputs.

use crate::config::Config;
use crate::controller::AnimController;
use crate::definition::StateGraphDef;
use crate::error::{AnimGraphError, Result};
use crate::layer::{AnimComponentLayer, AnimLayerBlendType};
use crate::outputs::{LayerOutput, Outputs};
use crate::parameters::ParameterStore;
use crate::track::AssetRef;

#[derive(Debug)]
pub struct AnimComponent {
    cfg: Config,
    parameters: ParameterStore,
    layers: Vec<AnimComponentLayer>,
    rebind_generation: u64,
    outputs: Outputs,
}

impl Default for AnimComponent {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AnimComponent {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            parameters: ParameterStore::new(),
            layers: Vec::new(),
            rebind_generation: 0,
            outputs: Outputs::default(),
        }
    }

    /// Build layers and parameters from a loaded graph, in definition order.
    pub fn from_definition(def: &StateGraphDef, cfg: Config) -> Result<Self> {
        let mut component = Self::new(cfg);
        for (key, param) in &def.parameters {
            let name = param.name.as_deref().unwrap_or(key);
            component.parameters.define(name, param.kind, param.value);
        }
        for layer_def in &def.layers {
            if component.layer_index(&layer_def.name).is_some() {
                return Err(AnimGraphError::InvalidDefinition {
                    reason: format!("duplicate layer '{}'", layer_def.name),
                });
            }
            component.layers.push(AnimComponentLayer::from_def(
                layer_def,
                component.cfg.activate,
                component.cfg.normalize_weights,
            )?);
        }
        log::debug!(
            "animation component built with {} layer(s), {} parameter(s)",
            component.layers.len(),
            component.parameters.len()
        );
        Ok(component)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }

    // --- Layers -------------------------------------------------------------------

    /// Append an empty layer. A layer with the same name is returned instead.
    pub fn add_layer(
        &mut self,
        name: &str,
        weight: f32,
        blend_type: AnimLayerBlendType,
    ) -> Result<usize> {
        if let Some(index) = self.layer_index(name) {
            log::warn!("layer '{name}' already exists");
            return Ok(index);
        }
        let controller = AnimController::new(Vec::new(), Vec::new(), self.cfg.activate)?;
        self.layers.push(AnimComponentLayer::new(
            name,
            controller,
            weight,
            blend_type,
            self.cfg.normalize_weights,
        ));
        Ok(self.layers.len() - 1)
    }

    pub fn layers(&self) -> &[AnimComponentLayer] {
        &self.layers
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name() == name)
    }

    pub fn find_layer(&self, name: &str) -> Option<&AnimComponentLayer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn find_layer_mut(&mut self, name: &str) -> Option<&mut AnimComponentLayer> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut AnimComponentLayer> {
        self.find_layer_mut(name)
            .ok_or_else(|| AnimGraphError::UnknownLayer {
                name: name.to_string(),
            })
    }

    /// Layer weight divided by the sum of all layer weights (0 when that sum is 0).
    pub fn normalized_weight(&self, name: &str) -> Option<f32> {
        let layer = self.find_layer(name)?;
        let total = self.total_weight();
        Some(if total > 0.0 {
            layer.weight() / total
        } else {
            0.0
        })
    }

    fn total_weight(&self) -> f32 {
        self.layers.iter().map(AnimComponentLayer::weight).sum()
    }

    // --- Playback -----------------------------------------------------------------

    pub fn playing(&self) -> bool {
        self.layers.iter().any(AnimComponentLayer::playing)
    }

    pub fn set_playing(&mut self, playing: bool) {
        for layer in &mut self.layers {
            layer.set_playing(playing);
        }
    }

    pub fn playable(&self) -> bool {
        self.layers.iter().all(AnimComponentLayer::playable)
    }

    /// Assign an asset to `node_path` on `layer`, starting playback once every
    /// layer is playable when `activate` is set.
    pub fn assign_animation(
        &mut self,
        layer: &str,
        node_path: &str,
        asset: AssetRef,
        speed: Option<f32>,
        looping: Option<bool>,
    ) -> Result<()> {
        self.layer_mut(layer)?
            .assign_animation(node_path, asset, speed, looping)?;
        if self.cfg.activate && self.playable() {
            self.set_playing(true);
        }
        Ok(())
    }

    pub fn remove_node_animations(&mut self, layer: &str, state: &str) -> Result<()> {
        self.layer_mut(layer)?.remove_node_animations(state)
    }

    /// Whether any layer weight was written since the last call.
    pub fn take_targets_dirty(&mut self) -> bool {
        self.layers
            .iter_mut()
            .fold(false, |dirty, layer| layer.take_targets_dirty() || dirty)
    }

    pub fn rebind(&mut self) {
        self.rebind_generation += 1;
    }

    /// Changes whenever this component or any layer requests a rebind.
    pub fn rebind_generation(&self) -> u64 {
        self.rebind_generation
            + self
                .layers
                .iter()
                .map(AnimComponentLayer::rebind_generation)
                .sum::<u64>()
    }

    // --- Tick ---------------------------------------------------------------------

    /// Advance every layer by `dt` seconds and gather the samples to evaluate.
    pub fn update(&mut self, dt: f32) -> &Outputs {
        self.outputs.clear();
        for layer in &mut self.layers {
            layer.update(dt, &mut self.parameters);
        }

        let total = self.total_weight();
        let epsilon = self.cfg.weight_epsilon;
        for layer in &mut self.layers {
            let mut samples = Vec::new();
            layer.collect_samples(&mut samples);
            samples.retain(|s| s.weight > epsilon);

            let weight = if !self.cfg.normalize_weights {
                layer.weight()
            } else if total > 0.0 {
                layer.weight() / total
            } else {
                0.0
            };

            let events: Vec<_> = layer.drain_events().collect();
            for event in events {
                self.outputs.push_event(layer.name(), event);
            }
            self.outputs.layers.push(LayerOutput {
                layer: layer.name().to_string(),
                blend_type: layer.blend_type(),
                weight,
                samples,
            });
        }
        &self.outputs
    }
}
