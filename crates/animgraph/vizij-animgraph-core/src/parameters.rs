//! Named parameters that drive blend trees and transition conditions.
//!
//! The component owns the store; the weighting core only reads it through
//! [`ParameterResolver`], except for consuming triggers when a transition that
//! depends on them fires.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnimGraphError, Result};

/// Declared type of a parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterType {
    Float,
    Integer,
    Boolean,
    /// Boolean that is reset once a transition conditioned on it fires.
    Trigger,
}

impl ParameterType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "FLOAT",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Trigger => "TRIGGER",
        }
    }

    /// Coerce an arbitrary value into the representation used by this type.
    pub fn coerce(self, value: ParamValue) -> ParamValue {
        match self {
            Self::Float => ParamValue::Float(value.as_f32()),
            Self::Integer => ParamValue::Int(value.as_f32() as i32),
            Self::Boolean | Self::Trigger => ParamValue::Bool(value.as_f32() != 0.0),
        }
    }
}

/// Parameter payload.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ParamValue {
    /// Numeric view used by blend kernels and condition predicates (`true` is 1).
    #[inline]
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(i) => i as f32,
            Self::Float(f) => f,
        }
    }

    #[inline]
    pub fn as_bool(self) -> bool {
        self.as_f32() != 0.0
    }
}

impl Default for ParamValue {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

/// A named parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub value: ParamValue,
}

/// Read access to parameters, plus trigger consumption.
///
/// Implementations must be side-effect free for `find_parameter` and return
/// the same answer for the same name within one update.
pub trait ParameterResolver {
    fn find_parameter(&self, name: &str) -> Option<&Parameter>;

    /// Reset a trigger after a transition conditioned on it has fired.
    fn consume_trigger(&mut self, name: &str);

    /// Numeric value of `name`, or 0 when it is not declared.
    fn value_of(&self, name: &str) -> f32 {
        self.find_parameter(name)
            .map(|p| p.value.as_f32())
            .unwrap_or(0.0)
    }
}

/// Default parameter store keyed by name.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    params: HashMap<String, Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a parameter.
    pub fn define(&mut self, name: &str, kind: ParameterType, value: ParamValue) {
        self.params.insert(
            name.to_string(),
            Parameter {
                name: name.to_string(),
                kind,
                value: kind.coerce(value),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    fn checked_mut(&mut self, name: &str, kind: ParameterType) -> Result<&mut Parameter> {
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| AnimGraphError::UnknownParameter {
                name: name.to_string(),
            })?;
        if param.kind != kind {
            return Err(AnimGraphError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: kind.name().to_string(),
                found: param.kind.name().to_string(),
            });
        }
        Ok(param)
    }

    fn checked(&self, name: &str, kind: ParameterType) -> Result<ParamValue> {
        let param = self
            .params
            .get(name)
            .ok_or_else(|| AnimGraphError::UnknownParameter {
                name: name.to_string(),
            })?;
        if param.kind != kind {
            return Err(AnimGraphError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: kind.name().to_string(),
                found: param.kind.name().to_string(),
            });
        }
        Ok(param.value)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.checked_mut(name, ParameterType::Float)?.value = ParamValue::Float(value);
        Ok(())
    }

    pub fn set_integer(&mut self, name: &str, value: i32) -> Result<()> {
        self.checked_mut(name, ParameterType::Integer)?.value = ParamValue::Int(value);
        Ok(())
    }

    pub fn set_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        self.checked_mut(name, ParameterType::Boolean)?.value = ParamValue::Bool(value);
        Ok(())
    }

    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        self.checked_mut(name, ParameterType::Trigger)?.value = ParamValue::Bool(true);
        Ok(())
    }

    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        self.checked_mut(name, ParameterType::Trigger)?.value = ParamValue::Bool(false);
        Ok(())
    }

    pub fn get_float(&self, name: &str) -> Result<f32> {
        self.checked(name, ParameterType::Float).map(ParamValue::as_f32)
    }

    pub fn get_integer(&self, name: &str) -> Result<i32> {
        self.checked(name, ParameterType::Integer)
            .map(|v| v.as_f32() as i32)
    }

    pub fn get_boolean(&self, name: &str) -> Result<bool> {
        self.checked(name, ParameterType::Boolean)
            .map(ParamValue::as_bool)
    }

    pub fn get_trigger(&self, name: &str) -> Result<bool> {
        self.checked(name, ParameterType::Trigger)
            .map(ParamValue::as_bool)
    }
}

impl ParameterResolver for ParameterStore {
    fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    fn consume_trigger(&mut self, name: &str) {
        if let Some(param) = self.params.get_mut(name) {
            if param.kind == ParameterType::Trigger {
                param.value = ParamValue::Bool(false);
            }
        }
    }
}
