//! Directed, timed edges between states and the conditions that arm them.

use serde::{Deserialize, Serialize};

use crate::parameters::{ParamValue, ParameterResolver};

/// Comparison applied between a parameter and a condition value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    EqualTo,
    NotEqualTo,
}

impl Predicate {
    #[inline]
    pub fn holds(self, lhs: f32, rhs: f32) -> bool {
        match self {
            Self::GreaterThan => lhs > rhs,
            Self::LessThan => lhs < rhs,
            Self::GreaterThanEqual => lhs >= rhs,
            Self::LessThanEqual => lhs <= rhs,
            Self::EqualTo => lhs == rhs,
            Self::NotEqualTo => lhs != rhs,
        }
    }
}

/// `parameter <predicate> value`. Conditions on undeclared parameters never hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub parameter_name: String,
    pub predicate: Predicate,
    pub value: ParamValue,
}

impl Condition {
    pub fn new(parameter_name: impl Into<String>, predicate: Predicate, value: ParamValue) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            predicate,
            value,
        }
    }

    pub fn holds(&self, params: &dyn ParameterResolver) -> bool {
        params
            .find_parameter(&self.parameter_name)
            .is_some_and(|p| self.predicate.holds(p.value.as_f32(), self.value.as_f32()))
    }
}

/// Which states may interrupt a transition while it is in progress.
///
/// The two-state variants also fix the order in which their transitions are
/// searched. `ANY` is always searched last.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterruptionSource {
    #[default]
    None,
    PrevState,
    NextState,
    PrevStateNextState,
    NextStatePrevState,
}

/// A timed hand-off from one state to another.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimTransition {
    pub from: String,
    pub to: String,
    /// Cross-fade duration in seconds; 0 is a hard cut.
    #[serde(default)]
    pub time: f32,
    /// Lower values are evaluated first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Normalised progress through the source state before this may fire.
    #[serde(default)]
    pub exit_time: Option<f32>,
    /// Normalised start position in the destination state.
    #[serde(default)]
    pub transition_offset: Option<f32>,
    #[serde(default)]
    pub interruption_source: InterruptionSource,
}

impl AnimTransition {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn with_offset(mut self, offset: Option<f32>) -> Self {
        self.transition_offset = offset;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_exit_time(mut self, exit_time: f32) -> Self {
        self.exit_time = Some(exit_time);
        self
    }

    pub fn with_interruption_source(mut self, source: InterruptionSource) -> Self {
        self.interruption_source = source;
        self
    }

    /// Offsets are only honoured strictly inside `(0, 1)`.
    pub fn offset(&self) -> Option<f32> {
        self.transition_offset.filter(|o| *o > 0.0 && *o < 1.0)
    }

    pub fn has_offset(&self) -> bool {
        self.offset().is_some()
    }

    pub fn conditions_met(&self, params: &dyn ParameterResolver) -> bool {
        self.conditions.iter().all(|c| c.holds(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ParameterStore, ParameterType};

    #[test]
    fn conditions_compare_numerically_and_fail_on_unknown() {
        let mut params = ParameterStore::new();
        params.define("speed", ParameterType::Float, ParamValue::Float(2.0));
        params.define("grounded", ParameterType::Boolean, ParamValue::Bool(true));

        let t = AnimTransition::new("Idle", "Run")
            .with_condition(Condition::new("speed", Predicate::GreaterThanEqual, ParamValue::Float(2.0)))
            .with_condition(Condition::new("grounded", Predicate::EqualTo, ParamValue::Bool(true)));
        assert!(t.conditions_met(&params));

        let missing = AnimTransition::new("Idle", "Jump")
            .with_condition(Condition::new("jump", Predicate::NotEqualTo, ParamValue::Int(5)));
        assert!(!missing.conditions_met(&params));
        assert!(AnimTransition::new("A", "B").conditions_met(&params));
    }

    #[test]
    fn offsets_outside_open_unit_interval_are_ignored() {
        assert!(AnimTransition::new("A", "B").with_offset(Some(0.5)).has_offset());
        assert!(!AnimTransition::new("A", "B").with_offset(Some(0.0)).has_offset());
        assert!(!AnimTransition::new("A", "B").with_offset(Some(1.0)).has_offset());
        assert_eq!(AnimTransition::new("A", "B").offset(), None);
    }

    #[test]
    fn parses_authoring_json() {
        let t: AnimTransition = serde_json::from_str(
            r#"{ "from": "Idle", "to": "Jump", "time": 0.2, "exitTime": 0.75,
                 "interruptionSource": "NEXT_STATE",
                 "conditions": [{ "parameterName": "jump", "predicate": "EQUAL_TO", "value": true }] }"#,
        )
        .unwrap();
        assert_eq!(t.exit_time, Some(0.75));
        assert_eq!(t.interruption_source, InterruptionSource::NextState);
        assert_eq!(t.conditions[0].predicate, Predicate::EqualTo);
        assert_eq!(t.conditions[0].value, ParamValue::Bool(true));
        assert_eq!(t.priority, 0);
    }
}
