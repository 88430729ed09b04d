//! State machine driving one layer.
//!
//! The controller owns its states and the static transition list. Each
//! `update` advances the active state's clock, picks at most one transition,
//! recomputes blend weights of every live tree and advances the cross-fade.
//!
//! During a cross-fade the outgoing states are kept on a stack. A transition
//! that interrupts another scales the weights already on the stack by how far
//! the interrupted transition had progressed, so the blend stays continuous.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::definition::LayerDef;
use crate::error::{AnimGraphError, Result};
use crate::ids::StateIndex;
use crate::outputs::{AnimEvent, ClipSample};
use crate::parameters::ParameterResolver;
use crate::state::{
    is_control_state, AnimState, ANIM_STATE_ANY, ANIM_STATE_END, ANIM_STATE_START, CONTROL_STATES,
};
use crate::track::AnimTrack;
use crate::transition::{AnimTransition, InterruptionSource};

/// Clock of one live state.
#[derive(Clone, Debug)]
struct StatePlayback {
    state: StateIndex,
    time: f32,
    time_before: f32,
    /// Local time per arena slot; only clip slots are used.
    clip_times: Vec<f32>,
    /// Stack weight while the state is fading out.
    weight: f32,
}

impl StatePlayback {
    fn start(index: StateIndex, state: &AnimState, offset: Option<f32>) -> Self {
        let tree = state.tree();
        // Reversed states run their timeline from the end.
        let time = match offset {
            Some(o) => state.timeline_duration() * o,
            None if state.speed() < 0.0 => state.timeline_duration(),
            None => 0.0,
        };
        let mut clip_times = vec![0.0; tree.len()];
        for clip in tree.clips() {
            if let Some(track) = tree.track(clip) {
                clip_times[clip.index()] = match offset {
                    Some(_) => wrap_time(time, track.duration, state.looping()),
                    None if state.speed() < 0.0 => track.duration,
                    None => 0.0,
                };
            }
        }
        Self {
            state: index,
            time,
            time_before: time,
            clip_times,
            weight: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct ActiveTransition {
    elapsed: f32,
    duration: f32,
    interruption_source: InterruptionSource,
}

fn wrap_time(time: f32, duration: f32, looping: bool) -> f32 {
    if duration <= 0.0 {
        0.0
    } else if looping {
        time.rem_euclid(duration)
    } else {
        time.clamp(0.0, duration)
    }
}

/// Whether `exit` lies in the progress interval crossed this frame.
fn exit_time_reached(exit: f32, before: f32, now: f32, looping: bool, forward: bool) -> bool {
    let (mut before, mut now) = (before, now);
    let per_loop = exit < 1.0 && looping;
    if per_loop {
        before -= before.floor();
        now -= now.floor();
    }
    if now == before {
        return now == exit;
    }
    if per_loop && forward && now < before {
        // Wrapped into the next loop during this frame.
        return exit > before || exit <= now;
    }
    if per_loop && !forward && now > before {
        return exit < before || exit >= now;
    }
    if now > before {
        exit > before && exit <= now
    } else {
        exit < before && exit >= now
    }
}

#[derive(Clone, Debug)]
pub struct AnimController {
    states: Vec<AnimState>,
    lookup: HashMap<String, StateIndex>,
    /// Stable-sorted by ascending priority.
    transitions: Vec<AnimTransition>,
    active: StatePlayback,
    previous: Vec<StatePlayback>,
    transition: Option<ActiveTransition>,
    playing: bool,
    activate: bool,
    events: Vec<AnimEvent>,
}

impl AnimController {
    /// Build a controller. Missing control states are added, and when nothing
    /// leaves `START` an implicit `START -> first state` transition is inserted.
    pub fn new(
        states: Vec<AnimState>,
        transitions: Vec<AnimTransition>,
        activate: bool,
    ) -> Result<Self> {
        let mut all: Vec<AnimState> = Vec::with_capacity(states.len() + CONTROL_STATES.len());
        let mut lookup = HashMap::new();
        let missing: Vec<AnimState> = CONTROL_STATES
            .iter()
            .filter(|name| !states.iter().any(|s| s.name() == **name))
            .map(|name| AnimState::control(name))
            .collect();
        for state in missing.into_iter().chain(states) {
            if lookup.contains_key(state.name()) {
                return Err(AnimGraphError::InvalidDefinition {
                    reason: format!("duplicate state '{}'", state.name()),
                });
            }
            lookup.insert(state.name().to_string(), StateIndex::from_usize(all.len()));
            all.push(state);
        }

        for t in &transitions {
            for name in [&t.from, &t.to] {
                if !lookup.contains_key(name.as_str()) {
                    return Err(AnimGraphError::InvalidDefinition {
                        reason: format!("transition {} -> {} names unknown state '{name}'", t.from, t.to),
                    });
                }
            }
        }

        let mut transitions = transitions;
        if !transitions.iter().any(|t| t.from == ANIM_STATE_START) {
            if let Some(first) = all.iter().find(|s| !s.is_control()) {
                transitions.push(AnimTransition::new(ANIM_STATE_START, first.name()));
            }
        }
        transitions.sort_by_key(|t| t.priority);

        let start = lookup
            .get(ANIM_STATE_START)
            .copied()
            .ok_or_else(|| AnimGraphError::InvalidState {
                name: ANIM_STATE_START.to_string(),
            })?;
        let active = StatePlayback::start(start, &all[start.index()], None);

        Ok(Self {
            states: all,
            lookup,
            transitions,
            active,
            previous: Vec::new(),
            transition: None,
            playing: false,
            activate,
            events: Vec::new(),
        })
    }

    pub fn from_layer_def(def: &LayerDef, activate: bool) -> Result<Self> {
        let states = def
            .states
            .iter()
            .map(AnimState::from_def)
            .collect::<Result<Vec<_>>>()?;
        Self::new(states, def.transitions.clone(), activate)
    }

    // --- Accessors -----------------------------------------------------------

    pub fn states(&self) -> &[AnimState] {
        &self.states
    }

    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(AnimState::name).collect()
    }

    pub fn find_state(&self, name: &str) -> Option<&AnimState> {
        self.lookup.get(name).map(|i| &self.states[i.index()])
    }

    pub fn transitions(&self) -> &[AnimTransition] {
        &self.transitions
    }

    /// Add a graph edge, keeping priority order.
    pub fn add_transition(&mut self, transition: AnimTransition) -> Result<()> {
        for name in [&transition.from, &transition.to] {
            if !self.lookup.contains_key(name.as_str()) {
                log::warn!("ignoring transition to or from unknown state '{name}'");
                return Err(AnimGraphError::InvalidState { name: name.clone() });
            }
        }
        self.transitions.push(transition);
        self.transitions.sort_by_key(|t| t.priority);
        Ok(())
    }

    pub fn active_state(&self) -> &AnimState {
        &self.states[self.active.state.index()]
    }

    pub fn active_state_name(&self) -> &str {
        self.active_state().name()
    }

    /// Most recent outgoing state; only set while transitioning.
    pub fn previous_state(&self) -> Option<&AnimState> {
        self.transition?;
        self.previous.last().map(|p| &self.states[p.state.index()])
    }

    pub fn previous_state_name(&self) -> Option<&str> {
        self.previous_state().map(AnimState::name)
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn activate(&self) -> bool {
        self.activate
    }

    /// Every state has all of its clips assigned.
    pub fn playable(&self) -> bool {
        self.states.iter().all(AnimState::playable)
    }

    pub fn transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// `elapsed / duration` clamped to `[0, 1]`, or `None` when not transitioning.
    pub fn transition_progress(&self) -> Option<f32> {
        self.transition.map(|t| {
            if t.duration > 0.0 {
                (t.elapsed / t.duration).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
    }

    pub fn active_state_duration(&self) -> f32 {
        let state = self.active_state();
        if state.is_control() {
            0.0
        } else {
            state.timeline_duration()
        }
    }

    fn progress_for_time(&self, time: f32) -> f32 {
        let duration = self.active_state_duration();
        if self.active_state().is_control() || duration <= 0.0 {
            1.0
        } else {
            time / duration
        }
    }

    /// Normalised time in the active state; control states and empty states report 1.
    pub fn active_state_progress(&self) -> f32 {
        self.progress_for_time(self.active.time)
    }

    pub fn active_state_current_time(&self) -> f32 {
        self.active.time
    }

    /// Seek the active state and all of its clips.
    pub fn set_active_state_current_time(&mut self, time: f32) {
        self.active.time = time;
        self.active.time_before = time;
        let state = &self.states[self.active.state.index()];
        let tree = state.tree();
        for clip in tree.clips() {
            let duration = tree.track(clip).map_or(0.0, |t| t.duration);
            self.active.clip_times[clip.index()] = wrap_time(time, duration, state.looping());
        }
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, AnimEvent> {
        self.events.drain(..)
    }

    // --- Playback control ------------------------------------------------------

    /// Hard cut to `name` from time 0, cancelling any cross-fade. `None` only
    /// resumes playback.
    pub fn play(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            let Some(&index) = self.lookup.get(name) else {
                log::warn!("play requested for unknown state '{name}'");
                return Err(AnimGraphError::InvalidState {
                    name: name.to_string(),
                });
            };
            if self.transition.take().is_some() {
                log::debug!("play('{name}') cancelled an in-flight transition");
            }
            self.previous.clear();
            self.active = StatePlayback::start(index, &self.states[index.index()], None);
            self.events.push(AnimEvent::StateEntered {
                state: name.to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Back to `START`, stopped, with no transition in flight.
    pub fn reset(&mut self) {
        if let Some(&start) = self.lookup.get(ANIM_STATE_START) {
            self.active = StatePlayback::start(start, &self.states[start.index()], None);
        }
        self.previous.clear();
        self.transition = None;
        self.playing = false;
    }

    /// Begin `transition` from the active state.
    ///
    /// A non-positive `time` switches immediately and drops every outgoing
    /// state. Fails with [`AnimGraphError::InvalidState`] when the destination
    /// is unknown, leaving the controller untouched.
    pub fn update_state_from_transition(&mut self, transition: &AnimTransition) -> Result<()> {
        let Some(&to) = self.lookup.get(transition.to.as_str()) else {
            log::warn!("transition requested to unknown state '{}'", transition.to);
            return Err(AnimGraphError::InvalidState {
                name: transition.to.clone(),
            });
        };
        let from = self.active_state_name().to_string();
        let incoming = StatePlayback::start(to, &self.states[to.index()], transition.offset());
        let mut outgoing = std::mem::replace(&mut self.active, incoming);

        if transition.time > 0.0 {
            match self.transition_progress() {
                Some(progress) => {
                    for entry in &mut self.previous {
                        entry.weight *= 1.0 - progress;
                    }
                    outgoing.weight = progress;
                    self.events.push(AnimEvent::TransitionInterrupted {
                        interrupted: from.clone(),
                        to: transition.to.clone(),
                    });
                }
                None => {
                    self.previous.clear();
                    outgoing.weight = 1.0;
                }
            }
            self.previous.push(outgoing);
            self.transition = Some(ActiveTransition {
                elapsed: 0.0,
                duration: transition.time,
                interruption_source: transition.interruption_source,
            });
            self.events.push(AnimEvent::TransitionStarted {
                from: from.clone(),
                to: transition.to.clone(),
            });
            log::debug!(
                "transition {from} -> {} over {}s started",
                transition.to,
                transition.time
            );
        } else {
            self.previous.clear();
            self.transition = None;
            log::debug!("switched {from} -> {}", transition.to);
        }
        self.events.push(AnimEvent::StateEntered {
            state: transition.to.clone(),
        });
        Ok(())
    }

    fn find_transition(&self, params: &dyn ParameterResolver) -> Option<AnimTransition> {
        let active = self.active_state_name();
        let mut sources: Vec<&str> = Vec::with_capacity(3);
        match self.transition {
            None => sources.push(active),
            Some(t) => {
                let prev = self
                    .previous
                    .last()
                    .map(|p| self.states[p.state.index()].name());
                match t.interruption_source {
                    InterruptionSource::None => return None,
                    InterruptionSource::PrevState => sources.extend(prev),
                    InterruptionSource::NextState => sources.push(active),
                    InterruptionSource::PrevStateNextState => {
                        sources.extend(prev);
                        sources.push(active);
                    }
                    InterruptionSource::NextStatePrevState => {
                        sources.push(active);
                        sources.extend(prev);
                    }
                }
            }
        }
        sources.push(ANIM_STATE_ANY);

        let state = self.active_state();
        let before = self.progress_for_time(self.active.time_before);
        let now = self.progress_for_time(self.active.time);
        let forward = state.speed() >= 0.0;

        let mut found = sources
            .iter()
            .flat_map(|from| self.transitions.iter().filter(move |t| t.from == *from))
            .filter(|t| t.to != active)
            .filter(|t| {
                t.exit_time.map_or(true, |exit| {
                    exit_time_reached(exit, before, now, state.looping(), forward)
                })
            })
            .find(|t| t.conditions_met(params))
            .cloned()?;

        if found.to == ANIM_STATE_END {
            if let Some(start) = self.transitions.iter().find(|t| t.from == ANIM_STATE_START) {
                found.to = start.to.clone();
            }
        }
        Some(found)
    }

    /// Advance by `dt` seconds. Does nothing while paused.
    pub fn update(&mut self, dt: f32, params: &mut dyn ParameterResolver) {
        if !self.playing {
            return;
        }
        let mut dt = dt;

        let duration = self.active_state_duration();
        let (speed, looping) = {
            let state = self.active_state();
            (state.speed(), state.looping())
        };
        let advancing = if speed < 0.0 {
            self.active.time > 0.0
        } else {
            self.active.time < duration
        };
        if looping || advancing {
            self.active.time_before = self.active.time;
            self.active.time += dt * speed;
            if !looping {
                // Clamp at whichever end the state runs into.
                let end = if speed < 0.0 { 0.0 } else { duration };
                let overshot = if speed < 0.0 {
                    self.active.time < end
                } else {
                    self.active.time > end
                };
                if overshot {
                    self.active.time = end;
                    dt = (end - self.active.time_before) / speed;
                }
            }
        }

        if let Some(transition) = self.find_transition(&*params) {
            if self.update_state_from_transition(&transition).is_ok() {
                for condition in &transition.conditions {
                    params.consume_trigger(&condition.parameter_name);
                }
            }
        }

        self.states[self.active.state.index()]
            .tree_mut()
            .calculate_weights(&*params);
        for entry in &self.previous {
            self.states[entry.state.index()]
                .tree_mut()
                .calculate_weights(&*params);
        }

        advance_clips(&self.states, &mut self.active, dt);
        for entry in &mut self.previous {
            advance_clips(&self.states, entry, dt);
        }

        if let Some(t) = &mut self.transition {
            if t.elapsed >= t.duration {
                self.transition = None;
                self.previous.clear();
                let state = self.active_state_name().to_string();
                log::debug!("transition into {state} finished");
                self.events.push(AnimEvent::TransitionEnded { state });
            } else {
                t.elapsed += dt;
            }
        }
    }

    // --- Assets -----------------------------------------------------------------

    /// Attach a track at `path` (`"State"` or `"State.Child.Leaf"`), creating a
    /// single-clip state when the first segment names no state.
    pub fn assign_animation(
        &mut self,
        path: &str,
        track: Arc<AnimTrack>,
        speed: Option<f32>,
        looping: Option<bool>,
    ) -> Result<()> {
        let segments: Vec<&str> = path.split('.').collect();
        let name = segments[0];
        match self.lookup.get(name) {
            Some(&index) => {
                let state = &mut self.states[index.index()];
                state.assign_animation(&segments, track)?;
                if let Some(speed) = speed {
                    state.set_speed(speed);
                }
                if let Some(looping) = looping {
                    state.set_looping(looping);
                }
            }
            None => {
                // Only registered once the path resolved inside it.
                let mut state =
                    AnimState::new(name, speed.unwrap_or(1.0), looping.unwrap_or(true));
                state.assign_animation(&segments, track)?;
                self.lookup
                    .insert(name.to_string(), StateIndex::from_usize(self.states.len()));
                self.states.push(state);
            }
        }

        if !self.playing && self.activate && self.playable() {
            self.playing = true;
        }
        Ok(())
    }

    /// Clear a state's tracks. Returns whether anything was removed; control
    /// states hold no tracks.
    pub fn remove_node_animations(&mut self, name: &str) -> Result<bool> {
        if is_control_state(name) {
            return Ok(false);
        }
        let Some(&index) = self.lookup.get(name) else {
            log::warn!("cannot remove animations from unknown state '{name}'");
            return Err(AnimGraphError::InvalidState {
                name: name.to_string(),
            });
        };
        self.states[index.index()].remove_animations();
        Ok(true)
    }

    // --- Evaluator contract -------------------------------------------------

    /// Append one sample per assigned clip of every live state.
    ///
    /// Weights are the clip's normalised weight within its state, times the
    /// cross-fade factor (`progress` for the active state, `1 - progress`
    /// times the stack weight for outgoing ones).
    pub fn collect_samples(&self, out: &mut Vec<ClipSample>) {
        match self.transition_progress() {
            Some(progress) => {
                self.push_samples(&self.active, progress, out);
                for entry in &self.previous {
                    self.push_samples(entry, (1.0 - progress) * entry.weight, out);
                }
            }
            None => self.push_samples(&self.active, 1.0, out),
        }
    }

    fn push_samples(&self, playback: &StatePlayback, factor: f32, out: &mut Vec<ClipSample>) {
        let state = &self.states[playback.state.index()];
        let tree = state.tree();
        for clip in state.animations() {
            let Some(track) = tree.track(clip) else {
                continue;
            };
            out.push(ClipSample {
                state: state.name().to_string(),
                node_path: tree.path_of(clip),
                track: Arc::clone(track),
                weight: factor * state.normalized_weight(clip),
                local_time: playback.clip_times[clip.index()],
            });
        }
    }
}

fn advance_clips(states: &[AnimState], playback: &mut StatePlayback, dt: f32) {
    let state = &states[playback.state.index()];
    let tree = state.tree();
    for clip in tree.clips() {
        let Some(track) = tree.track(clip) else {
            continue;
        };
        let time = &mut playback.clip_times[clip.index()];
        *time += dt * state.speed() * tree.playback_speed(clip);
        *time = wrap_time(*time, track.duration, state.looping());
    }
}
