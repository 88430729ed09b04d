use vizij_animgraph_core::{
    AnimController, AnimEvent, AnimGraphError, AnimState, AnimTrack, AnimTransition, Condition,
    InterruptionSource, ParamValue, ParameterStore, ParameterType, Predicate,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Controller over `names`, each with a one-second clip, already in the first state.
fn controller(names: &[&str], transitions: Vec<AnimTransition>) -> (AnimController, ParameterStore) {
    let states = names
        .iter()
        .map(|n| AnimState::new(*n, 1.0, true))
        .collect();
    let mut c = AnimController::new(states, transitions, true).expect("valid graph");
    for name in names {
        c.assign_animation(name, AnimTrack::shared(*name, 1.0), None, None)
            .expect("assign");
    }
    let mut params = ParameterStore::new();
    params.define("go", ParameterType::Boolean, ParamValue::Bool(false));
    params.define("next", ParameterType::Trigger, ParamValue::Bool(false));
    c.update(0.0, &mut params);
    assert_eq!(c.active_state_name(), names[0]);
    (c, params)
}

fn go() -> Condition {
    Condition::new("go", Predicate::EqualTo, ParamValue::Bool(true))
}

/// it should switch immediately on a zero-duration transition
#[test]
fn zero_duration_transition_is_a_hard_cut() {
    let (mut c, mut params) = controller(
        &["A", "B"],
        vec![
            AnimTransition::new("START", "A"),
            AnimTransition::new("A", "B").with_condition(go()),
        ],
    );
    params.set_boolean("go", true).unwrap();
    c.update(0.016, &mut params);
    assert_eq!(c.active_state_name(), "B");
    assert!(!c.transitioning());
    assert!(c.previous_state().is_none());
}

/// it should advance progress monotonically and finish after reaching one
#[test]
fn transition_progress_is_monotonic() {
    let (mut c, mut params) = controller(&["A", "B"], Vec::new());
    c.update_state_from_transition(&AnimTransition::new("A", "B").with_time(1.0))
        .unwrap();
    assert_eq!(c.transition_progress(), Some(0.0));
    assert_eq!(c.previous_state_name(), Some("A"));

    let mut last = 0.0;
    let mut frames = 0;
    while c.transition_progress() != Some(1.0) {
        c.update(0.1, &mut params);
        frames += 1;
        let p = c.transition_progress().expect("still transitioning");
        assert!(p >= last, "progress went backwards: {last} -> {p}");
        last = p;
        assert!(frames <= 12, "transition never reached 1");
    }
    assert!((9..=11).contains(&frames), "frames={frames}");

    c.update(0.1, &mut params);
    assert!(!c.transitioning());
    assert_eq!(c.active_state_name(), "B");
    assert!(c.previous_state().is_none());
}

/// it should fade the outgoing state out as the incoming one fades in
#[test]
fn cross_fade_weights_follow_progress() {
    let (mut c, mut params) = controller(&["A", "B"], Vec::new());
    c.update_state_from_transition(&AnimTransition::new("A", "B").with_time(1.0))
        .unwrap();
    c.update(0.25, &mut params);
    let mut samples = Vec::new();
    c.collect_samples(&mut samples);
    let weight = |s: &str| samples.iter().find(|x| x.state == s).unwrap().weight;
    approx(weight("B"), 0.25, 1e-6);
    approx(weight("A"), 0.75, 1e-6);
}

/// it should reject transitions to states that do not exist
#[test]
fn unknown_destination_is_an_error() {
    let (mut c, _) = controller(&["A", "B"], Vec::new());
    let err = c
        .update_state_from_transition(&AnimTransition::new("A", "Nowhere").with_time(0.5))
        .unwrap_err();
    assert_eq!(
        err,
        AnimGraphError::InvalidState {
            name: "Nowhere".into()
        }
    );
    assert_eq!(c.active_state_name(), "A");
    assert!(!c.transitioning());

    assert!(c.play(Some("Nowhere")).is_err());
    assert_eq!(c.active_state_name(), "A");
}

/// it should cancel an in-flight transition when play is called
#[test]
fn play_cancels_transition() {
    let (mut c, mut params) = controller(&["A", "B", "C"], Vec::new());
    c.update_state_from_transition(&AnimTransition::new("A", "B").with_time(1.0))
        .unwrap();
    c.update(0.3, &mut params);
    assert!(c.transitioning());

    c.play(Some("C")).unwrap();
    assert!(!c.transitioning());
    assert_eq!(c.active_state_name(), "C");
    assert_eq!(c.active_state_current_time(), 0.0);
    let mut samples = Vec::new();
    c.collect_samples(&mut samples);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].weight, 1.0);
}

/// it should start the destination at the requested normalised offset
#[test]
fn offset_positions_the_destination() {
    let (mut c, _) = controller(&["A", "B"], Vec::new());
    c.update_state_from_transition(
        &AnimTransition::new("A", "B")
            .with_time(0.5)
            .with_offset(Some(0.25)),
    )
    .unwrap();
    approx(c.active_state_current_time(), 0.25, 1e-6);
    approx(c.active_state_progress(), 0.25, 1e-6);
}

/// it should only allow interruptions from the configured source
#[test]
fn interruption_source_gates_new_transitions() {
    for (source, interrupted) in [
        (InterruptionSource::None, false),
        (InterruptionSource::NextState, true),
        (InterruptionSource::PrevState, false),
    ] {
        let (mut c, mut params) = controller(
            &["A", "B", "C"],
            vec![
                AnimTransition::new("START", "A"),
                AnimTransition::new("A", "B")
                    .with_time(1.0)
                    .with_condition(go())
                    .with_interruption_source(source),
                AnimTransition::new("B", "C")
                    .with_time(1.0)
                    .with_condition(Condition::new("next", Predicate::EqualTo, ParamValue::Bool(true))),
            ],
        );
        params.set_boolean("go", true).unwrap();
        c.update(0.1, &mut params);
        assert_eq!(c.active_state_name(), "B");

        params.set_trigger("next").unwrap();
        c.update(0.1, &mut params);
        assert_eq!(
            c.active_state_name() == "C",
            interrupted,
            "source={source:?}"
        );
        assert_eq!(params.get_trigger("next").unwrap(), !interrupted);
    }
}

/// it should emit lifecycle events in order
#[test]
fn events_describe_the_transition() {
    let (mut c, mut params) = controller(&["A", "B"], Vec::new());
    c.drain_events().for_each(drop);
    c.update_state_from_transition(&AnimTransition::new("A", "B").with_time(0.2))
        .unwrap();
    for _ in 0..4 {
        c.update(0.1, &mut params);
    }
    let events: Vec<AnimEvent> = c.drain_events().collect();
    assert_eq!(
        events,
        vec![
            AnimEvent::TransitionStarted {
                from: "A".into(),
                to: "B".into()
            },
            AnimEvent::StateEntered { state: "B".into() },
            AnimEvent::TransitionEnded { state: "B".into() },
        ]
    );
}

/// it should stop advancing while paused and restart from START after reset
#[test]
fn pause_and_reset() {
    let (mut c, mut params) = controller(&["A"], Vec::new());
    c.update(0.5, &mut params);
    approx(c.active_state_current_time(), 0.5, 1e-6);
    c.pause();
    c.update(0.5, &mut params);
    approx(c.active_state_current_time(), 0.5, 1e-6);

    c.reset();
    assert!(!c.playing());
    assert_eq!(c.active_state_name(), "START");
    c.play(None).unwrap();
    c.update(0.0, &mut params);
    assert_eq!(c.active_state_name(), "A");
}
