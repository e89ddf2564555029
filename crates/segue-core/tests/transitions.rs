use anyhow::Result;
use segue_core::{
    Clock, Entity, Interpolator, InterpolatorFactory, LifecycleKind, ManualClock, Motion,
    NoInterpolation, Node, Request, StandardInterpolator, State, TransitionError, Value,
};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn node(state: State) -> (Node<StandardInterpolator>, ManualClock) {
    let clock = ManualClock::new();
    (Node::new(state, StandardInterpolator, clock.clone()), clock)
}

fn bump(count: &Rc<Cell<u32>>) -> impl FnOnce(&mut dyn Entity) + 'static {
    let count = Rc::clone(count);
    move |_: &mut dyn Entity| count.set(count.get() + 1)
}

/// Advance the clock in `step` increments up to `until`, flushing each frame.
fn run_frames<I: InterpolatorFactory>(
    node: &mut Node<I>,
    clock: &ManualClock,
    step: f64,
    until: f64,
) -> Result<Vec<f64>> {
    let mut seen = Vec::new();
    node.advance()?;
    while clock.now() < until {
        clock.advance(step);
        node.advance()?;
        if let Some(x) = node.state().number("x") {
            seen.push(x);
        }
    }
    Ok(seen)
}

#[test]
fn literal_value_is_set_without_intermediates() -> Result<()> {
    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(Request::new().set("x", 5.0))?;
    assert_eq!(node.state().number("x"), Some(5.0));

    let seen = run_frames(&mut node, &clock, 20.0, 300.0)?;
    assert!(seen.iter().all(|x| *x == 5.0), "saw {seen:?}");
    assert!(!node.is_transitioning());
    Ok(())
}

#[test]
fn animate_to_passes_through_intermediate_values() -> Result<()> {
    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(Request::new().to("x", 10.0).duration(100.0))?;
    assert_eq!(node.state().number("x"), Some(0.0));

    node.advance()?;
    clock.advance(40.0);
    node.advance()?;
    let mid = node.state().number("x").unwrap_or_default();
    assert!(mid > 0.0 && mid < 10.0, "mid value {mid}");

    clock.advance(60.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(10.0));
    Ok(())
}

#[test]
fn animate_from_to_sets_begin_synchronously() -> Result<()> {
    let (mut node, clock) = node(State::new().with("x", 100.0));
    node.transition(Request::new().from_to("x", 0.0, 10.0).duration(100.0))?;
    assert_eq!(node.state().number("x"), Some(0.0));

    node.advance()?;
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(5.0));

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(10.0));
    Ok(())
}

#[test]
fn start_fires_once_per_request() -> Result<()> {
    let starts = Rc::new(Cell::new(0));
    let interrupts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));

    let (mut node, clock) = node(State::new().with("x", 0.0).with("y", 0.0));
    node.transition(
        Request::new()
            .to("x", 1.0)
            .to("y", 1.0)
            .on_start(bump(&starts))
            .on_interrupt(bump(&interrupts))
            .on_end(bump(&ends)),
    )?;

    run_frames(&mut node, &clock, 16.0, 400.0)?;
    assert_eq!(starts.get(), 1);
    assert_eq!(interrupts.get(), 0);
    assert_eq!(ends.get(), 1);
    Ok(())
}

#[test]
fn supersede_interrupts_running_transition() -> Result<()> {
    let starts = Rc::new(Cell::new(0));
    let interrupts = Rc::new(Cell::new(0));

    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 10.0)
            .duration(100.0)
            .on_start(bump(&starts))
            .on_interrupt(bump(&interrupts)),
    )?;
    node.advance()?;
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(5.0));

    node.transition(
        Request::new()
            .to("x", 20.0)
            .duration(100.0)
            .on_start(bump(&starts))
            .on_interrupt(bump(&interrupts)),
    )?;
    node.advance()?;
    assert_eq!(interrupts.get(), 1);
    assert_eq!(node.live_count(), 1);

    // The new transition begins where the interrupted one stopped.
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(12.5));

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(20.0));
    assert_eq!(starts.get(), 2);
    assert_eq!(interrupts.get(), 1);
    assert!(!node.is_transitioning());

    let kinds: Vec<_> = node.drain_events().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LifecycleKind::Started,
            LifecycleKind::Interrupted,
            LifecycleKind::Started,
            LifecycleKind::Ended,
        ]
    );
    Ok(())
}

#[test]
fn same_frame_collision_interrupts_the_first_request() -> Result<()> {
    let (first_starts, first_interrupts, first_ends) =
        (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let (second_starts, second_interrupts, second_ends) =
        (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));

    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 10.0)
            .duration(100.0)
            .on_start(bump(&first_starts))
            .on_interrupt(bump(&first_interrupts))
            .on_end(bump(&first_ends)),
    )?;
    node.transition(
        Request::new()
            .to("x", 20.0)
            .duration(100.0)
            .on_start(bump(&second_starts))
            .on_interrupt(bump(&second_interrupts))
            .on_end(bump(&second_ends)),
    )?;

    node.advance()?;
    assert_eq!(first_starts.get(), 1);
    assert_eq!(first_interrupts.get(), 1);
    assert_eq!(second_starts.get(), 1);
    assert_eq!(node.live_count(), 1);

    run_frames(&mut node, &clock, 25.0, 200.0)?;
    assert_eq!(node.state().number("x"), Some(20.0));
    assert_eq!(first_interrupts.get(), 1);
    assert_eq!(first_ends.get(), 0);
    assert_eq!(second_interrupts.get(), 0);
    assert_eq!(second_ends.get(), 1);

    let kinds: Vec<_> = node.drain_events().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LifecycleKind::Started,
            LifecycleKind::Interrupted,
            LifecycleKind::Started,
            LifecycleKind::Ended,
        ]
    );
    Ok(())
}

#[test]
fn custom_tween_inside_namespace() -> Result<()> {
    let (mut node, clock) = node(State::new().with_namespace(
        "style",
        [("opacity", Value::from(1.0)), ("label", Value::from("a"))],
    ));
    node.transition(
        Request::new()
            .namespace(
                "style",
                [("label", Motion::custom(|t| Value::from(format!("step {}", t * 4.0))))],
            )
            .duration(100.0),
    )?;

    node.advance()?;
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().attr("style", "label"), Some(&Value::from("step 2")));
    assert_eq!(node.state().attr("style", "opacity"), Some(&Value::Number(1.0)));

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().attr("style", "label"), Some(&Value::from("step 4")));
    assert!(!node.is_transitioning());
    Ok(())
}

#[test]
fn non_ascii_text_interpolates() -> Result<()> {
    let (mut node, clock) = node(State::new().with("label", "naïve 1"));
    node.transition(Request::new().to("label", "café 10").duration(100.0))?;

    node.advance()?;
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().value("label").and_then(Value::as_str), Some("café 5.5"));

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().value("label").and_then(Value::as_str), Some("café 10"));
    Ok(())
}

#[test]
fn namespaced_writes_leave_siblings_alone() -> Result<()> {
    let (mut node, clock) = node(
        State::new()
            .with("z", 1.0)
            .with_namespace("ns", [("x", 0.0), ("y", 7.0)])
            .with_namespace("other", [("x", 3.0)]),
    );
    node.transition(Request::new().namespace("ns", [("x", Motion::to(10.0))]))?;
    run_frames(&mut node, &clock, 50.0, 300.0)?;

    assert_eq!(node.state().attr("ns", "x"), Some(&Value::Number(10.0)));
    assert_eq!(node.state().attr("ns", "y"), Some(&Value::Number(7.0)));
    assert_eq!(node.state().attr("other", "x"), Some(&Value::Number(3.0)));
    assert_eq!(node.state().number("z"), Some(1.0));

    node.transition(Request::new().to("z", 5.0))?;
    run_frames(&mut node, &clock, 50.0, 600.0)?;
    assert_eq!(node.state().number("z"), Some(5.0));
    assert_eq!(node.state().attr("ns", "y"), Some(&Value::Number(7.0)));
    assert_eq!(node.state().attr("other", "x"), Some(&Value::Number(3.0)));
    Ok(())
}

#[test]
fn interpolator_sees_attribute_and_namespace() -> Result<()> {
    let calls: Rc<RefCell<Vec<(String, Option<String>)>>> = Rc::default();
    let recorded = Rc::clone(&calls);
    let factory = move |begin: &Value, end: &Value, attr: &str, ns: Option<&str>| -> Interpolator {
        recorded
            .borrow_mut()
            .push((attr.to_string(), ns.map(str::to_string)));
        let (a, b) = (begin.as_f64().unwrap_or(0.0), end.as_f64().unwrap_or(0.0));
        Box::new(move |t| Value::Number(a + (b - a) * t))
    };

    let clock = ManualClock::new();
    let mut node = Node::new(
        State::new().with("x", 0.0).with_namespace("ns", [("x", 0.0)]),
        factory,
        clock.clone(),
    );
    node.transition(
        Request::new()
            .to("x", 1.0)
            .namespace("ns", [("x", Motion::to(2.0))]),
    )?;
    node.advance()?;

    assert_eq!(
        *calls.borrow(),
        vec![
            ("x".to_string(), None),
            ("x".to_string(), Some("ns".to_string())),
        ]
    );
    Ok(())
}

#[test]
fn unchanged_value_still_fires_events() -> Result<()> {
    let starts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));

    let clock = ManualClock::new();
    // No interpolator is ever requested for a value that does not change.
    let mut node = Node::new(State::new().with("x", 5.0), NoInterpolation, clock.clone());
    node.transition(
        Request::new()
            .to("x", 5.0)
            .on_start(bump(&starts))
            .on_end(bump(&ends)),
    )?;

    run_frames(&mut node, &clock, 50.0, 300.0)?;
    assert_eq!(starts.get(), 1);
    assert_eq!(ends.get(), 1);
    assert_eq!(node.state().number("x"), Some(5.0));
    Ok(())
}

#[test]
fn not_transitioning_after_completion() -> Result<()> {
    let (mut node, clock) = node(State::new().with("x", 0.0).with("fill", "red"));
    assert!(!node.is_transitioning());

    node.transition(vec![
        Request::new().to("x", 1.0).duration(100.0),
        Request::new().to("fill", "blue").duration(200.0).delay(50.0),
    ])?;
    assert!(node.is_transitioning());

    run_frames(&mut node, &clock, 16.0, 300.0)?;
    assert!(!node.is_transitioning());
    assert_eq!(node.live_count(), 0);
    assert_eq!(node.state().value("fill"), Some(&Value::from("rgb(0, 0, 255)")));
    Ok(())
}

#[test]
fn end_handler_observes_final_value() -> Result<()> {
    let observed = Rc::new(Cell::new(None));
    let sink = Rc::clone(&observed);

    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 10.0)
            .duration(100.0)
            .on_end(move |entity: &mut dyn Entity| sink.set(entity.state().number("x"))),
    )?;

    run_frames(&mut node, &clock, 30.0, 200.0)?;
    assert_eq!(observed.get(), Some(10.0));
    Ok(())
}

#[test]
fn end_handler_can_start_new_transition() -> Result<()> {
    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 10.0)
            .duration(100.0)
            .on_end(|entity: &mut dyn Entity| {
                entity
                    .transition(Request::new().to("x", 0.0).duration(100.0).into())
                    .unwrap();
            }),
    )?;

    node.advance()?;
    clock.advance(100.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(10.0));
    assert!(node.is_transitioning());

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(5.0));

    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(0.0));
    assert!(!node.is_transitioning());
    Ok(())
}

#[test]
fn stop_transitions_fires_nothing() -> Result<()> {
    let interrupts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));

    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 100.0)
            .duration(100.0)
            .on_interrupt(bump(&interrupts))
            .on_end(bump(&ends)),
    )?;
    node.advance()?;
    clock.advance(25.0);
    node.advance()?;

    node.stop_transitions();
    assert!(!node.is_transitioning());

    clock.advance(200.0);
    node.advance()?;
    assert_eq!(node.state().number("x"), Some(25.0));
    assert_eq!(interrupts.get(), 0);
    assert_eq!(ends.get(), 0);
    Ok(())
}

#[test]
fn json_event_entries_are_rejected_before_anything_applies() {
    let (mut node, _clock) = node(State::new().with("x", 0.0));
    let err = node
        .transition_json(&json!({"y": 3, "x": [1], "events": {"end": "done"}}))
        .unwrap_err();

    assert_eq!(
        err,
        TransitionError::InvalidEventHandler {
            event: "end".to_string()
        }
    );
    assert_eq!(node.state().value("y"), None);
    assert!(!node.is_transitioning());
}

#[test]
fn json_request_animates_colors() -> Result<()> {
    let (mut node, clock) = node(State::new());
    node.transition_json(&json!({"fill": ["red", "blue"], "timing": {"duration": 100}}))?;
    assert_eq!(node.state().value("fill"), Some(&Value::from("red")));

    node.advance()?;
    clock.advance(50.0);
    node.advance()?;
    assert_eq!(node.state().value("fill"), Some(&Value::from("rgb(128, 0, 128)")));
    Ok(())
}

#[test]
fn missing_interpolator_surfaces_on_first_use() -> Result<()> {
    let clock = ManualClock::new();
    let mut node = Node::new(
        State::new().with_namespace("ns", [("x", 0.0)]),
        NoInterpolation,
        clock.clone(),
    );
    node.transition(Request::new().namespace("ns", [("x", Motion::to(1.0))]))?;

    let err = node.advance().unwrap_err();
    assert_eq!(
        err,
        TransitionError::MissingInterpolator {
            attribute: "x".to_string(),
            namespace: Some("ns".to_string()),
        }
    );
    Ok(())
}

#[test]
fn delayed_older_transition_is_cancelled_silently() -> Result<()> {
    let starts = Rc::new(Cell::new(0));
    let interrupts = Rc::new(Cell::new(0));

    let (mut node, clock) = node(State::new().with("x", 0.0));
    node.transition(
        Request::new()
            .to("x", 50.0)
            .delay(500.0)
            .on_start(bump(&starts))
            .on_interrupt(bump(&interrupts)),
    )?;
    node.transition(Request::new().to("x", 10.0).duration(100.0))?;

    run_frames(&mut node, &clock, 25.0, 800.0)?;
    assert_eq!(node.state().number("x"), Some(10.0));
    assert_eq!(starts.get(), 0);
    assert_eq!(interrupts.get(), 0);
    assert!(!node.is_transitioning());
    Ok(())
}
