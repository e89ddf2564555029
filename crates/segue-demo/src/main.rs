use anyhow::{Context, Result};
use segue_config::SegueConfig;
use segue_core::{
    Clock, EasingFunction, Entity, ManualClock, Motion, Node, Request, StandardInterpolator, State,
    Value,
};

/// Which transition script to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    /// One request moving a shape across several keys.
    Basic,
    /// A second request on the same key arriving mid-flight.
    Interrupt,
    /// A request read from `--request=<json>`.
    Json,
}

impl Scene {
    fn from_args() -> Self {
        let scene_env = std::env::var("SEGUE_SCENE").ok();
        let has = |name: &str| {
            scene_env.as_deref() == Some(name)
                || std::env::args()
                    .any(|a| a == format!("--scene={name}") || a == format!("--{name}"))
        };
        if has("interrupt") {
            Self::Interrupt
        } else if has("json") {
            Self::Json
        } else {
            Self::Basic
        }
    }
}

fn initial_state() -> State {
    State::new()
        .with("cx", 0.0)
        .with("cy", 0.0)
        .with("fill", "steelblue")
        .with_namespace(
            "style",
            [("opacity", Value::from(0.0)), ("transform", Value::from(""))],
        )
}

fn print_frame(now: f64, node: &Node<StandardInterpolator>) -> Result<()> {
    let line = serde_json::json!({
        "t": now,
        "transitioning": node.is_transitioning(),
        "state": node.state(),
    });
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = SegueConfig::load();
    let scene = Scene::from_args();
    log::info!("running {:?} scene for {} frames", scene, config.demo.frames);

    let clock = ManualClock::new();
    let mut node = Node::new(initial_state(), StandardInterpolator, clock.clone())
        .with_defaults(config.timing_defaults());

    match scene {
        Scene::Basic | Scene::Interrupt => {
            node.transition(
                Request::new()
                    .to("cx", 200.0)
                    .from_to("cy", 50.0, 100.0)
                    .to("fill", "tomato")
                    .namespace(
                        "style",
                        [
                            ("opacity", Motion::to(1.0)),
                            ("transform", Motion::to("translate(20, 10) rotate(45)")),
                        ],
                    )
                    .ease(EasingFunction::EaseInOut)
                    .on_start(|_: &mut dyn Entity| log::info!("first request started"))
                    .on_interrupt(|_: &mut dyn Entity| log::info!("first request interrupted"))
                    .on_end(|entity: &mut dyn Entity| {
                        log::info!("first request ended at cx = {:?}", entity.state().number("cx"))
                    }),
            )?;
        }
        Scene::Json => {
            let raw = std::env::args()
                .find_map(|a| a.strip_prefix("--request=").map(str::to_string))
                .context("the json scene needs --request=<json>")?;
            let json: serde_json::Value =
                serde_json::from_str(&raw).context("--request is not valid JSON")?;
            node.transition_json(&json)?;
        }
    }

    let interval = config.demo.frame_interval_ms;
    let interrupt_frame = config.demo.frames / 2;

    for frame in 0..=config.demo.frames {
        if scene == Scene::Interrupt && frame == interrupt_frame {
            node.transition(
                Request::new()
                    .to("cx", -100.0)
                    .on_start(|_: &mut dyn Entity| log::info!("second request started"))
                    .on_end(|_: &mut dyn Entity| log::info!("second request ended")),
            )?;
        }

        node.advance()?;
        print_frame(clock.now(), &node)?;
        clock.advance(interval);
    }

    for event in node.drain_events() {
        log::info!("{} {:?} on {}", event.transition_id, event.kind, event.state_key);
    }

    Ok(())
}
