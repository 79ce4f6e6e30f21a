// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo: a cube bouncing in front of a camera.
//!
//! `clock (timer) -> phase (script) -> bounce (animation) -> cube_binding`,
//! with an anchor point tracking the cube on screen.

use crate::bundle::{BundleError, SceneBundle};
use crate::scripts;
use ordoplay_logic::{
    AnimationChannel, AnimationConfig, EngineError, InterpolationType, LogicEngine, NodeId, PropertyId, PropertyValue,
};

fn port(engine: &LogicEngine, node: NodeId, path: &str, output: bool) -> Result<PropertyId, BundleError> {
    let found = if output {
        engine.output(node, path)
    } else {
        engine.input(node, path)
    };
    found.ok_or_else(|| BundleError::MissingProperty(path.to_owned()))
}

fn connect(engine: &mut LogicEngine, source: PropertyId, target: PropertyId) -> Result<(), BundleError> {
    engine.link(source, target).map_err(EngineError::from)?;
    Ok(())
}

pub fn bundle() -> Result<SceneBundle, BundleError> {
    let mut engine = LogicEngine::new();
    for id in ["phase", "scale"] {
        if let Some(definition) = scripts::builtin().get(id).cloned() {
            engine.register_script(definition);
        }
    }

    let host = engine.host_mut();
    let cube = host.create_node("cube");
    let camera = host.create_camera("camera");

    let clock = engine.create_timer("clock")?;
    let phase = engine.create_script("phase", "phase")?;
    let bounce = engine.create_animation(
        "bounce",
        AnimationConfig::new(vec![AnimationChannel::new(
            "translation",
            vec![0.0, 0.5, 1.0],
            vec![
                PropertyValue::Vec3f([0.0, 0.0, -5.0]),
                PropertyValue::Vec3f([0.0, 2.0, -5.0]),
                PropertyValue::Vec3f([0.0, 0.0, -5.0]),
            ],
            InterpolationType::Linear,
        )]),
    )?;
    let cube_binding = engine.create_node_binding("cube_binding", cube)?;
    let camera_binding = engine.create_camera_binding("camera_binding", camera)?;
    engine.create_anchor_point("cube_anchor", cube_binding, camera_binding)?;

    let period = port(&engine, phase, "period", false)?;
    engine.set_value(period, 2.0f32).map_err(EngineError::from)?;

    let links = [
        (clock, "ticker_us", phase, "ticker_us"),
        (phase, "progress", bounce, "progress"),
        (bounce, "translation", cube_binding, "translation"),
    ];
    for (from, output, to, input) in links {
        let source = port(&engine, from, output, true)?;
        let target = port(&engine, to, input, false)?;
        connect(&mut engine, source, target)?;
    }

    Ok(SceneBundle::capture(&engine))
}
