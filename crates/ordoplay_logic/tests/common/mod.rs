// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared scripts and helpers for integration tests.

#![allow(dead_code)]

use ordoplay_logic::{
    LogicEngine, NodeError, NodeId, PropertyDecl, PropertyId, PropertyType, ScriptDefinition, ScriptRegistry,
};

fn ints(names: &[&str]) -> PropertyDecl {
    PropertyDecl::structure(
        "",
        names
            .iter()
            .map(|name| PropertyDecl::new(*name, PropertyType::Int32))
            .collect(),
    )
}

fn int(io: &ordoplay_logic::NodeIo<'_>, path: &str) -> Result<i32, NodeError> {
    io.input(path)?
        .as_int32()
        .ok_or_else(|| NodeError::UnexpectedType(path.to_owned()))
}

/// Scripts used across the tests:
/// - `add`: `o = i + seed`
/// - `sign`: `o = signum(i + seed)`
/// - `feedback`: `o = x + fb`
/// - `checked`: `o = i`, fails for negative `i`
pub fn scripts() -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    registry.register(ScriptDefinition::new("add", ints(&["i", "seed"]), ints(&["o"]), |io| {
        let value = int(io, "i")? + int(io, "seed")?;
        io.set_output("o", value)
    }));
    registry.register(ScriptDefinition::new("sign", ints(&["i", "seed"]), ints(&["o"]), |io| {
        let value = (int(io, "i")? + int(io, "seed")?).signum();
        io.set_output("o", value)
    }));
    registry.register(ScriptDefinition::new("feedback", ints(&["x", "fb"]), ints(&["o"]), |io| {
        let value = int(io, "x")? + int(io, "fb")?;
        io.set_output("o", value)
    }));
    registry.register(ScriptDefinition::new("checked", ints(&["i"]), ints(&["o"]), |io| {
        let value = int(io, "i")?;
        if value < 0 {
            return Err(NodeError::script(format!("negative input {value}")));
        }
        io.set_output("o", value)
    }));
    registry
}

/// Engine with the test scripts registered and update reports enabled
pub fn engine() -> LogicEngine {
    let mut engine = LogicEngine::new();
    for id in ["add", "sign", "feedback", "checked"] {
        let definition = scripts().get(id).cloned().unwrap();
        engine.register_script(definition);
    }
    engine.enable_update_report(true);
    engine
}

pub fn input(engine: &LogicEngine, node: NodeId, path: &str) -> PropertyId {
    engine.input(node, path).unwrap()
}

pub fn output(engine: &LogicEngine, node: NodeId, path: &str) -> PropertyId {
    engine.output(node, path).unwrap()
}

pub fn out_int(engine: &LogicEngine, node: NodeId, path: &str) -> i32 {
    engine.value(output(engine, node, path)).and_then(|v| v.as_int32()).unwrap()
}

pub fn in_int(engine: &LogicEngine, node: NodeId, path: &str) -> i32 {
    engine.value(input(engine, node, path)).and_then(|v| v.as_int32()).unwrap()
}

pub fn executed(engine: &LogicEngine) -> Vec<NodeId> {
    engine.last_update_report().unwrap().executed.clone()
}

/// Chain of `add` nodes linked `o -> i`
pub fn chain(engine: &mut LogicEngine, len: usize) -> Vec<NodeId> {
    let nodes: Vec<NodeId> = (0..len)
        .map(|i| engine.create_script(format!("n{i}"), "add").unwrap())
        .collect();
    for pair in nodes.windows(2) {
        let source = output(engine, pair[0], "o");
        let target = input(engine, pair[1], "i");
        engine.link(source, target).unwrap();
    }
    nodes
}
