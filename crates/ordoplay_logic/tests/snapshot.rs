// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and reloading graphs.

mod common;

use common::{chain, engine, input, out_int, output, scripts};
use ordoplay_logic::host::node_fields;
use ordoplay_logic::{
    EngineError, GraphSnapshot, HostScene, LinkError, LinkRecord, LogicEngine, NodeConfig, NodeId, NodeRecord,
    PropertyValue, SceneStore, ScriptRegistry,
};

#[test]
fn reloaded_graph_keeps_ids_links_and_values() {
    let mut original = engine();
    let nodes = chain(&mut original, 3);
    original.set_value(input(&original, nodes[0], "seed"), 4).unwrap();
    original
        .link_weak(output(&original, nodes[2], "o"), input(&original, nodes[0], "i"))
        .unwrap();

    let text = original.snapshot().to_ron().unwrap();
    let snapshot = GraphSnapshot::from_ron(&text).unwrap();
    let mut reloaded = LogicEngine::from_snapshot(&snapshot, original.host().clone(), scripts()).unwrap();

    assert_eq!(reloaded.node_count(), 3);
    assert_eq!(reloaded.node(nodes[1]).map(|n| n.name()), Some("n1"));
    let links: Vec<_> = reloaded.links().copied().collect();
    assert_eq!(links, original.links().copied().collect::<Vec<_>>());
    assert!(links.last().unwrap().weak);

    reloaded.update().unwrap();
    original.update().unwrap();
    assert_eq!(out_int(&reloaded, nodes[2], "o"), 4);
    assert_eq!(out_int(&reloaded, nodes[2], "o"), out_int(&original, nodes[2], "o"));

    // new nodes continue after the highest loaded ID
    let next = reloaded.create_script("next", "add").unwrap();
    assert_eq!(next, NodeId(4));
}

#[test]
fn linked_inputs_are_not_stored_as_values() {
    let mut engine = engine();
    let nodes = chain(&mut engine, 2);
    let snapshot = engine.snapshot();

    let second = &snapshot.nodes[1];
    assert!(second.values.contains_key("inputs.seed"));
    assert!(!second.values.contains_key("inputs.i"));
    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(snapshot.links[0].source_path, "outputs.o");
    assert_eq!(snapshot.links[0].target_node, nodes[1]);
}

#[test]
fn binding_values_are_restored_onto_the_host() {
    let mut engine = engine();
    let object = engine.host_mut().create_node("mesh");
    let binding = engine.create_node_binding("mesh_binding", object).unwrap();
    engine
        .set_value(input(&engine, binding, "translation"), PropertyValue::Vec3f([1.0, 1.0, 1.0]))
        .unwrap();
    let snapshot = engine.snapshot();

    // a fresh host with the same object layout
    let mut host = SceneStore::new();
    let fresh = host.create_node("mesh");
    assert_eq!(fresh, object);

    let mut reloaded = LogicEngine::from_snapshot(&snapshot, host, scripts()).unwrap();
    reloaded.update().unwrap();
    assert_eq!(
        reloaded.host().field(object, node_fields::TRANSLATION),
        Some(PropertyValue::Vec3f([1.0, 1.0, 1.0]))
    );
    // untouched fields are not flagged for writing
    assert!(reloaded.validate().iter().all(|w| !w.to_string().contains("not applied")));
}

#[test]
fn cyclic_snapshot_links_are_rejected() {
    let record = |id: u64| NodeRecord {
        id: NodeId(id),
        name: format!("n{id}"),
        config: NodeConfig::Script { script: "add".into() },
        values: Default::default(),
    };
    let link = |from: u64, to: u64| LinkRecord {
        source_node: NodeId(from),
        source_path: "outputs.o".into(),
        target_node: NodeId(to),
        target_path: "inputs.i".into(),
        weak: false,
    };
    let snapshot = GraphSnapshot {
        nodes: vec![record(1), record(2)],
        links: vec![link(1, 2), link(2, 1)],
        ..GraphSnapshot::default()
    };

    let err = LogicEngine::from_snapshot(&snapshot, SceneStore::new(), scripts()).unwrap_err();
    assert_eq!(
        err,
        EngineError::Link(LinkError::CycleDetected {
            from: NodeId(2),
            to: NodeId(1),
        })
    );
}

#[test]
fn missing_scripts_and_paths_fail_to_load() {
    let mut engine = engine();
    chain(&mut engine, 2);
    let mut snapshot = engine.snapshot();

    let err = LogicEngine::from_snapshot(&snapshot, SceneStore::new(), ScriptRegistry::new()).unwrap_err();
    assert_eq!(err, EngineError::UnknownScript("add".into()));

    snapshot.links[0].target_path = "inputs.nothing".into();
    let err = LogicEngine::from_snapshot(&snapshot, SceneStore::new(), scripts()).unwrap_err();
    assert!(matches!(err, EngineError::Snapshot(_)));
}

#[test]
fn engine_settings_travel_with_the_snapshot() {
    let mut engine = engine();
    engine.set_dirty_tracking_enabled(false);
    engine.set_statistics_logging_rate(0);
    let snapshot = engine.snapshot();

    let reloaded = LogicEngine::from_snapshot(&snapshot, SceneStore::new(), scripts()).unwrap();
    let config = reloaded.config();
    assert!(!config.dirty_tracking);
    assert!(config.update_report);
    assert_eq!(config.statistics_logging_rate, 0);
}
