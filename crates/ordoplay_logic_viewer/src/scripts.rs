// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripts compiled into the viewer. Bundles can only reference these.

use ordoplay_logic::{NodeError, NodeIo, PropertyDecl, PropertyType, ScriptDefinition, ScriptRegistry};

fn fields(fields: &[(&str, PropertyType)]) -> PropertyDecl {
    PropertyDecl::structure(
        "",
        fields
            .iter()
            .map(|(name, property_type)| PropertyDecl::new(*name, *property_type))
            .collect(),
    )
}

fn float(io: &NodeIo<'_>, path: &str) -> Result<f32, NodeError> {
    io.input(path)?
        .as_float()
        .ok_or_else(|| NodeError::UnexpectedType(path.to_owned()))
}

/// Turns a microsecond ticker into a looping 0..1 phase
fn phase() -> ScriptDefinition {
    ScriptDefinition::new(
        "phase",
        fields(&[("ticker_us", PropertyType::Int64), ("period", PropertyType::Float)]),
        fields(&[("progress", PropertyType::Float)]),
        |io| {
            let ticker = io
                .input("ticker_us")?
                .as_int64()
                .ok_or_else(|| NodeError::UnexpectedType("ticker_us".into()))?;
            let period = float(io, "period")?;
            if period <= 0.0 {
                return Err(NodeError::script(format!("period must be positive, got {period}")));
            }
            let seconds = ticker as f64 / 1_000_000.0;
            let progress = (seconds % f64::from(period)) / f64::from(period);
            io.set_output("progress", progress as f32)
        },
    )
}

/// `value * factor + offset`
fn scale() -> ScriptDefinition {
    ScriptDefinition::new(
        "scale",
        fields(&[
            ("value", PropertyType::Float),
            ("factor", PropertyType::Float),
            ("offset", PropertyType::Float),
        ]),
        fields(&[("result", PropertyType::Float)]),
        |io| {
            let result = float(io, "value")? * float(io, "factor")? + float(io, "offset")?;
            io.set_output("result", result)
        },
    )
}

pub fn builtin() -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    registry.register(phase());
    registry.register(scale());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_logic::{GraphSnapshot, LogicEngine, SceneStore};

    fn engine() -> LogicEngine {
        LogicEngine::from_snapshot(&GraphSnapshot::default(), SceneStore::new(), builtin()).unwrap()
    }

    #[test]
    fn phase_loops_over_the_period() {
        let mut engine = engine();
        let node = engine.create_script("phase", "phase").unwrap();
        let ticker = engine.input(node, "ticker_us").unwrap();
        let period = engine.input(node, "period").unwrap();
        engine.set_value(ticker, 3_000_000i64).unwrap();
        engine.set_value(period, 2.0f32).unwrap();
        engine.update().unwrap();

        let progress = engine.value(engine.output(node, "progress").unwrap()).and_then(|v| v.as_float());
        assert_eq!(progress, Some(0.5));
    }

    #[test]
    fn phase_rejects_empty_period() {
        let mut engine = engine();
        engine.create_script("phase", "phase").unwrap();
        assert!(engine.update().is_err());
    }
}
