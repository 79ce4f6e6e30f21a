// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timer nodes.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::node::NodeError;
use crate::property::{PropertyDecl, PropertyType, PropertyValue};

const TICKER: &str = "ticker_us";

/// Ticker source: forwards `ticker_us`, or the frame clock when it is zero
#[derive(Debug, Clone, Default)]
pub struct TimerNode;

impl TimerNode {
    /// Create a timer
    pub fn new() -> Self {
        Self
    }
}

impl LogicNode for TimerNode {
    fn interface(&self) -> NodeInterface {
        NodeInterface {
            inputs: Some(PropertyDecl::structure("", vec![PropertyDecl::new(TICKER, PropertyType::Int64)])),
            outputs: Some(PropertyDecl::structure("", vec![PropertyDecl::new(TICKER, PropertyType::Int64)])),
            ..NodeInterface::default()
        }
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        let ticker = io
            .input(TICKER)?
            .as_int64()
            .ok_or_else(|| NodeError::UnexpectedType(format!("inputs.{TICKER}")))?;
        let ticker = if ticker == 0 { ctx.clock_us } else { ticker };
        io.set_output(TICKER, PropertyValue::Int64(ticker))
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::Timer
    }

    fn is_always_dirty(&self) -> bool {
        true
    }
}
