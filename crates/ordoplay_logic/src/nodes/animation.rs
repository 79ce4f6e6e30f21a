// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe animation nodes.
//!
//! An animation samples all of its channels at `progress * duration`, where
//! the duration is the last timestamp over all channels. Outside the keyed
//! range a channel holds its first or last keyframe.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::node::NodeError;
use crate::property::{PropertyDecl, PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};

const PROGRESS: &str = "progress";
const DURATION: &str = "duration";

/// How values between two keyframes are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationType {
    /// Hold the previous keyframe
    Step,
    /// Linear interpolation
    #[default]
    Linear,
    /// Linear interpolation of a quaternion, normalized
    LinearQuaternion,
    /// Cubic Hermite spline using the channel tangents
    Cubic,
    /// Cubic Hermite spline of a quaternion, normalized
    CubicQuaternion,
}

impl InterpolationType {
    fn is_cubic(self) -> bool {
        matches!(self, Self::Cubic | Self::CubicQuaternion)
    }

    fn is_quaternion(self) -> bool {
        matches!(self, Self::LinearQuaternion | Self::CubicQuaternion)
    }
}

/// One animated value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationChannel {
    /// Output name
    pub name: String,
    /// Key times in seconds, strictly ascending
    pub timestamps: Vec<f32>,
    /// Values at each timestamp
    pub keyframes: Vec<PropertyValue>,
    /// Interpolation mode
    pub interpolation: InterpolationType,
    /// Incoming tangents, cubic interpolation only
    #[serde(default)]
    pub tangents_in: Vec<PropertyValue>,
    /// Outgoing tangents, cubic interpolation only
    #[serde(default)]
    pub tangents_out: Vec<PropertyValue>,
}

impl AnimationChannel {
    /// Create a channel without tangents
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<f32>,
        keyframes: Vec<PropertyValue>,
        interpolation: InterpolationType,
    ) -> Self {
        Self {
            name: name.into(),
            timestamps,
            keyframes,
            interpolation,
            tangents_in: Vec::new(),
            tangents_out: Vec::new(),
        }
    }

    /// Set tangents for cubic interpolation
    pub fn with_tangents(mut self, tangents_in: Vec<PropertyValue>, tangents_out: Vec<PropertyValue>) -> Self {
        self.tangents_in = tangents_in;
        self.tangents_out = tangents_out;
        self
    }

    fn value_type(&self) -> Option<PropertyType> {
        self.keyframes.first().map(PropertyValue::property_type)
    }

    fn validate(&self) -> Result<(), String> {
        let name = &self.name;
        if name.is_empty() || name == DURATION {
            return Err(format!("invalid channel name '{name}'"));
        }
        if self.timestamps.is_empty() {
            return Err(format!("channel '{name}' has no timestamps"));
        }
        if self.timestamps.len() != self.keyframes.len() {
            return Err(format!(
                "channel '{name}' has {} timestamps but {} keyframes",
                self.timestamps.len(),
                self.keyframes.len()
            ));
        }
        if self.timestamps.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(format!("channel '{name}' has negative or non-finite timestamps"));
        }
        if self.timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("channel '{name}' timestamps must be strictly ascending"));
        }

        let value_type = self.value_type().ok_or_else(|| format!("channel '{name}' has no keyframes"))?;
        if components(&self.keyframes[0]).is_none() {
            return Err(format!("channel '{name}' keyframes of type {value_type} can't be animated"));
        }
        if self.keyframes.iter().any(|k| k.property_type() != value_type) {
            return Err(format!("channel '{name}' keyframes must all have the same type"));
        }
        if self.interpolation.is_quaternion() && value_type != PropertyType::Vec4f {
            return Err(format!("channel '{name}' quaternion interpolation requires Vec4f keyframes"));
        }
        if self.interpolation.is_cubic() {
            let count = self.keyframes.len();
            if self.tangents_in.len() != count || self.tangents_out.len() != count {
                return Err(format!("channel '{name}' cubic interpolation requires one tangent pair per keyframe"));
            }
            if self
                .tangents_in
                .iter()
                .chain(&self.tangents_out)
                .any(|t| t.property_type() != value_type)
            {
                return Err(format!("channel '{name}' tangents must have the keyframe type"));
            }
        }
        Ok(())
    }

    /// Value at `time` seconds
    pub fn sample(&self, time: f32) -> Option<PropertyValue> {
        if time.is_nan() {
            return None;
        }
        let value_type = self.value_type()?;
        let last = self.timestamps.len().checked_sub(1)?;
        if time <= self.timestamps[0] {
            return self.keyframes.first().cloned();
        }
        if time >= self.timestamps[last] {
            return self.keyframes.get(last).cloned();
        }

        // first keyframe after `time`
        let next = self.timestamps.partition_point(|t| *t <= time).min(last);
        let prev = next.checked_sub(1)?;
        if self.interpolation == InterpolationType::Step {
            return self.keyframes.get(prev).cloned();
        }

        let span = self.timestamps[next] - self.timestamps[prev];
        let t = (time - self.timestamps[prev]) / span;
        let a = components(&self.keyframes[prev])?;
        let b = components(&self.keyframes[next])?;

        let mut result: Vec<f32> = if self.interpolation.is_cubic() {
            let m0 = components(self.tangents_out.get(prev)?)?;
            let m1 = components(self.tangents_in.get(next)?)?;
            (0..a.len())
                .map(|i| hermite(a[i], m0[i] * span, b[i], m1[i] * span, t))
                .collect()
        } else {
            a.iter().zip(&b).map(|(a, b)| lerp(*a, *b, t)).collect()
        };

        if self.interpolation.is_quaternion() {
            normalize(&mut result);
        }
        from_components(value_type, &result)
    }
}

/// Channels of an animation node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Channels, one output each
    pub channels: Vec<AnimationChannel>,
}

impl AnimationConfig {
    /// Create a config from channels
    pub fn new(channels: Vec<AnimationChannel>) -> Self {
        Self { channels }
    }

    /// Check the channels can be sampled
    pub fn validate(&self) -> Result<(), String> {
        if self.channels.is_empty() {
            return Err("animation requires at least one channel".into());
        }
        for (i, channel) in self.channels.iter().enumerate() {
            channel.validate()?;
            if self.channels[..i].iter().any(|c| c.name == channel.name) {
                return Err(format!("duplicate channel name '{}'", channel.name));
            }
        }
        Ok(())
    }

    /// Last timestamp over all channels
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|c| c.timestamps.last().copied())
            .fold(0.0, f32::max)
    }
}

/// Node sampling keyframe channels
#[derive(Debug, Clone)]
pub struct AnimationNode {
    config: AnimationConfig,
    duration: f32,
}

impl AnimationNode {
    /// Create an animation node from a validated config
    pub fn new(config: AnimationConfig) -> Result<Self, String> {
        config.validate()?;
        let duration = config.duration();
        Ok(Self { config, duration })
    }

    /// Length of the animation in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl LogicNode for AnimationNode {
    fn interface(&self) -> NodeInterface {
        let mut outputs = vec![PropertyDecl::new(DURATION, PropertyType::Float)];
        outputs.extend(
            self.config
                .channels
                .iter()
                .filter_map(|c| Some(PropertyDecl::new(c.name.clone(), c.value_type()?))),
        );
        NodeInterface {
            inputs: Some(PropertyDecl::structure("", vec![PropertyDecl::new(PROGRESS, PropertyType::Float)])),
            outputs: Some(PropertyDecl::structure("", outputs)),
            ..NodeInterface::default()
        }
    }

    fn initialize(&mut self, io: &mut NodeIo<'_>, _host: &dyn crate::host::HostScene) -> Result<(), NodeError> {
        io.set_output(DURATION, self.duration)
    }

    fn update(&mut self, io: &mut NodeIo<'_>, _ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        let progress = io
            .input(PROGRESS)?
            .as_float()
            .ok_or_else(|| NodeError::UnexpectedType(format!("inputs.{PROGRESS}")))?;
        if !progress.is_finite() {
            return Err(NodeError::InvalidInput {
                path: format!("inputs.{PROGRESS}"),
                reason: format!("progress must be finite, got {progress}"),
            });
        }
        let time = progress.clamp(0.0, 1.0) * self.duration;

        io.set_output(DURATION, self.duration)?;
        for channel in &self.config.channels {
            let value = channel
                .sample(time)
                .ok_or_else(|| NodeError::UnexpectedType(format!("outputs.{}", channel.name)))?;
            io.set_output(&channel.name, value)?;
        }
        Ok(())
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::Animation(self.config.clone())
    }
}

fn components(value: &PropertyValue) -> Option<Vec<f32>> {
    let values = match value {
        PropertyValue::Float(v) => vec![*v],
        PropertyValue::Vec2f(v) => v.to_vec(),
        PropertyValue::Vec3f(v) => v.to_vec(),
        PropertyValue::Vec4f(v) => v.to_vec(),
        PropertyValue::Int32(v) => vec![*v as f32],
        PropertyValue::Vec2i(v) => v.iter().map(|c| *c as f32).collect(),
        PropertyValue::Vec3i(v) => v.iter().map(|c| *c as f32).collect(),
        PropertyValue::Vec4i(v) => v.iter().map(|c| *c as f32).collect(),
        _ => return None,
    };
    Some(values)
}

fn from_components(property_type: PropertyType, c: &[f32]) -> Option<PropertyValue> {
    let int = |i: usize| c.get(i).map(|v| v.round() as i32);
    let value = match property_type {
        PropertyType::Float => PropertyValue::Float(*c.first()?),
        PropertyType::Vec2f => PropertyValue::Vec2f(c.try_into().ok()?),
        PropertyType::Vec3f => PropertyValue::Vec3f(c.try_into().ok()?),
        PropertyType::Vec4f => PropertyValue::Vec4f(c.try_into().ok()?),
        PropertyType::Int32 => PropertyValue::Int32(int(0)?),
        PropertyType::Vec2i => PropertyValue::Vec2i([int(0)?, int(1)?]),
        PropertyType::Vec3i => PropertyValue::Vec3i([int(0)?, int(1)?, int(2)?]),
        PropertyType::Vec4i => PropertyValue::Vec4i([int(0)?, int(1)?, int(2)?, int(3)?]),
        _ => return None,
    };
    Some(value)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

fn normalize(v: &mut [f32]) {
    let len = v.iter().map(|c| c * c).sum::<f32>().sqrt();
    if len > f32::EPSILON {
        v.iter_mut().for_each(|c| *c /= len);
    }
}
