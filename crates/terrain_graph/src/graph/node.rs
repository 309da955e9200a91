//! Node kinds of the height-field graph.
//!
//! Each [`Node`] pairs a [`NodeKind`] with its [`ExecutionState`]. Dependency
//! edges are [`NodeId`]s into the owning graph; a node only owns its own
//! cached result.
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::blending::BlendMode;
use crate::effects::Effect;
use crate::generators::Generator;
use crate::graph::state::{ExecutionState, ExecutionStatus};
use crate::map::{Dimensions, HeightField};

/// Index of a node inside its [`NodeGraph`](crate::graph::NodeGraph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the graph arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a [`Generator`].
#[derive(Debug, Clone)]
pub struct GeneratorNode {
    pub generator: Arc<dyn Generator>,
}

/// Inputs of a mix or add node: dependencies with their weights.
#[derive(Debug, Default)]
pub struct WeightedNode {
    /// Output size; `None` takes the size of the first dependency.
    pub size: Option<Dimensions>,
    inputs: Mutex<Vec<(NodeId, f64)>>,
}

impl WeightedNode {
    pub fn new(size: Option<Dimensions>) -> Self {
        Self {
            size,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the weighted dependencies in insertion order.
    pub fn inputs(&self) -> Vec<(NodeId, f64)> {
        lock(&self.inputs).clone()
    }

    pub(crate) fn push(&self, dependency: NodeId, weight: f64) {
        lock(&self.inputs).push((dependency, weight));
    }
}

/// Folds its dependencies left to right with a [`BlendMode`].
#[derive(Debug)]
pub struct BlendingNode {
    pub blend_mode: Arc<dyn BlendMode>,
    /// Crop or pad the first dependency to this size before blending.
    pub dimensions: Option<Dimensions>,
    dependencies: Mutex<Vec<NodeId>>,
}

impl BlendingNode {
    pub fn new(blend_mode: Arc<dyn BlendMode>, dimensions: Option<Dimensions>) -> Self {
        Self {
            blend_mode,
            dimensions,
            dependencies: Mutex::new(Vec::new()),
        }
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        lock(&self.dependencies).clone()
    }

    pub(crate) fn push(&self, dependency: NodeId) {
        lock(&self.dependencies).push(dependency);
    }
}

/// Multiplies `source` by `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskNode {
    pub source: NodeId,
    pub mask: NodeId,
}

/// Runs `source` through a chain of effects.
#[derive(Debug)]
pub struct ImageEffectNode {
    pub source: NodeId,
    effects: Mutex<Vec<Arc<dyn Effect>>>,
}

impl ImageEffectNode {
    pub fn new(source: NodeId, effects: Vec<Arc<dyn Effect>>) -> Self {
        Self {
            source,
            effects: Mutex::new(effects),
        }
    }

    /// Snapshot of the effect chain.
    pub fn effects(&self) -> Vec<Arc<dyn Effect>> {
        lock(&self.effects).clone()
    }

    pub(crate) fn push(&self, effect: Arc<dyn Effect>) {
        lock(&self.effects).push(effect);
    }
}

/// Single-input node (invert, normalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryNode {
    pub source: NodeId,
}

/// The closed set of node types.
#[non_exhaustive]
#[derive(Debug)]
pub enum NodeKind {
    Generator(GeneratorNode),
    /// Weighted sum, clamped to `[0, 1]` after every input.
    Mix(WeightedNode),
    /// Weighted sum without clamping.
    Add(WeightedNode),
    Blending(BlendingNode),
    Mask(MaskNode),
    ImageEffect(ImageEffectNode),
    Invert(UnaryNode),
    Normalize(UnaryNode),
}

impl NodeKind {
    pub const GENERATOR: &'static str = "GeneratorNode";
    pub const MIX: &'static str = "MixNode";
    pub const ADD: &'static str = "AddNode";
    pub const BLENDING: &'static str = "BlendingNode";
    pub const MASK: &'static str = "MaskNode";
    pub const IMAGE_EFFECT: &'static str = "ImageEffectNode";
    pub const INVERT: &'static str = "InvertNode";
    pub const NORMALIZE: &'static str = "NormalizeNode";

    /// Tag of the node type in persisted documents.
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::Generator(_) => Self::GENERATOR,
            NodeKind::Mix(_) => Self::MIX,
            NodeKind::Add(_) => Self::ADD,
            NodeKind::Blending(_) => Self::BLENDING,
            NodeKind::Mask(_) => Self::MASK,
            NodeKind::ImageEffect(_) => Self::IMAGE_EFFECT,
            NodeKind::Invert(_) => Self::INVERT,
            NodeKind::Normalize(_) => Self::NORMALIZE,
        }
    }

    /// Current dependencies in evaluation order.
    pub fn dependencies(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Generator(_) => Vec::new(),
            NodeKind::Mix(w) | NodeKind::Add(w) => {
                w.inputs().into_iter().map(|(id, _)| id).collect()
            }
            NodeKind::Blending(b) => b.dependencies(),
            NodeKind::Mask(m) => vec![m.source, m.mask],
            NodeKind::ImageEffect(e) => vec![e.source],
            NodeKind::Invert(u) | NodeKind::Normalize(u) => vec![u.source],
        }
    }
}

/// A vertex of the graph: its kind plus its execution state.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    state: ExecutionState,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            state: ExecutionState::default(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<Arc<HeightField>> {
        self.state.result()
    }

    pub(crate) fn state(&self) -> &ExecutionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blending::AddBlend;
    use crate::effects::InvertEffect;
    use crate::generators::FlatGenerator;

    #[test]
    fn type_tags_are_stable() {
        let gen = NodeKind::Generator(GeneratorNode {
            generator: Arc::new(FlatGenerator::new(Dimensions::square(1), 0.0)),
        });
        assert_eq!(gen.type_tag(), "GeneratorNode");
        assert_eq!(NodeKind::Mix(WeightedNode::new(None)).type_tag(), "MixNode");
        assert_eq!(NodeKind::Add(WeightedNode::new(None)).type_tag(), "AddNode");
        assert_eq!(
            NodeKind::Invert(UnaryNode { source: NodeId(0) }).type_tag(),
            "InvertNode"
        );
    }

    #[test]
    fn dependencies_follow_insertion_order() {
        let mix = WeightedNode::new(None);
        mix.push(NodeId(3), 0.5);
        mix.push(NodeId(1), 0.25);
        assert_eq!(
            NodeKind::Mix(mix).dependencies(),
            vec![NodeId(3), NodeId(1)]
        );

        let blend = BlendingNode::new(Arc::new(AddBlend), None);
        blend.push(NodeId(2));
        blend.push(NodeId(0));
        assert_eq!(blend.dependencies(), vec![NodeId(2), NodeId(0)]);

        let mask = NodeKind::Mask(MaskNode {
            source: NodeId(4),
            mask: NodeId(5),
        });
        assert_eq!(mask.dependencies(), vec![NodeId(4), NodeId(5)]);
    }

    #[test]
    fn image_effect_node_appends_effects() {
        let node = ImageEffectNode::new(NodeId(0), Vec::new());
        node.push(Arc::new(InvertEffect));
        assert_eq!(node.effects().len(), 1);
        assert_eq!(node.effects()[0].type_tag(), "InvertEffect");
    }

    #[test]
    fn node_id_displays_with_hash() {
        assert_eq!(NodeId(7).to_string(), "#7");
    }
}
