//! Height-field node graph.
//!
//! A [`NodeGraph`] owns its nodes in an arena. Edges point from a node to the
//! nodes it consumes; evaluating a node evaluates its whole pending subgraph
//! first, one wave of independent nodes at a time.
//!
//! Node kinds:
//! - generator: produces a field from a [`Generator`](crate::generators::Generator)
//! - mix / add: weighted sums, mix clamped to `[0, 1]` after every input
//! - blending: left fold with a [`BlendMode`](crate::blending::BlendMode)
//! - mask: `source * mask`, uncovered cells become 0
//! - image effect: an [`Effect`](crate::effects::Effect) chain
//! - invert / normalize
pub mod config;
pub mod node;
pub mod node_graph;
pub(crate) mod process;
pub(crate) mod schedule;
pub mod state;

pub use config::ExecutionConfig;
pub use node::{
    BlendingNode, GeneratorNode, ImageEffectNode, MaskNode, Node, NodeId, NodeKind, UnaryNode,
    WeightedNode,
};
pub use node_graph::NodeGraph;
pub use state::{ExecutionState, ExecutionStatus};
