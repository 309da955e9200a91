//! The node arena and its evaluation engine.
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info_span, trace, warn};

use crate::blending::BlendMode;
use crate::effects::Effect;
use crate::error::{Error, Result};
use crate::generators::Generator;
use crate::graph::config::ExecutionConfig;
use crate::graph::node::{
    BlendingNode, GeneratorNode, ImageEffectNode, MaskNode, Node, NodeId, NodeKind, UnaryNode,
    WeightedNode,
};
use crate::graph::schedule;
use crate::graph::state::ExecutionStatus;
use crate::map::{Dimensions, HeightField};

/// An arena of height-field nodes with memoized, parallel evaluation.
///
/// Nodes are added with the `add_*` methods and addressed by the returned
/// [`NodeId`]. [`NodeGraph::execute`] evaluates a node after all of its
/// dependencies, processing independent nodes concurrently on a worker pool.
/// Every node is processed at most once; later calls reuse the cached result.
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    config: ExecutionConfig,
    pool: OnceLock<ThreadPool>,
    execution: Mutex<()>,
}

impl NodeGraph {
    /// Create an empty graph with the default [`ExecutionConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a custom configuration.
    pub fn with_config(config: ExecutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of all nodes in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::Precondition(format!("unknown node {id}")))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    /// Current dependencies of a node in evaluation order.
    pub fn dependencies(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.kind(id).map(NodeKind::dependencies)
    }

    pub fn status(&self, id: NodeId) -> Result<ExecutionStatus> {
        self.node(id).map(Node::status)
    }

    /// Cached result of a node, if it has been evaluated.
    pub fn result(&self, id: NodeId) -> Option<Arc<HeightField>> {
        self.nodes.get(id.0).and_then(Node::result)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    fn require(&self, id: NodeId) -> Result<NodeId> {
        self.node(id).map(|_| id)
    }

    pub fn add_generator(&mut self, generator: impl Generator + 'static) -> NodeId {
        self.add_generator_arc(Arc::new(generator))
    }

    pub fn add_generator_arc(&mut self, generator: Arc<dyn Generator>) -> NodeId {
        self.push(NodeKind::Generator(GeneratorNode { generator }))
    }

    /// Add a weighted sum clamped to `[0, 1]` after every input.
    pub fn add_mix(&mut self, size: Option<Dimensions>) -> NodeId {
        self.push(NodeKind::Mix(WeightedNode::new(size)))
    }

    /// Add an unclamped weighted sum.
    pub fn add_add(&mut self, size: Option<Dimensions>) -> NodeId {
        self.push(NodeKind::Add(WeightedNode::new(size)))
    }

    pub fn add_blending(
        &mut self,
        blend_mode: impl BlendMode + 'static,
        dimensions: Option<Dimensions>,
    ) -> NodeId {
        self.add_blending_arc(Arc::new(blend_mode), dimensions)
    }

    pub fn add_blending_arc(
        &mut self,
        blend_mode: Arc<dyn BlendMode>,
        dimensions: Option<Dimensions>,
    ) -> NodeId {
        self.push(NodeKind::Blending(BlendingNode::new(blend_mode, dimensions)))
    }

    pub fn add_mask(&mut self, source: NodeId, mask: NodeId) -> Result<NodeId> {
        let source = self.require(source)?;
        let mask = self.require(mask)?;
        Ok(self.push(NodeKind::Mask(MaskNode { source, mask })))
    }

    pub fn add_image_effect(
        &mut self,
        source: NodeId,
        effects: Vec<Arc<dyn Effect>>,
    ) -> Result<NodeId> {
        let source = self.require(source)?;
        Ok(self.push(NodeKind::ImageEffect(ImageEffectNode::new(source, effects))))
    }

    pub fn add_invert(&mut self, source: NodeId) -> Result<NodeId> {
        let source = self.require(source)?;
        Ok(self.push(NodeKind::Invert(UnaryNode { source })))
    }

    pub fn add_normalize(&mut self, source: NodeId) -> Result<NodeId> {
        let source = self.require(source)?;
        Ok(self.push(NodeKind::Normalize(UnaryNode { source })))
    }

    fn check_edge(&self, node: NodeId, dependency: NodeId) -> Result<&NodeKind> {
        self.require(dependency)?;
        if node == dependency {
            return Err(Error::Precondition(format!(
                "node {node} cannot depend on itself"
            )));
        }
        self.kind(node)
    }

    /// Append a weighted input to a mix or add node.
    pub fn add_weighted_dependency(
        &self,
        node: NodeId,
        dependency: NodeId,
        weight: f64,
    ) -> Result<()> {
        match self.check_edge(node, dependency)? {
            NodeKind::Mix(w) | NodeKind::Add(w) => {
                w.push(dependency, weight);
                Ok(())
            }
            other => Err(Error::Precondition(format!(
                "{} {node} does not take weighted dependencies",
                other.type_tag()
            ))),
        }
    }

    /// Append an input to a blending node.
    pub fn add_dependency(&self, node: NodeId, dependency: NodeId) -> Result<()> {
        match self.check_edge(node, dependency)? {
            NodeKind::Blending(b) => {
                b.push(dependency);
                Ok(())
            }
            other => Err(Error::Precondition(format!(
                "{} {node} does not take blend dependencies",
                other.type_tag()
            ))),
        }
    }

    /// Append an effect to an image-effect node.
    pub fn add_effect(&self, node: NodeId, effect: Arc<dyn Effect>) -> Result<()> {
        match self.kind(node)? {
            NodeKind::ImageEffect(e) => {
                e.push(effect);
                Ok(())
            }
            other => Err(Error::Precondition(format!(
                "{} {node} does not take effects",
                other.type_tag()
            ))),
        }
    }

    fn pool(&self) -> Result<&ThreadPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = self.config.build_pool()?;
        Ok(self.pool.get_or_init(|| pool))
    }

    fn resolve(&self, id: NodeId) -> Result<Arc<HeightField>> {
        self.result(id)
            .ok_or_else(|| Error::Operation(format!("dependency {id} has not been evaluated")))
    }

    /// Evaluate `id` and everything it depends on.
    ///
    /// Returns immediately when the node is already done. Concurrent calls are
    /// serialized. If a node fails, the nodes of the same wave that succeeded
    /// keep their results, the failed ones return to
    /// [`ExecutionStatus::NotStarted`] and the first error is returned.
    pub fn execute(&self, id: NodeId) -> Result<()> {
        if self.node(id)?.state().is_done() {
            return Ok(());
        }

        let _guard = self
            .execution
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let span = info_span!("execute", node = id.index());
        let _enter = span.enter();

        let waves = schedule::plan(&self.nodes, id)?;
        if waves.is_empty() {
            return Ok(());
        }
        let total: usize = waves.iter().map(Vec::len).sum();
        debug!(waves = waves.len(), nodes = total, "planned evaluation");

        let pool = self.pool()?;
        let resolve = |dep: NodeId| self.resolve(dep);
        for (index, wave) in waves.iter().enumerate() {
            for (node, _) in wave {
                self.nodes[node.0].state().mark_resolved();
            }
            debug!(wave = index, nodes = wave.len(), "processing wave");

            let outcomes: Vec<(NodeId, Result<Arc<HeightField>>)> = pool.install(|| {
                wave.par_iter()
                    .map(|(node, task)| {
                        trace!(node = node.index(), "processing node");
                        (*node, task.run(&resolve))
                    })
                    .collect()
            });

            let mut failure = None;
            for (node, outcome) in outcomes {
                let state = self.nodes[node.0].state();
                match outcome {
                    Ok(result) => state.complete(result),
                    Err(err) => {
                        warn!(node = node.index(), error = %err, "node failed");
                        state.reset();
                        failure.get_or_insert(err);
                    }
                }
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Evaluate `id` and return its result.
    pub fn evaluate(&self, id: NodeId) -> Result<Arc<HeightField>> {
        self.execute(id)?;
        self.resolve(id)
    }
}
