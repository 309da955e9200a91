//! Evaluation planning.
//!
//! Collects the pending subgraph below a root and groups it into waves: every
//! node's pending dependencies live in an earlier wave, so the nodes of one wave
//! can be processed concurrently.
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::graph::node::{Node, NodeId};
use crate::graph::process::Task;

/// Ordered waves of snapshotted tasks.
pub(crate) type Waves = Vec<Vec<(NodeId, Task)>>;

/// Plan the evaluation of `root`. Nodes that are already done are left out.
pub(crate) fn plan(nodes: &[Node], root: NodeId) -> Result<Waves> {
    let mut tasks: HashMap<NodeId, Task> = HashMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if tasks.contains_key(&id) {
            continue;
        }
        let node = nodes
            .get(id.index())
            .ok_or_else(|| Error::Precondition(format!("unknown node {id}")))?;
        if node.state().is_done() {
            continue;
        }
        let task = Task::snapshot(node.kind());
        stack.extend(task.inputs());
        tasks.insert(id, task);
    }

    let mut indeg: HashMap<NodeId, usize> = HashMap::with_capacity(tasks.len());
    let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (id, task) in &tasks {
        let pending: Vec<NodeId> = task
            .inputs()
            .into_iter()
            .filter(|dep| tasks.contains_key(dep))
            .collect();
        indeg.insert(*id, pending.len());
        for dep in pending {
            dependents.entry(dep).or_default().push(*id);
        }
    }

    let mut ready: Vec<NodeId> = indeg
        .iter()
        .filter_map(|(id, &d)| (d == 0).then_some(*id))
        .collect();
    let mut order: Vec<Vec<NodeId>> = Vec::new();
    let mut scheduled = 0;

    while !ready.is_empty() {
        ready.sort_unstable();
        let mut next = Vec::new();
        for id in &ready {
            if let Some(children) = dependents.get(id) {
                for child in children {
                    if let Some(d) = indeg.get_mut(child) {
                        *d = d.saturating_sub(1);
                        if *d == 0 {
                            next.push(*child);
                        }
                    }
                }
            }
        }
        scheduled += ready.len();
        order.push(std::mem::replace(&mut ready, next));
    }

    if scheduled != tasks.len() {
        return Err(Error::Operation(format!(
            "cycle detected below node {root}"
        )));
    }

    Ok(order
        .into_iter()
        .map(|wave| {
            wave.into_iter()
                .filter_map(|id| tasks.remove(&id).map(|task| (id, task)))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::generators::FlatGenerator;
    use crate::graph::node::{GeneratorNode, MaskNode, NodeKind, UnaryNode, WeightedNode};
    use crate::map::{Dimensions, HeightField};

    fn flat() -> Node {
        Node::new(NodeKind::Generator(GeneratorNode {
            generator: Arc::new(FlatGenerator::new(Dimensions::square(2), 0.5)),
        }))
    }

    fn ids(waves: &Waves) -> Vec<Vec<usize>> {
        waves
            .iter()
            .map(|w| w.iter().map(|(id, _)| id.index()).collect())
            .collect()
    }

    #[test]
    fn diamond_is_planned_in_three_waves() {
        // 0 -> 1, 0 -> 2, (1, 2) -> 3
        let nodes = vec![
            flat(),
            Node::new(NodeKind::Invert(UnaryNode { source: NodeId(0) })),
            Node::new(NodeKind::Normalize(UnaryNode { source: NodeId(0) })),
            Node::new(NodeKind::Mask(MaskNode {
                source: NodeId(1),
                mask: NodeId(2),
            })),
        ];
        let waves = plan(&nodes, NodeId(3)).unwrap();
        assert_eq!(ids(&waves), vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn done_nodes_are_skipped() {
        let nodes = vec![
            flat(),
            Node::new(NodeKind::Invert(UnaryNode { source: NodeId(0) })),
        ];
        nodes[0].state().complete(Arc::new(HeightField::new(2, 2)));
        let waves = plan(&nodes, NodeId(1)).unwrap();
        assert_eq!(ids(&waves), vec![vec![1]]);

        nodes[1].state().complete(Arc::new(HeightField::new(2, 2)));
        assert!(plan(&nodes, NodeId(1)).unwrap().is_empty());
    }

    #[test]
    fn repeated_dependency_is_planned_once() {
        let mix = WeightedNode::new(None);
        mix.push(NodeId(0), 0.5);
        mix.push(NodeId(0), 0.5);
        let nodes = vec![flat(), Node::new(NodeKind::Add(mix))];
        let waves = plan(&nodes, NodeId(1)).unwrap();
        assert_eq!(ids(&waves), vec![vec![0], vec![1]]);
    }

    #[test]
    fn cycles_are_reported() {
        let a = WeightedNode::new(None);
        a.push(NodeId(1), 1.0);
        let b = WeightedNode::new(None);
        b.push(NodeId(0), 1.0);
        let nodes = vec![Node::new(NodeKind::Mix(a)), Node::new(NodeKind::Mix(b))];
        let err = plan(&nodes, NodeId(0)).unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
    }

    #[test]
    fn unknown_root_is_a_precondition_error() {
        let err = plan(&[], NodeId(0)).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
