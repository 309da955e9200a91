//! Node processing.
//!
//! A [`Task`] is a snapshot of one node's inputs taken while planning, so that
//! dependencies added during evaluation cannot change what is processed.
use std::sync::Arc;

use crate::blending::BlendMode;
use crate::effects::Effect;
use crate::error::{Error, Result};
use crate::generators::Generator;
use crate::graph::node::{NodeId, NodeKind};
use crate::map::{Dimensions, HeightField};

/// Everything needed to process one node.
#[derive(Debug, Clone)]
pub(crate) enum Task {
    Generate(Arc<dyn Generator>),
    Weighted {
        size: Option<Dimensions>,
        inputs: Vec<(NodeId, f64)>,
        clamp: bool,
    },
    Blend {
        mode: Arc<dyn BlendMode>,
        dimensions: Option<Dimensions>,
        inputs: Vec<NodeId>,
    },
    Mask {
        source: NodeId,
        mask: NodeId,
    },
    Effects {
        source: NodeId,
        effects: Vec<Arc<dyn Effect>>,
    },
    Invert(NodeId),
    Normalize(NodeId),
}

impl Task {
    pub(crate) fn snapshot(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Generator(g) => Task::Generate(Arc::clone(&g.generator)),
            NodeKind::Mix(w) => Task::Weighted {
                size: w.size,
                inputs: w.inputs(),
                clamp: true,
            },
            NodeKind::Add(w) => Task::Weighted {
                size: w.size,
                inputs: w.inputs(),
                clamp: false,
            },
            NodeKind::Blending(b) => Task::Blend {
                mode: Arc::clone(&b.blend_mode),
                dimensions: b.dimensions,
                inputs: b.dependencies(),
            },
            NodeKind::Mask(m) => Task::Mask {
                source: m.source,
                mask: m.mask,
            },
            NodeKind::ImageEffect(e) => Task::Effects {
                source: e.source,
                effects: e.effects(),
            },
            NodeKind::Invert(u) => Task::Invert(u.source),
            NodeKind::Normalize(u) => Task::Normalize(u.source),
        }
    }

    /// Dependencies captured by the snapshot.
    pub(crate) fn inputs(&self) -> Vec<NodeId> {
        match self {
            Task::Generate(_) => Vec::new(),
            Task::Weighted { inputs, .. } => inputs.iter().map(|(id, _)| *id).collect(),
            Task::Blend { inputs, .. } => inputs.clone(),
            Task::Mask { source, mask } => vec![*source, *mask],
            Task::Effects { source, .. } | Task::Invert(source) | Task::Normalize(source) => {
                vec![*source]
            }
        }
    }

    /// Compute the node result. `input` resolves the cached result of a dependency.
    pub(crate) fn run(
        &self,
        input: &(dyn Fn(NodeId) -> Result<Arc<HeightField>> + Sync),
    ) -> Result<Arc<HeightField>> {
        match self {
            Task::Generate(generator) => generator.generate().map(Arc::new),
            Task::Weighted {
                size,
                inputs,
                clamp,
            } => weighted_sum(*size, inputs, *clamp, input).map(Arc::new),
            Task::Blend {
                mode,
                dimensions,
                inputs,
            } => blend_all(mode.as_ref(), *dimensions, inputs, input),
            Task::Mask { source, mask } => {
                let source = input(*source)?;
                let mask = input(*mask)?;
                Ok(Arc::new(apply_mask(&source, &mask)))
            }
            Task::Effects { source, effects } => {
                let mut current = input(*source)?;
                for effect in effects {
                    current = Arc::new(effect.calculate(&current));
                }
                Ok(current)
            }
            Task::Invert(source) => {
                let mut field = input(*source)?.as_ref().clone();
                field.map_in_place(|v| 1.0 - v);
                Ok(Arc::new(field))
            }
            Task::Normalize(source) => Ok(Arc::new(input(*source)?.as_normalized())),
        }
    }
}

fn weighted_sum(
    size: Option<Dimensions>,
    inputs: &[(NodeId, f64)],
    clamp: bool,
    input: &(dyn Fn(NodeId) -> Result<Arc<HeightField>> + Sync),
) -> Result<HeightField> {
    let Some((first, _)) = inputs.first() else {
        return Err(Error::Operation(
            "weighted node has no dependencies to combine".into(),
        ));
    };
    let dimensions = match size {
        Some(size) => size,
        None => input(*first)?.dimensions(),
    };

    let mut acc = HeightField::with_dimensions(dimensions);
    let width = dimensions.width;
    for (dependency, weight) in inputs {
        let field = input(*dependency)?;
        for (i, v) in acc.cells_mut().iter_mut().enumerate() {
            if let Some(x) = field.try_get(i / width, i % width) {
                *v += x * weight;
                if clamp {
                    *v = v.clamp(0.0, 1.0);
                }
            }
        }
    }
    acc.recalculate_extrema();
    Ok(acc)
}

fn blend_all(
    mode: &dyn BlendMode,
    dimensions: Option<Dimensions>,
    inputs: &[NodeId],
    input: &(dyn Fn(NodeId) -> Result<Arc<HeightField>> + Sync),
) -> Result<Arc<HeightField>> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err(Error::Operation(
            "blending node has no dependencies to blend".into(),
        ));
    };
    let mut acc = input(*first)?;
    if let Some(d) = dimensions {
        acc = Arc::new(acc.resized(d.height, d.width));
    }
    for dependency in rest {
        let next = input(*dependency)?;
        acc = Arc::new(mode.blend(&acc, &next));
    }
    Ok(acc)
}

fn apply_mask(source: &HeightField, mask: &HeightField) -> HeightField {
    let mut out = source.clone();
    let width = source.width();
    for (i, v) in out.cells_mut().iter_mut().enumerate() {
        let m = mask.try_get(i / width, i % width).unwrap_or(0.0);
        *v = (*v * m).clamp(0.0, 1.0);
    }
    out.recalculate_extrema();
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::blending::{AddBlend, SubtractBlend};
    use crate::effects::{BrightnessEffect, IntensityEffect};

    fn field(rows: Vec<Vec<f64>>) -> Arc<HeightField> {
        Arc::new(HeightField::from_rows(rows).unwrap())
    }

    fn resolver(
        results: HashMap<NodeId, Arc<HeightField>>,
    ) -> impl Fn(NodeId) -> Result<Arc<HeightField>> + Sync {
        move |id| {
            results
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::Operation(format!("{id} missing")))
        }
    }

    fn approx_cells(actual: &HeightField, expected: &[f64]) {
        assert_eq!(actual.cells().len(), expected.len());
        for (a, e) in actual.cells().iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{a} != {e}");
        }
    }

    #[test]
    fn mix_clamps_every_fold_but_add_does_not() {
        let results = HashMap::from([
            (NodeId(0), field(vec![vec![0.8, 0.2]])),
            (NodeId(1), field(vec![vec![0.6, -0.9]])),
        ]);
        let input = resolver(results);
        let inputs = vec![(NodeId(0), 1.0), (NodeId(1), 1.0)];

        let mix = Task::Weighted {
            size: None,
            inputs: inputs.clone(),
            clamp: true,
        }
        .run(&input)
        .unwrap();
        // 0.8 + 0.6 clamps to 1; 0.2 - 0.9 clamps to 0.
        approx_cells(&mix, &[1.0, 0.0]);

        let add = Task::Weighted {
            size: None,
            inputs,
            clamp: false,
        }
        .run(&input)
        .unwrap();
        approx_cells(&add, &[1.4, -0.7]);
    }

    #[test]
    fn mix_clamps_intermediate_results() {
        let results = HashMap::from([
            (NodeId(0), field(vec![vec![0.9]])),
            (NodeId(1), field(vec![vec![0.9]])),
            (NodeId(2), field(vec![vec![-0.5]])),
        ]);
        let inputs = vec![(NodeId(0), 1.0), (NodeId(1), 1.0), (NodeId(2), 1.0)];
        let mix = Task::Weighted {
            size: None,
            inputs,
            clamp: true,
        }
        .run(&resolver(results))
        .unwrap();
        // 0.9 + 0.9 -> 1.0, then 1.0 - 0.5 -> 0.5 (not 1.3).
        approx_cells(&mix, &[0.5]);
    }

    #[test]
    fn weighted_sum_uses_configured_size_and_weights() {
        let results = HashMap::from([(NodeId(0), field(vec![vec![0.5, 0.5]]))]);
        let add = Task::Weighted {
            size: Some(Dimensions::new(2, 3)),
            inputs: vec![(NodeId(0), 0.5)],
            clamp: false,
        }
        .run(&resolver(results))
        .unwrap();
        assert_eq!(add.dimensions(), Dimensions::new(2, 3));
        approx_cells(&add, &[0.25, 0.25, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn weighted_without_dependencies_is_an_operation_error() {
        let task = Task::Weighted {
            size: Some(Dimensions::square(2)),
            inputs: Vec::new(),
            clamp: true,
        };
        let err = task.run(&resolver(HashMap::new())).unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
    }

    #[test]
    fn blending_folds_left_to_right() {
        let results = HashMap::from([
            (NodeId(0), field(vec![vec![1.0]])),
            (NodeId(1), field(vec![vec![0.25]])),
            (NodeId(2), field(vec![vec![0.5]])),
        ]);
        let out = Task::Blend {
            mode: Arc::new(SubtractBlend),
            dimensions: None,
            inputs: vec![NodeId(0), NodeId(1), NodeId(2)],
        }
        .run(&resolver(results))
        .unwrap();
        approx_cells(&out, &[0.25]);
    }

    #[test]
    fn blending_resizes_first_input() {
        let results = HashMap::from([
            (NodeId(0), field(vec![vec![0.5, 0.5]])),
            (NodeId(1), field(vec![vec![0.1, 0.1], vec![0.2, 0.2]])),
        ]);
        let out = Task::Blend {
            mode: Arc::new(AddBlend),
            dimensions: Some(Dimensions::square(2)),
            inputs: vec![NodeId(0), NodeId(1)],
        }
        .run(&resolver(results))
        .unwrap();
        approx_cells(&out, &[0.6, 0.6, 0.2, 0.2]);
    }

    #[test]
    fn blending_without_dependencies_is_an_operation_error() {
        let err = Task::Blend {
            mode: Arc::new(AddBlend),
            dimensions: None,
            inputs: Vec::new(),
        }
        .run(&resolver(HashMap::new()))
        .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
    }

    #[test]
    fn single_blend_input_shares_the_cached_result() {
        let shared = field(vec![vec![0.3]]);
        let results = HashMap::from([(NodeId(0), Arc::clone(&shared))]);
        let out = Task::Blend {
            mode: Arc::new(AddBlend),
            dimensions: None,
            inputs: vec![NodeId(0)],
        }
        .run(&resolver(results))
        .unwrap();
        assert!(Arc::ptr_eq(&out, &shared));
    }

    #[test]
    fn mask_multiplies_and_zeroes_uncovered_cells() {
        let results = HashMap::from([
            (NodeId(0), field(vec![vec![0.8, 0.8], vec![0.8, 0.8]])),
            (NodeId(1), field(vec![vec![0.5, 2.0]])),
        ]);
        let out = Task::Mask {
            source: NodeId(0),
            mask: NodeId(1),
        }
        .run(&resolver(results))
        .unwrap();
        approx_cells(&out, &[0.4, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn effects_apply_in_order() {
        let results = HashMap::from([(NodeId(0), field(vec![vec![0.2]]))]);
        let effects: Vec<Arc<dyn Effect>> = vec![
            Arc::new(BrightnessEffect::new(0.3)),
            Arc::new(IntensityEffect::new(2.0)),
        ];
        let out = Task::Effects {
            source: NodeId(0),
            effects,
        }
        .run(&resolver(results))
        .unwrap();
        approx_cells(&out, &[1.0]);
    }

    #[test]
    fn invert_and_normalize_leave_dependency_untouched() {
        let source = field(vec![vec![0.0, 0.5, 2.0]]);
        let results = HashMap::from([(NodeId(0), Arc::clone(&source))]);
        let input = resolver(results);

        let inverted = Task::Invert(NodeId(0)).run(&input).unwrap();
        approx_cells(&inverted, &[1.0, 0.5, -1.0]);
        let normalized = Task::Normalize(NodeId(0)).run(&input).unwrap();
        approx_cells(&normalized, &[0.0, 0.25, 1.0]);
        approx_cells(&source, &[0.0, 0.5, 2.0]);
    }

    #[test]
    fn missing_dependency_result_is_reported() {
        let err = Task::Invert(NodeId(9))
            .run(&resolver(HashMap::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
    }

    #[test]
    fn snapshot_captures_current_inputs() {
        let node = crate::graph::node::WeightedNode::new(None);
        node.push(NodeId(1), 0.5);
        let kind = NodeKind::Mix(node);
        let task = Task::snapshot(&kind);
        if let NodeKind::Mix(w) = &kind {
            w.push(NodeId(2), 1.0);
        }
        assert_eq!(task.inputs(), vec![NodeId(1)]);
        assert_eq!(kind.dependencies(), vec![NodeId(1), NodeId(2)]);
    }
}
