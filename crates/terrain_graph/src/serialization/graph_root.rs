//! A single top-level node together with the graph that owns it.
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{ExecutionConfig, NodeGraph, NodeId, NodeKind};
use crate::map::{Dimensions, HeightField};
use crate::serialization::envelope::{self, ID_KEY, REF_KEY};
use crate::serialization::registry::TypeRegistry;

/// Stack left free before descending into a nested node.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Extra stack allocated whenever the red zone is reached.
const STACK_SEGMENT: usize = 1024 * 1024;

/// Root of a persisted graph document: `{"NodeType": <tag>, "Node": <payload>}`.
#[derive(Debug)]
pub struct GraphRoot {
    graph: NodeGraph,
    node: NodeId,
    node_type: &'static str,
}

impl GraphRoot {
    /// Wrap `node` of `graph`. Fails if the node does not exist.
    pub fn new(graph: NodeGraph, node: NodeId) -> Result<Self> {
        let node_type = graph.kind(node)?.type_tag();
        Ok(Self {
            graph,
            node,
            node_type,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Type tag of the root node.
    pub fn node_type(&self) -> &'static str {
        self.node_type
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn into_parts(self) -> (NodeGraph, NodeId) {
        (self.graph, self.node)
    }

    /// Evaluate the root node.
    pub fn execute(&self) -> Result<()> {
        self.graph.execute(self.node)
    }

    /// Result of the root node once executed.
    pub fn result(&self) -> Option<Arc<HeightField>> {
        self.graph.result(self.node)
    }

    /// Encode the root and every node reachable from it.
    pub fn to_document(&self) -> Result<Value> {
        let mut encoder = Encoder {
            graph: &self.graph,
            ids: HashMap::new(),
        };
        let (tag, payload) = encoder.node(self.node)?;
        debug!(nodes = encoder.ids.len(), root = tag, "encoded graph document");
        Ok(Value::Object(envelope::wrap("Node", tag, payload)))
    }

    /// Decode a document into a fresh graph with the default configuration.
    pub fn from_document(document: &Value, registry: &TypeRegistry) -> Result<Self> {
        Self::from_document_with_config(document, registry, ExecutionConfig::default())
    }

    pub fn from_document_with_config(
        document: &Value,
        registry: &TypeRegistry,
        config: ExecutionConfig,
    ) -> Result<Self> {
        let root = envelope::as_object(document, "graph document")?;
        let (tag, payload) = envelope::take(root, "Node")?;
        let mut decoder = Decoder {
            graph: NodeGraph::with_config(config)?,
            registry,
            refs: HashMap::new(),
        };
        let node = decoder.node(tag, payload)?;
        debug!(nodes = decoder.graph.len(), root = tag, "decoded graph document");
        Self::new(decoder.graph, node)
    }
}

struct Encoder<'a> {
    graph: &'a NodeGraph,
    ids: HashMap<NodeId, u64>,
}

impl Encoder<'_> {
    /// Returns the node tag and its payload, or a `$ref` if already written.
    fn node(&mut self, id: NodeId) -> Result<(&'static str, Value)> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.encode(id))
    }

    fn encode(&mut self, id: NodeId) -> Result<(&'static str, Value)> {
        let graph = self.graph;
        let kind = graph.kind(id)?;
        let tag = kind.type_tag();
        if let Some(existing) = self.ids.get(&id) {
            return Ok((tag, json!({ REF_KEY: existing })));
        }
        let ref_id = self.ids.len() as u64 + 1;
        self.ids.insert(id, ref_id);

        let mut out = Map::new();
        out.insert(ID_KEY.to_owned(), Value::from(ref_id));
        match kind {
            NodeKind::Generator(g) => {
                let generator = &g.generator;
                envelope::put(&mut out, "Generator", generator.type_tag(), generator.to_payload()?);
            }
            NodeKind::Mix(w) | NodeKind::Add(w) => {
                out.insert("Size".into(), serde_json::to_value(w.size)?);
                let mut deps = Vec::new();
                for (dep, weight) in w.inputs() {
                    let (dep_tag, payload) = self.node(dep)?;
                    let mut entry = envelope::wrap("Node", dep_tag, payload);
                    entry.insert("Weight".into(), Value::from(weight));
                    deps.push(Value::Object(entry));
                }
                out.insert("Dependencies".into(), Value::Array(deps));
            }
            NodeKind::Blending(b) => {
                out.insert("Dimensions".into(), serde_json::to_value(b.dimensions)?);
                let mut deps = Vec::new();
                for dep in b.dependencies() {
                    let (dep_tag, payload) = self.node(dep)?;
                    deps.push(Value::Object(envelope::wrap("Node", dep_tag, payload)));
                }
                out.insert("Dependencies".into(), Value::Array(deps));
                let mode = &b.blend_mode;
                envelope::put(&mut out, "BlendMode", mode.type_tag(), mode.to_payload()?);
            }
            NodeKind::Mask(m) => {
                let (source_tag, source) = self.node(m.source)?;
                envelope::put(&mut out, "Source", source_tag, source);
                let (mask_tag, mask) = self.node(m.mask)?;
                envelope::put(&mut out, "Mask", mask_tag, mask);
            }
            NodeKind::ImageEffect(e) => {
                let (source_tag, source) = self.node(e.source)?;
                envelope::put(&mut out, "Source", source_tag, source);
                let effects = e
                    .effects()
                    .iter()
                    .map(|effect| {
                        let payload = effect.to_payload()?;
                        Ok(Value::Object(envelope::wrap("Effect", effect.type_tag(), payload)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                out.insert("Effects".into(), Value::Array(effects));
            }
            NodeKind::Invert(u) | NodeKind::Normalize(u) => {
                let (source_tag, source) = self.node(u.source)?;
                envelope::put(&mut out, "Source", source_tag, source);
            }
        }
        Ok((tag, Value::Object(out)))
    }
}

struct Decoder<'a> {
    graph: NodeGraph,
    registry: &'a TypeRegistry,
    refs: HashMap<u64, NodeId>,
}

impl Decoder<'_> {
    fn node(&mut self, tag: &str, payload: &Value) -> Result<NodeId> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.decode(tag, payload))
    }

    fn decode(&mut self, tag: &str, payload: &Value) -> Result<NodeId> {
        let object = envelope::as_object(payload, "node payload")?;
        if let Some(reference) = object.get(REF_KEY) {
            return self.reference(tag, reference);
        }
        let ref_id = match object.get(ID_KEY) {
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                Error::Serialization(format!("'{ID_KEY}' must be an unsigned integer"))
            })?),
            None => None,
        };

        match tag {
            NodeKind::GENERATOR => {
                let (generator_tag, generator) = envelope::take(object, "Generator")?;
                let generator = self
                    .registry
                    .decode_generator(generator_tag, generator.clone())?;
                let id = self.graph.add_generator_arc(generator);
                self.remember(ref_id, id)?;
                Ok(id)
            }
            NodeKind::MIX | NodeKind::ADD => {
                let size: Option<Dimensions> = envelope::decode_field(object, "Size")?;
                let id = if tag == NodeKind::MIX {
                    self.graph.add_mix(size)
                } else {
                    self.graph.add_add(size)
                };
                // Registered before the dependencies so back references resolve.
                self.remember(ref_id, id)?;
                let deps = envelope::field(object, "Dependencies")?;
                let deps = envelope::as_array(deps, "Dependencies")?;
                for entry in deps {
                    let entry = envelope::as_object(entry, "dependency")?;
                    let (dep_tag, dep) = envelope::take(entry, "Node")?;
                    let weight: f64 = envelope::decode_field(entry, "Weight")?;
                    let dep = self.node(dep_tag, dep)?;
                    self.graph.add_weighted_dependency(id, dep, weight)?;
                }
                Ok(id)
            }
            NodeKind::BLENDING => {
                let dimensions: Option<Dimensions> = envelope::decode_field(object, "Dimensions")?;
                let (mode_tag, mode) = envelope::take(object, "BlendMode")?;
                let mode = self.registry.decode_blend_mode(mode_tag, mode.clone())?;
                let id = self.graph.add_blending_arc(mode, dimensions);
                self.remember(ref_id, id)?;
                let deps = envelope::field(object, "Dependencies")?;
                let deps = envelope::as_array(deps, "Dependencies")?;
                for entry in deps {
                    let entry = envelope::as_object(entry, "dependency")?;
                    let (dep_tag, dep) = envelope::take(entry, "Node")?;
                    let dep = self.node(dep_tag, dep)?;
                    self.graph.add_dependency(id, dep)?;
                }
                Ok(id)
            }
            NodeKind::MASK => {
                let source = self.envelope_node(object, "Source")?;
                let mask = self.envelope_node(object, "Mask")?;
                let id = self.graph.add_mask(source, mask)?;
                self.remember(ref_id, id)?;
                Ok(id)
            }
            NodeKind::IMAGE_EFFECT => {
                let source = self.envelope_node(object, "Source")?;
                let entries = envelope::as_array(envelope::field(object, "Effects")?, "Effects")?;
                let mut effects = Vec::with_capacity(entries.len());
                for entry in entries {
                    let entry = envelope::as_object(entry, "effect")?;
                    let (effect_tag, effect) = envelope::take(entry, "Effect")?;
                    effects.push(self.registry.decode_effect(effect_tag, effect.clone())?);
                }
                let id = self.graph.add_image_effect(source, effects)?;
                self.remember(ref_id, id)?;
                Ok(id)
            }
            NodeKind::INVERT | NodeKind::NORMALIZE => {
                let source = self.envelope_node(object, "Source")?;
                let id = if tag == NodeKind::INVERT {
                    self.graph.add_invert(source)?
                } else {
                    self.graph.add_normalize(source)?
                };
                self.remember(ref_id, id)?;
                Ok(id)
            }
            other => Err(Error::UnknownType {
                kind: "node",
                tag: other.to_owned(),
            }),
        }
    }

    fn envelope_node(&mut self, object: &Map<String, Value>, name: &str) -> Result<NodeId> {
        let (tag, payload) = envelope::take(object, name)?;
        self.node(tag, payload)
    }

    fn reference(&self, tag: &str, reference: &Value) -> Result<NodeId> {
        let reference = reference.as_u64().ok_or_else(|| {
            Error::Serialization(format!("'{REF_KEY}' must be an unsigned integer"))
        })?;
        let id = *self.refs.get(&reference).ok_or_else(|| {
            Error::Serialization(format!("reference to unknown node {reference}"))
        })?;
        let actual = self.graph.kind(id)?.type_tag();
        if actual != tag {
            return Err(Error::Serialization(format!(
                "reference {reference} points to a {actual}, not a {tag}"
            )));
        }
        Ok(id)
    }

    fn remember(&mut self, ref_id: Option<u64>, id: NodeId) -> Result<()> {
        let Some(ref_id) = ref_id else {
            return Ok(());
        };
        if self.refs.insert(ref_id, id).is_some() {
            return Err(Error::Serialization(format!(
                "duplicate node id {ref_id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blending::{LightenBlend, MultiplyBlend};
    use crate::effects::{GammaEffect, GaussianBlurEffect, InvertEffect};
    use crate::generators::{
        DiamondSquareGenerator, FlatGenerator, SimplexGenerator, VoronoiGenerator,
    };

    fn sample_root() -> GraphRoot {
        let mut graph = NodeGraph::new();
        let dims = Dimensions::square(17);
        let terrain = graph.add_generator(DiamondSquareGenerator::new(dims, Some(7)));
        let cells = graph.add_generator(VoronoiGenerator::new(dims, Some(3)).with_point_count(5));
        let noise = graph.add_generator(SimplexGenerator::new(dims, Some(11)));

        let mix = graph.add_mix(None);
        graph.add_weighted_dependency(mix, terrain, 0.6).unwrap();
        graph.add_weighted_dependency(mix, cells, 0.4).unwrap();

        let blend = graph.add_blending(LightenBlend, Some(dims));
        graph.add_dependency(blend, mix).unwrap();
        graph.add_dependency(blend, noise).unwrap();

        let effects: Vec<Arc<dyn crate::effects::Effect>> = vec![
            Arc::new(GaussianBlurEffect::new(1.0, None).unwrap()),
            Arc::new(GammaEffect::new(2.2).unwrap()),
        ];
        let smoothed = graph.add_image_effect(blend, effects).unwrap();
        let masked = graph.add_mask(smoothed, terrain).unwrap();
        let root = graph.add_normalize(masked).unwrap();
        GraphRoot::new(graph, root).unwrap()
    }

    #[test]
    fn document_has_typed_root_envelope() {
        let root = sample_root();
        let doc = root.to_document().unwrap();
        assert_eq!(doc["NodeType"], "NormalizeNode");
        assert_eq!(doc["Node"]["SourceType"], "MaskNode");
        assert_eq!(doc["Node"]["$id"], 1);
        let effects = &doc["Node"]["Source"]["Source"]["Effects"];
        assert_eq!(effects[0]["EffectType"], "GaussianBlurEffect");
        assert_eq!(effects[1]["Effect"]["Gamma"], 2.2);
    }

    #[test]
    fn round_trip_reproduces_the_result() {
        let original = sample_root();
        original.execute().unwrap();
        let expected = original.result().unwrap();

        let doc = original.to_document().unwrap();
        let decoded = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap();
        assert_eq!(decoded.node_type(), original.node_type());
        assert_eq!(decoded.graph().len(), original.graph().len());
        assert!(decoded.result().is_none());

        decoded.execute().unwrap();
        assert_eq!(*decoded.result().unwrap(), *expected);
    }

    #[test]
    fn shared_nodes_are_written_once_and_decoded_once() {
        let mut graph = NodeGraph::new();
        let shared = graph.add_generator(FlatGenerator::new(Dimensions::square(2), 0.5));
        let left = graph.add_invert(shared).unwrap();
        let blend = graph.add_blending(MultiplyBlend, None);
        graph.add_dependency(blend, left).unwrap();
        graph.add_dependency(blend, shared).unwrap();
        let root = GraphRoot::new(graph, blend).unwrap();

        let doc = root.to_document().unwrap();
        let deps = &doc["Node"]["Dependencies"];
        assert_eq!(deps[1]["NodeType"], "GeneratorNode");
        assert_eq!(deps[1]["Node"]["$ref"], deps[0]["Node"]["Source"]["$id"]);

        let decoded = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap();
        assert_eq!(decoded.graph().len(), 3);
        let deps = decoded.graph().dependencies(decoded.node()).unwrap();
        let invert_deps = decoded.graph().dependencies(deps[0]).unwrap();
        assert_eq!(invert_deps[0], deps[1]);
    }

    #[test]
    fn cycles_through_weighted_nodes_survive_encoding() {
        let mut graph = NodeGraph::new();
        let a = graph.add_mix(None);
        let b = graph.add_add(None);
        graph.add_weighted_dependency(a, b, 1.0).unwrap();
        graph.add_weighted_dependency(b, a, 0.5).unwrap();
        let doc = GraphRoot::new(graph, a).unwrap().to_document().unwrap();

        let decoded = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap();
        assert_eq!(decoded.graph().len(), 2);
        assert!(matches!(decoded.execute(), Err(Error::Operation(_))));
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let doc = json!({ "NodeType": "TeleportNode", "Node": {} });
        let err = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap_err();
        assert!(matches!(err, Error::UnknownType { kind: "node", .. }));
    }

    #[test]
    fn unknown_generator_type_is_rejected() {
        let doc = json!({
            "NodeType": "GeneratorNode",
            "Node": { "$id": 1, "Generator": {}, "GeneratorType": "PerlinGenerator" }
        });
        let err = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap_err();
        match err {
            Error::UnknownType { kind, tag } => {
                assert_eq!(kind, "generator");
                assert_eq!(tag, "PerlinGenerator");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dangling_or_mistyped_references_are_rejected() {
        let registry = TypeRegistry::with_defaults();
        let dangling = json!({
            "NodeType": "InvertNode",
            "Node": { "$id": 1, "Source": { "$ref": 9 }, "SourceType": "GeneratorNode" }
        });
        assert!(matches!(
            GraphRoot::from_document(&dangling, &registry),
            Err(Error::Serialization(_))
        ));

        let mistyped = json!({
            "NodeType": "MaskNode",
            "Node": {
                "$id": 1,
                "Source": {
                    "$id": 2,
                    "Generator": { "Dimensions": { "Height": 1, "Width": 1 }, "Height": 0.5 },
                    "GeneratorType": "FlatGenerator"
                },
                "SourceType": "GeneratorNode",
                "Mask": { "$ref": 2 },
                "MaskType": "InvertNode"
            }
        });
        assert!(matches!(
            GraphRoot::from_document(&mistyped, &registry),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn effect_chain_and_unit_types_round_trip() {
        let mut graph = NodeGraph::new();
        let source = graph.add_generator(FlatGenerator::new(Dimensions::new(2, 3), 0.2));
        let fx = graph
            .add_image_effect(source, vec![Arc::new(InvertEffect)])
            .unwrap();
        let doc = GraphRoot::new(graph, fx).unwrap().to_document().unwrap();
        assert_eq!(doc["Node"]["Effects"][0]["Effect"], json!({}));

        let decoded = GraphRoot::from_document(&doc, &TypeRegistry::with_defaults()).unwrap();
        decoded.execute().unwrap();
        let out = decoded.result().unwrap();
        assert!(out.cells().iter().all(|v| (*v - 0.8).abs() < 1e-12));
    }

    #[test]
    fn missing_root_fields_are_serialization_errors() {
        let registry = TypeRegistry::with_defaults();
        assert!(matches!(
            GraphRoot::from_document(&json!({ "Node": {} }), &registry),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            GraphRoot::from_document(&json!([]), &registry),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn root_must_exist() {
        let graph = NodeGraph::new();
        assert!(matches!(
            GraphRoot::new(graph, NodeId(0)),
            Err(Error::Precondition(_))
        ));
    }
}
