//! Persistence of node graphs as typed-envelope JSON documents.
//!
//! Every polymorphic value is written as two sibling fields: the payload under
//! `<Name>` and its type tag under `<Name>Type`. Node payloads carry a `$id`;
//! a node reached a second time is written as `{"$ref": id}` so shared
//! subgraphs decode to shared nodes.
//!
//! ```no_run
//! use terrain_graph::prelude::*;
//!
//! # fn main() -> terrain_graph::error::Result<()> {
//! let mut graph = NodeGraph::new();
//! let flat = graph.add_generator(FlatGenerator::new(Dimensions::square(8), 0.5));
//! let root = graph.add_invert(flat)?;
//! let root = GraphRoot::new(graph, root)?;
//!
//! let serializer = GraphSerializer::new();
//! serializer.serialize("graph.json", &root, DocumentFormat::Pretty)?;
//! let restored = serializer.deserialize("graph.json")?;
//! restored.execute()?;
//! # Ok(())
//! # }
//! ```
mod envelope;
pub mod graph_root;
pub mod registry;
pub mod serializer;

pub use graph_root::GraphRoot;
pub use registry::TypeRegistry;
pub use serializer::{DocumentFormat, GraphSerializer};
