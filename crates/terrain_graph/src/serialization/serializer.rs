//! Reading and writing graph documents.
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::graph::ExecutionConfig;
use crate::serialization::graph_root::GraphRoot;
use crate::serialization::registry::TypeRegistry;

/// Parses a whole document. Nested graphs can run deeper than serde_json's
/// default nesting limit, so the limit is lifted and the stack grows instead.
fn read_document<'de, R>(mut de: serde_json::Deserializer<R>) -> Result<Value>
where
    R: serde_json::de::Read<'de>,
{
    de.disable_recursion_limit();
    let document = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(document)
}

/// Output layout of a graph document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Single line, no insignificant whitespace.
    Compact,
    /// Indented, one field per line.
    #[default]
    Pretty,
}

/// Encodes [`GraphRoot`]s to JSON and decodes them back.
///
/// Decoding resolves generator, effect and blend-mode tags through the
/// serializer's [`TypeRegistry`]; decoded graphs use its [`ExecutionConfig`].
#[derive(Debug, Clone)]
pub struct GraphSerializer {
    registry: TypeRegistry,
    config: ExecutionConfig,
}

impl Default for GraphSerializer {
    fn default() -> Self {
        Self {
            registry: TypeRegistry::with_defaults(),
            config: ExecutionConfig::default(),
        }
    }
}

impl GraphSerializer {
    /// Creates a serializer that knows every built-in type.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the configuration of decoded graphs.
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn to_string(&self, root: &GraphRoot, format: DocumentFormat) -> Result<String> {
        let document = root.to_document()?;
        Ok(match format {
            DocumentFormat::Compact => serde_json::to_string(&document)?,
            DocumentFormat::Pretty => serde_json::to_string_pretty(&document)?,
        })
    }

    pub fn to_writer<W: Write>(
        &self,
        writer: W,
        root: &GraphRoot,
        format: DocumentFormat,
    ) -> Result<()> {
        let document = root.to_document()?;
        match format {
            DocumentFormat::Compact => serde_json::to_writer(writer, &document)?,
            DocumentFormat::Pretty => serde_json::to_writer_pretty(writer, &document)?,
        }
        Ok(())
    }

    /// Writes `root` to `path`, replacing any existing file.
    pub fn serialize(
        &self,
        path: impl AsRef<Path>,
        root: &GraphRoot,
        format: DocumentFormat,
    ) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer, root, format)?;
        writer.flush()?;
        debug!(path = %path.display(), ?format, "wrote graph document");
        Ok(())
    }

    pub fn from_value(&self, document: &Value) -> Result<GraphRoot> {
        GraphRoot::from_document_with_config(document, &self.registry, self.config.clone())
    }

    pub fn from_str(&self, text: &str) -> Result<GraphRoot> {
        let document = read_document(serde_json::Deserializer::from_str(text))?;
        self.from_value(&document)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<GraphRoot> {
        let document = read_document(serde_json::Deserializer::from_reader(reader))?;
        self.from_value(&document)
    }

    /// Reads a graph document from `path`.
    pub fn deserialize(&self, path: impl AsRef<Path>) -> Result<GraphRoot> {
        let path = path.as_ref();
        let root = self.from_reader(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), nodes = root.graph().len(), "read graph document");
        Ok(root)
    }
}
