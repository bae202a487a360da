use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::{
    foundation::{
        core::NodeId,
        error::{ArtificeError, ArtificeResult},
        math::{Fingerprint, StableHasher},
    },
    graph::{graph::Graph, operator::OperatorRegistry},
};

/// Free ids tolerated between imported nodes, left behind by removals.
const MAX_ID_GAP: usize = 65_536;

/// Serializable description of a graph: nodes, parameters and connections, never pixel data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphDesc {
    /// Graph name.
    pub name: String,
    /// Nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeDesc>,
    /// Connections in insertion order.
    #[serde(default)]
    pub connections: Vec<ConnectionDesc>,
}

/// One node of a [`GraphDesc`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDesc {
    /// Node id, preserved on import.
    pub id: NodeId,
    /// Registered operator kind.
    pub kind: String,
    /// Parameter values by name; omitted parameters keep their defaults.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

/// One connection of a [`GraphDesc`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConnectionDesc {
    /// Producing node.
    pub source_node: NodeId,
    /// Output port on the producing node.
    pub source_port: String,
    /// Consuming node.
    pub dest_node: NodeId,
    /// Input port on the consuming node.
    pub dest_port: String,
}

impl GraphDesc {
    /// Parse a description from JSON text.
    pub fn from_json(s: &str) -> ArtificeResult<Self> {
        serde_json::from_str(s).map_err(|e| ArtificeError::serde(format!("invalid graph JSON: {e}")))
    }

    /// Pretty-printed JSON text.
    pub fn to_json(&self) -> ArtificeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ArtificeError::serde(format!("failed to serialize graph: {e}")))
    }

    /// Read and parse a description file.
    pub fn load(path: impl AsRef<Path>) -> ArtificeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read graph file '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Write the description as JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> ArtificeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir '{}'", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("write graph file '{}'", path.display()))?;
        Ok(())
    }

    /// Stable fingerprint of the description's structure and parameters.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_str(&self.name);
        h.write_u64(self.nodes.len() as u64);
        for n in &self.nodes {
            h.write_u32(n.id.0);
            h.write_str(&n.kind);
            for (k, v) in &n.params {
                h.write_str(k);
                h.write_str(&v.to_string());
            }
        }
        h.write_u64(self.connections.len() as u64);
        for c in &self.connections {
            h.write_u32(c.source_node.0);
            h.write_str(&c.source_port);
            h.write_u32(c.dest_node.0);
            h.write_str(&c.dest_port);
        }
        h.finish()
    }
}

impl Graph {
    /// Snapshot of the graph's structure and parameter values.
    pub fn to_desc(&self) -> GraphDesc {
        let nodes = self
            .node_ids()
            .into_iter()
            .filter_map(|id| {
                let node = self.node(id).ok()?;
                Some(NodeDesc {
                    id,
                    kind: node.op.kind().to_owned(),
                    params: node
                        .params
                        .iter()
                        .map(|(k, v)| (k.to_owned(), v.to_json()))
                        .collect(),
                })
            })
            .collect();
        let connections = self
            .connections()
            .iter()
            .map(|c| ConnectionDesc {
                source_node: c.source,
                source_port: c.source_port.clone(),
                dest_node: c.target,
                dest_port: c.target_port.clone(),
            })
            .collect();
        GraphDesc {
            name: self.name().to_owned(),
            nodes,
            connections,
        }
    }

    /// Build a graph from a description, instantiating kinds through `registry`.
    ///
    /// Unknown kinds, duplicate ids, ids far beyond the node count and bad parameter values
    /// are configuration errors; invalid connections are connection errors.
    pub fn from_desc(desc: &GraphDesc, registry: &OperatorRegistry) -> ArtificeResult<Self> {
        let mut graph = Graph::new(desc.name.clone());
        let mut nodes: Vec<&NodeDesc> = desc.nodes.iter().collect();
        nodes.sort_by_key(|n| n.id);
        let max_id = desc.nodes.len().saturating_add(MAX_ID_GAP);
        for n in nodes {
            if n.id.index() > max_id {
                return Err(ArtificeError::configuration(format!(
                    "node id {} is out of range for a graph of {} node(s) (max {max_id})",
                    n.id,
                    desc.nodes.len()
                )));
            }
            graph.insert_with_id(n.id, registry.create(&n.kind)?)?;
            for (name, value) in &n.params {
                graph.set_param(n.id, name, value.clone())?;
            }
        }
        for c in &desc.connections {
            graph.connect(c.source_node, &c.source_port, c.dest_node, &c.dest_port)?;
        }
        Ok(graph)
    }

    /// Save the graph description as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ArtificeResult<()> {
        self.to_desc().save(path)
    }

    /// Load a graph description from a JSON file.
    pub fn load(path: impl AsRef<Path>, registry: &OperatorRegistry) -> ArtificeResult<Self> {
        Self::from_desc(&GraphDesc::load(path)?, registry)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/desc.rs"]
mod tests;
