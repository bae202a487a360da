use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    foundation::{
        core::NodeId,
        error::{ArtificeError, ArtificeResult},
    },
    graph::{
        operator::{Inputs, Operator, OperatorRegistry},
        param::{ParamValue, Params},
        port::{InputSpec, OutputSpec, PortValue},
        scheduler::DagScheduler,
    },
};

/// Directed edge from an output port to an input port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Producing node.
    pub source: NodeId,
    /// Output port on `source`.
    pub source_port: String,
    /// Consuming node.
    pub target: NodeId,
    /// Input port on `target`.
    pub target_port: String,
}

/// Shared cancellation flag, checked between node computations.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Nodes already running finish; nothing else starts.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Debug, Default)]
/// Execution options.
pub struct ExecOptions {
    /// Worker threads for node-internal parallel loops; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Only run these nodes and their ancestors; empty runs the whole graph.
    pub targets: Vec<NodeId>,
    /// Cancellation flag checked between nodes.
    pub cancel: Option<CancelToken>,
}

/// Failure of a single node during [`Graph::execute`].
#[derive(Debug)]
pub struct NodeFailure {
    /// Failing node.
    pub node: NodeId,
    /// Operator kind of the failing node.
    pub kind: &'static str,
    /// What went wrong.
    pub error: ArtificeError,
}

/// Outcome of one execution.
#[derive(Debug, Default)]
pub struct ExecReport {
    /// Nodes in the order the scheduler visited them.
    pub order: Vec<NodeId>,
    /// Nodes whose operator ran.
    pub computed: Vec<NodeId>,
    /// Nodes served from cache.
    pub reused: Vec<NodeId>,
    /// Nodes not run because an upstream node failed or was skipped.
    pub skipped: Vec<NodeId>,
    /// Per-node failures.
    pub failures: Vec<NodeFailure>,
    /// Whether the run stopped early on a [`CancelToken`].
    pub cancelled: bool,
}

impl ExecReport {
    /// `true` when every visited node produced outputs and the run was not cancelled.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty() && !self.cancelled
    }
}

pub(crate) struct Node {
    pub(crate) op: Box<dyn Operator>,
    pub(crate) inputs: Vec<InputSpec>,
    pub(crate) outputs: Vec<OutputSpec>,
    pub(crate) params: Params,
    dirty: bool,
    cache: Vec<Option<PortValue>>,
}

impl Node {
    fn new(op: Box<dyn Operator>) -> Self {
        let inputs = op.inputs();
        let outputs = op.outputs();
        let params = Params::new(op.params());
        let cache = vec![None; outputs.len()];
        Self {
            op,
            inputs,
            outputs,
            params,
            dirty: true,
            cache,
        }
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.cache.iter_mut().for_each(|c| *c = None);
    }

    fn cache_valid(&self) -> bool {
        !self.dirty && self.cache.iter().all(Option::is_some)
    }

    fn output_index(&self, port: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o.name == port)
    }
}

/// Directed acyclic graph of operator nodes with per-output caching.
///
/// Nodes live in an arena indexed by [`NodeId`]; ids are never reused. Every mutation that can
/// change a node's result marks it and all of its descendants dirty, and dirty nodes drop their
/// cached outputs.
pub struct Graph {
    name: String,
    nodes: Vec<Option<Node>>,
    connections: Vec<Connection>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("untitled")
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("nodes", &self.len())
            .field("connections", &self.connections.len())
            .finish()
    }
}

impl Graph {
    /// Empty graph called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the graph.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Insert a node hosting `op`. New nodes start dirty.
    pub fn add_node(&mut self, op: Box<dyn Operator>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        tracing::debug!(node = %id, kind = op.kind(), "add node");
        self.nodes.push(Some(Node::new(op)));
        id
    }

    /// Insert a node of a registered `kind`.
    pub fn add_kind(&mut self, registry: &OperatorRegistry, kind: &str) -> ArtificeResult<NodeId> {
        Ok(self.add_node(registry.create(kind)?))
    }

    /// Insert `op` under an explicit id that has never been used in this graph.
    pub(crate) fn insert_with_id(&mut self, id: NodeId, op: Box<dyn Operator>) -> ArtificeResult<()> {
        let i = id.index();
        if i < self.nodes.len() {
            return Err(ArtificeError::configuration(format!(
                "node id {id} is already used"
            )));
        }
        self.nodes.resize_with(i, || None);
        self.nodes.push(Some(Node::new(op)));
        Ok(())
    }

    /// Remove a node, its cached outputs and incident connections. Former targets become
    /// dirty.
    pub fn remove_node(&mut self, id: NodeId) -> ArtificeResult<()> {
        self.node(id).map_err(|_| unknown_node_cfg(id))?;
        let targets: Vec<NodeId> = self
            .connections
            .iter()
            .filter(|c| c.source == id)
            .map(|c| c.target)
            .collect();
        for t in targets {
            self.mark_dirty(t);
        }
        self.connections.retain(|c| c.source != id && c.target != id);
        self.nodes[id.index()] = None;
        tracing::debug!(node = %id, "remove node");
        Ok(())
    }

    /// Remove every node and connection. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.connections.clear();
        self.nodes.iter_mut().for_each(|n| *n = None);
    }

    /// Connect `src_port` of `src` to `dst_port` of `dst`.
    ///
    /// Fails when a node or port does not exist, the port types differ, the input is already
    /// connected, or the edge would close a cycle.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_port: &str,
        dst: NodeId,
        dst_port: &str,
    ) -> ArtificeResult<()> {
        let s = self.node(src)?;
        let d = self.node(dst)?;
        let Some(out) = s.outputs.iter().find(|o| o.name == src_port) else {
            return Err(ArtificeError::connection(format!(
                "node {src} ({}) has no output '{src_port}'",
                s.op.kind()
            )));
        };
        let Some(inp) = d.inputs.iter().find(|i| i.name == dst_port) else {
            return Err(ArtificeError::connection(format!(
                "node {dst} ({}) has no input '{dst_port}'",
                d.op.kind()
            )));
        };
        if out.ty != inp.ty {
            return Err(ArtificeError::connection(format!(
                "cannot connect {src}.{src_port} ({}) to {dst}.{dst_port} ({})",
                out.ty, inp.ty
            )));
        }
        if self.incoming(dst, dst_port).is_some() {
            return Err(ArtificeError::connection(format!(
                "input {dst}.{dst_port} is already connected"
            )));
        }
        if src == dst || self.reaches(dst, src) {
            return Err(ArtificeError::connection(format!(
                "connecting {src}.{src_port} to {dst}.{dst_port} would create a cycle"
            )));
        }

        self.connections.push(Connection {
            source: src,
            source_port: src_port.to_owned(),
            target: dst,
            target_port: dst_port.to_owned(),
        });
        self.mark_dirty(dst);
        Ok(())
    }

    /// Remove the edge `src.src_port -> dst.dst_port`; the former target becomes dirty.
    pub fn disconnect(
        &mut self,
        src: NodeId,
        src_port: &str,
        dst: NodeId,
        dst_port: &str,
    ) -> ArtificeResult<()> {
        let Some(pos) = self.connections.iter().position(|c| {
            c.source == src && c.source_port == src_port && c.target == dst && c.target_port == dst_port
        }) else {
            return Err(ArtificeError::connection(format!(
                "no connection {src}.{src_port} -> {dst}.{dst_port}"
            )));
        };
        self.connections.remove(pos);
        self.mark_dirty(dst);
        Ok(())
    }

    /// Set parameter `name` on node `id`. Invalid values leave the node untouched; valid ones
    /// mark it and its descendants dirty.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: serde_json::Value) -> ArtificeResult<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| unknown_node_cfg(id))?;
        node.params.set(name, &value)?;
        self.mark_dirty(id);
        Ok(())
    }

    /// Current value of parameter `name` on node `id`.
    pub fn param(&self, id: NodeId, name: &str) -> Option<&ParamValue> {
        self.node(id).ok()?.params.get(name)
    }

    /// Parameter set of node `id`.
    pub fn params(&self, id: NodeId) -> Option<&Params> {
        self.node(id).ok().map(|n| &n.params)
    }

    /// Operator kind of node `id`.
    pub fn kind(&self, id: NodeId) -> Option<&'static str> {
        self.node(id).ok().map(|n| n.op.kind())
    }

    /// Cached value of output `port` on node `id`, if computed and still valid.
    pub fn output(&self, id: NodeId, port: &str) -> Option<&PortValue> {
        let node = self.node(id).ok()?;
        node.cache[node.output_index(port)?].as_ref()
    }

    /// Whether node `id` needs recomputation; `None` for unknown ids.
    pub fn is_dirty(&self, id: NodeId) -> Option<bool> {
        self.node(id).ok().map(|n| n.dirty)
    }

    /// Whether node `id` exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// `true` when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live node ids in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Deterministic topological order of every live node.
    pub fn execution_order(&self) -> Vec<NodeId> {
        let active: Vec<bool> = self.nodes.iter().map(Option::is_some).collect();
        let mut sched = DagScheduler::new(&active, self.edges());
        let mut out = Vec::with_capacity(sched.remaining());
        while let Some(id) = sched.pop_ready() {
            out.push(id);
            sched.mark_done(id);
        }
        out
    }

    /// Run every dirty node in dependency order.
    pub fn execute(&mut self) -> ArtificeResult<ExecReport> {
        self.execute_with(&ExecOptions::default())
    }

    /// Run the graph with explicit options.
    ///
    /// Returns `Err` only for invalid options; node failures are collected in the report.
    #[tracing::instrument(skip(self, opts), fields(graph = %self.name, targets = opts.targets.len()))]
    pub fn execute_with(&mut self, opts: &ExecOptions) -> ArtificeResult<ExecReport> {
        let active = self.active_set(&opts.targets)?;
        let report = match opts.threads {
            None => self.run(&active, opts.cancel.as_ref()),
            Some(_) => {
                let pool = build_thread_pool(opts.threads)?;
                pool.install(|| self.run(&active, opts.cancel.as_ref()))
            }
        };
        tracing::debug!(
            computed = report.computed.len(),
            reused = report.reused.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "graph executed"
        );
        Ok(report)
    }

    fn run(&mut self, active: &[bool], cancel: Option<&CancelToken>) -> ExecReport {
        let mut sched = DagScheduler::new(active, self.edges());
        let mut blocked = vec![false; self.nodes.len()];
        let mut report = ExecReport::default();

        while let Some(id) = sched.pop_ready() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                report.cancelled = true;
                break;
            }
            report.order.push(id);

            let ok = if blocked[id.index()] {
                tracing::debug!(node = %id, "skip: upstream did not complete");
                report.skipped.push(id);
                false
            } else {
                match self.visit(id) {
                    Ok(true) => {
                        report.computed.push(id);
                        true
                    }
                    Ok(false) => {
                        report.reused.push(id);
                        true
                    }
                    Err(error) => {
                        let kind = self.kind(id).unwrap_or("?");
                        tracing::warn!(node = %id, kind, %error, "node failed");
                        report.failures.push(NodeFailure {
                            node: id,
                            kind,
                            error,
                        });
                        false
                    }
                }
            };
            if !ok {
                for &dep in sched.dependents(id) {
                    blocked[dep.index()] = true;
                }
            }
            sched.mark_done(id);
        }
        report
    }

    /// Compute node `id` unless its cache is valid. Returns whether the operator ran.
    fn visit(&mut self, id: NodeId) -> ArtificeResult<bool> {
        let node = self.node(id)?;
        if node.cache_valid() {
            tracing::debug!(node = %id, kind = node.op.kind(), "reuse cached outputs");
            return Ok(false);
        }

        let mut inputs = Inputs::new();
        for spec in &node.inputs {
            let value = match self.incoming(id, spec.name) {
                Some(c) => {
                    let upstream = self.output(c.source, &c.source_port).ok_or_else(|| {
                        ArtificeError::computation(format!(
                            "upstream output {}.{} has no value",
                            c.source, c.source_port
                        ))
                    })?;
                    Some(upstream.clone())
                }
                None if spec.default.is_some() => spec.default.clone(),
                None if spec.required => return Err(ArtificeError::missing_input(id, spec.name)),
                None => None,
            };
            inputs.insert(spec.name, value);
        }

        let _span = tracing::debug_span!("compute", node = %id, kind = node.op.kind()).entered();
        let produced = node.op.compute(&inputs, &node.params)?;
        let cache = validate_outputs(node, produced)?;

        if let Some(Some(node)) = self.nodes.get_mut(id.index()) {
            node.cache = cache;
            node.dirty = false;
        }
        Ok(true)
    }

    fn active_set(&self, targets: &[NodeId]) -> ArtificeResult<Vec<bool>> {
        if targets.is_empty() {
            return Ok(self.nodes.iter().map(Option::is_some).collect());
        }
        let mut active = vec![false; self.nodes.len()];
        let mut stack = Vec::with_capacity(targets.len());
        for &t in targets {
            self.node(t).map_err(|_| unknown_node_cfg(t))?;
            stack.push(t);
        }
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut active[id.index()], true) {
                continue;
            }
            stack.extend(
                self.connections
                    .iter()
                    .filter(|c| c.target == id)
                    .map(|c| c.source),
            );
        }
        Ok(active)
    }

    pub(crate) fn node(&self, id: NodeId) -> ArtificeResult<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| ArtificeError::connection(format!("unknown node {id}")))
    }

    fn incoming(&self, id: NodeId, port: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.target == id && c.target_port == port)
    }

    fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.connections.iter().map(|c| (c.source, c.target))
    }

    /// Whether `to` is reachable from `from` along existing edges.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            stack.extend(
                self.connections
                    .iter()
                    .filter(|c| c.source == id)
                    .map(|c| c.target),
            );
        }
        false
    }

    /// Mark `id` and every descendant dirty, dropping their caches.
    fn mark_dirty(&mut self, id: NodeId) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if std::mem::replace(&mut seen[cur.index()], true) {
                continue;
            }
            if let Some(Some(node)) = self.nodes.get_mut(cur.index()) {
                node.invalidate();
            }
            stack.extend(
                self.connections
                    .iter()
                    .filter(|c| c.source == cur)
                    .map(|c| c.target),
            );
        }
    }
}

fn unknown_node_cfg(id: NodeId) -> ArtificeError {
    ArtificeError::configuration(format!("unknown node {id}"))
}

fn validate_outputs(
    node: &Node,
    produced: crate::graph::operator::Outputs,
) -> ArtificeResult<Vec<Option<PortValue>>> {
    let kind = node.op.kind();
    let mut cache = vec![None; node.outputs.len()];
    for (name, value) in produced.into_values() {
        let Some(i) = node.output_index(&name) else {
            return Err(ArtificeError::computation(format!(
                "{kind} produced undeclared output '{name}'"
            )));
        };
        let want = node.outputs[i].ty;
        if value.port_type() != want {
            return Err(ArtificeError::computation(format!(
                "{kind} output '{name}' should be {want}, got {}",
                value.port_type()
            )));
        }
        cache[i] = Some(value);
    }
    if let Some(i) = cache.iter().position(Option::is_none) {
        return Err(ArtificeError::computation(format!(
            "{kind} did not produce output '{}'",
            node.outputs[i].name
        )));
    }
    Ok(cache)
}

fn build_thread_pool(threads: Option<usize>) -> ArtificeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ArtificeError::configuration(
            "execution 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ArtificeError::computation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/graph/graph.rs"]
mod tests;
