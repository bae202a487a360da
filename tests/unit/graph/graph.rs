use std::sync::atomic::AtomicUsize;

use super::*;
use crate::{
    foundation::core::PortType,
    graph::{operator::Outputs, param::ParamSpec},
};
use serde_json::json;

#[derive(Default)]
struct Counter(Arc<AtomicUsize>);

impl Counter {
    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Emits its `value` param.
struct Source(Arc<AtomicUsize>);

impl Operator for Source {
    fn kind(&self) -> &'static str {
        "Source"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Scalar)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("value", 1.0, -100.0, 100.0)]
    }

    fn compute(&self, _: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Outputs::single("out", PortValue::Scalar(params.float("value")?)))
    }
}

/// `out = in + offset`, optionally plus an optional `extra` input.
struct Add(Arc<AtomicUsize>);

impl Operator for Add {
    fn kind(&self) -> &'static str {
        "Add"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![
            InputSpec::required("in", PortType::Scalar),
            InputSpec::optional("extra", PortType::Scalar),
        ]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Scalar)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("offset", 1.0, -100.0, 100.0)]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        self.0.fetch_add(1, Ordering::SeqCst);
        let a = inputs.get("in").and_then(PortValue::as_scalar).unwrap_or(0.0);
        let b = inputs.get("extra").and_then(PortValue::as_scalar).unwrap_or(0.0);
        Ok(Outputs::single("out", PortValue::Scalar(a + b + params.float("offset")?)))
    }
}

/// Input with a default value.
struct Defaulted;

impl Operator for Defaulted {
    fn kind(&self) -> &'static str {
        "Defaulted"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("in", PortType::Scalar).with_default(PortValue::Scalar(40.0))]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Scalar)]
    }

    fn compute(&self, inputs: &Inputs, _: &Params) -> ArtificeResult<Outputs> {
        let v = inputs.get("in").and_then(PortValue::as_scalar).unwrap_or(0.0);
        Ok(Outputs::single("out", PortValue::Scalar(v + 2.0)))
    }
}

/// Always fails.
struct Broken;

impl Operator for Broken {
    fn kind(&self) -> &'static str {
        "Broken"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::optional("in", PortType::Scalar)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Scalar)]
    }

    fn compute(&self, _: &Inputs, _: &Params) -> ArtificeResult<Outputs> {
        Err(ArtificeError::computation("boom"))
    }
}

/// Declares an image output but produces a scalar.
struct Liar;

impl Operator for Liar {
    fn kind(&self) -> &'static str {
        "Liar"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Image)]
    }

    fn compute(&self, _: &Inputs, _: &Params) -> ArtificeResult<Outputs> {
        Ok(Outputs::single("out", PortValue::Scalar(0.0)))
    }
}

/// Cancels the shared token when it runs.
struct Canceller(CancelToken);

impl Operator for Canceller {
    fn kind(&self) -> &'static str {
        "Canceller"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("out", PortType::Scalar)]
    }

    fn compute(&self, _: &Inputs, _: &Params) -> ArtificeResult<Outputs> {
        self.0.cancel();
        Ok(Outputs::single("out", PortValue::Scalar(0.0)))
    }
}

fn scalar(g: &Graph, id: NodeId) -> Option<f64> {
    g.output(id, "out").and_then(PortValue::as_scalar)
}

/// A -> B -> C with per-node compute counters.
fn chain() -> (Graph, [NodeId; 3], [Counter; 3]) {
    let counters: [Counter; 3] = Default::default();
    let mut g = Graph::new("chain");
    let a = g.add_node(Box::new(Source(counters[0].0.clone())));
    let b = g.add_node(Box::new(Add(counters[1].0.clone())));
    let c = g.add_node(Box::new(Add(counters[2].0.clone())));
    g.connect(a, "out", b, "in").unwrap();
    g.connect(b, "out", c, "in").unwrap();
    (g, [a, b, c], counters)
}

#[test]
fn chain_computes_then_reuses() {
    let (mut g, [a, b, c], n) = chain();
    let r = g.execute().unwrap();
    assert!(r.is_success());
    assert_eq!(r.computed, vec![a, b, c]);
    assert_eq!(scalar(&g, c), Some(3.0));

    let r = g.execute().unwrap();
    assert_eq!(r.reused, vec![a, b, c]);
    assert!(r.computed.is_empty());
    assert_eq!([n[0].get(), n[1].get(), n[2].get()], [1, 1, 1]);
}

#[test]
fn param_change_recomputes_node_and_descendants_only() {
    let (mut g, [a, b, c], n) = chain();
    g.execute().unwrap();
    g.set_param(b, "offset", json!(10.0)).unwrap();
    assert_eq!(g.is_dirty(a), Some(false));
    assert_eq!(g.is_dirty(b), Some(true));
    assert_eq!(g.is_dirty(c), Some(true));
    assert!(g.output(c, "out").is_none());

    let r = g.execute().unwrap();
    assert_eq!(r.computed, vec![b, c]);
    assert_eq!(r.reused, vec![a]);
    assert_eq!([n[0].get(), n[1].get(), n[2].get()], [1, 2, 2]);
    assert_eq!(scalar(&g, c), Some(12.0));
}

#[test]
fn rejected_param_leaves_cache_intact() {
    let (mut g, [_, b, _], _) = chain();
    g.execute().unwrap();
    assert!(matches!(
        g.set_param(b, "offset", json!(1000.0)),
        Err(ArtificeError::Configuration(_))
    ));
    assert_eq!(g.is_dirty(b), Some(false));
    assert!(g.set_param(NodeId(99), "offset", json!(1.0)).is_err());
}

#[test]
fn cycles_are_rejected() {
    let (mut g, [a, b, c], _) = chain();
    let err = g.connect(c, "out", b, "extra").unwrap_err();
    assert!(matches!(err, ArtificeError::Connection(_)));
    let err = g.connect(b, "out", b, "extra").unwrap_err();
    assert!(matches!(err, ArtificeError::Connection(_)));
    // Non-cyclic extra edge is fine.
    g.connect(a, "out", c, "extra").unwrap();
    assert_eq!(g.execution_order(), vec![a, b, c]);
}

#[test]
fn invalid_connections_are_connection_errors() {
    let (mut g, [a, b, _], _) = chain();
    let liar = g.add_node(Box::new(Liar));
    for res in [
        g.connect(a, "nope", b, "extra"),
        g.connect(a, "out", b, "nope"),
        g.connect(a, "out", b, "in"),
        g.connect(liar, "out", b, "extra"),
        g.connect(NodeId(50), "out", b, "extra"),
    ] {
        assert!(matches!(res, Err(ArtificeError::Connection(_))), "{res:?}");
    }
}

#[test]
fn missing_input_fails_node_and_descendants_but_not_independent_branches() {
    let mut g = Graph::new("branches");
    let counter = Counter::default();
    let orphan = g.add_node(Box::new(Add(counter.0.clone())));
    let downstream = g.add_node(Box::new(Add(counter.0.clone())));
    g.connect(orphan, "out", downstream, "in").unwrap();
    let src = g.add_node(Box::new(Source(counter.0.clone())));
    let ok = g.add_node(Box::new(Add(counter.0.clone())));
    g.connect(src, "out", ok, "in").unwrap();

    let r = g.execute().unwrap();
    assert_eq!(r.failures.len(), 1);
    let f = &r.failures[0];
    assert_eq!(f.node, orphan);
    assert_eq!(f.kind, "Add");
    assert!(matches!(&f.error, ArtificeError::MissingInput { node, port } if *node == orphan && port == "in"));
    assert_eq!(r.skipped, vec![downstream]);
    assert_eq!(r.computed, vec![src, ok]);
    assert_eq!(g.is_dirty(orphan), Some(true));
    assert_eq!(g.is_dirty(downstream), Some(true));
    assert_eq!(scalar(&g, ok), Some(2.0));
    assert!(!r.is_success());
}

#[test]
fn optional_inputs_may_be_absent_and_defaults_fill_in() {
    let mut g = Graph::new("defaults");
    let d = g.add_node(Box::new(Defaulted));
    g.execute().unwrap();
    assert_eq!(scalar(&g, d), Some(42.0));
}

#[test]
fn compute_failures_are_attributed() {
    let mut g = Graph::new("fail");
    let counter = Counter::default();
    let broken = g.add_node(Box::new(Broken));
    let after = g.add_node(Box::new(Add(counter.0.clone())));
    g.connect(broken, "out", after, "in").unwrap();
    let liar = g.add_node(Box::new(Liar));

    let r = g.execute().unwrap();
    let failed: Vec<(NodeId, &str)> = r.failures.iter().map(|f| (f.node, f.kind)).collect();
    assert_eq!(failed, vec![(broken, "Broken"), (liar, "Liar")]);
    assert!(r.failures.iter().all(|f| matches!(f.error, ArtificeError::Computation(_))));
    assert_eq!(r.skipped, vec![after]);
    assert_eq!(counter.get(), 0);
}

#[test]
fn targets_limit_execution_to_ancestors() {
    let (mut g, [a, b, c], _) = chain();
    let opts = ExecOptions {
        targets: vec![b],
        ..ExecOptions::default()
    };
    let r = g.execute_with(&opts).unwrap();
    assert_eq!(r.order, vec![a, b]);
    assert_eq!(g.is_dirty(c), Some(true));

    let bad = ExecOptions {
        targets: vec![NodeId(77)],
        ..ExecOptions::default()
    };
    assert!(matches!(g.execute_with(&bad), Err(ArtificeError::Configuration(_))));
}

#[test]
fn cancellation_stops_between_nodes() {
    let token = CancelToken::new();
    let mut g = Graph::new("cancel");
    let first = g.add_node(Box::new(Canceller(token.clone())));
    let counter = Counter::default();
    let second = g.add_node(Box::new(Source(counter.0.clone())));

    let opts = ExecOptions {
        cancel: Some(token.clone()),
        ..ExecOptions::default()
    };
    let r = g.execute_with(&opts).unwrap();
    assert!(r.cancelled);
    assert_eq!(r.computed, vec![first]);
    assert_eq!(g.is_dirty(second), Some(true));
    assert_eq!(counter.get(), 0);
}

#[test]
fn remove_node_drops_edges_and_dirties_targets() {
    let (mut g, [a, b, c], _) = chain();
    g.execute().unwrap();
    g.remove_node(b).unwrap();
    assert!(!g.contains(b));
    assert_eq!(g.len(), 2);
    assert_eq!(g.connections().len(), 0);
    assert_eq!(g.is_dirty(c), Some(true));
    assert_eq!(g.is_dirty(a), Some(false));

    let d = g.add_node(Box::new(Defaulted));
    assert_eq!(d, NodeId(3));
    assert_eq!(g.node_ids(), vec![a, c, d]);
    assert!(g.remove_node(b).is_err());
}

#[test]
fn disconnect_dirties_former_target() {
    let (mut g, [a, b, c], _) = chain();
    g.execute().unwrap();
    g.disconnect(a, "out", b, "in").unwrap();
    assert_eq!(g.is_dirty(b), Some(true));
    assert_eq!(g.is_dirty(c), Some(true));
    assert!(matches!(
        g.disconnect(a, "out", b, "in"),
        Err(ArtificeError::Connection(_))
    ));
}

#[test]
fn ready_ties_break_toward_smallest_id() {
    let mut g = Graph::new("ties");
    let counter = Counter::default();
    let late_src = g.add_node(Box::new(Add(counter.0.clone())));
    let s1 = g.add_node(Box::new(Source(counter.0.clone())));
    let s2 = g.add_node(Box::new(Source(counter.0.clone())));
    g.connect(s2, "out", late_src, "in").unwrap();
    g.connect(s1, "out", late_src, "extra").unwrap();
    assert_eq!(g.execution_order(), vec![s1, s2, late_src]);
}

#[test]
fn explicit_thread_pool_runs_and_zero_threads_is_rejected() {
    let (mut g, [_, _, c], _) = chain();
    let opts = ExecOptions {
        threads: Some(2),
        ..ExecOptions::default()
    };
    assert!(g.execute_with(&opts).unwrap().is_success());
    assert_eq!(scalar(&g, c), Some(3.0));

    let zero = ExecOptions {
        threads: Some(0),
        ..ExecOptions::default()
    };
    assert!(matches!(g.execute_with(&zero), Err(ArtificeError::Configuration(_))));
}

#[test]
fn clear_empties_graph_without_reusing_ids() {
    let (mut g, _, _) = chain();
    g.clear();
    assert!(g.is_empty());
    let id = g.add_node(Box::new(Defaulted));
    assert_eq!(id, NodeId(3));
}
