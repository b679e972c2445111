//! Graph model: a weighted CSR adjacency with interned string node ids.

use crate::{Error, Result};
use std::collections::HashMap;

/// A weighted graph view that can return **borrowed** neighbor + weight slices.
///
/// This is the “CSR-style” representation the transition preprocessor relies on:
/// a node has a contiguous neighbor list and a contiguous weight list,
/// with matching indices.
pub trait WeightedGraphRef {
    fn node_count(&self) -> usize;

    /// Return `(neighbors, weights)` for a node.
    ///
    /// Requirements:
    /// - `neighbors.len() == weights.len()`
    /// - `neighbors` is sorted ascending (the triangle test is a sorted merge)
    /// - weights are positive
    fn neighbors_and_weights_ref(&self, node: usize) -> (&[usize], &[f32]);

    fn out_degree(&self, node: usize) -> usize {
        self.neighbors_and_weights_ref(node).0.len()
    }
}

/// Immutable weighted graph in compressed sparse row layout.
///
/// Node `i` owns the edge range `indptr[i]..indptr[i + 1]` of `indices`/`weights`; that
/// range is the node's out-neighbor list, sorted by neighbor index. Undirected graphs store
/// every edge in both directions, so `edge_count` counts arcs.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    weights: Vec<f32>,
    directed: bool,
}

impl CsrGraph {
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of stored directed arcs. An undirected edge counts twice, a self-loop once.
    pub fn edge_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_id(&self, node: usize) -> Option<&str> {
        self.ids.get(node).map(String::as_str)
    }

    pub fn node_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Edge-index range of `node`'s out-edges.
    pub fn edge_range(&self, node: usize) -> std::ops::Range<usize> {
        self.indptr[node]..self.indptr[node + 1]
    }

    pub fn neighbors_and_weights(&self, node: usize) -> (&[usize], &[f32]) {
        let r = self.edge_range(node);
        (&self.indices[r.clone()], &self.weights[r])
    }

    /// Weight of the arc `source -> target`, if present.
    pub fn edge_weight(&self, source: usize, target: usize) -> Option<f32> {
        if source >= self.node_count() {
            return None;
        }
        let (nbrs, wts) = self.neighbors_and_weights(source);
        nbrs.binary_search(&target).ok().map(|i| wts[i])
    }

    /// Build from a `petgraph` graph, mapping each edge payload to a weight.
    ///
    /// Node ids are the `Display` rendering of the node payloads; parallel edges follow the
    /// builder's last-write-wins policy.
    #[cfg(feature = "petgraph")]
    pub fn from_petgraph<N, E, Ty, Ix, F>(graph: &petgraph::Graph<N, E, Ty, Ix>, weight: F) -> Result<Self>
    where
        N: std::fmt::Display,
        Ty: petgraph::EdgeType,
        Ix: petgraph::graph::IndexType,
        F: Fn(&E) -> f32,
    {
        use petgraph::visit::EdgeRef;

        let mut builder = GraphBuilder::new(graph.is_directed());
        let ids: Vec<usize> = graph
            .node_indices()
            .map(|idx| builder.add_node(&graph[idx].to_string()))
            .collect();
        for e in graph.edge_references() {
            let (u, v) = (ids[e.source().index()], ids[e.target().index()]);
            builder.add_edge_by_index(u, v, weight(e.weight()))?;
        }
        builder.build()
    }
}

impl WeightedGraphRef for CsrGraph {
    fn node_count(&self) -> usize {
        self.ids.len()
    }

    fn neighbors_and_weights_ref(&self, node: usize) -> (&[usize], &[f32]) {
        self.neighbors_and_weights(node)
    }
}

/// Incremental builder for [`CsrGraph`].
///
/// Duplicate policy: **last write wins**. Re-adding an arc (or, for undirected graphs,
/// either orientation of an edge) replaces its weight in every stored direction; the
/// neighbor set never grows from a duplicate. Re-adding a node is a no-op.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    directed: bool,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    arcs: HashMap<(usize, usize), f32>,
}

impl GraphBuilder {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ids: Vec::new(),
            index: HashMap::new(),
            arcs: HashMap::new(),
        }
    }

    /// Intern `id`, returning its dense index (assigned in order of first appearance).
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&i) = self.index.get(id) {
            return i;
        }
        let i = self.ids.len();
        self.ids.push(id.to_owned());
        self.index.insert(id.to_owned(), i);
        i
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Add (or overwrite) the edge `source -> target`.
    ///
    /// Fails with [`Error::InvalidEdge`] if `weight` is not finite and positive. Line
    /// numbers are not known here, so the error carries line 0.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: f32) -> Result<()> {
        check_weight(weight).map_err(|reason| Error::InvalidEdge { line: 0, reason })?;
        let u = self.add_node(source);
        let v = self.add_node(target);
        self.insert_arcs(u, v, weight);
        Ok(())
    }

    /// Like [`GraphBuilder::add_edge`] for nodes already interned.
    pub fn add_edge_by_index(&mut self, source: usize, target: usize, weight: f32) -> Result<()> {
        let n = self.ids.len();
        if source >= n {
            return Err(Error::IndexOutOfBounds(source));
        }
        if target >= n {
            return Err(Error::IndexOutOfBounds(target));
        }
        check_weight(weight).map_err(|reason| Error::InvalidEdge { line: 0, reason })?;
        self.insert_arcs(source, target, weight);
        Ok(())
    }

    fn insert_arcs(&mut self, u: usize, v: usize, weight: f32) {
        self.arcs.insert((u, v), weight);
        if !self.directed {
            self.arcs.insert((v, u), weight);
        }
    }

    /// Freeze into CSR form. Fails with [`Error::EmptyGraph`] if no node was added.
    pub fn build(self) -> Result<CsrGraph> {
        let n = self.ids.len();
        if n == 0 {
            return Err(Error::EmptyGraph);
        }

        let mut arcs: Vec<((usize, usize), f32)> = self.arcs.into_iter().collect();
        arcs.sort_unstable_by_key(|&(key, _)| key);

        let mut indptr = vec![0usize; n + 1];
        for &((u, _), _) in &arcs {
            indptr[u + 1] += 1;
        }
        for i in 0..n {
            indptr[i + 1] += indptr[i];
        }
        let indices: Vec<usize> = arcs.iter().map(|&((_, v), _)| v).collect();
        let weights: Vec<f32> = arcs.iter().map(|&(_, w)| w).collect();

        tracing::debug!(
            nodes = n,
            arcs = indices.len(),
            directed = self.directed,
            "built csr graph"
        );

        Ok(CsrGraph {
            ids: self.ids,
            index: self.index,
            indptr,
            indices,
            weights,
            directed: self.directed,
        })
    }
}

pub(crate) fn check_weight(weight: f32) -> std::result::Result<(), String> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(format!("edge weight must be finite and positive, got {weight}"))
    }
}
