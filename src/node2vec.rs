//! Node2vec transition preprocessing (PreComp mode).
//!
//! For every node `v` we compile a first-step alias table over `v`'s out-edges (weights
//! only), and for every arc `e = (t -> v)` a second-order table over `v`'s out-edges with
//! the node2vec bias relative to `t`:
//!
//! ```text
//! w(v, x) / p   if x == t
//! w(v, x)       if t -> x exists     (x is one hop from t)
//! w(v, x) / q   otherwise            (x is two hops from t)
//! ```
//!
//! Storage is arena-style. Node tables share the CSR edge layout: node `v`'s table lives at
//! `indptr[v]..indptr[v + 1]` and slot `k` is the arc to `indices[indptr[v] + k]`. Edge
//! tables live in one flat arena; arc `e = (t -> v)` owns `edge_indptr[e]..edge_indptr[e + 1]`
//! (length `deg(v)`). Arcs are numbered in CSR order, so all tables for arcs leaving `t`
//! are contiguous and can be built independently per source node.

use crate::alias::{alias_setup_into, AliasView};
use crate::graph::WeightedGraphRef;
use crate::{Error, Result};
use rand::Rng;

/// Precomputed alias tables for weighted node2vec walks.
#[derive(Debug, Clone)]
pub struct TransitionTables {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    node_q: Vec<f32>,
    node_j: Vec<u32>,
    edge_indptr: Vec<usize>,
    edge_q: Vec<f32>,
    edge_j: Vec<u32>,
    p: f32,
    q: f32,
}

impl TransitionTables {
    /// Build every first-step and second-order table of `graph`.
    ///
    /// `graph` must return sorted neighbor lists (see [`WeightedGraphRef`]).
    ///
    /// Errors:
    /// - [`Error::InvalidParameter`] unless `p` and `q` are finite and positive
    /// - [`Error::EmptyGraph`] if the graph has no nodes
    pub fn new<G: WeightedGraphRef + Sync>(graph: &G, p: f32, q: f32) -> Result<Self> {
        check_bias("p", p)?;
        check_bias("q", q)?;

        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyGraph);
        }
        let start = std::time::Instant::now();

        let mut indptr = vec![0usize; n + 1];
        let mut indices: Vec<usize> = Vec::new();
        for v in 0..n {
            let (nbrs, _) = graph.neighbors_and_weights_ref(v);
            debug_assert!(nbrs.windows(2).all(|w| w[0] < w[1]), "neighbors of {v} not sorted");
            indices.extend_from_slice(nbrs);
            indptr[v + 1] = indices.len();
        }
        let arcs = indices.len();

        // Arc e = (t -> v) needs deg(v) slots.
        let mut edge_indptr = vec![0usize; arcs + 1];
        for (e, &v) in indices.iter().enumerate() {
            edge_indptr[e + 1] = edge_indptr[e] + (indptr[v + 1] - indptr[v]);
        }
        let total = edge_indptr[arcs];

        let mut node_q = vec![0.0f32; arcs];
        let mut node_j = vec![0u32; arcs];
        let mut edge_q = vec![0.0f32; total];
        let mut edge_j = vec![0u32; total];

        let node_blocks = split_blocks(&mut node_q, &mut node_j, &indptr);
        for_each_block(node_blocks, |v, q_out, j_out| {
            let (_, wts) = graph.neighbors_and_weights_ref(v);
            // Weights are positive, so only a dead end produces an empty table.
            alias_setup_into(wts, q_out, j_out);
        });

        let src_ptr: Vec<usize> = indptr.iter().map(|&e| edge_indptr[e]).collect();
        let edge_blocks = split_blocks(&mut edge_q, &mut edge_j, &src_ptr);
        for_each_block(edge_blocks, |t, q_out, j_out| {
            let (t_nbrs, _) = graph.neighbors_and_weights_ref(t);
            let mut buf: Vec<f64> = Vec::new();
            let mut offset = 0usize;
            for &v in t_nbrs {
                let deg = graph.out_degree(v);
                second_order_weights(graph, t, v, p, q, &mut buf);
                alias_setup_into(
                    &buf,
                    &mut q_out[offset..offset + deg],
                    &mut j_out[offset..offset + deg],
                );
                offset += deg;
            }
        });

        tracing::info!(
            nodes = n,
            arcs,
            edge_entries = total,
            p,
            q,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "preprocessed transition tables"
        );

        Ok(Self {
            indptr,
            indices,
            node_q,
            node_j,
            edge_indptr,
            edge_q,
            edge_j,
            p,
            q,
        })
    }

    pub fn node_count(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.indices.len()
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.indices[self.indptr[node]..self.indptr[node + 1]]
    }

    /// Target node of arc `edge`.
    pub fn edge_target(&self, edge: usize) -> usize {
        self.indices[edge]
    }

    /// Arc index of `source -> target`, if that arc exists.
    pub fn edge_index(&self, source: usize, target: usize) -> Option<usize> {
        if source >= self.node_count() {
            return None;
        }
        self.neighbors(source)
            .binary_search(&target)
            .ok()
            .map(|k| self.indptr[source] + k)
    }

    /// First-step table of `node` (empty for a dead end).
    pub fn node_table(&self, node: usize) -> AliasView<'_> {
        let r = self.indptr[node]..self.indptr[node + 1];
        AliasView::new(&self.node_q[r.clone()], &self.node_j[r])
    }

    /// Second-order table of arc `edge` (empty when its target is a dead end).
    pub fn edge_table(&self, edge: usize) -> AliasView<'_> {
        let r = self.edge_indptr[edge]..self.edge_indptr[edge + 1];
        AliasView::new(&self.edge_q[r.clone()], &self.edge_j[r])
    }

    /// `(neighbor, probability)` pairs of the first step out of `node`.
    pub fn node_distribution(&self, node: usize) -> Vec<(usize, f64)> {
        let probs = self.node_table(node).probabilities();
        self.neighbors(node).iter().copied().zip(probs).collect()
    }

    /// `(neighbor of target, probability)` pairs of the step after `source -> target`.
    pub fn edge_distribution(&self, source: usize, target: usize) -> Option<Vec<(usize, f64)>> {
        let e = self.edge_index(source, target)?;
        let probs = self.edge_table(e).probabilities();
        Some(self.neighbors(target).iter().copied().zip(probs).collect())
    }

    /// Sample the first step out of `node`; returns the arc index taken.
    pub fn sample_first<R: Rng>(&self, node: usize, rng: &mut R) -> Result<usize> {
        self.node_table(node)
            .sample(rng)
            .map(|k| self.indptr[node] + k)
            .ok_or(Error::DeadEnd { node })
    }

    /// Sample the step after traversing arc `edge`; returns the arc index taken.
    pub fn sample_next<R: Rng>(&self, edge: usize, rng: &mut R) -> Result<usize> {
        let node = self.indices[edge];
        self.edge_table(edge)
            .sample(rng)
            .map(|k| self.indptr[node] + k)
            .ok_or(Error::DeadEnd { node })
    }
}

/// Unnormalized second-order weights for the step after `prev -> cur`, written into `buf`
/// aligned with `cur`'s neighbor list.
///
/// On directed graphs, `x` counts as one hop from `prev` when the arc `prev -> x` exists;
/// the reverse arc `x -> prev` alone does not qualify. Weights are biased in `f64`, so large
/// finite weights divided by a small `p` or `q` stay finite.
pub fn second_order_weights<G: WeightedGraphRef>(
    graph: &G,
    prev: usize,
    cur: usize,
    p: f32,
    q: f32,
    buf: &mut Vec<f64>,
) {
    let (nbrs, wts) = graph.neighbors_and_weights_ref(cur);
    let (prev_nbrs, _) = graph.neighbors_and_weights_ref(prev);
    let (p, q) = (f64::from(p), f64::from(q));

    buf.clear();
    buf.extend(wts.iter().map(|&w| f64::from(w)));

    // Sorted merge: `j` walks prev's neighbor list alongside cur's.
    let mut j = 0usize;
    for (i, &x) in nbrs.iter().enumerate() {
        while j < prev_nbrs.len() && prev_nbrs[j] < x {
            j += 1;
        }
        if x == prev {
            buf[i] /= p;
        } else if !(j < prev_nbrs.len() && prev_nbrs[j] == x) {
            buf[i] /= q;
        }
    }
}

fn check_bias(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

type Block<'a> = (usize, &'a mut [f32], &'a mut [u32]);

/// Split aligned arenas into one disjoint block per node, block `v` covering
/// `ptr[v]..ptr[v + 1]`.
fn split_blocks<'a>(mut q: &'a mut [f32], mut j: &'a mut [u32], ptr: &[usize]) -> Vec<Block<'a>> {
    let mut blocks = Vec::with_capacity(ptr.len().saturating_sub(1));
    for (v, w) in ptr.windows(2).enumerate() {
        let len = w[1] - w[0];
        let (q_head, q_tail) = std::mem::take(&mut q).split_at_mut(len);
        let (j_head, j_tail) = std::mem::take(&mut j).split_at_mut(len);
        blocks.push((v, q_head, j_head));
        q = q_tail;
        j = j_tail;
    }
    blocks
}

#[cfg(feature = "parallel")]
fn for_each_block<F>(blocks: Vec<Block<'_>>, f: F)
where
    F: Fn(usize, &mut [f32], &mut [u32]) + Sync + Send,
{
    use rayon::prelude::*;
    blocks.into_par_iter().for_each(|(v, q, j)| f(v, q, j));
}

#[cfg(not(feature = "parallel"))]
fn for_each_block<F>(blocks: Vec<Block<'_>>, f: F)
where
    F: Fn(usize, &mut [f32], &mut [u32]),
{
    blocks.into_iter().for_each(|(v, q, j)| f(v, q, j));
}
