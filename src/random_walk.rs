//! Walk simulation over precomputed transition tables.
//!
//! Policy: for each of `walks_per_node` passes, shuffle the start nodes and run one walk
//! from each. The first step samples the start node's table; every later step samples the
//! table of the arc just traversed.

use crate::node2vec::TransitionTables;
use crate::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalkConfig {
    /// Maximum walk length (in nodes).
    pub length: usize,
    /// Number of walks started from each node.
    pub walks_per_node: usize,
    /// Return parameter \(p\).
    pub p: f32,
    /// In-out parameter \(q\).
    pub q: f32,
    /// Seed for deterministic RNG.
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { length: 80, walks_per_node: 10, p: 1.0, q: 1.0, seed: 42 }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(Error::InvalidParameter("length must be >= 1".into()));
        }
        if self.walks_per_node == 0 {
            return Err(Error::InvalidParameter("walks_per_node must be >= 1".into()));
        }
        for (name, v) in [("p", self.p), ("q", self.q)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be finite and positive, got {v}"
                )));
            }
        }
        Ok(())
    }

    fn check_tables(&self, tables: &TransitionTables) -> Result<()> {
        self.validate()?;
        if (tables.p() - self.p).abs() > 1e-6 || (tables.q() - self.q).abs() > 1e-6 {
            return Err(Error::InvalidParameter(format!(
                "tables were built with p={} q={}, config has p={} q={}",
                tables.p(),
                tables.q(),
                self.p,
                self.q
            )));
        }
        Ok(())
    }
}

/// Walks from every node, `walks_per_node` passes.
pub fn simulate_walks(tables: &TransitionTables, config: WalkConfig) -> Result<Vec<Vec<usize>>> {
    let start_nodes: Vec<usize> = (0..tables.node_count()).collect();
    simulate_walks_from_nodes(tables, &start_nodes, config)
}

/// Walks restricted to an explicit set of start nodes.
///
/// This is the “delta walk” primitive: generate new walks only for the subset of nodes
/// whose neighborhood changed, or for sharding.
pub fn simulate_walks_from_nodes(
    tables: &TransitionTables,
    start_nodes: &[usize],
    config: WalkConfig,
) -> Result<Vec<Vec<usize>>> {
    let mut walks = Vec::with_capacity(start_nodes.len() * config.walks_per_node);
    simulate_walks_streaming_from_nodes(tables, start_nodes, config, |w| walks.push(w.to_vec()))?;
    Ok(walks)
}

/// Same walks as [`simulate_walks_from_nodes`], handed to `on_walk` one at a time through a
/// single reused buffer.
pub fn simulate_walks_streaming_from_nodes<F>(
    tables: &TransitionTables,
    start_nodes: &[usize],
    config: WalkConfig,
    mut on_walk: F,
) -> Result<()>
where
    F: FnMut(&[usize]),
{
    config.check_tables(tables)?;
    check_start_nodes(tables, start_nodes)?;

    let start = std::time::Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut epoch_nodes: Vec<usize> = start_nodes.to_vec();
    let mut buf: Vec<usize> = Vec::with_capacity(config.length);
    let mut steps = 0usize;

    for _ in 0..config.walks_per_node {
        epoch_nodes.shuffle(&mut rng);
        for &node in &epoch_nodes {
            walk_into(tables, node, config.length, &mut rng, &mut buf);
            steps += buf.len();
            on_walk(&buf);
        }
    }

    tracing::info!(
        walks = start_nodes.len() * config.walks_per_node,
        steps,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "simulated walks"
    );
    Ok(())
}

/// Deterministic parallel walks from every node.
#[cfg(feature = "parallel")]
pub fn simulate_walks_parallel(
    tables: &TransitionTables,
    config: WalkConfig,
) -> Result<Vec<Vec<usize>>> {
    let start_nodes: Vec<usize> = (0..tables.node_count()).collect();
    simulate_walks_parallel_from_nodes(tables, &start_nodes, config)
}

/// Deterministic parallel walks (delta/sharded start nodes).
///
/// Invariant: output is stable for a fixed `seed`, independent of Rayon thread count.
/// It is not the same sequence as the serial driver.
#[cfg(feature = "parallel")]
pub fn simulate_walks_parallel_from_nodes(
    tables: &TransitionTables,
    start_nodes: &[usize],
    config: WalkConfig,
) -> Result<Vec<Vec<usize>>> {
    use rayon::prelude::*;

    config.check_tables(tables)?;
    check_start_nodes(tables, start_nodes)?;

    // Shuffle per epoch using a seed that depends only on (seed, epoch).
    let mut epoch_nodes: Vec<usize> = start_nodes.to_vec();
    let mut jobs: Vec<usize> = Vec::with_capacity(start_nodes.len() * config.walks_per_node);
    for epoch in 0..(config.walks_per_node as u32) {
        let mut rng = ChaCha8Rng::seed_from_u64(mix64(config.seed ^ (epoch as u64)));
        epoch_nodes.shuffle(&mut rng);
        jobs.extend_from_slice(&epoch_nodes);
    }

    let walks = jobs
        .par_iter()
        .enumerate()
        .map(|(i, &node)| {
            // `mix64` is a bijection, so distinct job indices never share a stream.
            let seed = mix64(mix64(config.seed) ^ (i as u64));
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut walk = Vec::with_capacity(config.length);
            walk_into(tables, node, config.length, &mut rng, &mut walk);
            walk
        })
        .collect();
    Ok(walks)
}

fn check_start_nodes(tables: &TransitionTables, start_nodes: &[usize]) -> Result<()> {
    let n = tables.node_count();
    match start_nodes.iter().find(|&&v| v >= n) {
        Some(&v) => Err(Error::IndexOutOfBounds(v)),
        None => Ok(()),
    }
}

/// One walk from `start` into `walk` (cleared first).
///
/// A dead end ends the walk early, including at the start node, which yields a walk of
/// length 1.
fn walk_into<R: Rng>(
    tables: &TransitionTables,
    start: usize,
    length: usize,
    rng: &mut R,
    walk: &mut Vec<usize>,
) {
    walk.clear();
    walk.push(start);
    if length < 2 {
        return;
    }

    let mut edge = match tables.sample_first(start, rng) {
        Ok(e) => e,
        // Dead end at the start node: single-node walk.
        Err(_) => return,
    };
    walk.push(tables.edge_target(edge));

    while walk.len() < length {
        match tables.sample_next(edge, rng) {
            Ok(next) => {
                edge = next;
                walk.push(tables.edge_target(edge));
            }
            // Dead end: the walk is shorter than requested.
            Err(_) => break,
        }
    }
}

#[cfg(feature = "parallel")]
fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}
