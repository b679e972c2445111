//! `n2v-walk`: biased second-order (node2vec) random walks for node embeddings.
//!
//! Pipeline: edge list → [`CsrGraph`] → [`TransitionTables`] (per-node and per-edge alias
//! tables) → walks → [`Corpus`] → an external [`EmbeddingTrainer`].
//!
//! Public invariants (must not drift):
//! - **Node order**: walks hold dense node indices \(0..n-1\), assigned in order of first
//!   appearance while loading; [`CsrGraph::node_id`] maps them back.
//! - **Determinism**: walk output is a pure function of (graph, config, seed). The parallel
//!   drivers are additionally independent of the Rayon thread count.
//! - **Dead ends shorten walks**: a node without outgoing edges ends the walk early; this is
//!   never an error.
//!
//! Swappable (allowed to change without breaking the contract):
//! - iteration strategy (serial vs parallel table construction)
//! - arena layout of the alias tables

pub mod alias;
pub mod corpus;
pub mod edgelist;
pub mod graph;
pub mod node2vec;
pub mod random_walk;

pub use alias::{AliasTable, AliasView};
pub use corpus::{Corpus, EmbeddingTrainer, Embeddings, TrainerConfig};
pub use edgelist::{parse_edgelist, read_edgelist, read_edgelist_path, EdgeListOptions};
pub use graph::{CsrGraph, GraphBuilder, WeightedGraphRef};
pub use node2vec::{second_order_weights, TransitionTables};
pub use random_walk::{
    simulate_walks, simulate_walks_from_nodes, simulate_walks_streaming_from_nodes, WalkConfig,
};

#[cfg(feature = "parallel")]
pub use random_walk::{simulate_walks_parallel, simulate_walks_parallel_from_nodes};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid edge on line {line}: {reason}")]
    InvalidEdge { line: usize, reason: String },
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("distribution is empty or sums to zero")]
    EmptyDistribution,
    #[error("node {node} has no outgoing edges")]
    DeadEnd { node: usize },
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid embedding on line {line}: {reason}")]
    InvalidEmbedding { line: usize, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
