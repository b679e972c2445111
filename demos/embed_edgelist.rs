//! Load an edge list, generate a node2vec corpus, and print it.
//!
//! ```text
//! N2V_EDGELIST=/path/to/edges.txt N2V_DIRECTED=1 N2V_WEIGHTED=1 \
//!     RUST_LOG=info cargo run --example embed_edgelist > walks.txt
//! ```
//!
//! Without `N2V_EDGELIST` a small two-community graph is used. The printed corpus is what a
//! skip-gram trainer (window 10, min count 0) would consume.

use n2v_walk::{parse_edgelist, read_edgelist_path, Corpus, EdgeListOptions, WalkConfig};
use tracing_subscriber::EnvFilter;

const BUILTIN: &str = "\
# two triangles joined by a weak bridge
a b 1
b c 1
c a 1
d e 1
e f 1
f d 1
c d 0.1
";

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("1" | "true" | "yes"))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = EdgeListOptions {
        directed: env_flag("N2V_DIRECTED"),
        weighted: env_flag("N2V_WEIGHTED"),
    };
    let graph = match std::env::var("N2V_EDGELIST") {
        Ok(path) => read_edgelist_path(path, options)?,
        Err(_) => parse_edgelist(
            BUILTIN,
            EdgeListOptions {
                weighted: true,
                ..options
            },
        )?,
    };

    let defaults = WalkConfig::default();
    let config = WalkConfig {
        length: env_parse("N2V_WALK_LENGTH", defaults.length),
        walks_per_node: env_parse("N2V_NUM_WALKS", defaults.walks_per_node),
        p: env_parse("N2V_P", defaults.p),
        q: env_parse("N2V_Q", defaults.q),
        seed: env_parse("N2V_SEED", defaults.seed),
    };

    let corpus = Corpus::generate(&graph, config)?;
    tracing::info!(
        walks = corpus.len(),
        tokens = corpus.token_count(),
        vocabulary = corpus.vocabulary().len(),
        "corpus ready"
    );
    corpus.write_to(std::io::stdout().lock())?;
    Ok(())
}
