//! Walk corpus and the embedding-trainer seam.
//!
//! Walks become “sentences” of node ids; an [`EmbeddingTrainer`] (skip-gram, or any other
//! sequence embedder) turns them into [`Embeddings`]. Training itself lives outside this
//! crate; this module only fixes the hand-off formats.

use crate::graph::CsrGraph;
use crate::node2vec::TransitionTables;
use crate::random_walk::{simulate_walks, WalkConfig};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Walks rendered as node-id strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    walks: Vec<Vec<String>>,
}

impl Corpus {
    /// Map index walks back to the graph's node ids.
    pub fn from_walks(graph: &CsrGraph, walks: &[Vec<usize>]) -> Result<Self> {
        let ids = graph.node_ids();
        let walks = walks
            .iter()
            .map(|w| {
                w.iter()
                    .map(|&v| ids.get(v).cloned().ok_or(Error::IndexOutOfBounds(v)))
                    .collect::<Result<Vec<String>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { walks })
    }

    /// Preprocess, simulate and render in one go.
    pub fn generate(graph: &CsrGraph, config: WalkConfig) -> Result<Self> {
        let span = tracing::info_span!("corpus", nodes = graph.node_count(), seed = config.seed);
        let _guard = span.enter();

        config.validate()?;
        let tables = TransitionTables::new(graph, config.p, config.q)?;
        let walks = simulate_walks(&tables, config)?;
        Self::from_walks(graph, &walks)
    }

    pub fn len(&self) -> usize {
        self.walks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.walks.iter().map(Vec::as_slice)
    }

    /// Total number of tokens across all walks.
    pub fn token_count(&self) -> usize {
        self.walks.iter().map(Vec::len).sum()
    }

    /// Distinct node ids, in order of first occurrence.
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.walks
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// One walk per line, tokens separated by single spaces.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        for walk in &self.walks {
            writeln!(out, "{}", walk.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Settings handed to the external embedding trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainerConfig {
    /// Embedding dimension.
    pub dimensions: usize,
    /// Context window size (each side).
    pub window_size: usize,
    /// Training passes over the corpus.
    pub epochs: usize,
    /// Worker threads.
    pub workers: usize,
}

impl TrainerConfig {
    /// Minimum token count. Fixed at 0 so that every node gets a vector.
    pub const MIN_COUNT: usize = 0;
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self { dimensions: 128, window_size: 10, epochs: 5, workers: 8 }
    }
}

/// A sequence embedder consuming walk corpora.
pub trait EmbeddingTrainer {
    fn train(&mut self, corpus: &Corpus, config: &TrainerConfig) -> Result<Embeddings>;
}

/// One vector per node id.
#[derive(Debug, Clone, PartialEq)]
pub struct Embeddings {
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<f32>,
}

impl Embeddings {
    pub fn new(dim: usize) -> Self {
        Self { dim, ids: Vec::new(), vectors: Vec::new() }
    }

    pub fn push(&mut self, id: impl Into<String>, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::InvalidParameter(format!(
                "vector has {} components, expected {}",
                vector.len(),
                self.dim
            )));
        }
        self.ids.push(id.into());
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        let i = self.ids.iter().position(|x| x == id)?;
        Some(&self.vectors[i * self.dim..(i + 1) * self.dim])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.ids
            .iter()
            .enumerate()
            .map(move |(i, id)| (id.as_str(), &self.vectors[i * self.dim..(i + 1) * self.dim]))
    }

    /// word2vec text format: `<count> <dim>` header, then `id v1 .. vd` per line.
    pub fn write_word2vec<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "{} {}", self.len(), self.dim)?;
        for (id, v) in self.iter() {
            write!(out, "{id}")?;
            for x in v {
                write!(out, " {x}")?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_word2vec<R: BufRead>(reader: R) -> Result<Self> {
        let invalid = |line: usize, reason: String| Error::InvalidEmbedding { line, reason };

        let mut lines = reader.lines().enumerate();
        let (count, dim) = match lines.next() {
            Some((_, header)) => {
                let header = header?;
                let mut it = header.split_whitespace();
                let mut field = |name: &str| -> Result<usize> {
                    let tok = it.next().ok_or_else(|| invalid(1, format!("missing {name}")))?;
                    tok.parse()
                        .map_err(|e| invalid(1, format!("bad {name} '{tok}': {e}")))
                };
                (field("count")?, field("dimension")?)
            }
            None => return Err(invalid(1, "missing header".to_string())),
        };

        let mut emb = Self::new(dim);
        let mut vector = Vec::with_capacity(dim);
        for (i, line) in lines {
            let line = line?;
            let line_no = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut it = line.split_whitespace();
            let id = it.next().ok_or_else(|| invalid(line_no, "missing id".to_string()))?;
            vector.clear();
            for tok in it {
                let x: f32 = tok
                    .parse()
                    .map_err(|e| invalid(line_no, format!("bad component '{tok}': {e}")))?;
                vector.push(x);
            }
            if vector.len() != dim {
                return Err(invalid(
                    line_no,
                    format!("expected {dim} components, got {}", vector.len()),
                ));
            }
            emb.push(id, &vector)?;
        }

        if emb.len() != count {
            return Err(invalid(
                1,
                format!("header declares {count} vectors, found {}", emb.len()),
            ));
        }
        Ok(emb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgelist::{parse_edgelist, EdgeListOptions};

    /// Stand-in trainer: vector = (occurrences, first position seen).
    struct CountingTrainer;

    impl EmbeddingTrainer for CountingTrainer {
        fn train(&mut self, corpus: &Corpus, config: &TrainerConfig) -> Result<Embeddings> {
            assert_eq!(TrainerConfig::MIN_COUNT, 0);
            let mut emb = Embeddings::new(config.dimensions);
            for id in corpus.vocabulary() {
                let n = corpus.iter().flatten().filter(|t| t.as_str() == id).count();
                let mut v = vec![0.0f32; config.dimensions];
                v[0] = n as f32;
                emb.push(id, &v)?;
            }
            Ok(emb)
        }
    }

    fn graph() -> CsrGraph {
        parse_edgelist("a b\nb c\nc a\nc d\n", EdgeListOptions::default()).unwrap()
    }

    #[test]
    fn from_walks_maps_ids() {
        let g = graph();
        let corpus = Corpus::from_walks(&g, &[vec![0, 1, 2], vec![3]]).unwrap();
        let walks: Vec<&[String]> = corpus.iter().collect();
        assert_eq!(walks[0], &["a", "b", "c"]);
        assert_eq!(walks[1], &["d"]);
        assert_eq!(corpus.token_count(), 4);

        assert!(matches!(
            Corpus::from_walks(&g, &[vec![0, 9]]),
            Err(Error::IndexOutOfBounds(9))
        ));
    }

    #[test]
    fn generate_covers_every_node() {
        let g = graph();
        let cfg = WalkConfig { length: 6, walks_per_node: 2, p: 0.5, q: 2.0, seed: 1 };
        let corpus = Corpus::generate(&g, cfg).unwrap();
        assert_eq!(corpus.len(), 8);
        assert!(corpus.iter().all(|w| w.len() == 6));
        let mut vocab = corpus.vocabulary();
        vocab.sort_unstable();
        assert_eq!(vocab, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn corpus_text_is_one_walk_per_line() {
        let g = graph();
        let corpus = Corpus::from_walks(&g, &[vec![0, 1], vec![2, 3, 2]]).unwrap();
        let mut out = Vec::new();
        corpus.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a b\nc d c\n");
    }

    #[test]
    fn trainer_output_round_trips_word2vec_text() {
        let g = graph();
        let corpus = Corpus::from_walks(&g, &[vec![0, 1, 0], vec![2]]).unwrap();
        let cfg = TrainerConfig { dimensions: 3, ..TrainerConfig::default() };
        let emb = CountingTrainer.train(&corpus, &cfg).unwrap();
        assert_eq!(emb.len(), 3);
        assert_eq!(emb.get("a"), Some(&[2.0f32, 0.0, 0.0][..]));

        let mut out = Vec::new();
        emb.write_word2vec(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("3 3\n"), "{text}");

        let back = Embeddings::read_word2vec(std::io::Cursor::new(text)).unwrap();
        assert_eq!(back, emb);
    }

    #[test]
    fn zero_dimension_embeddings_keep_their_rows() {
        let mut emb = Embeddings::new(0);
        emb.push("a", &[]).unwrap();
        emb.push("b", &[]).unwrap();
        assert_eq!(emb.iter().map(|(id, _)| id).collect::<Vec<_>>(), ["a", "b"]);

        let mut out = Vec::new();
        emb.write_word2vec(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "2 0\na\nb\n");

        let back = Embeddings::read_word2vec(std::io::Cursor::new(text)).unwrap();
        assert_eq!(back, emb);
    }

    #[test]
    fn malformed_word2vec_is_rejected() {
        let cases = [
            ("", 1),
            ("2 x\n", 1),
            ("1 2\na 1.0\n", 2),
            ("1 2\na 1.0 zz\n", 2),
            ("2 2\na 1.0 2.0\n", 1),
        ];
        for (text, line) in cases {
            match Embeddings::read_word2vec(std::io::Cursor::new(text)) {
                Err(Error::InvalidEmbedding { line: got, .. }) => {
                    assert_eq!(got, line, "wrong line for {text:?}")
                }
                other => panic!("expected InvalidEmbedding for {text:?}, got {other:?}"),
            }
        }
    }
}
