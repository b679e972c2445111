//! Whitespace edge-list loader.
//!
//! One edge per line: `source target [weight]`. Blank lines and lines starting with `#`
//! are skipped. Node ids are arbitrary non-whitespace tokens.

use crate::graph::{check_weight, CsrGraph, GraphBuilder};
use crate::{Error, Result};
use std::io::BufRead;
use std::path::Path;

/// How to interpret an edge list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeListOptions {
    /// Store each edge in one direction only.
    pub directed: bool,
    /// Read the optional third column as the edge weight. When `false`, every edge weighs
    /// 1.0 and a third column is ignored.
    pub weighted: bool,
}

/// Parse an in-memory edge list.
pub fn parse_edgelist(text: &str, options: EdgeListOptions) -> Result<CsrGraph> {
    let mut builder = GraphBuilder::new(options.directed);
    for (line_no, line) in text.lines().enumerate() {
        parse_line(&mut builder, line, line_no + 1, options)?;
    }
    finish(builder)
}

/// Read an edge list from any buffered reader.
pub fn read_edgelist<R: BufRead>(reader: R, options: EdgeListOptions) -> Result<CsrGraph> {
    let mut builder = GraphBuilder::new(options.directed);
    for (line_no, line) in reader.lines().enumerate() {
        parse_line(&mut builder, &line?, line_no + 1, options)?;
    }
    finish(builder)
}

/// Read an edge list from a file.
pub fn read_edgelist_path<P: AsRef<Path>>(path: P, options: EdgeListOptions) -> Result<CsrGraph> {
    let path = path.as_ref();
    let start = std::time::Instant::now();
    let file = std::fs::File::open(path)?;
    let graph = read_edgelist(std::io::BufReader::new(file), options)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        arcs = graph.edge_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "read edge list"
    );
    Ok(graph)
}

fn parse_line(
    builder: &mut GraphBuilder,
    line: &str,
    line_no: usize,
    options: EdgeListOptions,
) -> Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let invalid = |reason: String| Error::InvalidEdge { line: line_no, reason };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (src, dst, raw_weight) = match tokens.as_slice() {
        [src, dst] => (*src, *dst, None),
        [src, dst, w] => (*src, *dst, Some(*w)),
        [_] => return Err(invalid("missing target".to_string())),
        _ => {
            return Err(invalid(format!(
                "expected `source target [weight]`, got {} fields",
                tokens.len()
            )))
        }
    };

    let weight = match raw_weight {
        Some(w) if options.weighted => {
            let w: f32 = w
                .parse()
                .map_err(|e| invalid(format!("bad weight '{w}': {e}")))?;
            check_weight(w).map_err(invalid)?;
            w
        }
        _ => 1.0,
    };

    let u = builder.add_node(src);
    let v = builder.add_node(dst);
    builder.add_edge_by_index(u, v, weight)
}

fn finish(builder: GraphBuilder) -> Result<CsrGraph> {
    if builder.node_count() == 0 {
        return Err(Error::EmptyGraph);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTED: EdgeListOptions = EdgeListOptions {
        directed: false,
        weighted: true,
    };

    #[test]
    fn parses_weighted_undirected() {
        let g = parse_edgelist("# comment\n1 2 0.5\n\n2 3\n", WEIGHTED).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 4);
        let (n1, n2, n3) = (
            g.node_index("1").unwrap(),
            g.node_index("2").unwrap(),
            g.node_index("3").unwrap(),
        );
        assert_eq!(g.edge_weight(n2, n1), Some(0.5));
        // Missing weight defaults to 1.
        assert_eq!(g.edge_weight(n3, n2), Some(1.0));
    }

    #[test]
    fn unweighted_ignores_third_column() {
        let opts = EdgeListOptions {
            directed: true,
            weighted: false,
        };
        let g = parse_edgelist("a b 9.0\nb c not-a-number\n", opts).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge_weight(0, 1), Some(1.0));
        assert_eq!(g.edge_weight(1, 2), Some(1.0));
        assert_eq!(g.edge_weight(1, 0), None);
    }

    #[test]
    fn malformed_lines_report_line_numbers() {
        let err = parse_edgelist("a b 1\nc d x\n", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::InvalidEdge { line: 2, .. }), "{err}");

        let err = parse_edgelist("a b\nlonely\n", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::InvalidEdge { line: 2, .. }), "{err}");

        let err = parse_edgelist("a b 1 2\n", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::InvalidEdge { line: 1, .. }), "{err}");

        let err = parse_edgelist("a b -3\n", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::InvalidEdge { line: 1, .. }), "{err}");

        let err = parse_edgelist("a b NaN\n", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::InvalidEdge { line: 1, .. }), "{err}");
    }

    #[test]
    fn empty_input_is_empty_graph() {
        assert!(matches!(
            parse_edgelist("", WEIGHTED),
            Err(Error::EmptyGraph)
        ));
        assert!(matches!(
            parse_edgelist("# only comments\n\n", WEIGHTED),
            Err(Error::EmptyGraph)
        ));
    }

    #[test]
    fn duplicate_entries_last_write_wins() {
        let g = parse_edgelist("a b 1\nb a 4\n", WEIGHTED).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge_weight(0, 1), Some(4.0));
        assert_eq!(g.edge_weight(1, 0), Some(4.0));
    }

    #[test]
    fn reader_and_str_agree() {
        let text = "x y 2\ny z 3\nz x 1\n";
        let a = parse_edgelist(text, WEIGHTED).unwrap();
        let b = read_edgelist(std::io::Cursor::new(text), WEIGHTED).unwrap();
        assert_eq!(a.node_ids(), b.node_ids());
        for v in 0..a.node_count() {
            assert_eq!(a.neighbors_and_weights(v), b.neighbors_and_weights(v));
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_edgelist_path("/definitely/not/here.edgelist", WEIGHTED).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
