use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use prelude::flame::{self, Span};

/// Time spent under one span name at one position in the call tree, summed over every time
/// the span was entered.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileNode {
    pub name: String,
    pub total_ns: u64,
    pub calls: usize,
    pub children: Vec<ProfileNode>,
}

/// Folds sibling spans sharing a name into one node, recursively, so repeated control cycles
/// collapse into a single tree.
pub fn merge_spans(spans: &[Span]) -> Vec<ProfileNode> {
    let mut merged: Vec<(ProfileNode, Vec<Span>)> = Vec::new();
    for span in spans {
        match merged.iter_mut().find(|(node, _)| node.name == span.name) {
            Some((node, children)) => {
                node.total_ns += span.delta;
                node.calls += 1;
                children.extend(span.children.iter().cloned());
            }
            None => merged.push((
                ProfileNode {
                    name: span.name.to_string(),
                    total_ns: span.delta,
                    calls: 1,
                    children: Vec::new(),
                },
                span.children.clone(),
            )),
        }
    }

    merged
        .into_iter()
        .map(|(mut node, children)| {
            node.children = merge_spans(&children);
            node
        })
        .collect()
}

/// One line per node, indented by depth, slowest siblings first.
pub fn write_profile<W: Write>(out: &mut W, nodes: &[ProfileNode]) -> io::Result<()> {
    write_nodes(out, nodes, 0)
}

fn write_nodes<W: Write>(out: &mut W, nodes: &[ProfileNode], depth: usize) -> io::Result<()> {
    let mut sorted: Vec<&ProfileNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| b.total_ns.cmp(&a.total_ns));
    for node in sorted {
        writeln!(
            out,
            "{:indent$}{}: {:.3} ms over {} calls",
            "",
            node.name,
            node.total_ns as f64 * 1e-6,
            node.calls,
            indent = 2 * depth
        )?;
        write_nodes(out, &node.children, depth + 1)?;
    }
    Ok(())
}

/// Writes the flame graph of this thread as html and its merged profile as text.
pub fn write_flame<P: AsRef<Path>, Q: AsRef<Path>>(html: P, profile: Q) -> io::Result<()> {
    flame::dump_html(File::create(html)?)?;
    let nodes = merge_spans(&flame::spans());
    write_profile(&mut File::create(profile)?, &nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() {
        flame::span_of("cycle", || {
            flame::span_of("build", || ());
            flame::span_of("solve", || flame::span_of("qp", || ()));
            flame::span_of("solve", || ());
        })
    }

    #[test]
    fn repeated_cycles_merge_into_one_tree() {
        // Tests run on their own threads, so only these spans are recorded here.
        for _ in 0..3 {
            cycle();
        }
        let spans = flame::spans();
        let nodes = merge_spans(&spans);

        assert_eq!(nodes.len(), 1);
        let root = &nodes[0];
        assert_eq!(root.name, "cycle");
        assert_eq!(root.calls, 3);
        assert_eq!(root.total_ns, spans.iter().map(|s| s.delta).sum::<u64>());

        let names: Vec<&str> = root.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["build", "solve"]);
        assert_eq!(root.children[0].calls, 3);
        assert_eq!(root.children[1].calls, 6);
        assert_eq!(root.children[1].children.len(), 1);
        assert_eq!(root.children[1].children[0].name, "qp");
        assert_eq!(root.children[1].children[0].calls, 3);

        let mut text = Vec::new();
        write_profile(&mut text, &nodes).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("cycle: "));
        assert!(text.contains("\n    qp: "));
    }
}
