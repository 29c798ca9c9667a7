//! Plain-text layout report.
//!
//! One line for the overall size, one per node and one per edge:
//!
//! ```text
//! size 120.00 80.00
//! node a 20.00 10.00 40.00 20.00
//! edge a b bends 60.00,45.00
//! edge b a key=back reversed
//! ```

use std::fmt::Write;

use strata::{Layout, graph::Graph};

pub fn render(graph: &Graph, layout: &Layout) -> String {
    let mut out = String::new();
    let size = layout.size();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "size {:.2} {:.2}", size.width(), size.height());

    for node in graph.nodes() {
        let position = node.position();
        let _ = writeln!(
            out,
            "node {} {:.2} {:.2} {:.2} {:.2}",
            node.id(),
            position.x(),
            position.y(),
            node.size().width(),
            node.size().height()
        );
    }

    for edge in graph.edges() {
        let _ = write!(out, "edge {} {}", edge.source(), edge.target());
        if let Some(key) = edge.key() {
            let _ = write!(out, " key={key}");
        }
        if let Some(bends) = edge.bend_points() {
            out.push_str(" bends");
            for point in bends {
                let _ = write!(out, " {:.2},{:.2}", point.x(), point.y());
            }
        }
        if layout
            .layering()
            .is_some_and(|report| report.is_reversed(&edge.identity()))
        {
            out.push_str(" reversed");
        }
        out.push('\n');
    }

    out
}
