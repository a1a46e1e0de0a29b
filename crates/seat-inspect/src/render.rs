//! Output rendering

use seat_inspect_api::{Report, Severity};
use seat_inspect_core::{Inspection, Tree, TreeNode};
use std::io::{self, Write};

/// Markers appended to a tree line, e.g. ` [!] #1 #3`
fn markers(node: &TreeNode, inspection: &Inspection) -> String {
    if node.findings.is_empty() {
        return String::new();
    }

    let warned = node
        .findings
        .iter()
        .any(|i| inspection.findings[*i].severity == Severity::Warning);
    let refs: Vec<String> = node.findings.iter().map(|i| format!("#{}", i + 1)).collect();

    format!("  [{}] {}", if warned { "!" } else { "i" }, refs.join(" "))
}

/// Indented tree, then findings, then incomplete-data warnings
pub fn write_text(out: &mut impl Write, inspection: &Inspection) -> io::Result<()> {
    writeln!(
        out,
        "Source: {} ({})",
        inspection.source,
        inspection.captured_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out)?;

    let tree = Tree::from_inspection(inspection);
    if tree.roots.is_empty() {
        writeln!(out, "No seats, sessions or users.")?;
    }
    for (depth, node) in tree.walk() {
        writeln!(
            out,
            "{}{}{}",
            "  ".repeat(depth),
            node.label,
            markers(node, inspection)
        )?;
    }

    writeln!(out)?;
    if inspection.findings.is_empty() {
        writeln!(out, "No findings.")?;
    } else {
        writeln!(out, "Findings:")?;
        for (i, finding) in inspection.findings.iter().enumerate() {
            writeln!(out, "  #{} {}", i + 1, finding)?;
        }
    }

    if !inspection.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Incomplete data:")?;
        for warning in &inspection.warnings {
            writeln!(out, "  {}", warning)?;
        }
    }

    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &Report) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
