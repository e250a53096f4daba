//! Renders a [Plan] as firmware commands and splices it into a program.

use std::fmt;

use crate::{document::Document, markers, plan::Plan};

/// The firmware directives carrying a [Plan], one per line, each line
/// terminated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionBlock(String);

impl InjectionBlock {
    /// Format the plan. Purge values get three decimals, mesh bounds one,
    /// the spacing none.
    pub fn render(plan: &Plan) -> Self {
        let mut out = String::from("; --- RRF ADAPTIVE DATA ---\n");
        out.push_str(&format!("set global.purge_x = {:.3}\n", plan.purge.x));
        out.push_str(&format!("set global.purge_y = {:.3}\n", plan.purge.y));
        if let Some(pattern) = &plan.pattern {
            out.push_str(&format!("set global.purge_dist = {:.3}\n", pattern.distance));
            out.push_str(&format!("set global.purge_shape = {}\n", pattern.shape.code()));
        }
        let probe = &plan.probe;
        out.push_str(&format!(
            "M557 X{:.1}:{:.1} Y{:.1}:{:.1} S{}\n",
            probe.min_x, probe.max_x, probe.min_y, probe.max_y, probe.spacing
        ));
        out.push_str("; -------------------------\n");
        Self(out)
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InjectionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append the rendered plan to the first segment carrying the flavor
/// marker. Every other segment is left alone, and a program without the
/// marker comes back unchanged.
pub fn inject(mut document: Document, plan: &Plan) -> Document {
    let block = InjectionBlock::render(plan);

    match document
        .segments_mut()
        .iter_mut()
        .enumerate()
        .find(|(_, segment)| segment.contains(markers::FLAVOR))
    {
        Some((index, segment)) => {
            segment.push('\n');
            segment.push_str(block.as_str());
            tracing::info!(segment = index, "injected adaptive purge and mesh block");
        }
        None => {
            tracing::info!("no {} marker found, nothing injected", markers::FLAVOR);
        }
    }

    document
}
