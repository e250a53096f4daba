//! A G-code program as an ordered list of text segments.

use crate::markers;

/// Ordered text segments which, concatenated, make up a whole program.
///
/// Segments are whatever chunks the upstream stage handed over, usually one
/// per layer plus a header. The transform never splits, merges or reorders
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<String>,
}

impl Document {
    /// Wrap pre-split segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Split a flat program into segments the way the slicer hands them to
    /// post-processors: the `;FLAVOR:` comment header on its own, then the
    /// start G-code, then one segment per `;LAYER:` line. The header ends at
    /// the first line after `;FLAVOR:` that is not a comment. Line
    /// terminators stay attached so that [Document::to_program] gives back
    /// the exact input.
    pub fn from_program(program: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut seen_flavor = false;
        let mut in_header = false;

        for line in program.split_inclusive('\n') {
            let ends_header = in_header && !line.trim_start().starts_with(';');
            if (ends_header || line.contains(markers::LAYER)) && !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            if ends_header || line.contains(markers::LAYER) {
                in_header = false;
            }
            if !seen_flavor && line.contains(markers::FLAVOR) {
                seen_flavor = true;
                in_header = true;
            }
            current.push_str(line);
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Self { segments }
    }

    /// The segments, in program order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [String] {
        &mut self.segments
    }

    /// Take the segments back out.
    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    /// Concatenate every segment.
    pub fn to_program(&self) -> String {
        self.segments.concat()
    }
}

impl From<Vec<String>> for Document {
    fn from(segments: Vec<String>) -> Self {
        Self::new(segments)
    }
}

impl FromIterator<String> for Document {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
