//! Scans a program for the first layer's footprint and the bed size.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::{
    document::Document,
    error::{Error, Result},
    markers,
};

lazy_static! {
    /// A G0/G1 move carrying both an X and a Y coordinate.
    static ref MOVE_XY: Regex =
        Regex::new(r"[Gg][01].*[Xx](?P<x>[-0-9.]+).*[Yy](?P<y>[-0-9.]+)").expect("invalid move regex");

    /// The bed-limits marker with its X and Y extents.
    static ref BED_LIMITS: Regex =
        Regex::new(r";BED_LIMITS.*X(?P<x>[0-9.]+).*Y(?P<y>[0-9.]+)").expect("invalid bed limits regex");
}

/// Axis-aligned XY bounds of the extrusion moves seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Smallest X seen (mm).
    pub min_x: f64,
    /// Largest X seen (mm).
    pub max_x: f64,
    /// Smallest Y seen (mm).
    pub min_y: f64,
    /// Largest Y seen (mm).
    pub max_y: f64,
}

impl BoundingBox {
    /// The inverted range every scan starts from.
    pub const EMPTY: Self = Self {
        min_x: 9999.0,
        max_x: -9999.0,
        min_y: 9999.0,
        max_y: -9999.0,
    };

    /// Grow the box to contain `(x, y)`.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Printable area of the bed (mm).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BedSize {
    /// Width along X (mm).
    pub x: f64,
    /// Depth along Y (mm).
    pub y: f64,
}

impl Default for BedSize {
    fn default() -> Self {
        Self { x: 300.0, y: 300.0 }
    }
}

/// Everything a scan learned about the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanResult {
    /// First-layer bounds. Meaningless unless `found_model` is set.
    pub bounds: BoundingBox,
    /// Last bed size seen, or the default.
    pub bed: BedSize,
    /// At least one first-layer extrusion move was seen.
    pub found_model: bool,
}

impl ScanResult {
    /// The first-layer bounds, if there were any extrusion moves.
    pub fn footprint(&self) -> Option<BoundingBox> {
        self.found_model.then_some(self.bounds)
    }
}

/// Single-pass line scanner. Build one per document and discard it after
/// [Scanner::finish].
#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    in_first_layer: bool,
    bounds: BoundingBox,
    bed: BedSize,
    found_model: bool,
    line: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(BedSize::default())
    }
}

impl Scanner {
    /// Create a scanner that assumes `bed` until a `;BED_LIMITS` line is
    /// seen.
    pub fn new(bed: BedSize) -> Self {
        Self {
            in_first_layer: false,
            bounds: BoundingBox::EMPTY,
            bed,
            found_model: false,
            line: 0,
        }
    }

    /// Feed every line of one segment.
    ///
    /// The first-layer window is decided per segment, before any of its
    /// lines are read: a segment mentioning `;LAYER:0` is first layer from
    /// its first line to its last, otherwise one mentioning `;LAYER:1`
    /// closes the window.
    pub fn feed_segment(&mut self, segment: &str) -> Result<()> {
        if segment.contains(markers::FIRST_LAYER) {
            if !self.in_first_layer {
                tracing::debug!(line = self.line + 1, "entering first layer");
            }
            self.in_first_layer = true;
        } else if segment.contains(markers::SECOND_LAYER) {
            if self.in_first_layer {
                tracing::debug!(line = self.line + 1, "leaving first layer");
            }
            self.in_first_layer = false;
        }

        for line in segment.lines() {
            self.feed_line(line)?;
        }
        Ok(())
    }

    /// Feed a single program line. Layer markers on the line are not looked
    /// at; the window is only moved by [Scanner::feed_segment].
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.line += 1;

        if line.contains(markers::BED_LIMITS) {
            if let Some(captures) = BED_LIMITS.captures(line) {
                let (x, y) = self.xy(&captures)?;
                tracing::debug!(line = self.line, x, y, "bed limits");
                self.bed = BedSize { x, y };
            }
        }

        if self.in_first_layer && is_extrusion_move(line) {
            if let Some(captures) = MOVE_XY.captures(line) {
                let (x, y) = self.xy(&captures)?;
                self.found_model = true;
                self.bounds.include(x, y);
            }
        }

        Ok(())
    }

    /// Consume the scanner.
    pub fn finish(self) -> ScanResult {
        ScanResult {
            bounds: self.bounds,
            bed: self.bed,
            found_model: self.found_model,
        }
    }

    fn xy(&self, captures: &Captures<'_>) -> Result<(f64, f64)> {
        Ok((self.number(&captures["x"])?, self.number(&captures["y"])?))
    }

    fn number(&self, token: &str) -> Result<f64> {
        token.parse().map_err(|source| Error::InvalidNumber {
            line: self.line,
            token: token.to_owned(),
            source,
        })
    }
}

// Only the upper-case command at the very start of the line counts here; the
// coordinate pattern itself is case-insensitive.
fn is_extrusion_move(line: &str) -> bool {
    (line.starts_with("G1") || line.starts_with("G0")) && line.contains('E')
}

/// Scan a whole document assuming the default 300x300 bed.
pub fn scan(document: &Document) -> Result<ScanResult> {
    let mut scanner = Scanner::default();
    for segment in document.segments() {
        scanner.feed_segment(segment)?;
    }
    Ok(scanner.finish())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;

    fn doc(segments: &[&str]) -> Document {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_footprint_of_first_layer() -> TestResult {
        let result = scan(&doc(&[
            ";LAYER:0\nG1 X1 Y2 E0.1\nG1 X5 Y2 E0.2\nG1 X5 Y8 E0.3\nG1 X1 Y8 E0.4\n",
        ]))?;
        assert!(result.found_model);
        assert_eq!(
            result.footprint(),
            Some(BoundingBox {
                min_x: 1.0,
                max_x: 5.0,
                min_y: 2.0,
                max_y: 8.0,
            })
        );
        Ok(())
    }

    #[test]
    fn test_moves_outside_first_layer_are_ignored() -> TestResult {
        let result = scan(&doc(&[
            ";FLAVOR:Marlin\nG1 X100 Y100 E5\n",
            ";LAYER:0\nG1 X10 Y10 E1\n",
            ";LAYER:1\nG1 X200 Y200 E1\n",
        ]))?;
        assert_eq!(
            result.footprint(),
            Some(BoundingBox {
                min_x: 10.0,
                max_x: 10.0,
                min_y: 10.0,
                max_y: 10.0,
            })
        );
        Ok(())
    }

    #[test]
    fn test_window_covers_whole_segment() -> TestResult {
        // Moves ahead of the marker in the same segment still count.
        let result = scan(&doc(&[";FLAVOR:RepRap\nG1 X1 Y150 E9\n;LAYER:0\nG1 X100 Y100 E1\n"]))?;
        assert_eq!(
            result.footprint(),
            Some(BoundingBox {
                min_x: 1.0,
                max_x: 100.0,
                min_y: 100.0,
                max_y: 150.0,
            })
        );
        Ok(())
    }

    #[test]
    fn test_segment_with_both_layer_markers_stays_open() -> TestResult {
        let result = scan(&doc(&[";FLAVOR:RepRap\n;LAYER:0\nG1 X10 Y10 E1\n;LAYER:1\nG1 X200 Y200 E1\n"]))?;
        let footprint = result.footprint().ok_or("no footprint")?;
        assert_eq!(footprint.max_x, 200.0);
        assert_eq!(footprint.max_y, 200.0);
        Ok(())
    }

    #[test]
    fn test_first_layer_window_reopens() -> TestResult {
        let result = scan(&doc(&[
            ";LAYER:0\nG1 X10 Y10 E1\n",
            ";LAYER:1\nG1 X200 Y200 E1\n",
            ";LAYER:0\nG1 X20 Y30 E1\n",
        ]))?;
        let footprint = result.footprint().ok_or("no footprint")?;
        assert_eq!(footprint.max_x, 20.0);
        assert_eq!(footprint.max_y, 30.0);
        Ok(())
    }

    #[test]
    fn test_non_extrusion_lines_are_skipped() -> TestResult {
        let result = scan(&doc(&[
            ";LAYER:0\nG0 X50 Y50 F3000\ng1 X60 Y60 E1\nG1 Z0.2 E1\nG92 E0\nM104 S200\nG1 X70 E1\n",
        ]))?;
        assert!(!result.found_model);
        assert_eq!(result.footprint(), None);
        assert_eq!(result.bounds, BoundingBox::EMPTY);
        Ok(())
    }

    #[test]
    fn test_lowercase_axes_match() -> TestResult {
        let result = scan(&doc(&[";LAYER:0\nG1 x12.5 y-3.25 E1\n"]))?;
        let footprint = result.footprint().ok_or("no footprint")?;
        assert_eq!(footprint.min_x, 12.5);
        assert_eq!(footprint.min_y, -3.25);
        Ok(())
    }

    #[test]
    fn test_bed_limits_last_wins_in_any_layer() -> TestResult {
        let result = scan(&doc(&[
            ";BED_LIMITS X220.0 Y220.0\n",
            ";LAYER:0\nG1 X10 Y10 E1\n",
            ";LAYER:1\n;BED_LIMITS X250.0 Y210.0\n",
        ]))?;
        assert_eq!(result.bed, BedSize { x: 250.0, y: 210.0 });
        Ok(())
    }

    #[test]
    fn test_bed_default_and_override() -> TestResult {
        let mut scanner = Scanner::new(BedSize { x: 180.0, y: 180.0 });
        scanner.feed_line(";BED_LIMITS without numbers")?;
        assert_eq!(scanner.finish().bed, BedSize { x: 180.0, y: 180.0 });

        assert_eq!(scan(&Document::default())?.bed, BedSize::default());
        Ok(())
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let err = scan(&doc(&[";LAYER:0\nG1 X1.2.3 Y4 E1\n"])).unwrap_err();
        match err {
            Error::InvalidNumber { line, token, .. } => {
                assert_eq!(line, 2);
                assert_eq!(token, "1.2.3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_crlf_lines() -> TestResult {
        let result = scan(&doc(&[";LAYER:0\r\nG1 X3 Y4 E1\r\n;BED_LIMITS X200 Y190\r\n"]))?;
        assert_eq!(result.bed, BedSize { x: 200.0, y: 190.0 });
        assert!(result.found_model);
        Ok(())
    }
}
