#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate post-processes sliced G-code for RepRapFirmware printers.
//!
//! It finds the footprint of the first printed layer, places a purge just
//! left of it and sizes a bed-mesh probe region around it, then writes the
//! result into the program header as firmware variables and an `M557`
//! command:
//!
//! ```text
//! ; --- RRF ADAPTIVE DATA ---
//! set global.purge_x = 0.500
//! set global.purge_y = 10.000
//! set global.purge_dist = 30.000
//! set global.purge_shape = 0
//! M557 X10.0:60.0 Y10.0:20.0 S15
//! ; -------------------------
//! ```

pub mod config;
pub mod document;
mod error;
pub mod inject;
pub mod markers;
pub mod plan;
pub mod scan;

pub use config::{Config, PurgeConfig, PurgePattern, PurgeShape};
pub use document::Document;
pub use error::{Error, Result};
pub use inject::{inject, InjectionBlock};
pub use plan::{plan, Plan, ProbeRegion, PurgePoint};
pub use scan::{scan, BedSize, BoundingBox, ScanResult, Scanner};

/// Scan a document and compute its plan, without modifying anything.
///
/// Returns `None` when the first layer has no extrusion moves.
pub fn analyze(document: &Document, config: &Config) -> Result<Option<Plan>> {
    let mut scanner = Scanner::new(config.bed);
    for segment in document.segments() {
        scanner.feed_segment(segment)?;
    }
    let scanned = scanner.finish();

    Ok(scanned.footprint().map(|footprint| {
        tracing::debug!(
            min_x = footprint.min_x,
            max_x = footprint.max_x,
            min_y = footprint.min_y,
            max_y = footprint.max_y,
            bed_x = scanned.bed.x,
            bed_y = scanned.bed.y,
            "first layer footprint"
        );
        plan(&footprint, &scanned.bed, &config.purge)
    }))
}

/// Insert the adaptive purge and mesh block into a document.
///
/// The document comes back untouched when there is no first-layer
/// extrusion or no `;FLAVOR:` anchor.
#[tracing::instrument(skip_all, fields(segments = document.segments().len()))]
pub fn transform(document: Document, config: &Config) -> Result<Document> {
    match analyze(&document, config)? {
        Some(plan) => Ok(inject(document, &plan)),
        None => {
            tracing::info!("no first layer extrusion found, leaving program untouched");
            Ok(document)
        }
    }
}
