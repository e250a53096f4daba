//! Purge point and probe mesh placement.
//!
//! Everything here is pure arithmetic over the scanned first-layer bounds.

use serde::Serialize;

use crate::{
    config::{PurgeConfig, PurgePattern},
    scan::{BedSize, BoundingBox},
};

/// Lowest X the purge may start at, keeping it on the bed.
const PURGE_X_FLOOR: f64 = 0.5;
/// Padding around the model, and inset from the bed edge, for the mesh.
const MESH_MARGIN: f64 = 10.0;
/// Probe spacing before the mesh is shrunk to fit small models.
const NOMINAL_SPACING: f64 = 50.0;
/// Densest probe spacing allowed.
const MIN_SPACING: f64 = 15.0;

/// Where the purge starts (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurgePoint {
    /// X coordinate (mm).
    pub x: f64,
    /// Y coordinate (mm).
    pub y: f64,
}

/// Rectangle to probe for the bed mesh, and the spacing between points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeRegion {
    /// Left edge (mm).
    pub min_x: f64,
    /// Right edge (mm).
    pub max_x: f64,
    /// Front edge (mm).
    pub min_y: f64,
    /// Back edge (mm).
    pub max_y: f64,
    /// Distance between probe points (mm).
    pub spacing: u32,
}

/// The values injected into the program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plan {
    /// Purge start.
    pub purge: PurgePoint,
    /// Mesh probing area.
    pub probe: ProbeRegion,
    /// Distance and shape, when the config emits them.
    pub pattern: Option<PurgePattern>,
}

/// Compute the purge point and probe region for a first-layer footprint.
///
/// `bounds` must come from a scan that found at least one extrusion move.
pub fn plan(bounds: &BoundingBox, bed: &BedSize, config: &PurgeConfig) -> Plan {
    let purge = PurgePoint {
        x: (bounds.min_x - config.x_offset()).max(PURGE_X_FLOOR),
        y: bounds.min_y,
    };

    let min_x = (bounds.min_x - MESH_MARGIN).max(MESH_MARGIN);
    let max_x = (bounds.max_x + MESH_MARGIN).min(bed.x - MESH_MARGIN);
    let min_y = (bounds.min_y - MESH_MARGIN).max(MESH_MARGIN);
    let max_y = (bounds.max_y + MESH_MARGIN).min(bed.y - MESH_MARGIN);

    Plan {
        purge,
        probe: ProbeRegion {
            min_x,
            max_x,
            min_y,
            max_y,
            spacing: probe_spacing(max_x - min_x, max_y - min_y),
        },
        pattern: config.pattern(),
    }
}

// The Y check must see the spacing the X check left behind.
fn probe_spacing(x_span: f64, y_span: f64) -> u32 {
    let mut spacing = NOMINAL_SPACING;
    if x_span < spacing {
        spacing = x_span / 2.0;
    }
    if y_span < spacing {
        spacing = spacing.min(y_span / 2.0);
    }
    spacing.trunc().max(MIN_SPACING) as u32
}
