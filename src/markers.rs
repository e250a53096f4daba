//! Comment markers the slicer writes into the program.

/// Start of the first printed layer.
pub const FIRST_LAYER: &str = ";LAYER:0";

/// Start of the second printed layer; ends the first-layer window.
pub const SECOND_LAYER: &str = ";LAYER:1";

/// Any layer boundary. Used to split a flat program into segments.
pub const LAYER: &str = ";LAYER:";

/// Bed dimensions, as `;BED_LIMITS ... X<width> ... Y<depth>`.
pub const BED_LIMITS: &str = ";BED_LIMITS";

/// G-code dialect header. The adaptive block is anchored here.
pub const FLAVOR: &str = ";FLAVOR:";
