//! Value snapshot of a body for the rendering boundary

use serde::Serialize;

use crate::body::BodyId;
use crate::properties::BodyColor;

/// One body's render state at the end of a cycle
///
/// An independent value copy with no aliasing back into the simulation: the
/// renderer may outlive or fall behind the compute loop without holding
/// references to live bodies. Meshes and lights are keyed by `id`; a body's
/// first appearance implies creation and `exists == false` implies removal.
/// Radius and color may change between snapshots of the same id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Renderable {
    pub id: BodyId,
    pub exists: bool,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub is_sun: bool,
    /// Light intensity; meaningful only when `is_sun` is set
    pub intensity: f64,
    pub color: BodyColor,
}
