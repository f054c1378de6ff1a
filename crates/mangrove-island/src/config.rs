//! Island geometry configuration.

use mangrove_protocol::Position;

/// Extents of a player island and the point where players appear on it.
///
/// Every island shares one geometry. Coordinates are client pixels;
/// the defaults match the reference client's 1000×700 scene, with the
/// spawn point centered on the dock sprite near the bottom edge.
#[derive(Debug, Clone, Copy)]
pub struct IslandConfig {
    /// Island width; valid x is `0.0..=width`.
    pub width: f64,
    /// Island height; valid y is `0.0..=height`.
    pub height: f64,
    /// Where a player stands after landing on their own island.
    pub spawn: Position,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            // 500 - 16/2, 700 - 33 - 31: sprite-centered dock position.
            spawn: Position::new(492.0, 636.0),
        }
    }
}

impl IslandConfig {
    /// Returns `true` if `(x, y)` lies within the island extents.
    ///
    /// NaN fails every comparison and is therefore rejected here,
    /// which keeps NaN out of stored positions entirely.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}
