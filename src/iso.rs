//! Cartesian ⇄ isometric projection.
//!
//! All integer divisions floor (towards negative infinity) so that tiles on
//! either side of the origin line up the same way.

/// World/tile space to isometric screen space.
pub fn cartesian_to_iso(x: i32, y: i32) -> (i32, i32) {
    (x - y, (x + y).div_euclid(2))
}

/// Tile grid index to screen pixels for a `tile_w` × `tile_h` diamond.
pub fn iso_to_cartesian(x: i32, y: i32, tile_w: i32, tile_h: i32) -> (i32, i32) {
    (
        ((x - y) * tile_w).div_euclid(2),
        ((x + y) * tile_h).div_euclid(2),
    )
}

/// Inverse of [`cartesian_to_iso`]; exact up to the floor in the forward map.
pub fn screen_to_world(sx: i32, sy: i32) -> (i32, i32) {
    // x + y lies in {2*sy, 2*sy + 1}; pick the one with the parity of sx.
    let sum = 2 * sy + (sx - 2 * sy).rem_euclid(2);
    ((sum + sx).div_euclid(2), (sum - sx).div_euclid(2))
}

/// Floating-point projection used for sub-tile positions.
pub fn project(x: f32, y: f32) -> (f32, f32) {
    (x - y, ((x + y) / 2.0).floor())
}
