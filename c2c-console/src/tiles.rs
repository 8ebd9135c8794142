//! Slippy-map tile addressing.
//!
//! Tiles are served under `maps/{z}/{x}/{y}` with the operator key forwarded
//! as the `key` query parameter.

use crate::error::Result;
use crate::gateway::{build_url, Command, Param};
use std::fmt;
use url::Url;

/// Tile URL template with `{z}`, `{x}`, `{y}` and `{accessToken}` placeholders,
/// relative to the API prefix.
pub const TILE_URL_TEMPLATE: &str = "maps/{z}/{x}/{y}?key={accessToken}";

/// Highest zoom level the tiling scheme defines.
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinate in the standard XYZ scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Coordinate, or `None` if `x`/`y` fall outside the zoom level's grid.
    pub fn new(z: u8, x: u32, y: u32) -> Option<Self> {
        if z > MAX_ZOOM {
            return None;
        }
        let side = 1u32 << z;
        (x < side && y < side).then_some(Self { z, x, y })
    }

    /// Tile containing the given WGS84 point.
    pub fn from_lat_lng(lat: f64, lng: f64, z: u8) -> Option<Self> {
        if z > MAX_ZOOM || !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        let side = f64::from(1u32 << z);
        let lat = lat.clamp(-85.051_128_78, 85.051_128_78).to_radians();
        let x = ((lng + 180.0) / 360.0 * side).floor();
        let y = ((1.0 - lat.tan().asinh() / std::f64::consts::PI) / 2.0 * side).floor();
        let max = side - 1.0;
        Self::new(z, x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
    }

    /// Command path of this tile.
    pub fn command(&self) -> String {
        format!("{}/{}/{}/{}", Command::Maps, self.z, self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Full URL of one tile.
pub fn tile_url(origin: &Url, api_prefix: &str, tile: TileCoord, access_key: &str) -> Result<Url> {
    build_url(origin, api_prefix, &tile.command(), &[Param::access_key(access_key)])
}

/// Template a map renderer can substitute itself, e.g.
/// `https://host:6060/api/v1/maps/{z}/{x}/{y}?key={accessToken}`.
///
/// The base is resolved by [`build_url`], so it always agrees with
/// [`tile_url`].
pub fn tile_template(origin: &Url, api_prefix: &str) -> Result<String> {
    let maps = format!("{}/", Command::Maps);
    let base = build_url(origin, api_prefix, &maps, &[])?;
    let placeholders = TILE_URL_TEMPLATE.strip_prefix(maps.as_str()).unwrap_or(TILE_URL_TEMPLATE);
    Ok(format!("{}{}", base, placeholders))
}
