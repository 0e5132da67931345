//! Geographic coordinate types and tile-identifier parsing.
//!
//! Tile identifiers encode the tile centre as `"<lat>_<lon>"`, optionally
//! suffixed with an image extension, e.g. `"28.6583_76.2294.png"`.
//! All coordinate math uses f64.

use crate::error::{Error, Result};

/// A point in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Image extensions stripped before the coordinate split.
const KNOWN_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".tif", ".tiff"];

fn strip_extension(id: &str) -> &str {
    for ext in KNOWN_EXTENSIONS {
        if let Some(stem) = id.strip_suffix(ext) {
            return stem;
        }
    }
    id
}

/// Parse a tile identifier into its encoded coordinates.
///
/// The stem must split on `_` into exactly two floating-point tokens
/// (decimal point only, no locale handling); anything else is a
/// malformed identifier.
pub fn extract(id: &str) -> Result<LatLon> {
    let stem = strip_extension(id);
    let mut tokens = stem.split('_');
    let lat_tok = tokens.next().unwrap_or_default();
    let lon_tok = match tokens.next() {
        Some(t) => t,
        None => return Err(Error::MalformedIdentifier(id.to_string())),
    };
    if tokens.next().is_some() {
        return Err(Error::MalformedIdentifier(id.to_string()));
    }

    let lat: f64 = lat_tok
        .parse()
        .map_err(|_| Error::MalformedIdentifier(id.to_string()))?;
    let lon: f64 = lon_tok
        .parse()
        .map_err(|_| Error::MalformedIdentifier(id.to_string()))?;
    Ok(LatLon::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn extracts_with_and_without_extension() {
        let ll = extract("28.6583_76.2294.png").unwrap();
        assert_relative_eq!(ll.lat, 28.6583);
        assert_relative_eq!(ll.lon, 76.2294);

        let ll = extract("29.0_77.0").unwrap();
        assert_relative_eq!(ll.lat, 29.0);
        assert_relative_eq!(ll.lon, 77.0);
    }

    #[test]
    fn extracts_negative_coordinates() {
        let ll = extract("-5.25_-120.5.jpg").unwrap();
        assert_relative_eq!(ll.lat, -5.25);
        assert_relative_eq!(ll.lon, -120.5);
    }

    #[test]
    fn roundtrip_formatted_ids() {
        let mut rng_state: u64 = 42;
        for _ in 0..1000 {
            // LCG for deterministic pseudo-random
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let lat = (rng_state as f64 / u64::MAX as f64) * 180.0 - 90.0;
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let lon = (rng_state as f64 / u64::MAX as f64) * 360.0 - 180.0;

            let id = format!("{lat}_{lon}.png");
            let ll = extract(&id).unwrap();
            assert_relative_eq!(ll.lat, lat);
            assert_relative_eq!(ll.lon, lon);
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "28.6583", "a_b.png", "1_2_3.png", "28,6_76,2.png"] {
            assert!(matches!(extract(bad), Err(Error::MalformedIdentifier(_))), "accepted {bad:?}");
        }
    }
}
