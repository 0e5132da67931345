//! Inputs handed to the map display collaborator.
//!
//! The core supplies a centre, zoom, marker popup and tile-layer
//! source; rendering belongs to the presentation layer. `leaflet_html`
//! is the hand-off the terminal tool uses to open a one-tile preview
//! in a browser.

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;

/// Satellite basemap source. The observed labeling screens differed
/// only in which of these they mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapProvider {
    EsriWorldImagery,
    GoogleSatellite,
    OpenStreetMap,
}

impl MapProvider {
    /// Slippy-map URL template for the tile layer.
    pub fn tile_url(self) -> &'static str {
        match self {
            MapProvider::EsriWorldImagery => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
            MapProvider::GoogleSatellite => "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}",
            MapProvider::OpenStreetMap => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        }
    }

    pub fn attribution(self) -> &'static str {
        match self {
            MapProvider::EsriWorldImagery => "Esri World Imagery",
            MapProvider::GoogleSatellite => "Google",
            MapProvider::OpenStreetMap => "OpenStreetMap contributors",
        }
    }
}

/// Everything the collaborator needs to show one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u32,
    /// Marker popup text, `Image: <id>`.
    pub popup: String,
    pub provider: MapProvider,
}

impl MapView {
    pub fn for_tile(id: &str, center: LatLon, provider: MapProvider, zoom: u32) -> Self {
        Self {
            center,
            zoom,
            popup: format!("Image: {id}"),
            provider,
        }
    }

    /// Render a self-contained Leaflet page: basemap, one marker, the
    /// popup already open. No state of ours leaks in; the page is the
    /// whole hand-off.
    pub fn leaflet_html(&self) -> String {
        PAGE_TEMPLATE
            .replace("__LAT__", &self.center.lat.to_string())
            .replace("__LON__", &self.center.lon.to_string())
            .replace("__ZOOM__", &self.zoom.to_string())
            .replace("__TILE_URL__", self.provider.tile_url())
            .replace("__ATTRIBUTION__", self.provider.attribution())
            .replace("__POPUP__", &html_escape(&self.popup))
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Tile preview</title>
  <link
    rel="stylesheet"
    href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
    crossorigin=""
  />
  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { height: 100%; width: 100%; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script
    src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
    crossorigin=""
  ></script>
  <script>
    const map = L.map('map').setView([__LAT__, __LON__], __ZOOM__);
    L.tileLayer('__TILE_URL__', { attribution: '__ATTRIBUTION__' }).addTo(map);
    L.marker([__LAT__, __LON__]).addTo(map).bindPopup('__POPUP__').openPopup();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_carries_popup_and_provider() {
        let view = MapView::for_tile(
            "28.6583_76.2294.png",
            LatLon::new(28.6583, 76.2294),
            MapProvider::EsriWorldImagery,
            16,
        );
        assert_eq!(view.popup, "Image: 28.6583_76.2294.png");
        assert!(view.provider.tile_url().contains("World_Imagery"));
    }

    #[test]
    fn leaflet_page_substitutes_every_placeholder() {
        let view = MapView::for_tile(
            "29.0_77.0.png",
            LatLon::new(29.0, 77.0),
            MapProvider::OpenStreetMap,
            14,
        );
        let html = view.leaflet_html();
        assert!(html.contains("setView([29, 77], 14)"));
        assert!(html.contains("tile.openstreetmap.org"));
        assert!(html.contains("Image: 29.0_77.0.png"));
        assert!(!html.contains("__"), "unsubstituted placeholder left in page");
    }
}
