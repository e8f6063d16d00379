use std::path::Path;

use geo_types::Point;
use log::debug;
use serde_json::{Value, json};

use crate::error::{Error, Result};

const LEAFLET_VERSION: &str = "1.9.4";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<style>
html, body { height: 100%; margin: 0; }
#map { position: absolute; top: 0; bottom: 0; left: 0; right: 0; }
</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView(__CENTER__, __ZOOM__);
L.tileLayer("https://tile.openstreetmap.org/{z}/{x}/{y}.png", {
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
}).addTo(map);
var layers = __LAYERS__;
L.geoJSON(layers, {
    style: function (feature) {
        return {
            color: feature.properties.color,
            weight: feature.properties.weight,
            opacity: feature.properties.opacity
        };
    },
    onEachFeature: function (feature, layer) {
        layer.bindTooltip(feature.properties.tooltip);
    }
}).addTo(map);
</script>
</body>
</html>
"#;

/// Drawing style of one polyline on the map
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub tooltip: &'static str,
}

pub const ORIGINAL_STYLE: LineStyle = LineStyle {
    color: "blue",
    weight: 2,
    opacity: 0.6,
    tooltip: "Original Trajectory",
};

pub const MATCHED_STYLE: LineStyle = LineStyle {
    color: "red",
    weight: 1,
    opacity: 0.6,
    tooltip: "Matched Trajectory",
};

fn line_feature(points: &[Point<f64>], style: &LineStyle) -> Value {
    let coords: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x(), p.y()]).collect();
    json!({
        "type": "Feature",
        "properties": {
            "color": style.color,
            "weight": style.weight,
            "opacity": style.opacity,
            "tooltip": style.tooltip
        },
        "geometry": {
            "type": "LineString",
            "coordinates": coords
        }
    })
}

/// Both paths as a styled GeoJSON FeatureCollection, original first
pub fn trajectory_layers(original: &[Point<f64>], matched: &[Point<f64>]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            line_feature(original, &ORIGINAL_STYLE),
            line_feature(matched, &MATCHED_STYLE)
        ]
    })
}

/// Build the HTML page, centered on the first original point
pub fn render_map_html(original: &[Point<f64>], matched: &[Point<f64>], zoom: u8) -> Result<String> {
    let center = original.first().ok_or(Error::EmptyTrajectory("original"))?;
    if matched.is_empty() {
        return Err(Error::EmptyTrajectory("matched"));
    }

    // A literal "</" would end the script element early
    let layers = trajectory_layers(original, matched)
        .to_string()
        .replace("</", "<\\/");
    let center = json!([center.y(), center.x()]).to_string();

    Ok(PAGE_TEMPLATE
        .replace("__TITLE__", "Trajectory Before and After Matching")
        .replace("__LEAFLET__", LEAFLET_VERSION)
        .replace("__CENTER__", &center)
        .replace("__ZOOM__", &zoom.to_string())
        .replace("__LAYERS__", &layers))
}

pub fn write_interactive_map(
    original: &[Point<f64>],
    matched: &[Point<f64>],
    path: &Path,
    zoom: u8,
) -> Result<()> {
    let html = render_map_html(original, matched, zoom)?;
    std::fs::write(path, html).map_err(|e| Error::io(path, e))?;
    debug!("Map written to {}", path.display());
    Ok(())
}
