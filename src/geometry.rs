//! Geometry literals to bounding boxes
//!
//! Understands WKT (with an optional `<crs-iri>` prefix as GeoSPARQL
//! writes it), JSON arrays of four numbers and schema.org `box`/point
//! values. Anything else yields `None`; callers log and drop it.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::mapping::GeometryEncoding;

/// EPSG code assumed when no CRS is given (WGS 84)
pub const DEFAULT_CRS: u32 = 4326;

/// A bounding box with its coordinate reference system
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialExtent {
    /// `[minx, miny, maxx, maxy]`
    pub bbox: [f64; 4],
    pub crs: u32,
}

impl SpatialExtent {
    pub fn new(bbox: [f64; 4]) -> Self {
        Self {
            bbox,
            crs: DEFAULT_CRS,
        }
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new([lon, lat, lon, lat])
    }

    pub fn to_value(&self) -> Value {
        json!({"bbox": self.bbox, "crs": self.crs})
    }
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn crs_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^\s*<([^>]*)>\s*(.*)$")
}

fn wkt_geometry() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &RE,
        r"(?is)^\s*(POINT|LINESTRING|POLYGON|MULTIPOINT|MULTILINESTRING|MULTIPOLYGON|ENVELOPE)\s*(ZM|Z|M)?\s*\((.*)\)\s*$",
    )
}

fn number() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
}

fn epsg_code() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)EPSG(?:/0/|:+|/)(\d+)")
}

/// Parse a geometry literal according to its declared encoding
pub fn parse_geometry(text: &str, encoding: GeometryEncoding) -> Option<SpatialExtent> {
    match encoding {
        GeometryEncoding::Wkt => parse_wkt(text).or_else(|| parse_bbox_array(text)),
        GeometryEncoding::Bbox => parse_bbox_array(text),
        GeometryEncoding::SchemaBox => parse_schema_box(text),
        // Points come as latitude/longitude pairs from separate predicates
        GeometryEncoding::SchemaPoint => None,
    }
}

/// Parse any supported geometry literal, trying WKT first
pub fn parse_any(text: &str) -> Option<SpatialExtent> {
    parse_wkt(text).or_else(|| parse_bbox_array(text))
}

/// Parse a WKT literal into the bounding box of its coordinates
pub fn parse_wkt(text: &str) -> Option<SpatialExtent> {
    let (crs, body) = match crs_prefix()?.captures(text) {
        Some(caps) => {
            let iri = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            (crs_from_iri(iri)?, body)
        }
        None => (DEFAULT_CRS, text),
    };

    let caps = wkt_geometry()?.captures(body)?;
    let kind = caps.get(1)?.as_str().to_ascii_uppercase();
    let dims = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(d) if d == "ZM" => 4,
        Some(_) => 3,
        None => 2,
    };
    let numbers: Vec<f64> = number()?
        .find_iter(caps.get(3)?.as_str())
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let bbox = if kind == "ENVELOPE" {
        // ENVELOPE(minx, maxx, maxy, miny)
        match numbers.as_slice() {
            [minx, maxx, maxy, miny] => [*minx, *miny, *maxx, *maxy],
            _ => return None,
        }
    } else {
        if numbers.is_empty() || numbers.len() % dims != 0 {
            return None;
        }
        bounds(numbers.chunks(dims).map(|c| (c[0], c[1])))?
    };

    Some(SpatialExtent { bbox, crs })
}

fn bounds(points: impl Iterator<Item = (f64, f64)>) -> Option<[f64; 4]> {
    points.fold(None, |acc, (x, y)| match acc {
        None => Some([x, y, x, y]),
        Some([minx, miny, maxx, maxy]) => {
            Some([minx.min(x), miny.min(y), maxx.max(x), maxy.max(y)])
        }
    })
}

/// EPSG code named by a CRS IRI; CRS84 is WGS 84
fn crs_from_iri(iri: &str) -> Option<u32> {
    if iri.is_empty() || iri.ends_with("CRS84") {
        return Some(DEFAULT_CRS);
    }
    epsg_code()?.captures(iri)?.get(1)?.as_str().parse().ok()
}

/// Parse `[minx, miny, maxx, maxy]`, as JSON or comma-separated numbers
pub fn parse_bbox_array(text: &str) -> Option<SpatialExtent> {
    let trimmed = text.trim();
    let numbers: Vec<f64> = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items.iter().map(number_of).collect::<Option<_>>()?,
        _ => trimmed
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|s| s.trim().parse().ok())
            .collect::<Option<_>>()?,
    };
    bbox_from_numbers(&numbers)
}

/// Bounding box from exactly four numeric values in `minx miny maxx maxy`
/// order, as carried by RDF lists or separate literals
pub fn parse_bbox_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<SpatialExtent> {
    let numbers: Vec<f64> = values
        .into_iter()
        .map(|v| v.trim().parse().ok())
        .collect::<Option<_>>()?;
    bbox_from_numbers(&numbers)
}

fn bbox_from_numbers(numbers: &[f64]) -> Option<SpatialExtent> {
    match numbers {
        [minx, miny, maxx, maxy] => Some(SpatialExtent::new([*minx, *miny, *maxx, *maxy])),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a schema.org box: `"south west north east"` (latitude first)
pub fn parse_schema_box(text: &str) -> Option<SpatialExtent> {
    let numbers: Vec<f64> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    match numbers.as_slice() {
        [south, west, north, east] => Some(SpatialExtent::new([*west, *south, *east, *north])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wkt_polygon() {
        let extent =
            parse_wkt("POLYGON((-141 42, -52 42, -52 84, -141 84, -141 42))").unwrap();
        assert_eq!(extent.bbox, [-141.0, 42.0, -52.0, 84.0]);
        assert_eq!(extent.crs, 4326);
    }

    #[test]
    fn test_wkt_with_crs_prefix() {
        let extent = parse_wkt(
            "<http://www.opengis.net/def/crs/EPSG/0/3857> POINT(1000.5 2000)",
        )
        .unwrap();
        assert_eq!(extent.bbox, [1000.5, 2000.0, 1000.5, 2000.0]);
        assert_eq!(extent.crs, 3857);

        let extent = parse_wkt(
            "<http://www.opengis.net/def/crs/OGC/1.3/CRS84> POINT(10 20)",
        )
        .unwrap();
        assert_eq!(extent.crs, 4326);
    }

    #[test]
    fn test_wkt_with_z() {
        let extent = parse_wkt("LINESTRING Z (0 0 5, 10 20 7)").unwrap();
        assert_eq!(extent.bbox, [0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_envelope() {
        let extent = parse_wkt("ENVELOPE(-10, 10, 50, 40)").unwrap();
        assert_eq!(extent.bbox, [-10.0, 40.0, 10.0, 50.0]);
    }

    #[test]
    fn test_unparsable_wkt() {
        assert!(parse_wkt("CIRCLE(0 0, 5)").is_none());
        assert!(parse_wkt("POINT(1)").is_none());
        assert!(parse_wkt("<urn:unknown-crs> POINT(1 2)").is_none());
    }

    #[test]
    fn test_bbox_array() {
        let extent = parse_bbox_array("[-141, 42, -52, 84]").unwrap();
        assert_eq!(extent.bbox, [-141.0, 42.0, -52.0, 84.0]);
        assert!(parse_bbox_array("[1, 2, 3]").is_none());
        assert!(parse_bbox_array("not, numbers, at, all").is_none());
    }

    #[test]
    fn test_bbox_values() {
        let extent = parse_bbox_values(["0", "0", "1.5E1", " 10 "]).unwrap();
        assert_eq!(extent.bbox, [0.0, 0.0, 15.0, 10.0]);
        assert!(parse_bbox_values(["1", "2", "3"]).is_none());
        assert!(parse_bbox_values(["1", "2", "3", "north"]).is_none());
    }

    #[test]
    fn test_schema_box_swaps_axes() {
        let extent = parse_schema_box("42 -141 84 -52").unwrap();
        assert_eq!(extent.bbox, [-141.0, 42.0, -52.0, 84.0]);
    }

    #[test]
    fn test_to_value() {
        let value = SpatialExtent::new([0.0, 1.0, 2.0, 3.0]).to_value();
        assert_eq!(value, json!({"bbox": [0.0, 1.0, 2.0, 3.0], "crs": 4326}));
    }
}
