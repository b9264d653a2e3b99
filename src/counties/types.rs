// Nominatim GeoJSON response types.
// Deserializes search results and converts boundary geometry into geo multipolygons.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;

/// A GeoJSON linear ring as `[lon, lat]` pairs.
type Ring = Vec<[f64; 2]>;

/// Search results returned with `format=geojson`.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A single search hit.
#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureProperties {
    pub display_name: Option<String>,
}

/// Boundary geometry of a hit. Counties come back as polygons or multipolygons.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Convert into a multipolygon in the source lon/lat degrees.
    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        match self {
            Geometry::Polygon(rings) => MultiPolygon::new(vec![polygon(rings)]),
            Geometry::MultiPolygon(polys) => {
                MultiPolygon::new(polys.into_iter().map(polygon).collect())
            }
        }
    }
}

fn ring(points: Ring) -> LineString<f64> {
    points
        .into_iter()
        .map(|[x, y]| Coord { x, y })
        .collect()
}

fn polygon(mut rings: Vec<Ring>) -> Polygon<f64> {
    if rings.is_empty() {
        return Polygon::new(LineString::new(Vec::new()), Vec::new());
    }
    let exterior = ring(rings.remove(0));
    let interiors = rings.into_iter().map(ring).collect();
    Polygon::new(exterior, interiors)
}
