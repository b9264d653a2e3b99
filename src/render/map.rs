// Map projection and PNG rendering.
// Projects lon/lat county shapes to metres and draws them filled with region colours.

use std::fs;
use std::path::Path;

use geo::{BoundingRect, MapCoords, MultiPolygon};
use plotters::prelude::{
    BitMapBackend, Color, IntoDrawingArea, PathElement, Polygon as FilledPolygon, RGBColor, WHITE,
};
use tracing::debug;

use crate::error::{BotError, Result};

use super::palette::Rgb;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Blank border around the drawing, in pixels.
const MARGIN_PX: f64 = 20.0;

const OUTLINE: RGBColor = RGBColor(40, 40, 40);

fn render_err(e: impl std::fmt::Display) -> BotError {
    BotError::Render(e.to_string())
}

/// Combined bounding box of every shape as `(min_x, min_y, max_x, max_y)`.
pub fn bounds(shapes: &[MultiPolygon<f64>]) -> Option<(f64, f64, f64, f64)> {
    shapes
        .iter()
        .filter_map(|shape| shape.bounding_rect())
        .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
}

/// Equirectangular projection of lon/lat degrees to metres, centred on the
/// latitude midpoint of the collection so east-west distances are not stretched.
pub fn project(shapes: &[MultiPolygon<f64>]) -> Vec<MultiPolygon<f64>> {
    let Some((_, min_lat, _, max_lat)) = bounds(shapes) else {
        return shapes.to_vec();
    };
    let cos_lat = ((min_lat + max_lat) / 2.0).to_radians().cos();

    shapes
        .iter()
        .map(|shape| {
            shape.map_coords(|c| geo::Coord {
                x: EARTH_RADIUS_M * c.x.to_radians() * cos_lat,
                y: EARTH_RADIUS_M * c.y.to_radians(),
            })
        })
        .collect()
}

/// Maps planar coordinates onto the canvas, preserving aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    min_x: f64,
    min_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: f64,
}

impl Frame {
    /// Fit `bounds` into a `width` x `height` canvas, centred, inside the margin.
    pub fn fit(bounds: (f64, f64, f64, f64), width: u32, height: u32) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        let avail_w = (f64::from(width) - 2.0 * MARGIN_PX).max(1.0);
        let avail_h = (f64::from(height) - 2.0 * MARGIN_PX).max(1.0);
        let span_x = (max_x - min_x).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);
        let scale = (avail_w / span_x).min(avail_h / span_y);

        Self {
            min_x,
            min_y,
            scale,
            offset_x: MARGIN_PX + (avail_w - span_x * scale) / 2.0,
            offset_y: MARGIN_PX + (avail_h - span_y * scale) / 2.0,
            height: f64::from(height),
        }
    }

    /// Pixel position of a planar point; y grows downward on the canvas.
    pub fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        let px = self.offset_x + (x - self.min_x) * self.scale;
        let py = self.height - (self.offset_y + (y - self.min_y) * self.scale);
        (px.round() as i32, py.round() as i32)
    }
}

/// Draw every shape's exterior rings, filled per `fills`, and write a PNG to `path`.
///
/// `fills` is aligned with `shapes` by index; `None` leaves a shape unfilled.
pub fn render_map(
    path: &Path,
    shapes: &[MultiPolygon<f64>],
    fills: &[Option<Rgb>],
    width: u32,
    height: u32,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    if let Some(bounds) = bounds(shapes) {
        let frame = Frame::fit(bounds, width, height);

        for (i, shape) in shapes.iter().enumerate() {
            let fill = fills.get(i).copied().flatten();
            for polygon in shape {
                let points: Vec<(i32, i32)> = polygon
                    .exterior()
                    .coords()
                    .map(|c| frame.to_pixel(c.x, c.y))
                    .collect();

                if let Some(Rgb(r, g, b)) = fill {
                    root.draw(&FilledPolygon::new(
                        points.clone(),
                        RGBColor(r, g, b).filled(),
                    ))
                    .map_err(render_err)?;
                }
                root.draw(&PathElement::new(points, OUTLINE.stroke_width(1)))
                    .map_err(render_err)?;
            }
        }
    }

    root.present().map_err(render_err)?;
    debug!(path = %path.display(), width, height, "rendered map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord};
    use tempfile::TempDir;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        let rect = Rect::new(coord! { x: x, y: y }, coord! { x: x + size, y: y + size });
        MultiPolygon::new(vec![rect.to_polygon()])
    }

    #[test]
    fn test_bounds() {
        let shapes = vec![square(-120.0, 35.0, 1.0), square(-118.0, 37.0, 0.5)];
        assert_eq!(bounds(&shapes), Some((-120.0, 35.0, -117.5, 37.5)));
        assert_eq!(bounds(&[]), None);
    }

    #[test]
    fn test_projection_shrinks_longitude() {
        let shapes = vec![square(-120.0, 37.0, 1.0)];
        let projected = project(&shapes);

        let (min_x, min_y, max_x, max_y) = bounds(&projected).unwrap();
        let width = max_x - min_x;
        let height = max_y - min_y;

        // One degree of latitude is about 111 km; longitude is narrower at 37.5°N.
        assert!((height - 111_195.0).abs() < 100.0);
        assert!(width < height);
        assert!((width / height - 37.5f64.to_radians().cos()).abs() < 1e-9);
    }

    #[test]
    fn test_frame_fits_canvas() {
        let frame = Frame::fit((0.0, 0.0, 200.0, 100.0), 440, 440);

        let (x0, y0) = frame.to_pixel(0.0, 0.0);
        let (x1, y1) = frame.to_pixel(200.0, 100.0);

        assert_eq!((x0, x1), (20, 420));
        // Wide content is centred vertically and y is flipped.
        assert_eq!((y0, y1), (320, 120));
    }

    #[test]
    fn test_render_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("map.png");

        let shapes = project(&[square(-122.0, 37.0, 1.0), square(-121.0, 37.0, 1.0)]);
        let fills = vec![Some(Rgb(229, 0, 0)), None];

        render_map(&path, &shapes, &fills, 200, 150).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
