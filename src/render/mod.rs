// Presentation module.
// Colours, post text, and the rendered map image for a partition.

pub mod map;
pub mod palette;
pub mod text;

pub use map::{project, render_map};
pub use palette::{Palette, holiday_colors};
pub use text::{image_description, post_text};
