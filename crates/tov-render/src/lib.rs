//! Compositing and hit testing for text overlays.
//!
//! The render pass in [`compose`] is written once against the
//! [`Rasterizer`] trait; backends supply the pixels (software, Canvas2D)
//! or record the calls (tests, headless layout).

pub mod compose;
pub mod error;
pub mod hit;
pub mod raster;
pub mod recording;
#[cfg(feature = "software")]
pub mod software;

pub use compose::{Compositor, Frame, LayerBox, fit_contain};
pub use error::{LoadError, RenderError};
pub use hit::{display_to_canvas, hit_test};
pub use raster::{FontSpec, ImageSize, Rasterizer, StrokeStyle};
pub use recording::{DrawCall, RecordedImage, RecordingRasterizer};
#[cfg(feature = "software")]
pub use software::{FontBook, SoftwareRasterizer, load_image, load_image_file};
