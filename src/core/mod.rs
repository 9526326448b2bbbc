//! Core ungridding and footprint modeling modules

pub mod footprint;
pub mod geolocation;
pub mod scan_pixel;
pub mod tie_points;
pub mod ungrid;

// Re-export main types
pub use footprint::{pixel_footprint, FootprintExtentStrategy, FootprintTable, ThresholdCrossingExtent};
pub use scan_pixel::ScanPixel;
pub use tie_points::PixelCoordinates;
pub use ungrid::{image_column_to_pixel, Ungridder, PIXELS_PER_ROW};
