//! aatsr-ungrid: An AATSR L1B ungridding and pixel field-of-view processor
//!
//! This library recovers the original (un-gridded) per-pixel geolocation,
//! acquisition time and instantaneous field-of-view footprint of (A)ATSR
//! Level-1B products from their annotation data sets, following the
//! published tie-point interpolation methodology and the RAL calibration
//! footprint model.

pub mod ads;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    mjd2000_to_datetime, Channel, FootprintDimension, FovCalibration, GeoPoint,
    InstrumentParameters, InstrumentParametersBuilder, PixelGeolocation, UngridError, UngridResult,
    View, ViewGeolocation, ViewResult, NO_DATA,
};

pub use ads::{
    GeolocationAds, GeolocationRecord, ScanTime, TiePointScanAds, TiePointScanRecord,
    ViewScanPixelAds, ViewScanPixelRecord,
};

pub use crate::core::{FootprintTable, Ungridder};
pub use crate::io::{load_fov_calibration, CharacterisationFile};
