use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic fill value for undefined geolocation, time and footprint output.
pub const NO_DATA: f64 = -999999.0;

/// Reserved fill value for pixels whose scan precedes the first ADS record.
/// Current (A)ATSR products never produce it; the first tie record is
/// clamped to instead.
pub const BELOW_FIRST_SCAN: f64 = -888888.0;

/// Tie-point correction value meaning "no correction available".
pub const CORRECTION_UNAVAILABLE: i32 = -999999;

/// The two looking geometries of the dual-view instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Nadir,
    Forward,
}

/// AATSR spectral channels as numbered in the FOV measurement file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Ir12,
    Ir11,
    Ir37,
    Swir16,
    Vis87,
    Vis66,
    Vis56,
}

impl Channel {
    /// Map the header channel number (0..=6) to a channel.
    pub fn from_index(index: i32) -> UngridResult<Channel> {
        match index {
            0 => Ok(Channel::Ir12),
            1 => Ok(Channel::Ir11),
            2 => Ok(Channel::Ir37),
            3 => Ok(Channel::Swir16),
            4 => Ok(Channel::Vis87),
            5 => Ok(Channel::Vis66),
            6 => Ok(Channel::Vis56),
            _ => Err(UngridError::UnknownChannel(index)),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Ir12 => write!(f, "12um"),
            Channel::Ir11 => write!(f, "11um"),
            Channel::Ir37 => write!(f, "3.7um"),
            Channel::Swir16 => write!(f, "1.6um"),
            Channel::Vis87 => write!(f, "0.87um"),
            Channel::Vis66 => write!(f, "0.66um"),
            Channel::Vis56 => write!(f, "0.56um"),
        }
    }
}

/// Calibrated instrument field-of-view response on the uniform 31x31
/// angular grid (20 arcsec step, -300..+300 arcsec, centred on the
/// response centroid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FovCalibration {
    pub channel: Channel,
    /// Along-track angle of each sample, arcsec (961 values)
    pub along_track_angle: Vec<f64>,
    /// Across-track angle of each sample, arcsec (961 values)
    pub across_track_angle: Vec<f64>,
    /// Normalised response in [0, 1] (961 values)
    pub response: Vec<f64>,
}

/// Immutable per-run instrument configuration, built once before any
/// per-pixel processing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentParameters {
    /// Instrument pixel number of the first nadir-view image pixel
    pub first_nadir_pixel: i32,
    /// Instrument pixel number of the first forward-view image pixel
    pub first_forward_pixel: i32,
    /// FOV calibration; absent when footprint reporting is not requested
    pub fov: Option<FovCalibration>,
    /// Response threshold in [0, 1] delimiting the reported footprint
    pub reporting_extent: f64,
    /// Reference coordinates to the pixel corner instead of its centre
    pub corner_reference: bool,
    /// Apply topographic corrections near tie points
    pub topographic: bool,
    /// Distance (image coordinates) a pixel can be from a tie point to
    /// have the topographic correction applied
    pub topography_homogeneity: f64,
}

impl InstrumentParameters {
    pub fn builder() -> InstrumentParametersBuilder {
        InstrumentParametersBuilder::default()
    }
}

/// Builder for [`InstrumentParameters`]; defaults match the original
/// AATSR processor configuration.
#[derive(Debug, Clone)]
pub struct InstrumentParametersBuilder {
    first_nadir_pixel: i32,
    first_forward_pixel: i32,
    fov: Option<FovCalibration>,
    reporting_extent: f64,
    corner_reference: bool,
    topographic: bool,
    topography_homogeneity: f64,
}

impl Default for InstrumentParametersBuilder {
    fn default() -> Self {
        Self {
            first_nadir_pixel: crate::io::characterisation::DEFAULT_FIRST_NADIR_PIXEL,
            first_forward_pixel: crate::io::characterisation::DEFAULT_FIRST_FORWARD_PIXEL,
            fov: None,
            reporting_extent: 0.4,
            corner_reference: true,
            topographic: false,
            topography_homogeneity: 0.05,
        }
    }
}

impl InstrumentParametersBuilder {
    /// Set the first nadir/forward pixel numbers, typically read from the
    /// L1B characterisation file.
    pub fn first_pixels(mut self, nadir: i32, forward: i32) -> Self {
        self.first_nadir_pixel = nadir;
        self.first_forward_pixel = forward;
        self
    }

    pub fn fov_calibration(mut self, fov: FovCalibration) -> Self {
        self.fov = Some(fov);
        self
    }

    /// Extent of the IFOV to report, as a fraction of the peak response
    pub fn reporting_extent(mut self, extent: f64) -> Self {
        self.reporting_extent = extent;
        self
    }

    pub fn corner_reference(mut self, enabled: bool) -> Self {
        self.corner_reference = enabled;
        self
    }

    pub fn topographic_correction(mut self, enabled: bool, homogeneity: f64) -> Self {
        self.topographic = enabled;
        self.topography_homogeneity = homogeneity;
        self
    }

    pub fn build(self) -> InstrumentParameters {
        InstrumentParameters {
            first_nadir_pixel: self.first_nadir_pixel,
            first_forward_pixel: self.first_forward_pixel,
            fov: self.fov,
            reporting_extent: self.reporting_extent,
            corner_reference: self.corner_reference,
            topographic: self.topographic,
            topography_homogeneity: self.topography_homogeneity,
        }
    }
}

/// Geographic position in degrees, longitude in (-180, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Ungridded geolocation of one view of one image pixel.
///
/// `position` is `None` when the geolocation grid does not extend to the
/// pixel (last image rows of ATSR-1/2 products); the acquisition time is
/// still valid there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewGeolocation {
    pub position: Option<GeoPoint>,
    /// Acquisition time, days since 2000-01-01T00:00:00 UTC
    pub time_mjd2000: f64,
}

/// Per-view ungridding result.
///
/// `geolocation` is `None` exactly when the view ADS resolved the image
/// pixel to scan or pixel number 0 (absent or cosmetically filled pixel).
/// The relative pixel number is reported regardless, for footprint lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub pixel_number: i32,
    pub geolocation: Option<ViewGeolocation>,
}

impl ViewResult {
    /// Latitude in degrees, or [`NO_DATA`]
    pub fn latitude(&self) -> f64 {
        self.geolocation
            .and_then(|g| g.position)
            .map_or(NO_DATA, |p| p.latitude)
    }

    /// Longitude in degrees, or [`NO_DATA`]
    pub fn longitude(&self) -> f64 {
        self.geolocation
            .and_then(|g| g.position)
            .map_or(NO_DATA, |p| p.longitude)
    }

    /// Acquisition time in MJD2000, or [`NO_DATA`]
    pub fn time_mjd2000(&self) -> f64 {
        self.geolocation.map_or(NO_DATA, |g| g.time_mjd2000)
    }
}

/// Ungridded geolocation and timing of one image pixel, both views
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelGeolocation {
    pub nadir: ViewResult,
    pub forward: ViewResult,
}

/// Ground extent of one instrument pixel footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootprintDimension {
    pub along_track_km: f64,
    pub across_track_km: f64,
}

/// Convert an MJD2000 day count to a UTC timestamp.
///
/// Returns `None` for values outside the representable range (including
/// the [`NO_DATA`] sentinel).
pub fn mjd2000_to_datetime(days: f64) -> Option<DateTime<Utc>> {
    if !days.is_finite() || days == NO_DATA {
        return None;
    }
    // 2000-01-01T00:00:00 UTC as a unix timestamp
    const MJD2000_EPOCH_UNIX: i64 = 946_684_800;
    let seconds = days * 86400.0;
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1.0e9).round() as u32;
    DateTime::from_timestamp(MJD2000_EPOCH_UNIX + whole as i64, nanos)
}

/// Error types for the ungridding pipeline
#[derive(Debug, thiserror::Error)]
pub enum UngridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown channel number: {0}")]
    UnknownChannel(i32),

    #[error("malformed calibration data: {0}")]
    MalformedCalibration(String),

    #[error("data gap in scan pixel ADS record {record}: expected scan {expected}, found {found}")]
    AdsDataGap {
        record: usize,
        expected: i32,
        found: i32,
    },

    #[error("no FOV calibration loaded")]
    MissingFovCalibration,

    #[error("empty annotation data set: {0}")]
    EmptyAds(&'static str),
}

/// Result type for ungridding operations
pub type UngridResult<T> = Result<T, UngridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_index() {
        assert_eq!(Channel::from_index(0).unwrap(), Channel::Ir12);
        assert_eq!(Channel::from_index(6).unwrap(), Channel::Vis56);
        assert_eq!(format!("{}", Channel::from_index(2).unwrap()), "3.7um");
        assert!(matches!(
            Channel::from_index(7),
            Err(UngridError::UnknownChannel(7))
        ));
        assert!(matches!(
            Channel::from_index(-1),
            Err(UngridError::UnknownChannel(-1))
        ));
    }

    #[test]
    fn test_view_result_fill_flattening() {
        let undefined = ViewResult {
            pixel_number: 0,
            geolocation: None,
        };
        assert_eq!(undefined.latitude(), NO_DATA);
        assert_eq!(undefined.longitude(), NO_DATA);
        assert_eq!(undefined.time_mjd2000(), NO_DATA);

        let no_position = ViewResult {
            pixel_number: 120,
            geolocation: Some(ViewGeolocation {
                position: None,
                time_mjd2000: 1850.5,
            }),
        };
        assert_eq!(no_position.latitude(), NO_DATA);
        assert_eq!(no_position.time_mjd2000(), 1850.5);
    }

    #[test]
    fn test_mjd2000_to_datetime() {
        let epoch = mjd2000_to_datetime(0.0).unwrap();
        assert_eq!(epoch.to_rfc3339(), "2000-01-01T00:00:00+00:00");

        let half_day = mjd2000_to_datetime(0.5).unwrap();
        assert_eq!(half_day.to_rfc3339(), "2000-01-01T12:00:00+00:00");

        assert!(mjd2000_to_datetime(NO_DATA).is_none());
        assert!(mjd2000_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_builder_defaults() {
        let params = InstrumentParameters::builder().build();
        assert_eq!(params.first_nadir_pixel, 213);
        assert_eq!(params.first_forward_pixel, 1305);
        assert!(params.fov.is_none());
        assert_eq!(params.reporting_extent, 0.4);
        assert!(params.corner_reference);
        assert!(!params.topographic);
        assert_eq!(params.topography_homogeneity, 0.05);
    }
}
