//! Annotation Data Set (ADS) collaborator records.
//!
//! These are the read-only record types the host product model is adapted
//! into before ungridding starts. The core only ever reads them by record
//! index; record `i` nominally covers instrument scan `32*i + s0`. No code
//! in this crate mutates an ADS after construction, so they can be shared
//! freely across parallel workers.

use serde::{Deserialize, Serialize};

/// One record of the nadir or forward view scan/pixel number ADS
/// (ADS#1/ADS#2), covering 32 image rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewScanPixelRecord {
    /// Instrument scan number per image column; 0 means no original
    /// geolocation (absent or cosmetically filled pixel)
    pub instr_scan_num: Vec<i32>,
    /// Instrument pixel number per image column; 0 means no original
    /// geolocation
    pub pix_num: Vec<i32>,
}

/// Nadir or forward view scan/pixel number ADS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewScanPixelAds {
    pub records: Vec<ViewScanPixelRecord>,
}

impl ViewScanPixelAds {
    pub fn new(records: Vec<ViewScanPixelRecord>) -> Self {
        Self { records }
    }

    pub fn record(&self, index: usize) -> Option<&ViewScanPixelRecord> {
        self.records.get(index)
    }
}

/// DSR time triplet as stored in an ADS record header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanTime {
    /// Days since 2000-01-01 (MJD2000)
    pub days: i32,
    pub seconds: f64,
    pub microseconds: f64,
}

impl ScanTime {
    /// Collapse the triplet into a fractional MJD2000 day count.
    pub fn to_mjd2000(self) -> f64 {
        self.days as f64 + (self.seconds / 86400.0) + ((self.microseconds / 1.0e6) / 86400.0)
    }
}

/// One record of the scan pixel x/y coordinate ADS (ADS#4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiePointScanRecord {
    pub dsr_time: ScanTime,
    /// Instrument scan number this record was acquired at
    pub instr_scan_num: i32,
    /// Tie-point x coordinates, metres (nadir series then forward series)
    pub tie_pix_x: Vec<i32>,
    /// Tie-point y coordinates, metres
    pub tie_pix_y: Vec<i32>,
}

/// Scan pixel x/y coordinate ADS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TiePointScanAds {
    pub records: Vec<TiePointScanRecord>,
}

impl TiePointScanAds {
    pub fn new(records: Vec<TiePointScanRecord>) -> Self {
        Self { records }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Scan number of the first record (s0, nominally 32).
    pub fn first_scan_number(&self) -> Option<i32> {
        self.records.first().map(|r| r.instr_scan_num)
    }
}

/// One record of the geolocation ADS (ADS#3), carrying the lat/lon
/// tie-point grid and the optional topographic corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationRecord {
    /// Along-track coordinate of this tie scan, metres
    pub img_scan_y: i32,
    /// Tie-point latitudes, micro-degrees
    pub tie_pt_lat: Vec<i32>,
    /// Tie-point longitudes, micro-degrees
    pub tie_pt_long: Vec<i32>,
    /// Topographic corrections, micro-degrees;
    /// [`CORRECTION_UNAVAILABLE`](crate::types::CORRECTION_UNAVAILABLE)
    /// where no correction exists
    pub lat_corr_nadv: Vec<i32>,
    pub long_corr_nadv: Vec<i32>,
    pub lat_corr_forv: Vec<i32>,
    pub long_corr_forv: Vec<i32>,
}

/// Geolocation ADS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeolocationAds {
    pub records: Vec<GeolocationRecord>,
}

impl GeolocationAds {
    pub fn new(records: Vec<GeolocationRecord>) -> Self {
        Self { records }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, index: usize) -> Option<&GeolocationRecord> {
        self.records.get(index)
    }

    /// Extract the per-record along-track tie coordinates.
    ///
    /// Walking the records is expensive on the host side, so the engine
    /// computes this once up front and reuses it for every pixel.
    pub fn scan_y_coords(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.img_scan_y as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_time_to_mjd2000() {
        let t = ScanTime {
            days: 1850,
            seconds: 43200.0,
            microseconds: 0.0,
        };
        assert_eq!(t.to_mjd2000(), 1850.5);

        let with_micros = ScanTime {
            days: 0,
            seconds: 0.0,
            microseconds: 500_000.0,
        };
        assert!((with_micros.to_mjd2000() - 0.5 / 86400.0).abs() < 1.0e-12);
    }

    #[test]
    fn test_scan_y_coords() {
        let ads = GeolocationAds::new(vec![
            GeolocationRecord {
                img_scan_y: 0,
                tie_pt_lat: vec![],
                tie_pt_long: vec![],
                lat_corr_nadv: vec![],
                long_corr_nadv: vec![],
                lat_corr_forv: vec![],
                long_corr_forv: vec![],
            },
            GeolocationRecord {
                img_scan_y: 32352,
                tie_pt_lat: vec![],
                tie_pt_long: vec![],
                lat_corr_nadv: vec![],
                long_corr_nadv: vec![],
                lat_corr_forv: vec![],
                long_corr_forv: vec![],
            },
        ]);
        assert_eq!(ads.scan_y_coords(), vec![0.0, 32352.0]);
        assert!(ads.record(2).is_none());
    }
}
