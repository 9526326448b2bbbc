use crate::ads::{GeolocationAds, TiePointScanAds};
use crate::types::{UngridError, UngridResult};

/// Tie-point spacing in instrument pixels
const PIXELS_PER_TIE_INTERVAL: f64 = 10.0;
/// Relative pixel index past which the final, 4-pixel tie interval applies
const LAST_INTERVAL_START: i32 = 570;
/// Tie-point index offset of the forward-view series within a record
const FORWARD_TIE_OFFSET: i32 = 59;
/// Scan period, seconds
const SCAN_PERIOD_SECONDS: f64 = 0.15;
/// Nominal along-track pixel spacing, metres
const NOMINAL_PIXEL_SPACING: f64 = 1011.0;

/// Raw instrument coordinates and acquisition time of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoordinates {
    /// Across-track coordinate, metres
    pub x: f64,
    /// Along-track coordinate, metres
    pub y: f64,
    /// Acquisition time, MJD2000
    pub time_mjd2000: f64,
}

/// Map an instrument (scan, pixel) to raw (x, y) coordinates and an
/// acquisition time by interpolating across the scan pixel ADS tie points.
///
/// Methodology from the Technical Note "Instrument Pixel Co-ordinates and
/// Measurement Times from AATSR Products" (A. Birks, RAL). The tie
/// coordinate lists must cover the derived tie index; pixel numbers below
/// `first_pixel_number` are outside the contract.
///
/// Fails with [`UngridError::AdsDataGap`] when the retrieved record does
/// not sit at its nominal scan number.
pub fn interpolate(
    scan: i32,
    pixel: i32,
    s0: i32,
    scan_pixel_ads: &TiePointScanAds,
    first_pixel_number: i32,
) -> UngridResult<PixelCoordinates> {
    let record_count = scan_pixel_ads.record_count() as i32;

    // Tie scan at or before the input scan. The ADS starts at scan s0, so
    // scans before it use the first record; the ADS may also end before
    // the image does, in which case the last record is used.
    let mut sg = ((scan - s0) as f64 / 32.0).floor() as i32;
    if sg < 0 {
        sg = 0;
    }
    if sg > record_count - 1 {
        sg = record_count - 1;
    }

    let record = &scan_pixel_ads.records[sg as usize];
    let current_scan = record.instr_scan_num;

    // With data gaps present this record would not correspond to the
    // input scan number; surface that instead of interpolating garbage.
    let expected_scan = 32 * sg + s0;
    if current_scan != expected_scan {
        return Err(UngridError::AdsDataGap {
            record: sg as usize,
            expected: expected_scan,
            found: current_scan,
        });
    }

    let relative_pixel = pixel - first_pixel_number;

    // Tie pixel and interpolation weight. Intervals are 10 pixels apart
    // from the final one, which spans only 4.
    let tie_pixel_part = relative_pixel as f64 / PIXELS_PER_TIE_INTERVAL;
    let mut tie_pixel = tie_pixel_part.floor() as i32;
    let mut weight = tie_pixel_part - tie_pixel as f64;
    if relative_pixel > LAST_INTERVAL_START {
        weight = (relative_pixel - LAST_INTERVAL_START) as f64 / 4.0;
    }

    // The forward-view series occupies the later tie-point block
    if first_pixel_number > 1000 {
        tie_pixel += FORWARD_TIE_OFFSET;
    }

    let tie = tie_pixel as usize;
    let mut x = lerp_tie(&record.tie_pix_x, tie, weight);
    let mut y = lerp_tie(&record.tie_pix_y, tie, weight);

    // A scan between ADS records is blended with the next record's
    // coordinates, weighted by scan-number distance
    if scan != current_scan && scan > s0 && sg < record_count - 1 {
        let next_record = &scan_pixel_ads.records[(sg + 1) as usize];
        let next_scan = next_record.instr_scan_num;
        let x_next = lerp_tie(&next_record.tie_pix_x, tie, weight);
        let y_next = lerp_tie(&next_record.tie_pix_y, tie, weight);
        x += (scan - current_scan) as f64 * (x_next - x) / (next_scan - current_scan) as f64;
        y += (scan - current_scan) as f64 * (y_next - y) / (next_scan - current_scan) as f64;
    }

    let time_mjd2000 = pixel_sample_time(record.dsr_time.to_mjd2000(), scan, sg, s0, pixel, current_scan);

    Ok(PixelCoordinates { x, y, time_mjd2000 })
}

fn lerp_tie(coordinates: &[i32], tie: usize, weight: f64) -> f64 {
    (1.0 - weight) * coordinates[tie] as f64 + weight * coordinates[tie + 1] as f64
}

/// Exact sample time in MJD2000: record scan time, corrected per scan when
/// the scan falls between records, plus the intra-scan pixel offset.
fn pixel_sample_time(scan_time: f64, scan: i32, sg: i32, s0: i32, pixel: i32, current_scan: i32) -> f64 {
    let mut time = scan_time;
    if scan != current_scan && scan > s0 {
        time += SCAN_PERIOD_SECONDS * (scan - 32 * sg - s0) as f64 / 86400.0;
    }
    time + (pixel - 1) as f64 * (SCAN_PERIOD_SECONDS / 2000.0) / 86400.0
}

/// Re-reference pixel coordinates from the pixel centre to its corner.
///
/// The along-track pixel spacing is not constant (~1011 m); an average is
/// estimated from the geolocation ADS `img_scan_y` values bracketing the
/// row's tie scan, extrapolating one nominal record span past the end of
/// the series.
pub fn center_to_corner(coordinates: &mut PixelCoordinates, row: usize, geolocation_ads: &GeolocationAds) {
    coordinates.x -= 500.0;

    let sg = row / 32;
    let last_y = geolocation_ads.records[sg].img_scan_y;
    let next_y = match geolocation_ads.record(sg + 1) {
        Some(record) => record.img_scan_y,
        None => last_y + (32.0 * NOMINAL_PIXEL_SPACING) as i32,
    };

    let average_pixel_spacing = (next_y - last_y) as f64 / 32.0;
    coordinates.y -= average_pixel_spacing / 2.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::{GeolocationRecord, ScanTime, TiePointScanRecord};
    use approx::assert_relative_eq;

    fn tie_record(scan: i32, x_step: i32, y_step: i32) -> TiePointScanRecord {
        TiePointScanRecord {
            dsr_time: ScanTime {
                days: 1850,
                seconds: 0.0,
                microseconds: 0.0,
            },
            instr_scan_num: scan,
            tie_pix_x: (0..100).map(|k| k * x_step).collect(),
            tie_pix_y: (0..100).map(|k| k * y_step).collect(),
        }
    }

    #[test]
    fn test_exact_tie_point_selection() {
        let ads = TiePointScanAds::new(vec![tie_record(33, 10, 5)]);
        // Relative pixel 10 lands exactly on tie index 1, weight 0
        let result = interpolate(32, 100, 33, &ads, 90).unwrap();
        assert_relative_eq!(result.x, 10.0);
        assert_relative_eq!(result.y, 5.0);
    }

    #[test]
    fn test_fractional_weight() {
        let ads = TiePointScanAds::new(vec![tie_record(33, 10, 5)]);
        // Relative pixel 15: tie index 1, weight 0.5
        let result = interpolate(33, 105, 33, &ads, 90).unwrap();
        assert_relative_eq!(result.x, 15.0);
        assert_relative_eq!(result.y, 7.5);
    }

    #[test]
    fn test_final_short_interval_weight() {
        let ads = TiePointScanAds::new(vec![tie_record(33, 10, 5)]);
        // Relative pixel 572: tie index 57, re-derived weight (572-570)/4
        let result = interpolate(33, 662, 33, &ads, 90).unwrap();
        assert_relative_eq!(result.x, 575.0);
    }

    #[test]
    fn test_forward_series_offset() {
        let mut record = tie_record(33, 0, 0);
        record.tie_pix_x[59] = 7000;
        record.tie_pix_x[60] = 7100;
        let ads = TiePointScanAds::new(vec![record]);
        // First forward pixel numbers exceed 1000, addressing tie block 59+
        let result = interpolate(33, 1305, 33, &ads, 1305).unwrap();
        assert_relative_eq!(result.x, 7000.0);
    }

    #[test]
    fn test_between_record_blend() {
        let ads = TiePointScanAds::new(vec![tie_record(32, 10, 5), tie_record(64, 20, 5)]);
        // Scan 48 is halfway between records 0 (scan 32) and 1 (scan 64)
        let result = interpolate(48, 110, 32, &ads, 100).unwrap();
        assert_relative_eq!(result.x, 15.0);
        assert_relative_eq!(result.y, 5.0);
    }

    #[test]
    fn test_data_gap_detection() {
        let ads = TiePointScanAds::new(vec![tie_record(32, 10, 5), tie_record(99, 20, 5)]);
        let err = interpolate(70, 110, 32, &ads, 100).unwrap_err();
        match err {
            UngridError::AdsDataGap {
                record,
                expected,
                found,
            } => {
                assert_eq!(record, 1);
                assert_eq!(expected, 64);
                assert_eq!(found, 99);
            }
            other => panic!("expected AdsDataGap, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_time_corrections() {
        let ads = TiePointScanAds::new(vec![tie_record(32, 10, 5), tie_record(64, 20, 5)]);
        // On-record scan: only the intra-scan pixel offset applies
        let on_record = interpolate(32, 101, 32, &ads, 100).unwrap();
        assert_relative_eq!(
            on_record.time_mjd2000,
            1850.0 + 100.0 * (0.15 / 2000.0) / 86400.0,
            max_relative = 1.0e-12
        );
        // Between records: 0.15 s per scan past the tie scan is added
        let between = interpolate(40, 101, 32, &ads, 100).unwrap();
        assert_relative_eq!(
            between.time_mjd2000,
            1850.0 + (0.15 * 8.0) / 86400.0 + 100.0 * (0.15 / 2000.0) / 86400.0,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn test_center_to_corner() {
        let records = (0..2)
            .map(|k| GeolocationRecord {
                img_scan_y: k * 32 * 1000,
                tie_pt_lat: vec![],
                tie_pt_long: vec![],
                lat_corr_nadv: vec![],
                long_corr_nadv: vec![],
                lat_corr_forv: vec![],
                long_corr_forv: vec![],
            })
            .collect();
        let geolocation_ads = GeolocationAds::new(records);

        let mut coordinates = PixelCoordinates {
            x: 1000.0,
            y: 10_000.0,
            time_mjd2000: 0.0,
        };
        center_to_corner(&mut coordinates, 5, &geolocation_ads);
        assert_relative_eq!(coordinates.x, 500.0);
        assert_relative_eq!(coordinates.y, 10_000.0 - 500.0);

        // Past the end of the series the nominal spacing is extrapolated
        let mut at_end = PixelCoordinates {
            x: 0.0,
            y: 0.0,
            time_mjd2000: 0.0,
        };
        center_to_corner(&mut at_end, 33, &geolocation_ads);
        assert_relative_eq!(at_end.y, -NOMINAL_PIXEL_SPACING / 2.0);
    }
}
