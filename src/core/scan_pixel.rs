use crate::ads::ViewScanPixelAds;

/// Rows covered by one ADS record
pub const ROWS_PER_ADS_RECORD: i32 = 32;

/// Instrument scan and pixel number resolved for one image pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPixel {
    pub scan: i32,
    pub pixel: i32,
}

impl ScanPixel {
    /// An undefined location; the fill condition for the whole view
    pub const UNDEFINED: ScanPixel = ScanPixel { scan: 0, pixel: 0 };

    /// A scan or pixel number of 0 means the pixel has no original
    /// geolocation (absent, or cosmetically filled during regridding).
    pub fn is_defined(&self) -> bool {
        self.scan != 0 && self.pixel != 0
    }
}

/// Map an image pixel (row, column) to its instrument scan and pixel
/// number using the view's scan/pixel number ADS.
///
/// Record `row / 32` holds the per-column scan and pixel numbers for the
/// record's first row; the intra-record row offset is added to the scan
/// number. Rows or columns outside the ADS yield the undefined result,
/// never an error.
pub fn locate(row: usize, column: usize, view_ads: &ViewScanPixelAds) -> ScanPixel {
    let record_index = row / ROWS_PER_ADS_RECORD as usize;
    let row_offset = (row - record_index * ROWS_PER_ADS_RECORD as usize) as i32;

    let Some(record) = view_ads.record(record_index) else {
        return ScanPixel::UNDEFINED;
    };
    let (Some(&scan), Some(&pixel)) = (
        record.instr_scan_num.get(column),
        record.pix_num.get(column),
    ) else {
        return ScanPixel::UNDEFINED;
    };

    ScanPixel {
        scan: scan + row_offset,
        pixel,
    }
}
