use crate::ads::{GeolocationAds, TiePointScanAds, ViewScanPixelAds};
use crate::core::{geolocation, scan_pixel, tie_points};
use crate::types::{
    InstrumentParameters, PixelGeolocation, UngridError, UngridResult, View, ViewGeolocation,
    ViewResult,
};
use std::ops::Range;

/// Image pixels per row of an (A)ATSR L1B product
pub const PIXELS_PER_ROW: usize = 512;

/// Map an image column to its instrument pixel index.
///
/// The gridded product stores columns mirrored with respect to the
/// instrument pixel order.
pub fn image_column_to_pixel(column: usize) -> usize {
    PIXELS_PER_ROW - 1 - column
}

/// Recovers original per-pixel geolocation and acquisition time from a
/// gridded L1B product.
///
/// Transforms image pixels (row, column) into instrument scan and pixel
/// numbers via the view ADS, into raw (x, y) coordinates via the scan
/// pixel ADS and the characterisation first-pixel numbers, and into
/// (lat, lon) via the geolocation ADS — for the nadir and the forward
/// view independently.
///
/// Every per-pixel evaluation is a pure function of the borrowed,
/// read-only inputs, so pixels and rows can be processed in parallel.
pub struct Ungridder<'a> {
    parameters: &'a InstrumentParameters,
    nadir_ads: &'a ViewScanPixelAds,
    forward_ads: &'a ViewScanPixelAds,
    tie_point_ads: &'a TiePointScanAds,
    geolocation_ads: &'a GeolocationAds,
    /// Along-track tie coordinates, hoisted out of the record walk once
    scan_y: Vec<f64>,
    /// Scan number of the first tie record (nominally 32)
    s0: i32,
}

impl<'a> Ungridder<'a> {
    pub fn new(
        parameters: &'a InstrumentParameters,
        nadir_ads: &'a ViewScanPixelAds,
        forward_ads: &'a ViewScanPixelAds,
        tie_point_ads: &'a TiePointScanAds,
        geolocation_ads: &'a GeolocationAds,
    ) -> UngridResult<Self> {
        let s0 = tie_point_ads
            .first_scan_number()
            .ok_or(UngridError::EmptyAds("scan pixel x/y ADS"))?;
        if geolocation_ads.record_count() == 0 {
            return Err(UngridError::EmptyAds("geolocation ADS"));
        }
        let scan_y = geolocation_ads.scan_y_coords();
        log::debug!(
            "Ungridder ready: s0 = {}, {} tie records, {} geolocation records",
            s0,
            tie_point_ads.record_count(),
            geolocation_ads.record_count()
        );

        Ok(Self {
            parameters,
            nadir_ads,
            forward_ads,
            tie_point_ads,
            geolocation_ads,
            scan_y,
            s0,
        })
    }

    /// Ungrid one image pixel: geolocation and acquisition time for both
    /// views, with fill results where the original geolocation is
    /// undefined.
    pub fn ungrid(&self, row: usize, column: usize) -> UngridResult<PixelGeolocation> {
        Ok(PixelGeolocation {
            nadir: self.ungrid_view(row, column, View::Nadir)?,
            forward: self.ungrid_view(row, column, View::Forward)?,
        })
    }

    fn ungrid_view(&self, row: usize, column: usize, view: View) -> UngridResult<ViewResult> {
        let (view_ads, first_pixel_number) = match view {
            View::Nadir => (self.nadir_ads, self.parameters.first_nadir_pixel),
            View::Forward => (self.forward_ads, self.parameters.first_forward_pixel),
        };

        let located = scan_pixel::locate(row, column, view_ads);
        // A zero scan or pixel number means the pixel is absent or
        // cosmetically filled: report the fill result, keep processing
        if !located.is_defined() {
            return Ok(ViewResult {
                pixel_number: located.pixel,
                geolocation: None,
            });
        }

        let mut coordinates = tie_points::interpolate(
            located.scan,
            located.pixel,
            self.s0,
            self.tie_point_ads,
            first_pixel_number,
        )?;
        if self.parameters.corner_reference {
            tie_points::center_to_corner(&mut coordinates, row, self.geolocation_ads);
        }

        let position = geolocation::interpolate(
            coordinates.x,
            coordinates.y,
            self.geolocation_ads,
            &self.scan_y,
            view,
            self.parameters.topographic,
            self.parameters.topography_homogeneity,
        );

        Ok(ViewResult {
            pixel_number: located.pixel,
            geolocation: Some(ViewGeolocation {
                position,
                time_mjd2000: coordinates.time_mjd2000,
            }),
        })
    }

    /// Ungrid a rectangular region row by row.
    pub fn ungrid_region(
        &self,
        rows: Range<usize>,
        columns: Range<usize>,
    ) -> UngridResult<Vec<Vec<PixelGeolocation>>> {
        rows.map(|row| self.ungrid_row(row, columns.clone())).collect()
    }

    /// Ungrid a rectangular region with rows fanned out over the rayon
    /// thread pool.
    #[cfg(feature = "parallel")]
    pub fn ungrid_region_parallel(
        &self,
        rows: Range<usize>,
        columns: Range<usize>,
    ) -> UngridResult<Vec<Vec<PixelGeolocation>>> {
        use rayon::prelude::*;

        log::debug!(
            "Ungridding rows {:?} in parallel over {} threads",
            rows,
            rayon::current_num_threads()
        );
        rows.into_par_iter()
            .map(|row| self.ungrid_row(row, columns.clone()))
            .collect()
    }

    fn ungrid_row(&self, row: usize, columns: Range<usize>) -> UngridResult<Vec<PixelGeolocation>> {
        columns.map(|column| self.ungrid(row, column)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_column_to_pixel_is_mirrored() {
        assert_eq!(image_column_to_pixel(0), 511);
        assert_eq!(image_column_to_pixel(511), 0);
        assert_eq!(image_column_to_pixel(255), 256);
    }

    #[test]
    fn test_new_rejects_empty_ads() {
        let parameters = InstrumentParameters::builder().build();
        let nadir = ViewScanPixelAds::default();
        let forward = ViewScanPixelAds::default();
        let tie_points = TiePointScanAds::default();
        let geolocation = GeolocationAds::default();
        let result = Ungridder::new(&parameters, &nadir, &forward, &tie_points, &geolocation);
        assert!(matches!(result, Err(UngridError::EmptyAds(_))));
    }
}
