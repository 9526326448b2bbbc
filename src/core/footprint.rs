use crate::types::{
    FootprintDimension, FovCalibration, InstrumentParameters, UngridError, UngridResult, NO_DATA,
};
use ndarray::Array2;

/// Scan cone half-angle, radians
const CONE_ANGLE: f64 = 23.45 * std::f64::consts::PI / 180.0;
/// Response grid step, arcsec
const GRID_INTERVAL: f64 = 20.0;
/// Spherical Earth radius, km
const EARTH_RADIUS_KM: f64 = 6371.0;
/// Platform altitude, km
const ALTITUDE_KM: f64 = 800.0;
/// Synthetic sub-samples simulated across one pixel dwell
const SUB_SAMPLES: usize = 101;

/// Grid indices of the first threshold crossing seen from each edge of
/// the response grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentIndices {
    /// First across-track index reaching the threshold
    pub top: usize,
    /// Last across-track index reaching the threshold
    pub bottom: usize,
    /// First along-track index reaching the threshold
    pub left: usize,
    /// Last along-track index reaching the threshold
    pub right: usize,
}

/// Pluggable search for the reported footprint extent on a sampled,
/// normalised 2-D response grid.
pub trait FootprintExtentStrategy {
    /// The response grid is (along, across) indexed. `None` when no cell
    /// reaches the threshold.
    fn extents(&self, response: &Array2<f64>, threshold: f64) -> Option<ExtentIndices>;
}

/// Threshold crossing on whole grid cells: the extent is delimited by the
/// first cell at or above the threshold seen from each edge, without
/// interpolating between the bracketing cells. The position of the
/// crossing can therefore jump by a full grid step (20 arcsec) between
/// adjacent pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdCrossingExtent;

impl FootprintExtentStrategy for ThresholdCrossingExtent {
    fn extents(&self, response: &Array2<f64>, threshold: f64) -> Option<ExtentIndices> {
        let (along_len, across_len) = response.dim();
        let crosses_across = |i: usize| (0..along_len).any(|j| response[[j, i]] >= threshold);
        let crosses_along = |j: usize| (0..across_len).any(|i| response[[j, i]] >= threshold);

        let top = (0..across_len).find(|&i| crosses_across(i))?;
        let bottom = (0..across_len).rev().find(|&i| crosses_across(i))?;
        let left = (0..along_len).find(|&j| crosses_along(j))?;
        let right = (0..along_len).rev().find(|&j| crosses_along(j))?;
        Some(ExtentIndices {
            top,
            bottom,
            left,
            right,
        })
    }
}

/// Viewing geometry of the 101 sub-samples simulated across one pixel
struct PixelViewGeometry {
    across_fov_arcsec: [f64; SUB_SAMPLES],
    along_fov_arcsec: [f64; SUB_SAMPLES],
    /// Nadir view angle at the pixel centre, radians
    view_angle: f64,
    /// Sub-satellite-point to pixel angle at the centre, radians
    surface_to_pixel_angle: f64,
}

impl PixelViewGeometry {
    /// Simulate the scan geometry over the pixel dwell (pixel centre
    /// ± 0.5 pixel) with the fixed half-cone-angle model.
    fn simulate(pixel: i32) -> PixelViewGeometry {
        use std::f64::consts::PI;
        let sin_cone = CONE_ANGLE.sin();
        let tan_cone = CONE_ANGLE.tan();

        let mut across = [0.0; SUB_SAMPLES];
        let mut along = [0.0; SUB_SAMPLES];
        let mut centre_view_angle = 0.0;
        let mut centre_surface_angle = 0.0;
        for i in 0..SUB_SAMPLES {
            let rotation =
                2.0 * PI * (pixel as f64 - (i as f64 - 50.0) / 100.0 - 501.0) / 2000.0;
            let view_angle = 2.0 * (sin_cone * (rotation / 2.0).sin()).asin();
            let mut surface_angle = ((view_angle / 2.0).tan() / tan_cone).acos();
            // Past half a rotation the pixel lies on the other side of
            // the sub-satellite track
            if rotation.abs() > PI {
                surface_angle = -surface_angle;
            }

            let across_angle = (view_angle.sin() * surface_angle.sin()).asin();
            let along_angle = (view_angle.cos() / across_angle.cos()).acos();
            across[i] = (across_angle * 3600.0).to_degrees();
            along[i] = (along_angle * 3600.0).to_degrees();

            if i == 50 {
                centre_view_angle = view_angle;
                centre_surface_angle = surface_angle;
            }
        }

        PixelViewGeometry {
            across_fov_arcsec: across,
            along_fov_arcsec: along,
            view_angle: centre_view_angle,
            surface_to_pixel_angle: centre_surface_angle,
        }
    }
}

/// Model the ground footprint of one instrument pixel.
///
/// The 101 simulated sub-samples are convolved with the calibrated IFOV
/// response into a 20 arcsec histogram (nearest-cell assignment on both
/// axes), normalised, converted to ground distance with the centre
/// sub-sample's spherical-earth geometry, and delimited by the extent
/// strategy at `reporting_extent`.
///
/// `None` for relative pixel numbers <= 0 (data not available) and for
/// degenerate grids where no cell reaches the threshold.
pub fn pixel_footprint(
    pixel: i32,
    fov: &FovCalibration,
    reporting_extent: f64,
    strategy: &dyn FootprintExtentStrategy,
) -> Option<FootprintDimension> {
    if pixel <= 0 {
        return None;
    }

    let geometry = PixelViewGeometry::simulate(pixel);
    let centre_along = geometry.along_fov_arcsec[50];
    let centre_across = geometry.across_fov_arcsec[50];

    // Centre sub-sample ground geometry, spherical earth
    let view_angle = geometry.view_angle;
    let zenith_angle =
        (view_angle.sin() * (EARTH_RADIUS_KM + ALTITUDE_KM) / EARTH_RADIUS_KM).asin();
    let across_track_distance = EARTH_RADIUS_KM
        * ((zenith_angle - view_angle).sin() * geometry.surface_to_pixel_angle.sin()).asin();
    let along_track_distance = EARTH_RADIUS_KM
        * ((zenith_angle - view_angle).cos() / (across_track_distance / EARTH_RADIUS_KM).cos())
            .acos();
    let across_perp_angle = ((EARTH_RADIUS_KM * (across_track_distance / EARTH_RADIUS_KM).sin())
        / (EARTH_RADIUS_KM * (1.0 - (across_track_distance / EARTH_RADIUS_KM).cos())
            + ALTITUDE_KM))
        .atan();
    let sat_to_pixel_distance = if view_angle != 0.0 {
        EARTH_RADIUS_KM * (zenith_angle - view_angle).sin() / view_angle.sin()
    } else {
        ALTITUDE_KM
    };

    let (min_along_pixel, max_along_pixel) = min_max(&geometry.along_fov_arcsec);
    let (min_across_pixel, max_across_pixel) = min_max(&geometry.across_fov_arcsec);
    let (min_along_fov, max_along_fov) = min_max(&fov.along_track_angle);
    let (min_across_fov, max_across_fov) = min_max(&fov.across_track_angle);

    let min_along_index = round_half_up((min_along_fov + min_along_pixel - centre_along) / GRID_INTERVAL);
    let max_along_index = round_half_up((max_along_fov + max_along_pixel - centre_along) / GRID_INTERVAL);
    let min_across_index = round_half_up((min_across_fov + min_across_pixel - centre_across) / GRID_INTERVAL);
    let max_across_index = round_half_up((max_across_fov + max_across_pixel - centre_across) / GRID_INTERVAL);

    let along_len = (max_along_index - min_along_index + 1) as usize;
    let across_len = (max_across_index - min_across_index + 1) as usize;

    let mut along_axis: Vec<f64> = (0..along_len)
        .map(|i| i as f64 * GRID_INTERVAL + min_along_index as f64 * GRID_INTERVAL)
        .collect();
    let mut across_axis: Vec<f64> = (0..across_len)
        .map(|i| i as f64 * GRID_INTERVAL + min_across_index as f64 * GRID_INTERVAL)
        .collect();

    // Accumulate the calibration response over every combination of
    // calibration sample and pixel sub-sample; a sample contributes only
    // when its continuous angular position rounds into the cell on both
    // axes.
    let mut response = Array2::zeros((along_len, across_len));
    for i in 0..fov.response.len() {
        for j in 0..SUB_SAMPLES {
            let along_position = fov.along_track_angle[i] + geometry.along_fov_arcsec[j] - centre_along;
            let across_position =
                fov.across_track_angle[i] + geometry.across_fov_arcsec[j] - centre_across;
            let m = round_half_up(along_position / GRID_INTERVAL);
            let n = round_half_up(across_position / GRID_INTERVAL);

            let dm = m as f64 * GRID_INTERVAL;
            let dn = n as f64 * GRID_INTERVAL;
            let in_cell_along = dm >= along_position - GRID_INTERVAL / 2.0
                && dm < along_position + GRID_INTERVAL / 2.0;
            let in_cell_across = dn >= across_position - GRID_INTERVAL / 2.0
                && dn < across_position + GRID_INTERVAL / 2.0;
            if in_cell_along && in_cell_across {
                response[[(m - min_along_index) as usize, (n - min_across_index) as usize]] +=
                    fov.response[i];
            }
        }
    }

    // Normalise the accumulated response to [0, 1]
    let mut maximum = -1.0e6_f64;
    let mut minimum = 1.0e6_f64;
    for &value in response.iter() {
        maximum = maximum.max(value);
        minimum = minimum.min(value);
    }
    let range = maximum - minimum;
    response.mapv_inplace(|value| (value - minimum) / range);

    // Convert the angular axes to ground distance, km
    for value in along_axis.iter_mut() {
        *value = (value.to_radians() / 3600.0) * sat_to_pixel_distance
            / ((centre_along.to_radians() / 3600.0)
                + (along_track_distance / EARTH_RADIUS_KM))
                .cos();
    }
    for value in across_axis.iter_mut() {
        *value = (value.to_radians() / 3600.0) * sat_to_pixel_distance
            / (across_perp_angle + (across_track_distance / EARTH_RADIUS_KM)).cos();
    }

    let extents = strategy.extents(&response, reporting_extent)?;
    Some(FootprintDimension {
        along_track_km: along_axis[extents.right] - along_axis[extents.left],
        across_track_km: across_axis[extents.bottom] - across_axis[extents.top],
    })
}

/// Precomputed footprint dimensions for every relative pixel number.
///
/// Assuming spherical earth geometry and constant platform altitude, each
/// pixel number has a constant projection dimension, so the table is
/// built once and indexed per pixel afterwards.
#[derive(Debug, Clone)]
pub struct FootprintTable {
    entries: Vec<Option<FootprintDimension>>,
}

impl FootprintTable {
    /// Relative pixel numbers covered by the table
    pub const SIZE: usize = 2000;

    /// Build the table with the threshold-crossing extent strategy.
    ///
    /// Fails with [`UngridError::MissingFovCalibration`] when the
    /// parameters carry no FOV calibration.
    pub fn build(parameters: &InstrumentParameters) -> UngridResult<FootprintTable> {
        Self::build_with(parameters, &ThresholdCrossingExtent)
    }

    /// Build the table with a caller-provided extent strategy.
    pub fn build_with(
        parameters: &InstrumentParameters,
        strategy: &dyn FootprintExtentStrategy,
    ) -> UngridResult<FootprintTable> {
        let fov = parameters
            .fov
            .as_ref()
            .ok_or(UngridError::MissingFovCalibration)?;
        log::info!(
            "Computing pixel projection table for {} pixel numbers",
            Self::SIZE
        );
        let entries = (0..Self::SIZE)
            .map(|pixel| pixel_footprint(pixel as i32, fov, parameters.reporting_extent, strategy))
            .collect();
        Ok(FootprintTable { entries })
    }

    /// Build the table in parallel with the threshold-crossing strategy.
    #[cfg(feature = "parallel")]
    pub fn build_parallel(parameters: &InstrumentParameters) -> UngridResult<FootprintTable> {
        use rayon::prelude::*;

        let fov = parameters
            .fov
            .as_ref()
            .ok_or(UngridError::MissingFovCalibration)?;
        log::info!(
            "Computing pixel projection table for {} pixel numbers in parallel",
            Self::SIZE
        );
        let entries = (0..Self::SIZE)
            .into_par_iter()
            .map(|pixel| {
                pixel_footprint(
                    pixel as i32,
                    fov,
                    parameters.reporting_extent,
                    &ThresholdCrossingExtent,
                )
            })
            .collect();
        Ok(FootprintTable { entries })
    }

    /// Footprint of the given relative pixel number; `None` for pixel
    /// numbers outside 1..SIZE and for undefined entries.
    pub fn get(&self, pixel_number: i32) -> Option<FootprintDimension> {
        if pixel_number < 0 {
            return None;
        }
        self.entries.get(pixel_number as usize).copied().flatten()
    }

    /// Footprint as an (along, across) km pair, [`NO_DATA`] when undefined
    pub fn dimensions_or_fill(&self, pixel_number: i32) -> (f64, f64) {
        self.get(pixel_number)
            .map_or((NO_DATA, NO_DATA), |d| (d.along_track_km, d.across_track_km))
    }
}

/// Round half-up, matching the discretisation the response histogram was
/// calibrated with ((-2.5) rounds to -2, not -3).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut minimum = 1.0e7_f64;
    let mut maximum = -1.0e7_f64;
    for &value in values {
        minimum = minimum.min(value);
        maximum = maximum.max(value);
    }
    (minimum, maximum)
}
