use crate::types::{Channel, FovCalibration, UngridError, UngridResult};
use ndarray::Array2;
use std::fs;
use std::path::Path;

/// Number of samples per axis of the uniform output grid
const GRID_POINTS: usize = 31;
/// Output grid step, arcsec
const GRID_STEP: f64 = 20.0;
/// Half extent of the output grid, arcsec
const GRID_HALF_EXTENT: f64 = 300.0;
/// Samples per axis used for drift fitting and the response centroid
const CORE_SAMPLES: usize = 49;

/// Token layout of the measurement data lines, classified once from the
/// first data line and enforced for the rest of the file. The format
/// carries no marker; the ordinate pair is selected by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineLayout {
    TwoField,
    ThreeField,
    ThreeFieldLeadingBlank,
    FourField,
}

impl LineLayout {
    fn classify(tokens: &[&str]) -> UngridResult<LineLayout> {
        match tokens.len() {
            2 => Ok(LineLayout::TwoField),
            3 if tokens[0].is_empty() => Ok(LineLayout::ThreeFieldLeadingBlank),
            3 => Ok(LineLayout::ThreeField),
            4 => Ok(LineLayout::FourField),
            n => Err(UngridError::MalformedCalibration(format!(
                "unexpected field count {} in measurement line",
                n
            ))),
        }
    }

    /// Select the earlier and later ordinate fields of one data line.
    fn ordinates(self, tokens: &[&str]) -> UngridResult<(f64, f64)> {
        let expected = match self {
            LineLayout::TwoField => 2,
            LineLayout::ThreeField | LineLayout::ThreeFieldLeadingBlank => 3,
            LineLayout::FourField => 4,
        };
        if tokens.len() != expected {
            return Err(UngridError::MalformedCalibration(format!(
                "expected {} fields per measurement line, found {}",
                expected,
                tokens.len()
            )));
        }
        let (earlier, later) = match self {
            LineLayout::TwoField => (tokens[0], tokens[1]),
            LineLayout::ThreeField => (tokens[0], tokens[2]),
            LineLayout::ThreeFieldLeadingBlank => (tokens[1], tokens[2]),
            LineLayout::FourField => (tokens[1], tokens[3]),
        };
        Ok((parse_f64(earlier)?, parse_f64(later)?))
    }
}

/// Load an AATSR FOV calibration measurement file (`*.SFV`) and derive the
/// normalised instrument response on the uniform 31x31 angular grid.
///
/// The processing chain follows the RAL calibration methodology: ordinate
/// combination per channel, per-column baseline subtraction, linear drift
/// removal for the thermal channels, min-max normalisation, centroid
/// recentring of the angular axes, and a bilinear regrid.
pub fn load_fov_calibration<P: AsRef<Path>>(path: P) -> UngridResult<FovCalibration> {
    let content = fs::read_to_string(path.as_ref())?;
    let lines: Vec<&str> = content.lines().collect();

    let header = lines.first().ok_or_else(|| {
        UngridError::MalformedCalibration("empty FOV measurement file".to_string())
    })?;
    let fields: Vec<i64> = header
        .split_whitespace()
        .map(parse_i64)
        .collect::<UngridResult<_>>()?;
    if fields.len() < 7 {
        return Err(UngridError::MalformedCalibration(format!(
            "expected 7 header fields, found {}",
            fields.len()
        )));
    }
    let (xstart, ystart) = (fields[0], fields[1]);
    let (xstop, ystop) = (fields[2], fields[3]);
    let (xstep, ystep) = (fields[4], fields[5]);
    let channel = Channel::from_index(fields[6] as i32)?;
    log::info!("Raw FOV data ingested is for channel: {}", channel);

    if xstep == 0 || ystep == 0 {
        return Err(UngridError::MalformedCalibration(
            "zero step in FOV measurement header".to_string(),
        ));
    }

    // Measurement grid dimensions; nx/ny are the per-axis sample counts
    let count_x = ((xstop - xstart).abs() / xstep) as usize;
    let count_y = ((ystop - ystart).abs() / ystep) as usize;
    let nx = count_x + 1;
    let ny = count_y + 1;
    if nx < CORE_SAMPLES || ny < CORE_SAMPLES {
        return Err(UngridError::MalformedCalibration(format!(
            "measurement grid {}x{} smaller than the {}x{} core",
            nx, ny, CORE_SAMPLES, CORE_SAMPLES
        )));
    }

    // Angular axes of the native grid, arcsec. The mirror factors convert
    // the mechanism step counts of the measurement rig.
    let mut fov_array_x = vec![0.0f64; nx * ny];
    let mut fov_array_y = vec![0.0f64; nx * ny];
    for i in 0..nx {
        for j in 0..ny {
            fov_array_x[i + j * nx] = -2.0 * (xstart + i as i64 * xstep) as f64 / 1000.0;
            fov_array_y[i + j * nx] = -1.398 * (ystart + j as i64 * ystep) as f64 / 1000.0;
        }
    }

    // The first measurement block belongs to scan -1 and is discarded.
    // Every block is 2 header lines followed by nx data lines.
    let block_len = count_x + 3;
    let needed = (count_x + 4) + ny * block_len;
    if lines.len() < needed {
        return Err(UngridError::MalformedCalibration(format!(
            "expected at least {} lines, found {}",
            needed,
            lines.len()
        )));
    }
    let body = &lines[count_x + 4..];

    // Raw response; packed with the y index fastest
    let mut ifov = vec![0.0f64; nx * ny];
    let mut layout: Option<LineLayout> = None;
    for j in 0..ny {
        let scan_lines = &body[j * block_len + 2..j * block_len + block_len];
        for i in 0..nx {
            let tokens = split_fields(scan_lines[i]);
            let line_layout = match layout {
                Some(classified) => classified,
                None => {
                    let classified = LineLayout::classify(&tokens)?;
                    layout = Some(classified);
                    classified
                }
            };
            let (earlier, later) = line_layout.ordinates(&tokens)?;
            ifov[j + i * nx] = match channel {
                Channel::Ir12 | Channel::Ir11 | Channel::Ir37 => later - earlier,
                Channel::Vis56 => later + earlier,
                _ => later,
            };
        }
    }

    // Subtract the minimum value of each column from all column values
    for j in 0..ny {
        let mut minimum = 500.0;
        for i in 0..nx {
            if ifov[j + i * nx] < minimum {
                minimum = ifov[j + i * nx];
            }
        }
        for i in 0..nx {
            ifov[j + i * nx] -= minimum;
        }
    }

    // Remove the underlying background drift for the thermal channels.
    // The fit uses samples 0 and 48 along each axis; the methodology is
    // undocumented and used as is.
    if matches!(channel, Channel::Ir12 | Channel::Ir11 | Channel::Ir37) {
        for i in 0..CORE_SAMPLES {
            let m = (ifov[48 + i * nx] - ifov[i * nx]) / 48.0;
            let c = ifov[i * nx];
            for j in 0..ny {
                ifov[j + i * nx] -= m * j as f64 + c;
            }
        }
        for i in 0..CORE_SAMPLES {
            let m = (ifov[i + 48 * nx] - ifov[i]) / 48.0;
            let c = ifov[i];
            for j in 0..nx {
                ifov[i + j * nx] -= m * j as f64 + c;
            }
        }
    }

    // Normalise the response to [0, 1]
    let mut maximum = -500.0f64;
    let mut minimum = 500.0f64;
    for i in 0..nx {
        for j in 0..ny {
            maximum = maximum.max(ifov[i + j * nx]);
            minimum = minimum.min(ifov[i + j * nx]);
        }
    }
    let range = maximum - minimum;
    for i in 0..nx {
        for j in 0..ny {
            ifov[i + j * nx] = (ifov[i + j * nx] - minimum) / range;
        }
    }

    // Intensity-weighted centroid over the core samples; both angular axes
    // are recentred on it
    let mut sum_xz = 0.0;
    let mut sum_yz = 0.0;
    let mut sum_z = 0.0;
    for i in 0..CORE_SAMPLES {
        for j in 0..CORE_SAMPLES {
            sum_xz += fov_array_x[i + j * nx] * ifov[i + j * nx];
            sum_yz += fov_array_y[i + j * nx] * ifov[i + j * nx];
            sum_z += ifov[i + j * nx];
        }
    }
    let centroid_x = sum_xz / sum_z;
    let centroid_y = sum_yz / sum_z;
    for i in 0..nx {
        for j in 0..ny {
            fov_array_x[i + j * nx] -= centroid_x;
            fov_array_y[i + j * nx] -= centroid_y;
        }
    }

    Ok(regrid(
        channel,
        &fov_array_x,
        &fov_array_y,
        &ifov,
        count_x,
        count_y,
    ))
}

/// Regrid the drift-corrected, normalised response from its native grid
/// onto the uniform output grid and flatten to the 1-D form used by the
/// footprint modeler.
fn regrid(
    channel: Channel,
    fov_array_x: &[f64],
    fov_array_y: &[f64],
    ifov: &[f64],
    count_x: usize,
    count_y: usize,
) -> FovCalibration {
    let nx = count_x + 1;
    let ny = count_y + 1;

    let axis: Vec<f64> = (0..GRID_POINTS)
        .map(|i| i as f64 * GRID_STEP - GRID_HALF_EXTENT)
        .collect();

    log::info!("Resampling IFOV using bilinear interpolation");

    // Unpack the response into (x, y) order for interpolation
    let mut grid = Array2::zeros((nx, ny));
    for i in 0..nx {
        for j in 0..ny {
            grid[[i, j]] = ifov[j + i * nx];
        }
    }

    // Both axes descend with sample index
    let axis_x: Vec<f64> = fov_array_x[..nx].to_vec();
    let axis_y: Vec<f64> = (0..ny).map(|j| fov_array_y[j * (count_y + 1)]).collect();

    let mut regridded = vec![0.0f64; GRID_POINTS * GRID_POINTS];
    for i in 0..GRID_POINTS {
        for j in 0..GRID_POINTS {
            let x = axis[i];
            let y = axis[j];

            let mut solved_x = 0;
            for (m, &value) in axis_x.iter().enumerate() {
                if value >= x {
                    solved_x = m;
                } else {
                    break;
                }
            }
            let mut solved_y = 0;
            for (n, &value) in axis_y.iter().enumerate() {
                if value >= y {
                    solved_y = n;
                } else {
                    break;
                }
            }

            let min_x = axis_x[nx - 1];
            let (x1, x2) = if x < min_x {
                // Extrapolate off the last two samples
                solved_x = solved_x.saturating_sub(1);
                (axis_x[nx - 2], axis_x[nx - 1])
            } else {
                // A target exactly on the last sample keeps the final interval
                solved_x = solved_x.min(nx - 2);
                (axis_x[solved_x], axis_x[solved_x + 1])
            };
            let min_y = axis_y[ny - 1];
            let (y1, y2) = if y < min_y {
                solved_y = solved_y.saturating_sub(1);
                (axis_y[ny - 2], axis_y[ny - 1])
            } else {
                solved_y = solved_y.min(ny - 2);
                (axis_y[solved_y], axis_y[solved_y + 1])
            };

            let f11 = grid[[solved_x, solved_y]];
            let f21 = grid[[solved_x + 1, solved_y]];
            let f12 = grid[[solved_x, solved_y + 1]];
            let f22 = grid[[solved_x + 1, solved_y + 1]];
            regridded[j + i * GRID_POINTS] = bilinear_interp(x1, x2, y1, y2, f11, f12, f21, f22, x, y);
        }
    }

    let mut along_track_angle = vec![0.0f64; GRID_POINTS * GRID_POINTS];
    let mut across_track_angle = vec![0.0f64; GRID_POINTS * GRID_POINTS];
    let mut response = vec![0.0f64; GRID_POINTS * GRID_POINTS];
    for i in 0..GRID_POINTS {
        for j in 0..GRID_POINTS {
            along_track_angle[i + j * GRID_POINTS] = i as f64 * GRID_STEP - GRID_HALF_EXTENT;
            across_track_angle[i + j * GRID_POINTS] = j as f64 * GRID_STEP - GRID_HALF_EXTENT;
            response[i + j * GRID_POINTS] = regridded[i + j * GRID_POINTS];
        }
    }

    FovCalibration {
        channel,
        along_track_angle,
        across_track_angle,
        response,
    }
}

#[allow(clippy::too_many_arguments)]
fn bilinear_interp(
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    f11: f64,
    f12: f64,
    f21: f64,
    f22: f64,
    x: f64,
    y: f64,
) -> f64 {
    let fxy1 = ((x2 - x) / (x2 - x1)) * f11 + ((x - x1) / (x2 - x1)) * f21;
    let fxy2 = ((x2 - x) / (x2 - x1)) * f12 + ((x - x1) / (x2 - x1)) * f22;
    ((y2 - y) / (y2 - y1)) * fxy1 + ((y - y1) / (y2 - y1)) * fxy2
}

/// Split a measurement line on single spaces, discarding trailing empty
/// fields. A leading empty field is kept; it distinguishes the
/// blank-padded three-field layout.
fn split_fields(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split(' ').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn parse_i64(token: &str) -> UngridResult<i64> {
    token.parse().map_err(|_| {
        UngridError::MalformedCalibration(format!("unparsable integer token: {:?}", token))
    })
}

fn parse_f64(token: &str) -> UngridResult<f64> {
    token.parse().map_err(|_| {
        UngridError::MalformedCalibration(format!("unparsable numeric token: {:?}", token))
    })
}
