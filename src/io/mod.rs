//! I/O modules for reading the instrument characterisation and FOV
//! calibration files

pub mod characterisation;
pub mod fov;

pub use characterisation::CharacterisationFile;
pub use fov::load_fov_calibration;
