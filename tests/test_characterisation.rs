use aatsr_ungrid::io::characterisation::{
    CharacterisationFile, DEFAULT_FIRST_FORWARD_PIXEL, DEFAULT_FIRST_NADIR_PIXEL,
};
use aatsr_ungrid::UngridError;
use std::fs;

/// 1800-byte characterisation buffer with the two first-pixel fields set
fn characterisation_bytes(nadir: [u8; 4], forward: [u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 1800];
    data[1753..1757].copy_from_slice(&nadir);
    data[1757..1761].copy_from_slice(&forward);
    data
}

#[test]
fn test_big_endian_default_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ATS_CH1_AX");
    fs::write(&path, characterisation_bytes([0, 0, 0, 42], [0, 0, 5, 25])).unwrap();

    let file = CharacterisationFile::read(&path).expect("read characterisation");
    assert_eq!(file.first_nadir_pixel, 42);
    assert_eq!(file.first_forward_pixel, 5 * 256 + 25);
}

#[test]
fn test_little_endian_atsr1_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("AT1_CH1_AX");
    fs::write(&path, characterisation_bytes([0, 0, 0, 42], [0, 0, 1, 0])).unwrap();

    // The same bytes parse differently under the AT1 filename convention
    let file = CharacterisationFile::read(&path).expect("read characterisation");
    assert_eq!(file.first_nadir_pixel, 42 << 24);
    assert_eq!(file.first_forward_pixel, 1 << 16);
}

#[test]
fn test_little_endian_atsr2_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("AT2_CH1_AX");
    fs::write(&path, characterisation_bytes([213, 0, 0, 0], [25, 5, 0, 0])).unwrap();

    let file = CharacterisationFile::read(&path).expect("read characterisation");
    assert_eq!(file.first_nadir_pixel, 213);
    assert_eq!(file.first_forward_pixel, 5 * 256 + 25);
}

#[test]
fn test_truncated_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ATS_CH1_AX");
    fs::write(&path, vec![0u8; 100]).unwrap();

    let err = CharacterisationFile::read(&path).unwrap_err();
    assert!(matches!(err, UngridError::Io(_)));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = CharacterisationFile::read("/nonexistent/ATS_CH1_AX").unwrap_err();
    assert!(matches!(err, UngridError::Io(_)));
}

#[test]
fn test_defaults_match_technical_note() {
    assert_eq!(DEFAULT_FIRST_NADIR_PIXEL, 213);
    assert_eq!(DEFAULT_FIRST_FORWARD_PIXEL, 1305);
}
