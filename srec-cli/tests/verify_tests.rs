use srec_cli::commands::verify;
use srec_cli::exit_code;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_verify_valid_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("ok.s19");
    fs::write(
        &input,
        "S00600004844521B\r\nS1050000AABB95\r\nS5030001FB\r\nS9030000FC\r\n",
    )
    .unwrap();

    let summary = verify::execute(input.to_str().unwrap(), false).unwrap();
    assert_eq!(summary.data_records, 1);
    assert_eq!(summary.declared_count, Some(1));
    assert!(summary.count_matches());
    assert_eq!(summary.header.as_deref(), Some("HDR"));
}

#[test]
fn test_verify_count_mismatch_is_not_fatal() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("count.s19");
    fs::write(&input, "S1050000AABB95\r\nS5030003F9\r\n").unwrap();

    let summary = verify::execute(input.to_str().unwrap(), false).unwrap();
    assert!(!summary.count_matches());
}

#[test]
fn test_verify_reports_malformed_record() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.s19");
    fs::write(&input, "S1050000AABB95\r\nS4030000FC\r\n").unwrap();

    let err = verify::execute(input.to_str().unwrap(), false).unwrap_err();
    assert_eq!(exit_code(&err), 6);
}

#[test]
fn test_verify_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("ok.s19");
    fs::write(&input, "S1050000AABB95\r\nS9030000FC\r\n").unwrap();

    let summary = verify::execute(input.to_str().unwrap(), true).unwrap();
    assert_eq!(summary.records, 2);
}

#[test]
fn test_verify_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.s19");

    assert!(verify::execute(path.to_str().unwrap(), false).is_err());
}
