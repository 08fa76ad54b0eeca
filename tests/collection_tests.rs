//! Integration tests for a full collection cycle.
//!
//! These tests drive `DfService` against a report file and check what the
//! host would receive on registration and on each update.

use hdd_space_exporter::protocol::{write_definitions, write_update};
use hdd_space_exporter::{DeviceFilter, DfService, ReportSource};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const HEADER: &str = "Filesystem     1024-blocks      Used  Available Capacity Mounted on";

/// Helper to write a df report with the POSIX header.
fn report(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

fn service_for(file: &NamedTempFile, pattern: &str) -> DfService {
    DfService::with_source(
        DeviceFilter::new(pattern).unwrap(),
        ReportSource::File(file.path().to_path_buf()),
    )
}

#[tokio::test]
async fn test_md_device_reported_tmpfs_ignored() {
    let file = report(&[
        "/dev/md3        976285620   1005888  975279732       1% /disk3",
        "tmpfs             3822880         0    3822880       0% /dev",
    ]);
    let mut service = service_for(&file, "md[0-9]+$");

    service.check().await.unwrap();
    assert_eq!(service.registered_devices(), vec!["/dev/md3"]);

    let sample = service.get_data().await.unwrap();
    assert_eq!(sample.values.len(), 4);
    assert_eq!(sample.get("hdd_used__dev_md3"), Some(1));
    assert_eq!(sample.get("hdd_avail__dev_md3"), Some(975));
    assert_eq!(sample.get("hdd_used_percentage__dev_md3"), Some(1));
    assert_eq!(sample.get("hdd_avail_percentage__dev_md3"), Some(99));
    assert!(sample.values.keys().all(|k| !k.contains("tmpfs")));
}

#[tokio::test]
async fn test_registration_precedes_values() {
    let file = report(&[
        "/dev/md0  2000000 1500000 500000 75% /",
        "/dev/md1  8000000 2000000 6000000 25% /data",
    ]);
    let mut service = service_for(&file, "md[0-9]+$");

    let mut out = Vec::new();
    service.check().await.unwrap();
    write_definitions(&mut out, service.definitions(), 60000, 60).unwrap();
    let sample = service.get_data().await.unwrap();
    let written = write_update(
        &mut out,
        service.definitions(),
        &sample,
        Some(Duration::from_secs(60)),
    )
    .unwrap();
    assert_eq!(written, 4);

    let out = String::from_utf8(out).unwrap();
    let first_chart = out.find("CHART df.hdd_avail ").unwrap();
    let first_begin = out.find("BEGIN ").unwrap();
    assert!(first_chart < first_begin);

    assert!(out.contains(
        "CHART df.hdd_avail '' 'HDD space available in GB' 'GB' 'diskspace' 'df' line 60000 60\n"
    ));
    assert!(out.contains(
        "CHART df.hdd_avail_percentage '' 'HDD space available in percent' '%' 'diskspace' 'df' line 60003 60\n"
    ));
    assert!(out.contains("BEGIN df.hdd_used_percentage 60000000\n"));
    assert!(out.contains("SET 'hdd_used_percentage__dev_md0' = 75\n"));
    assert!(out.contains("SET 'hdd_avail_percentage__dev_md1' = 75\n"));
    assert!(out.contains("SET 'hdd_used__dev_md1' = 2\n"));
}

#[tokio::test]
async fn test_no_matching_devices_reports_nothing() {
    let file = report(&["tmpfs 3822880 0 3822880 0% /dev"]);
    let mut service = service_for(&file, "md[0-9]+$");

    let definitions = service.check().await.unwrap();
    assert_eq!(definitions.len(), 4);
    assert!(definitions.iter().all(|d| d.lines.is_empty()));

    let sample = service.get_data().await.unwrap();
    let mut out = Vec::new();
    let written = write_update(&mut out, service.definitions(), &sample, None).unwrap();
    assert_eq!(written, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    let file = report(&[
        "",
        "/dev/md2 100",
        "/dev/md4 976285620 1005888 975279732 full% /disk4",
        "/dev/md5 976285620 1005888 975279732 101% /disk5",
        "/dev/md6 976285620 1005888 975279732 1% /disk6",
    ]);
    let mut service = service_for(&file, "md[0-9]+$");

    service.check().await.unwrap();
    assert_eq!(service.registered_devices(), vec!["/dev/md6"]);
}

#[tokio::test]
async fn test_missing_report_file_fails_check() {
    let file = report(&[]);
    let path = file.path().to_path_buf();
    drop(file);

    let mut service = DfService::with_source(DeviceFilter::default(), ReportSource::File(path));
    assert!(service.check().await.is_err());
    assert!(service.definitions().is_empty());
}

#[tokio::test]
async fn test_invalid_utf8_row_does_not_fail_cycle() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(format!("{}\n", HEADER).as_bytes()).unwrap();
    file.write_all(b"/dev/md3 976285620 1005888 975279732 1% /disk3\n")
        .unwrap();
    file.write_all(b"/dev/sdb1 100 50 50 50% /mnt/caf\xe9\n").unwrap();
    file.write_all(b"/dev/md4 2000000 1000000 1000000 50% /srv/caf\xe9\n")
        .unwrap();
    let mut service = service_for(&file, "md[0-9]+$");

    service.check().await.unwrap();
    assert_eq!(service.registered_devices(), vec!["/dev/md3", "/dev/md4"]);

    let sample = service.get_data().await.unwrap();
    assert_eq!(sample.get("hdd_avail__dev_md3"), Some(975));
    assert_eq!(sample.get("hdd_avail_percentage__dev_md3"), Some(99));
    assert_eq!(sample.get("hdd_used__dev_md4"), Some(1));
    assert_eq!(sample.get("hdd_used_percentage__dev_md4"), Some(50));
}
