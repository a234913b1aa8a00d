mod common;

use common::{write_jpeg, write_plain_jpeg, GpsFixture};
use exif::Tag;
use reefmap_core::pipeline::Rejection;
use reefmap_core::{Config, GpsOutcome, MetadataExtractor};

fn sorted_extractor() -> MetadataExtractor {
    let mut config = Config::default();
    config.scan.sort_by_name = true;
    MetadataExtractor::new(&config)
}

#[test]
fn test_extracts_camera_tags_and_gps() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_jpeg(
        dir.path(),
        "turtle.jpg",
        &[
            (Tag::Make, "OLYMPUS"),
            (Tag::Model, "TG-6"),
            (Tag::DateTimeOriginal, "2023:07:14 10:22:05"),
        ],
        Some(&GpsFixture::da_nang()),
    );

    let extraction = MetadataExtractor::default().extract_detailed(&path);
    let record = extraction.record;
    assert!(matches!(extraction.gps, GpsOutcome::Accepted(_)));
    assert_eq!(record.filename, "turtle.jpg");
    assert_eq!((record.width, record.height), (Some(64), Some(48)));
    assert_eq!(record.make.as_deref(), Some("OLYMPUS"));
    assert_eq!(record.model.as_deref(), Some("TG-6"));
    assert_eq!(record.datetimeoriginal.as_deref(), Some("2023:07:14 10:22:05"));
    assert!(record.datetime.is_none());
    assert!((record.latitude.unwrap() - 16.0544).abs() < 1e-9);
    assert!((record.longitude.unwrap() - 108.2022).abs() < 1e-9);
    assert!(record.error.is_none());
    assert!(!record.manually_tagged);
}

#[test]
fn test_camera_tags_keep_padding() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_jpeg(
        dir.path(),
        "padded.jpg",
        &[(Tag::Make, "SeaLife  "), (Tag::Model, "DC2000")],
        None,
    );

    let record = MetadataExtractor::default().extract(&path);
    assert_eq!(record.make.as_deref(), Some("SeaLife  "));
    assert_eq!(record.model.as_deref(), Some("DC2000"));
}

#[test]
fn test_southern_reference_negates_latitude() {
    let dir = tempfile::tempdir().unwrap();
    let gps = GpsFixture {
        latitude: [(10, 1), (0, 1), (0, 1)],
        latitude_ref: "S",
        longitude: [(20, 1), (30, 1), (0, 1)],
        longitude_ref: "E",
    };
    let path = write_jpeg(dir.path(), "ray.jpg", &[], Some(&gps));

    let record = MetadataExtractor::default().extract(&path);
    assert_eq!(record.latitude, Some(-10.0));
    assert_eq!(record.longitude, Some(20.5));
}

#[test]
fn test_null_island_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let gps = GpsFixture {
        latitude: [(0, 1), (0, 1), (0, 1)],
        latitude_ref: "N",
        longitude: [(0, 1), (0, 1), (0, 1)],
        longitude_ref: "E",
    };
    let path = write_jpeg(dir.path(), "placeholder.jpg", &[(Tag::Make, "GoPro")], Some(&gps));

    let extraction = MetadataExtractor::default().extract_detailed(&path);
    assert_eq!(extraction.gps, GpsOutcome::Rejected(Rejection::NullIsland));
    assert!(extraction.record.latitude.is_none());
    assert!(extraction.record.longitude.is_none());
    assert_eq!(extraction.record.make.as_deref(), Some("GoPro"));
}

#[test]
fn test_zero_denominator_seconds_count_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    let gps = GpsFixture {
        latitude: [(12, 1), (30, 1), (7, 0)],
        latitude_ref: "N",
        longitude: [(100, 1), (0, 1), (0, 1)],
        longitude_ref: "W",
    };
    let path = write_jpeg(dir.path(), "wreck.jpg", &[], Some(&gps));

    let record = MetadataExtractor::default().extract(&path);
    assert_eq!(record.latitude, Some(12.5));
    assert_eq!(record.longitude, Some(-100.0));
}

#[test]
fn test_image_without_exif_has_only_identity_and_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_plain_jpeg(dir.path(), "plain.jpg", 30, 20);

    let record = MetadataExtractor::default().extract(&path);
    let value = serde_json::to_value(&record).unwrap();
    let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["filename", "height", "path", "width"]);
    assert_eq!(value["width"], 30);
}

#[test]
fn test_undecodable_file_yields_error_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.jpg");
    std::fs::write(&path, b"definitely not a photograph").unwrap();

    let record = MetadataExtractor::default().extract(&path);
    assert!(record.error.is_some());
    assert_eq!(record.filename, "notes.jpg");
    assert!(record.width.is_none());
    assert!(!record.has_gps());
}

#[test]
fn test_process_directory_survives_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(dir.path(), "a_turtle.jpg", &[], Some(&GpsFixture::da_nang()));
    write_plain_jpeg(dir.path(), "b_moray.jpg", 40, 40);
    std::fs::write(dir.path().join("c_broken.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0, 1]).unwrap();
    std::fs::write(dir.path().join("readme.txt"), "skip me").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    write_plain_jpeg(&dir.path().join("nested"), "deep.jpg", 10, 10);

    let report = sorted_extractor().process_directory(dir.path()).unwrap();
    let names: Vec<&str> = report.records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, ["a_turtle.jpg", "b_moray.jpg", "c_broken.jpg"]);

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.with_gps, 1);
    assert_eq!(report.stats.without_gps, 2);
    assert_eq!(report.stats.failed, 1);
    assert!(report.records[2].error.is_some());
}

#[test]
fn test_process_missing_directory_errors() {
    let dir = tempfile::tempdir().unwrap();
    let result = MetadataExtractor::default().process_directory(&dir.path().join("gone"));
    assert!(result.is_err());
}
