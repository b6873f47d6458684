//! CLI smoke tests.

use assert_cmd::Command;
use flextarget::{ImageBuffer, PixelFormat};
use predicates::prelude::*;

fn write_png(dir: &tempfile::TempDir, name: &str, buf: &ImageBuffer) -> std::path::PathBuf {
    let path = dir.path().join(name);
    flextarget::adapt::save(buf, &path).expect("write test image");
    path
}

fn two_blob_mask() -> ImageBuffer {
    let mut data = vec![0u8; 64 * 64];
    for y in 10..20 {
        for x in 10..20 {
            data[y * 64 + x] = 255;
        }
    }
    for y in 40..50 {
        for x in 40..50 {
            data[y * 64 + x] = 255;
        }
    }
    ImageBuffer::new(64, 64, PixelFormat::Gray8, data).unwrap()
}

#[test]
fn contours_reports_blob_count_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let mask = write_png(&dir, "mask.png", &two_blob_mask());

    Command::cargo_bin("flextarget")
        .unwrap()
        .args(["contours", "--binary"])
        .arg(&mask)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 2"));
}

#[test]
fn contours_writes_overlay_image() {
    let dir = tempfile::tempdir().unwrap();
    let mask = write_png(&dir, "mask.png", &two_blob_mask());
    let overlay = dir.path().join("overlay.png");

    Command::cargo_bin("flextarget")
        .unwrap()
        .args(["contours", "--binary"])
        .arg(&mask)
        .arg("--overlay")
        .arg(&overlay)
        .assert()
        .success();

    assert!(overlay.exists());
}

#[test]
fn diff_of_identical_images_is_zero() {
    let dir = tempfile::tempdir().unwrap();
    let img = ImageBuffer::filled(32, 32, PixelFormat::Rgba8, 200).unwrap();
    let a = write_png(&dir, "a.png", &img);
    let b = write_png(&dir, "b.png", &img);

    Command::cargo_bin("flextarget")
        .unwrap()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mean_abs_diff\": 0.0"));
}

#[test]
fn frame_command_fails_cleanly_without_a_frame() {
    let dir = tempfile::tempdir().unwrap();
    let blank = ImageBuffer::filled(64, 64, PixelFormat::Rgba8, 255).unwrap();
    let input = write_png(&dir, "blank.png", &blank);
    let output = dir.path().join("interior.png");

    Command::cargo_bin("flextarget")
        .unwrap()
        .arg("frame")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Frame"));
}
