use assert_cmd::Command;
use predicates::prelude::*;

fn chesscal() -> Command {
    Command::cargo_bin("chesscal").unwrap()
}

#[test]
fn generate_writes_pdf_and_reports_grid() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = tmp.path().join("board.pdf");
    let png = tmp.path().join("board.png");

    chesscal()
        .args(["generate", "--preview-dpi", "30", "--output"])
        .arg(&pdf)
        .arg("--preview")
        .arg(&png)
        .assert()
        .success()
        .stdout(predicate::str::contains("Box size: 1.80 cm"))
        .stdout(predicate::str::contains("inner corners"));

    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF-"));
    assert!(png.exists());
}

#[test]
fn generate_saves_resolved_config() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg_path = tmp.path().join("target.json");

    chesscal()
        .args(["generate", "--fit-across", "10", "--palette", "monochrome"])
        .arg("--output")
        .arg(tmp.path().join("board.pdf"))
        .arg("--save-config")
        .arg(&cfg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Grid: 10x"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cfg_path).unwrap()).unwrap();
    assert_eq!(saved["sizing"]["mode"], "fit_across");
    assert_eq!(saved["sizing"]["boxes"], 10);
    assert_eq!(saved["palette"], "monochrome");
}

#[test]
fn generate_rejects_conflicting_sizing_flags() {
    chesscal()
        .args(["generate", "--box-mm", "20", "--fit-across", "8"])
        .assert()
        .failure();
}

#[test]
fn calibrate_without_images_fails_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir(&images).unwrap();
    let archive = tmp.path().join("out/calibration.npz");

    chesscal()
        .arg("calibrate")
        .arg("--image-dir")
        .arg(&images)
        .arg("--output")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no jpg/png files found"));

    assert!(!archive.exists());
}

#[test]
fn extract_without_videos_fails() {
    let tmp = tempfile::tempdir().unwrap();
    chesscal()
        .arg("extract")
        .arg("--video-dir")
        .arg(tmp.path())
        .arg("--output-dir")
        .arg(tmp.path().join("frames"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no mov files found"));
}

#[test]
fn visualize_missing_directory_fails() {
    let tmp = tempfile::tempdir().unwrap();
    chesscal()
        .arg("visualize")
        .arg("--image-dir")
        .arg(tmp.path().join("missing"))
        .arg("--output-dir")
        .arg(tmp.path().join("review"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read directory"));
}

#[test]
fn config_file_values_are_used() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg_path = tmp.path().join("calibrate.json");
    let images = tmp.path().join("nothing_here");
    std::fs::create_dir(&images).unwrap();
    let cfg = serde_json::json!({
        "image_dir": images,
        "board": { "cols": 7, "rows": 5, "square_size": 2.5 }
    });
    std::fs::write(&cfg_path, cfg.to_string()).unwrap();

    chesscal()
        .arg("calibrate")
        .arg("--config")
        .arg(&cfg_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing_here"));
}
