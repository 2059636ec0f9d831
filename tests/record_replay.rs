//! Cassette replay integration tests; zero network I/O.
//!
//! Each test writes a cassette to a temp directory and points
//! `REIMAGINE_REPLAY` at it, so the binary never contacts a live endpoint.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use serde_json::{json, Value};

const DESCRIPTION: &str = "A red bicycle on a beach under a purple sky";

fn cmd(cassette: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("reimagine");
    cmd.env("REIMAGINE_REPLAY", cassette)
        .env("REIMAGINE_CONFIG", "/nonexistent/reimagine/config.toml")
        .env_remove("REIMAGINE_REC")
        .env_remove("GEMINI_API_KEY");
    cmd
}

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn encoded(img: &image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn jpeg_bytes() -> Vec<u8> {
    encoded(&image::DynamicImage::new_rgb8(2, 2), image::ImageFormat::Jpeg)
}

/// Fresh scratch directory holding the input photo.
fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("photo.jpg"), jpeg_bytes()).unwrap();
    dir
}

fn write_cassette(dir: &Path, interactions: &[Value]) -> PathBuf {
    let cassette = json!({
        "name": "replay-test",
        "recorded_at": "2026-01-01T00:00:00Z",
        "commit": "test",
        "interactions": interactions,
    });
    let path = dir.join("pipeline.cassette.yaml");
    std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    path
}

fn interaction(seq: u64, port: &str, method: &str, output: Value) -> Value {
    json!({"seq": seq, "port": port, "method": method, "input": {}, "output": output})
}

fn describe_ok(seq: u64, text: &str) -> Value {
    interaction(seq, "prompt_describer", "describe", json!({"Ok": text}))
}

fn describe_err(seq: u64, message: &str) -> Value {
    interaction(seq, "prompt_describer", "describe", json!({"Err": message}))
}

fn generate_ok(seq: u64, data: &[u8], mime_type: &str) -> Value {
    let image = json!({"data": b64(data), "mime_type": mime_type});
    interaction(seq, "image_generator", "generate", json!({"Ok": image}))
}

fn generate_err(seq: u64, message: &str) -> Value {
    interaction(seq, "image_generator", "generate", json!({"Err": message}))
}

/// Cassette with a successful describe followed by a successful generate.
fn happy_cassette(dir: &Path, data: &[u8], mime_type: &str) -> PathBuf {
    write_cassette(dir, &[describe_ok(0, DESCRIPTION), generate_ok(1, data, mime_type)])
}

#[test]
fn happy_path_prints_data_uri() {
    let dir = workdir("reimagine_replay_data_uri");
    let new_jpeg = jpeg_bytes();
    let cassette = happy_cassette(&dir, &new_jpeg, "image/jpeg");

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .args(["make the sky purple", "--no-save", "--data-uri"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("data:image/jpeg;base64,{}\n", b64(&new_jpeg))))
        .stderr(predicate::str::contains("Describing image..."))
        .stderr(predicate::str::contains("Generating image..."))
        .stderr(predicate::str::contains("Done."));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn verbose_shows_descriptive_prompt() {
    let dir = workdir("reimagine_replay_verbose");
    let cassette = happy_cassette(&dir, &jpeg_bytes(), "image/jpeg");

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .args(["make the sky purple", "--no-save", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("Generating image from prompt: {DESCRIPTION}")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn describe_failure_never_reaches_generator() {
    let dir = workdir("reimagine_replay_describe_fail");
    // No generate interaction: a call would fail with "Cassette exhausted".
    let cassette = write_cassette(&dir, &[describe_err(0, "API key not valid")]);

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .arg("make the sky purple")
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed: API key not valid"))
        .stderr(predicate::str::contains("Error: prompt description failed: API key not valid"))
        .stderr(predicate::str::contains("Generating image").not())
        .stderr(predicate::str::contains("Cassette exhausted").not());

    let produced: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("make-the-sky"))
        .collect();
    assert!(produced.is_empty(), "No image should be written on failure");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_failure_fails_run() {
    let dir = workdir("reimagine_replay_generate_fail");
    let cassette = write_cassette(
        &dir,
        &[describe_ok(0, "A red bicycle on a beach"), generate_err(1, "quota exceeded")],
    );

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .args(["make the sky purple", "--data-uri"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error: image generation failed: quota exceeded"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn auto_filename_uses_instruction() {
    let dir = workdir("reimagine_replay_autofile");
    let cassette = happy_cassette(&dir, &jpeg_bytes(), "image/jpeg");

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .arg("Make the sky PURPLE!")
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("make-the-sky-purple-"))
        .collect();
    assert_eq!(names.len(), 1, "Exactly one image should be created, got {names:?}");
    assert!(names[0].ends_with(".jpg"), "got {}", names[0]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn png_result_is_converted_to_requested_jpeg() {
    let dir = workdir("reimagine_replay_convert");
    let png = encoded(&image::DynamicImage::new_rgba8(2, 2), image::ImageFormat::Png);
    let cassette = happy_cassette(&dir, &png, "image/png");
    let out = dir.join("edited.jpg");

    cmd(&cassette)
        .arg(dir.join("photo.jpg"))
        .args(["make the sky purple", "--image-model", "nano-banana", "--format", "jpeg"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[..3], &[0xFF, 0xD8, 0xFF], "Output should be a JPEG file");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_cassette_is_config_error() {
    cmd(Path::new("/nonexistent/pipeline.cassette.yaml"))
        .args(["photo.jpg", "make the sky purple"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load cassette"));
}
