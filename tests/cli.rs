use assert_cmd::Command;
use axum::Router;
use axum::routing::post;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use predicates::prelude::*;
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const ORANGE: Rgba<u8> = Rgba([240, 120, 20, 255]);
const TEAL: Rgba<u8> = Rgba([20, 160, 160, 255]);

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn config_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("config")
    }

    fn output_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("icons")
    }

    fn write_config(&self, config: serde_json::Value) {
        std::fs::create_dir_all(self.config_dir()).unwrap();
        std::fs::write(
            self.config_dir().join("config.json"),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("iconsmith").unwrap();
        cmd.current_dir(self.dir.path())
            .env("ICONSMITH_CONFIG_DIR", self.config_dir())
            .env("ICONSMITH_OUTPUT_DIR", self.output_dir())
            .env("NO_COLOR", "1")
            .env_remove("OPENAI_API_KEY")
            .env_remove("OPENAI_IMAGE_MODEL")
            .env_remove("ICONSMITH_LOG")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// A centred disk on black: left and right halves in the given colors.
fn icon_png(left: Rgba<u8>, right: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_fn(1024, 1024, |x, y| {
        let dx = x as f32 + 0.5 - 512.0;
        let dy = y as f32 + 0.5 - 512.0;
        if (dx * dx + dy * dy).sqrt() > 300.0 {
            Rgba([0, 0, 0, 255])
        } else if dx < 0.0 {
            left
        } else {
            right
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serve `png` from both image endpoints on a background runtime.
/// Returns the API base URL and a hit counter.
fn spawn_images_api(png: Vec<u8>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let body = json!({
        "data": [{ "b64_json": base64::engine::general_purpose::STANDARD.encode(&png) }]
    });
    let counter = hits.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let handler = move || {
                let body = body.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::Json(body)
                }
            };
            let router = Router::new()
                .route("/v1/images/generations", post(handler.clone()))
                .route("/v1/images/edits", post(handler));
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.ok();
        });
    });

    (format!("http://{addr}/v1"), hits)
}

#[test]
fn list_on_empty_output_dir() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No icons found."));
}

#[test]
fn set_key_writes_config_without_echoing_the_key() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["set-key", "sk-e2e-secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key saved"))
        .stdout(predicate::str::contains("sk-e2e-secret").not());

    let saved = std::fs::read_to_string(sandbox.config_dir().join("config.json")).unwrap();
    assert!(saved.contains("sk-e2e-secret"));
}

#[test]
fn generate_without_key_fails_before_any_call() {
    let sandbox = Sandbox::new();
    let (base_url, hits) = spawn_images_api(icon_png(ORANGE, ORANGE));
    sandbox.write_config(json!({ "base_url": base_url }));

    sandbox
        .cmd()
        .args(["generate", "a", "rocket"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config-error"))
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(files_in(&sandbox.output_dir()).is_empty());
}

#[test]
fn edit_with_nothing_generated_is_no_source_available() {
    let sandbox = Sandbox::new();
    let (base_url, hits) = spawn_images_api(icon_png(ORANGE, ORANGE));
    sandbox.write_config(json!({ "base_url": base_url }));

    sandbox
        .cmd()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["edit", "make", "it", "blue"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no-source-available"));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn generate_then_edit_then_list() {
    let sandbox = Sandbox::new();
    let (base_url, hits) = spawn_images_api(icon_png(ORANGE, ORANGE));
    sandbox.write_config(json!({ "api_key": "sk-stored", "base_url": base_url }));

    sandbox
        .cmd()
        .args(["generate", "a", "rocket", "--variants", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 variant(s) accepted"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let files = files_in(&sandbox.output_dir());
    assert_eq!(files.len(), 4, "{files:?}");
    assert!(files.iter().any(|f| f.ends_with("_a-rocket_v1.png")));
    assert!(files.iter().any(|f| f.ends_with("_a-rocket_v2.json")));

    sandbox
        .cmd()
        .args(["edit", "thicker", "flames"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Edit accepted"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let sidecar = files_in(&sandbox.output_dir())
        .into_iter()
        .find(|f| f.ends_with("_thicker-flames_v1.json"))
        .unwrap();
    let metadata: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(sandbox.output_dir().join(sidecar)).unwrap(),
    )
    .unwrap();
    assert_eq!(metadata["kind"], "edit");
    assert_eq!(metadata["retried"], false);
    assert_eq!(metadata["validation_passed"], true);
    assert!(
        metadata["parent_image"]
            .as_str()
            .unwrap()
            .contains("_a-rocket_v")
    );

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("thicker flames"))
        .stdout(predicate::str::contains("a rocket"));
}

#[test]
fn rejected_images_exit_nonzero_and_store_nothing() {
    let sandbox = Sandbox::new();
    let (base_url, hits) = spawn_images_api(icon_png(ORANGE, TEAL));
    sandbox.write_config(json!({ "base_url": base_url }));

    sandbox
        .cmd()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["generate", "a", "rocket", "-n", "1"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("validation-failed"))
        .stdout(predicate::str::contains("multi-color"));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(files_in(&sandbox.output_dir()).is_empty());
}
