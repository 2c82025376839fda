use crate::error::ProviderError;
use crate::model::{ArtifactMetadata, BackgroundMode, METADATA_SCHEMA_VERSION, RequestKind};
use crate::provider::{ImageProvider, ProviderRequest};
use crate::store::fs::FileStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: FileStore,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = FileStore::new(root.clone());
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }
}

pub fn sample_metadata(description: &str, variant_index: u32, retried: bool) -> ArtifactMetadata {
    ArtifactMetadata {
        schema_version: METADATA_SCHEMA_VERSION,
        kind: RequestKind::Generate,
        description: description.to_string(),
        compiled_prompt: format!("icon of {description}"),
        model: "test-model".to_string(),
        variant_index,
        created_at: Utc::now(),
        retried,
        validation_passed: true,
        width: 1024,
        height: 1024,
        background: BackgroundMode::Black,
        parent_image: None,
        warnings: Vec::new(),
    }
}

/// Replays queued responses in order and records every request it sees.
///
/// Running out of responses is itself a provider error, so a test that
/// expects N calls fails loudly on the N+1th.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, bytes: Vec<u8>) -> Self {
        self.push(Ok(bytes));
        self
    }

    pub fn fail(self, error: ProviderError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, response: Result<Vec<u8>, ProviderError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn render(&self, request: &ProviderRequest) -> Result<Vec<u8>, ProviderError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Service {
                    status: 500,
                    message: "no scripted response left".to_string(),
                })
            })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Synthetic icon layers for exercising the checker and pipeline.
pub mod fixtures {
    use crate::checker::{CANVAS_SIZE, Corner};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    pub const ORANGE: Rgba<u8> = Rgba([240, 120, 20, 255]);
    pub const TEAL: Rgba<u8> = Rgba([20, 160, 160, 255]);

    /// Blend weights of the anti-aliasing rings drawn outside the disk.
    const SOFT_EDGE_RINGS: [f32; 3] = [0.75, 0.5, 0.25];

    enum Fill {
        Solid(Rgba<u8>),
        Split(Rgba<u8>, Rgba<u8>),
    }

    /// A centred disk on a flat background.
    pub struct IconFixture {
        size: u32,
        background: Rgba<u8>,
        fill: Option<Fill>,
        soft_edge: bool,
        corners: Vec<(Corner, Rgba<u8>)>,
    }

    impl Default for IconFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IconFixture {
        pub fn new() -> Self {
            Self {
                size: CANVAS_SIZE,
                background: BLACK,
                fill: None,
                soft_edge: false,
                corners: Vec::new(),
            }
        }

        pub fn size(mut self, size: u32) -> Self {
            self.size = size;
            self
        }

        pub fn background(mut self, color: Rgba<u8>) -> Self {
            self.background = color;
            self
        }

        pub fn disk(mut self, color: Rgba<u8>) -> Self {
            self.fill = Some(Fill::Solid(color));
            self
        }

        /// Left half `left`, right half `right`.
        pub fn split_disk(mut self, left: Rgba<u8>, right: Rgba<u8>) -> Self {
            self.fill = Some(Fill::Split(left, right));
            self
        }

        /// Add one-pixel rings blending the disk into the background.
        pub fn soft_edge(mut self) -> Self {
            self.soft_edge = true;
            self
        }

        /// Paint a single corner pixel.
        pub fn corner(mut self, corner: Corner, color: Rgba<u8>) -> Self {
            self.corners.push((corner, color));
            self
        }

        pub fn build(&self) -> RgbaImage {
            let size = self.size;
            let centre = size as f32 / 2.0;
            let radius = size as f32 * 0.3;

            let mut img = RgbaImage::from_pixel(size, size, self.background);
            if let Some(fill) = &self.fill {
                for (x, y, pixel) in img.enumerate_pixels_mut() {
                    let dx = x as f32 + 0.5 - centre;
                    let dy = y as f32 + 0.5 - centre;
                    let distance = (dx * dx + dy * dy).sqrt();
                    let color = match fill {
                        Fill::Solid(c) => *c,
                        Fill::Split(left, right) => {
                            if dx < 0.0 {
                                *left
                            } else {
                                *right
                            }
                        }
                    };

                    if distance <= radius {
                        *pixel = color;
                    } else if self.soft_edge {
                        let ring = (distance - radius).ceil() as usize;
                        if let Some(weight) = SOFT_EDGE_RINGS.get(ring.saturating_sub(1)) {
                            *pixel = blend(color, self.background, *weight);
                        }
                    }
                }
            }

            let last = size - 1;
            for (corner, color) in &self.corners {
                let (x, y) = match corner {
                    Corner::TopLeft => (0, 0),
                    Corner::TopRight => (last, 0),
                    Corner::BottomLeft => (0, last),
                    Corner::BottomRight => (last, last),
                };
                img.put_pixel(x, y, *color);
            }
            img
        }

        pub fn png(&self) -> Vec<u8> {
            encode_png(self.build())
        }
    }

    pub fn encode_png(img: RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode fixture png");
        bytes
    }

    fn blend(fg: Rgba<u8>, bg: Rgba<u8>, weight: f32) -> Rgba<u8> {
        let mix = |f: u8, b: u8| (f as f32 * weight + b as f32 * (1.0 - weight)).round() as u8;
        Rgba([
            mix(fg.0[0], bg.0[0]),
            mix(fg.0[1], bg.0[1]),
            mix(fg.0[2], bg.0[2]),
            mix(fg.0[3], bg.0[3]),
        ])
    }
}
