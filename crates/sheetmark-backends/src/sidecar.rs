//! Manual-entry recognizer: marks typed into a JSON file beside each scan.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use sheetmark_core::traits::{ImageHandle, RecognitionResult, SheetRecognizer};

/// Reads `sheet.json` for the image `sheet.png`.
///
/// The sidecar holds a serialized [`RecognitionResult`], e.g.
/// `{"detectedRollSuffix": "023", "marks": {"1": 4, "2_a": 3}}`. A handle that
/// already points at a `.json` file is read directly.
#[derive(Debug, Clone, Default)]
pub struct SidecarRecognizer;

impl SidecarRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Path of the sidecar file for an image.
    pub fn sidecar_path(image: &ImageHandle) -> PathBuf {
        let path = Path::new(image.as_str());
        if path.extension().is_some_and(|ext| ext == "json") {
            path.to_path_buf()
        } else {
            path.with_extension("json")
        }
    }
}

#[async_trait]
impl SheetRecognizer for SidecarRecognizer {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn recognize(&self, image: &ImageHandle) -> anyhow::Result<RecognitionResult> {
        let path = Self::sidecar_path(image);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read sidecar: {}", path.display()))?;
        let result: RecognitionResult = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse sidecar: {}", path.display()))?;
        Ok(result)
    }
}
