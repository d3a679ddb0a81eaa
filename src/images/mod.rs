use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::ImageFormat;

use crate::core::{ExportError, ExportResult, ImageError};

/// Dereferences one image URL into raw bytes.
///
/// The upload provider only matters in the other direction (bytes -> URL);
/// this side of the contract is all the engine consumes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// Production fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

/// Outcome of materializing one image reference.
#[derive(Debug, Clone)]
pub enum ResolvedImage {
    /// Verified image data. `bytes` are always PNG, JPEG, GIF or BMP; any
    /// other decodable format is normalized to PNG here so both generators
    /// can embed the buffer as-is.
    Ready { bytes: Vec<u8>, format: ImageFormat },
    /// Fetch or decode failed; both generators emit a placeholder at this
    /// index instead of dropping it.
    Failed,
}

impl ResolvedImage {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResolvedImage::Ready { .. })
    }
}

/// Resolves a list of image references into decoded, verified buffers.
///
/// All references are fetched concurrently; completion order is irrelevant
/// because results land in a fixed-size vector addressed by input index.
/// A single bad reference never aborts the batch.
pub struct ImageMaterializer {
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageMaterializer {
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(HttpFetcher::new()))
    }

    pub fn with_fetcher(fetcher: Arc<dyn ImageFetcher>) -> Self {
        ImageMaterializer { fetcher }
    }

    pub async fn materialize(&self, refs: &[String]) -> ExportResult<Vec<ResolvedImage>> {
        let tasks: Vec<_> = refs
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, url)| {
                let fetcher = Arc::clone(&self.fetcher);
                tokio::spawn(async move { (index, resolve_one(fetcher.as_ref(), &url).await) })
            })
            .collect();

        let mut resolved: Vec<ResolvedImage> =
            refs.iter().map(|_| ResolvedImage::Failed).collect();
        let mut failures = 0usize;

        for joined in futures::future::join_all(tasks).await {
            let (index, outcome) = joined
                .map_err(|e| ExportError::Orchestration(format!("image task failed: {}", e)))?;

            match outcome {
                Ok(image) => resolved[index] = image,
                Err(err) => {
                    failures += 1;
                    tracing::warn!(index, error = %err, "image materialization failed");
                }
            }
        }

        if failures > 0 {
            tracing::info!(
                total = refs.len(),
                failures,
                "image batch resolved with placeholder entries"
            );
        }

        Ok(resolved)
    }
}

impl Default for ImageMaterializer {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve_one(fetcher: &dyn ImageFetcher, url: &str) -> Result<ResolvedImage, ImageError> {
    let bytes = fetcher.fetch(url).await?;

    let format = image::guess_format(&bytes)?;
    // Full decode doubles as verification that the payload is image data.
    let decoded = image::load_from_memory(&bytes)?;

    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp => {
            Ok(ResolvedImage::Ready { bytes, format })
        }
        _ => {
            let bytes = encode_png(&decoded)?;
            Ok(ResolvedImage::Ready {
                bytes,
                format: ImageFormat::Png,
            })
        }
    }
}

fn encode_png(decoded: &image::DynamicImage) -> Result<Vec<u8>, ImageError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    let rgb = decoded.to_rgb8();
    let mut out = Vec::new();
    PngEncoder::new(std::io::Cursor::new(&mut out)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ColorType::Rgb8,
    )?;
    Ok(out)
}
