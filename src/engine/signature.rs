//! Signature isolation
//!
//! Turns a photo of a signature on white paper into a tightly cropped,
//! transparent PNG with black ink:
//! grayscale -> blur -> inverse threshold -> outer contours -> crop -> RGBA.

use image::{codecs::png::PngEncoder, ColorType, GrayImage, ImageEncoder, RgbaImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{SignatureBox, SignatureDimensions, SignatureResponse};
use crate::storage::CdnClient;

/// Sigma equivalent to a 3x3 Gaussian kernel
const BLUR_SIGMA: f32 = 0.8;
/// Pixels at or below this after blurring count as ink
const INK_THRESHOLD: u8 = 127;
/// Contours smaller than this are not a signature on their own
const MIN_SIGNATURE_AREA: f64 = 500.0;
/// Strokes bigger than this are merged when no single contour is large enough
const MIN_STROKE_AREA: f64 = 50.0;
const CROP_PADDING: u32 = 20;
const CONFIDENCE: f32 = 0.9;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to build signature image")]
    Buffer,
    #[error("Signature task failed: {0}")]
    Task(String),
}

/// A cropped signature ready for upload
#[derive(Debug, Clone)]
pub struct ExtractedSignature {
    pub png: Vec<u8>,
    pub bbox: SignatureBox,
    pub dimensions: SignatureDimensions,
    pub confidence: f32,
}

/// Find the signature in an encoded image
///
/// Returns `Ok(None)` when no ink is found.
pub fn extract_signature(bytes: &[u8]) -> Result<Option<ExtractedSignature>, SignatureError> {
    let image = image::load_from_memory(bytes)?;
    let gray = image.to_luma8();
    let (img_w, img_h) = gray.dimensions();

    let blurred = imageproc::filter::gaussian_blur_f32(&gray, BLUR_SIGMA);
    let mut binary = imageproc::contrast::threshold(&blurred, INK_THRESHOLD);
    image::imageops::invert(&mut binary);

    let contours: Vec<Contour<u32>> = find_contours::<u32>(&binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect();

    let Some(bbox) = locate_signature(&contours) else {
        debug!(width = img_w, height = img_h, "No signature contours found");
        return Ok(None);
    };

    let bbox = pad_box(bbox, img_w, img_h);
    let crop = image::imageops::crop_imm(&binary, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
    let rgba = transparent_signature(&crop)?;
    let png = encode_png(&rgba)?;

    info!(
        x = bbox.x,
        y = bbox.y,
        width = bbox.width,
        height = bbox.height,
        bytes = png.len(),
        "Signature extracted"
    );

    Ok(Some(ExtractedSignature {
        png,
        bbox,
        dimensions: SignatureDimensions {
            width: rgba.width(),
            height: rgba.height(),
        },
        confidence: CONFIDENCE,
    }))
}

/// Bounding box of the largest contour, or of all strokes when the largest is small
fn locate_signature(contours: &[Contour<u32>]) -> Option<SignatureBox> {
    let areas: Vec<f64> = contours.iter().map(|c| polygon_area(&c.points)).collect();

    let (largest, largest_area) = areas
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, a)| match best {
            Some((_, b)) if a <= b => best,
            _ => Some((i, a)),
        })?;

    if largest_area >= MIN_SIGNATURE_AREA {
        return bounding_rect(contours[largest].points.iter());
    }

    let strokes: Vec<&Contour<u32>> = contours
        .iter()
        .zip(&areas)
        .filter(|(_, area)| **area > MIN_STROKE_AREA)
        .map(|(c, _)| c)
        .collect();

    if strokes.is_empty() {
        return None;
    }

    bounding_rect(strokes.iter().flat_map(|c| c.points.iter()))
}

/// Shoelace area of a closed contour
fn polygon_area(points: &[imageproc::point::Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum();

    twice_area.abs() / 2.0
}

fn bounding_rect<'a, I>(points: I) -> Option<SignatureBox>
where
    I: Iterator<Item = &'a imageproc::point::Point<u32>>,
{
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut any = false;

    for p in points {
        any = true;
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    any.then(|| SignatureBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Grow the box by the crop padding, clamped to the image
fn pad_box(bbox: SignatureBox, img_w: u32, img_h: u32) -> SignatureBox {
    let x = bbox.x.saturating_sub(CROP_PADDING);
    let y = bbox.y.saturating_sub(CROP_PADDING);
    SignatureBox {
        x,
        y,
        width: (bbox.width + 2 * CROP_PADDING).min(img_w - x),
        height: (bbox.height + 2 * CROP_PADDING).min(img_h - y),
    }
}

/// Ink becomes opaque black, everything else fully transparent
fn transparent_signature(mask: &GrayImage) -> Result<RgbaImage, SignatureError> {
    let (width, height) = mask.dimensions();

    let pixels: Vec<u8> = mask
        .as_raw()
        .par_iter()
        .flat_map_iter(|&v| if v > INK_THRESHOLD { [0, 0, 0, 255] } else { [0, 0, 0, 0] })
        .collect();

    RgbaImage::from_raw(width, height, pixels).ok_or(SignatureError::Buffer)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, SignatureError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Extracts signatures and publishes them to the CDN
pub struct SignatureService {
    cdn: CdnClient,
}

impl SignatureService {
    pub fn new(cdn: CdnClient) -> Self {
        SignatureService { cdn }
    }

    /// Run extraction on the blocking pool, then upload the PNG
    pub async fn extract_and_upload(&self, bytes: Vec<u8>) -> SignatureResponse {
        if bytes.is_empty() {
            return SignatureResponse::failed("No image provided");
        }

        let extracted = tokio::task::spawn_blocking(move || extract_signature(&bytes))
            .await
            .map_err(|e| SignatureError::Task(e.to_string()))
            .and_then(|result| result);

        let signature = match extracted {
            Ok(Some(signature)) => signature,
            Ok(None) => return SignatureResponse::failed("No signature found in image"),
            Err(e) => {
                warn!(error = %e, "Signature extraction failed");
                return SignatureResponse::failed(format!("Error: {}", e));
            }
        };

        debug!(
            x = signature.bbox.x,
            y = signature.bbox.y,
            confidence = signature.confidence,
            "Uploading signature"
        );

        match self.cdn.upload_png(signature.png, None).await {
            Ok(url) => SignatureResponse {
                success: true,
                message: "Signature extracted and uploaded successfully".to_string(),
                signature_url: Some(url),
                confidence: Some(signature.confidence),
                dimensions: Some(signature.dimensions),
            },
            Err(e) => {
                warn!(error = %e, "Signature upload failed");
                SignatureResponse::failed(format!("Failed to upload signature: {}", e))
            }
        }
    }
}
