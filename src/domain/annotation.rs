//! OCR annotations in the Google Cloud Vision wire layout
//!
//! Every OCR provider converts its output into this shape so the KTP parser
//! only deals with one format. By convention the first annotation holds the
//! full text block and later ones hold individual words or lines.

use serde::{Deserialize, Serialize};

/// A polygon corner; coordinates omitted on the wire default to 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Vertex { x, y }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// A recognised piece of text with its bounding polygon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

impl TextAnnotation {
    pub fn new(description: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        TextAnnotation {
            description: description.into(),
            bounding_poly: Some(BoundingPoly { vertices }),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.bounding_poly
            .as_ref()
            .map(|poly| poly.vertices.as_slice())
            .unwrap_or(&[])
    }
}

/// Output of a text detection call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    #[serde(default)]
    pub text_annotations: Vec<TextAnnotation>,
}

impl OcrResult {
    pub fn is_empty(&self) -> bool {
        self.text_annotations.is_empty()
    }

    /// Whether the annotations carry at least `min_chars` characters of text
    pub fn is_meaningful(&self, min_chars: usize) -> bool {
        if self.text_annotations.is_empty() {
            return false;
        }

        let total: String = self
            .text_annotations
            .iter()
            .map(|a| a.description.as_str())
            .collect();

        total.trim().chars().count() >= min_chars
    }
}
