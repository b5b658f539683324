//! PaddleOCR to Vision layout mapper

use crate::domain::{OcrResult, TextAnnotation, Vertex};
use super::models::ServingLine;

/// Page-sized box given to the synthetic full-text annotation
const FULL_TEXT_EXTENT: i32 = 1000;

pub struct PaddleMapper;

impl PaddleMapper {
    /// Map recognised lines to annotations, full text first
    ///
    /// Lines without four corner points are dropped.
    pub fn map_lines(lines: Vec<ServingLine>) -> OcrResult {
        let mut annotations: Vec<TextAnnotation> = lines
            .into_iter()
            .filter(|line| line.text_region.len() >= 4)
            .map(Self::map_line)
            .collect();

        if annotations.is_empty() {
            return OcrResult::default();
        }

        let full_text = annotations
            .iter()
            .map(|a| a.description.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        annotations.insert(
            0,
            TextAnnotation::new(
                full_text.trim(),
                vec![
                    Vertex::new(0, 0),
                    Vertex::new(FULL_TEXT_EXTENT, 0),
                    Vertex::new(FULL_TEXT_EXTENT, FULL_TEXT_EXTENT),
                    Vertex::new(0, FULL_TEXT_EXTENT),
                ],
            ),
        );

        OcrResult {
            text_annotations: annotations,
        }
    }

    fn map_line(line: ServingLine) -> TextAnnotation {
        let vertices = line
            .text_region
            .iter()
            .take(4)
            .map(|[x, y]| Vertex::new(*x as i32, *y as i32))
            .collect();

        TextAnnotation::new(line.text, vertices)
    }
}
