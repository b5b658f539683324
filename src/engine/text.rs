//! Word boxes and fuzzy text helpers shared by the KTP parser

use crate::domain::OcrResult;

/// An OCR word with its four corners, clockwise from top-left
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub label: String,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub x3: i32,
    pub y3: i32,
    pub x4: i32,
    pub y4: i32,
    pub w: i32,
    pub h: i32,
}

impl WordBox {
    /// Lowercased label, as compared against field keywords
    pub fn key(&self) -> String {
        self.label.to_lowercase()
    }

    /// Angle of the top edge (x1,y1 -> x2,y2)
    pub fn top_edge_degree(&self) -> f64 {
        calc_degree(self.x1 as f64, self.y1 as f64, self.x2 as f64, self.y2 as f64)
    }
}

/// Flatten annotations into word boxes, skipping entries with fewer than 4 vertices
pub fn convert_format(result: &OcrResult) -> Vec<WordBox> {
    result
        .text_annotations
        .iter()
        .filter_map(|annotation| {
            let v = annotation.vertices();
            if v.len() < 4 {
                return None;
            }

            Some(WordBox {
                label: annotation.description.clone(),
                x1: v[0].x,
                y1: v[0].y,
                x2: v[1].x,
                y2: v[1].y,
                x3: v[2].x,
                y3: v[2].y,
                x4: v[3].x,
                y4: v[3].y,
                w: v[2].x - v[0].x,
                h: v[2].y - v[0].y,
            })
        })
        .collect()
}

/// Edit distance between two strings, counted in chars
pub fn levenshtein(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();

    let (long, short) = if source.len() < target.len() {
        (&target, &source)
    } else {
        (&source, &target)
    };

    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitution = previous[j] + usize::from(lc != sc);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// Direction from (x2,y2) towards (x1,y1) in degrees, normalised to [0, 360)
pub fn calc_degree(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let degrees = (y1 - y2).atan2(x1 - x2).to_degrees();
    if degrees >= 0.0 {
        degrees
    } else {
        360.0 + degrees
    }
}

/// Index of the first minimum, or None for an empty slice
pub fn argmin<T: PartialOrd + Copy>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
