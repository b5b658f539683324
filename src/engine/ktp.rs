//! KTP field extraction from OCR word boxes
//!
//! Each card label ("NIK", "Nama", "Tempat/Tgl Lahir", ...) is located by
//! fuzzy matching against the OCR words. The value is read from the words
//! lying on the same text line to the right of the label: close in y and
//! at the same angle as the label's top edge, so slightly rotated photos
//! still line up.

use std::collections::HashMap;
use tracing::debug;

use crate::domain::{KtpData, OcrResult};
use super::normalize::build_ktp_data;
use super::text::{argmin, calc_degree, convert_format, levenshtein, WordBox};

/// Max vertical distance between a label and its value words
const LINE_Y_WINDOW: i32 = 300;
/// Max angular deviation (degrees) from the label's text direction
const LINE_ANGLE_TOLERANCE: f64 = 3.0;
/// Right margin used before the NIK line has been measured
const NO_RIGHT_MARGIN: i32 = 9999;

/// Fields read from the card, in extraction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KtpField {
    Provinsi,
    Kota,
    Nik,
    Nama,
    Ttl,
    JenisKelamin,
    GolDarah,
    Alamat,
    RtRw,
    KelDesa,
    Kecamatan,
    Agama,
    StatusPerkawinan,
    Pekerjaan,
    Kewarganegaraan,
    BerlakuHingga,
}

/// How a field's label is located on the card
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: KtpField,
    pub keyword: &'static str,
    pub typo_tolerance: usize,
}

const fn rule(field: KtpField, keyword: &'static str, typo_tolerance: usize) -> FieldRule {
    FieldRule { field, keyword, typo_tolerance }
}

/// Order matters: the NIK line sets the right margin used by Pekerjaan.
pub const FIELD_RULES: [FieldRule; 16] = [
    rule(KtpField::Provinsi, "provinsi", 2),
    rule(KtpField::Kota, "kabupaten", 2),
    rule(KtpField::Nik, "nik", 1),
    rule(KtpField::Nama, "nama", 2),
    rule(KtpField::Ttl, "tempat/tgl", 5),
    rule(KtpField::JenisKelamin, "kelamin", 3),
    rule(KtpField::GolDarah, "darah", 3),
    rule(KtpField::Alamat, "alamat", 2),
    rule(KtpField::RtRw, "rt/rw", 3),
    rule(KtpField::KelDesa, "kel/desa", 4),
    rule(KtpField::Kecamatan, "kecamatan", 3),
    rule(KtpField::Agama, "agama", 3),
    rule(KtpField::StatusPerkawinan, "perkawinan", 4),
    rule(KtpField::Pekerjaan, "pekerjaan", 4),
    rule(KtpField::Kewarganegaraan, "kewarganegaraan", 4),
    rule(KtpField::BerlakuHingga, "berlaku", 4),
];

/// Raw field strings before normalisation
#[derive(Debug, Default, Clone)]
pub struct RawFields(HashMap<KtpField, String>);

impl RawFields {
    pub fn get(&self, field: KtpField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: KtpField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }
}

/// Per-card state carried across fields
struct ParseState {
    right_margin: i32,
}

impl Default for ParseState {
    fn default() -> Self {
        ParseState { right_margin: NO_RIGHT_MARGIN }
    }
}

/// Parses OCR output of a KTP photo into [`KtpData`]
#[derive(Debug, Default, Clone)]
pub struct KtpExtractor;

impl KtpExtractor {
    pub fn new() -> Self {
        KtpExtractor
    }

    /// Extract all card fields; returns an empty record when there are no words
    pub fn extract(&self, ocr: &OcrResult) -> KtpData {
        let raw = self.extract_raw(ocr);
        build_ktp_data(&raw)
    }

    /// Locate every field and return the cleaned raw strings
    pub fn extract_raw(&self, ocr: &OcrResult) -> RawFields {
        let words = convert_format(ocr);
        let mut raw = RawFields::default();

        if words.is_empty() {
            return raw;
        }

        let words: Vec<&WordBox> = words.iter().collect();
        let mut state = ParseState::default();

        for rule in FIELD_RULES {
            let value = self
                .attribute(&words, rule.field, rule.keyword, rule.typo_tolerance, &mut state)
                .map(|v| v.replace(": ", "").replace(':', ""))
                .filter(|v| !v.is_empty());

            debug!(field = ?rule.field, value = ?value, "Extracted KTP field");

            if let Some(value) = value {
                raw.set(rule.field, value);
            }
        }

        raw
    }

    fn attribute(
        &self,
        words: &[&WordBox],
        field: KtpField,
        keyword: &str,
        tolerance: usize,
        state: &mut ParseState,
    ) -> Option<String> {
        // Province names like JAWA/NUSA sit near "NAMA" in edit distance
        let candidates: Vec<&WordBox> = if field == KtpField::Nama {
            words
                .iter()
                .copied()
                .filter(|w| !matches!(w.key().as_str(), "jawa" | "nusa"))
                .collect()
        } else {
            words.to_vec()
        };

        let keys: Vec<String> = candidates.iter().map(|w| w.key()).collect();
        let alt_keyword = keyword.contains('/').then(|| keyword.replace('/', " "));
        let distances: Vec<usize> = keys
            .iter()
            .map(|key| {
                let d = levenshtein(keyword, key);
                match &alt_keyword {
                    Some(alt) => d.min(levenshtein(alt, key)),
                    None => d,
                }
            })
            .collect();

        let index = argmin(&distances)?;
        if distances[index] > tolerance {
            if field == KtpField::Kota && keyword != "kota" {
                return self.attribute(&candidates, field, "kota", 1, state);
            }
            return None;
        }

        let anchor = candidates[index];
        let degree = anchor.top_edge_degree();

        let mut values: Vec<&WordBox> = candidates
            .iter()
            .copied()
            .filter(|w| (anchor.y1 - w.y1).abs() < LINE_Y_WINDOW)
            .filter(|w| {
                let d = calc_degree(anchor.x1 as f64, anchor.y1 as f64, w.x1 as f64, w.y1 as f64);
                (d - degree).abs() < LINE_ANGLE_TOLERANCE
            })
            .filter(|w| !w.label.replace([' ', ':'], "").is_empty())
            .collect();

        // The blood-type label shares the line with Jenis Kelamin
        remove_closest(&mut values, "gol.", 1);
        remove_closest(&mut values, "darah", 1);

        match field {
            KtpField::Nik => {
                if let Some(max_x) = values.iter().map(|w| w.x2).max() {
                    state.right_margin = max_x;
                }
            }
            KtpField::Kota => {
                let value = join_labels(&values);
                let prefix = if keyword == "kabupaten" { "KABUPATEN" } else { "KOTA" };
                return Some(format!("{} {}", prefix, value));
            }
            KtpField::Ttl => {
                for label in ["lahir", "tempat/tgl", "tempat", "tgl"] {
                    if remove_closest(&mut values, label, 2) {
                        break;
                    }
                }
            }
            KtpField::JenisKelamin => {
                for w in &values {
                    let key = w.key();
                    if levenshtein("laki-laki", &key) <= 2 || levenshtein("laki", &key) <= 1 {
                        return Some("LAKI-LAKI".to_string());
                    }
                    if levenshtein("wanita", &key) <= 2 || levenshtein("perempuan", &key) <= 2 {
                        return Some("PEREMPUAN".to_string());
                    }
                }
                return None;
            }
            KtpField::GolDarah => {
                return values
                    .iter()
                    .find(|w| w.label.chars().count() <= 3)
                    .map(|w| w.label.clone());
            }
            KtpField::Pekerjaan => {
                // The photo sits right of the NIK column; drop words beyond it
                remove_closest(&mut values, "kartu", 2);
                values.retain(|w| w.x1 <= state.right_margin);
            }
            KtpField::Kewarganegaraan => {
                // "wna" is one edit from "wni", so it must be matched first
                if values.iter().any(|w| w.key() == "wna") {
                    return Some("WNA".to_string());
                }
                if values.iter().any(|w| levenshtein("wni", &w.key()) <= 1) {
                    return Some("WNI".to_string());
                }
                return leftmost(&values).map(|w| w.label.clone());
            }
            KtpField::StatusPerkawinan => {
                let value = leftmost(&values)?;
                if levenshtein("belum", &value.key()) <= 1 {
                    return Some("BELUM KAWIN".to_string());
                }
                return Some(value.label.clone());
            }
            KtpField::BerlakuHingga => {
                remove_closest(&mut values, "hingga", 2);
                let value = leftmost(&values)?;
                if levenshtein("seumur", &value.key()) <= 2 {
                    return Some("SEUMUR HIDUP".to_string());
                }
                return Some(value.label.clone());
            }
            _ => {}
        }

        let value = join_labels(&values);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Remove the word closest to `keyword` if it is within `tolerance` edits
fn remove_closest(words: &mut Vec<&WordBox>, keyword: &str, tolerance: usize) -> bool {
    let distances: Vec<usize> = words.iter().map(|w| levenshtein(keyword, &w.key())).collect();
    match argmin(&distances) {
        Some(index) if distances[index] <= tolerance => {
            words.remove(index);
            true
        }
        _ => false,
    }
}

fn leftmost<'a>(words: &[&'a WordBox]) -> Option<&'a WordBox> {
    let xs: Vec<i32> = words.iter().map(|w| w.x1).collect();
    argmin(&xs).map(|i| words[i])
}

fn join_labels(words: &[&WordBox]) -> String {
    words
        .iter()
        .map(|w| w.label.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
