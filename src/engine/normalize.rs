//! Normalisation of raw KTP field strings into [`KtpData`]

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::KtpData;
use super::ktp::{KtpField, RawFields};
use super::text::levenshtein;

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}-\d{1,2}-\d{4})").expect("valid date regex")
});

/// Residue of the "Tempat/Tgl Lahir" label left in the place name
static TGL_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[/\\]\s*[TtIi]gl\s*").expect("valid label regex")
});

const MIN_BIRTH_YEAR: i32 = 1910;
const MAX_BIRTH_YEAR: i32 = 2100;

/// (fuzzy key, canonical name, max edits), checked in order
const OCCUPATIONS: [(&str, &str, usize); 11] = [
    ("mengurus rumah tangga", "Mengurus Rumah Tangga", 6),
    ("buruh harian lepas", "Buruh Harian Lepas", 6),
    ("pegawai negeri sipil", "Pegawai Negeri Sipil", 5),
    ("pelajar/mahasiswa", "Pelajar/Mahasiswa", 4),
    ("pelajar/mhs", "Pelajar/Mahasiswa", 3),
    ("belum/tidak bekerja", "Belum/Tidak Bekerja", 5),
    ("karyawan swasta", "Karyawan Swasta", 4),
    ("pegawai negeri", "Pegawai Negeri", 4),
    ("wiraswasta", "Wiraswasta", 3),
    ("peg negeri", "Pegawai Negeri", 3),
    ("peg swasta", "Pegawai Swasta", 3),
];

const BLOOD_TYPES: [&str; 4] = ["a", "b", "ab", "o"];

/// Assemble the response record from raw field strings
pub fn build_ktp_data(raw: &RawFields) -> KtpData {
    let mut data = KtpData::default();

    data.nik = raw
        .get(KtpField::Nik)
        .map(|nik| nik.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|nik| !nik.is_empty());

    data.nama = raw
        .get(KtpField::Nama)
        .map(|nama| {
            nama.chars()
                .filter(|c| !c.is_ascii_digit() && *c != '-')
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|nama| !nama.is_empty());

    data.jenis_kelamin = match raw.get(KtpField::JenisKelamin) {
        Some("LAKI-LAKI") => Some("LAKI-LAKI".to_string()),
        Some("WANITA") | Some("PEREMPUAN") => Some("PEREMPUAN".to_string()),
        _ => None,
    };

    if let Some(ttl) = raw.get(KtpField::Ttl) {
        let (place, date) = split_birth(ttl);
        data.tempat_lahir = clean_birth_place(place);
        data.tanggal_lahir = parse_birth_date(date);
    }

    data.kewarganegaraan = raw.get(KtpField::Kewarganegaraan).map(|value| {
        if value == "WNI" {
            "INDONESIA".to_string()
        } else {
            value.to_string()
        }
    });

    data.status_perkawinan = raw.get(KtpField::StatusPerkawinan).and_then(normalize_marital_status);
    data.pekerjaan = raw.get(KtpField::Pekerjaan).map(normalize_occupation);
    data.golongan_darah = raw.get(KtpField::GolDarah).and_then(normalize_blood_type);

    let copy = |field| raw.get(field).map(str::to_string);
    data.provinsi = copy(KtpField::Provinsi);
    data.kota = copy(KtpField::Kota);
    data.alamat = copy(KtpField::Alamat);
    data.rt_rw = copy(KtpField::RtRw);
    data.kelurahan_desa = copy(KtpField::KelDesa);
    data.kecamatan = copy(KtpField::Kecamatan);
    data.agama = copy(KtpField::Agama);
    data.berlaku_hingga = copy(KtpField::BerlakuHingga);

    data
}

/// Split "PLACE, DD-MM-YYYY" into place and date parts
///
/// Without a separator the whole string is used for both.
fn split_birth(ttl: &str) -> (&str, &str) {
    let mut parts = ttl.split(", ");
    let place = parts.next().unwrap_or(ttl);
    match parts.next() {
        Some(date) => (place, date),
        None => (place, ttl),
    }
}

fn clean_birth_place(place: &str) -> Option<String> {
    let place = TGL_LABEL_REGEX.replace_all(place, "");
    let place: String = place
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    let place = place.trim().to_uppercase();

    if place.is_empty() {
        None
    } else {
        Some(place)
    }
}

/// Parse a birth date written as D-M-YYYY, or as eight bare digits (DDMMYYYY)
pub fn parse_birth_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    let date = if let Some(found) = DATE_REGEX.find(text) {
        NaiveDate::parse_from_str(found.as_str(), "%d-%m-%Y").ok()?
    } else {
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 8 {
            return None;
        }
        let day = digits[0..2].parse().ok()?;
        let month = digits[2..4].parse().ok()?;
        let year = digits[4..8].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?
    };

    if date.year() < MIN_BIRTH_YEAR || date.year() > MAX_BIRTH_YEAR {
        return None;
    }

    Some(date)
}

/// Map an occupation to its canonical spelling; unknown values pass through
pub fn normalize_occupation(occupation: &str) -> String {
    let lower = occupation.to_lowercase();

    OCCUPATIONS
        .iter()
        .find(|(key, _, tolerance)| levenshtein(key, &lower) <= *tolerance)
        .map(|(_, canonical, _)| canonical.to_string())
        .unwrap_or_else(|| occupation.to_string())
}

fn normalize_marital_status(status: &str) -> Option<String> {
    let lower = status.to_lowercase();

    if levenshtein("belum kawin", &lower) <= 2 || levenshtein("tidak kawin", &lower) <= 2 {
        Some("BELUM KAWIN".to_string())
    } else if levenshtein("kawin", &lower) <= 1 {
        Some("KAWIN".to_string())
    } else if ["janda", "duda", "cerai"].iter().any(|s| levenshtein(s, &lower) <= 2) {
        Some("CERAI".to_string())
    } else {
        None
    }
}

fn normalize_blood_type(raw: &str) -> Option<String> {
    let blood: String = raw.chars().filter(|c| !c.is_ascii_digit()).collect();
    let blood = blood.trim();

    if BLOOD_TYPES.contains(&blood.to_lowercase().as_str()) {
        Some(blood.to_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_birth_date_formats() {
        assert_eq!(parse_birth_date("17-08-1945"), NaiveDate::from_ymd_opt(1945, 8, 17));
        assert_eq!(parse_birth_date("lahir 1-2-2001 x"), NaiveDate::from_ymd_opt(2001, 2, 1));
        assert_eq!(parse_birth_date("17 08 1945"), NaiveDate::from_ymd_opt(1945, 8, 17));
        assert_eq!(parse_birth_date("17081945"), NaiveDate::from_ymd_opt(1945, 8, 17));
    }

    #[test]
    fn test_parse_birth_date_rejects_invalid() {
        assert_eq!(parse_birth_date(""), None);
        assert_eq!(parse_birth_date("32-01-2000"), None);
        assert_eq!(parse_birth_date("01-01-1900"), None);
        assert_eq!(parse_birth_date("01-01-2101"), None);
        assert_eq!(parse_birth_date("1708194"), None);
    }

    #[test]
    fn test_occupation_mapping() {
        assert_eq!(normalize_occupation("MENGURUS RUMAH TANGGA"), "Mengurus Rumah Tangga");
        assert_eq!(normalize_occupation("PELAJAR/MHS"), "Pelajar/Mahasiswa");
        assert_eq!(normalize_occupation("WIRASWSTA"), "Wiraswasta");
        assert_eq!(normalize_occupation("PETANI"), "PETANI");
    }

    #[test]
    fn test_marital_status() {
        assert_eq!(normalize_marital_status("BELUM KAWlN").as_deref(), Some("BELUM KAWIN"));
        assert_eq!(normalize_marital_status("KAWN").as_deref(), Some("KAWIN"));
        assert_eq!(normalize_marital_status("CERAI HIDUP"), None);
        assert_eq!(normalize_marital_status("JANDA").as_deref(), Some("CERAI"));
    }

    #[test]
    fn test_blood_type() {
        assert_eq!(normalize_blood_type("ab").as_deref(), Some("AB"));
        assert_eq!(normalize_blood_type("0 B").as_deref(), Some("B"));
        assert_eq!(normalize_blood_type("-"), None);
    }

    #[test]
    fn test_birth_place_without_separator() {
        let mut raw = RawFields::default();
        raw.set(KtpField::Ttl, "JAKARTA /Tgl 05-06-1988");
        let data = build_ktp_data(&raw);
        assert_eq!(data.tempat_lahir.as_deref(), Some("JAKARTA"));
        assert_eq!(data.tanggal_lahir, NaiveDate::from_ymd_opt(1988, 6, 5));
    }

    #[test]
    fn test_identity_fields_cleaned() {
        let mut raw = RawFields::default();
        raw.set(KtpField::Nik, "3171-0123 4567 8901");
        raw.set(KtpField::Nama, "SITI-AMINAH 2");
        raw.set(KtpField::Kewarganegaraan, "WNI");
        raw.set(KtpField::JenisKelamin, "PEREMPUAN");
        let data = build_ktp_data(&raw);
        assert_eq!(data.nik.as_deref(), Some("3171012345678901"));
        assert_eq!(data.nama.as_deref(), Some("SITIAMINAH"));
        assert_eq!(data.kewarganegaraan.as_deref(), Some("INDONESIA"));
        assert_eq!(data.jenis_kelamin.as_deref(), Some("PEREMPUAN"));
    }

    #[test]
    fn test_nik_without_digits_is_missing() {
        let mut raw = RawFields::default();
        raw.set(KtpField::Nik, "NIK");
        assert_eq!(build_ktp_data(&raw).nik, None);
    }
}
