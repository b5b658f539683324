//! Structured KTP (Indonesian identity card) data

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fields read from the front of a KTP
///
/// Field names follow the labels printed on the card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KtpData {
    /// 16-digit national identity number
    pub nik: Option<String>,
    pub nama: Option<String>,
    pub tempat_lahir: Option<String>,
    /// Birth date (YYYY-MM-DD)
    pub tanggal_lahir: Option<NaiveDate>,
    /// LAKI-LAKI or PEREMPUAN
    pub jenis_kelamin: Option<String>,
    /// A, B, AB or O
    pub golongan_darah: Option<String>,
    pub alamat: Option<String>,
    pub rt_rw: Option<String>,
    pub kelurahan_desa: Option<String>,
    pub kecamatan: Option<String>,
    pub agama: Option<String>,
    /// BELUM KAWIN, KAWIN or CERAI
    pub status_perkawinan: Option<String>,
    pub pekerjaan: Option<String>,
    pub kewarganegaraan: Option<String>,
    pub berlaku_hingga: Option<String>,
    pub provinsi: Option<String>,
    /// Regency or city, prefixed with KABUPATEN or KOTA
    pub kota: Option<String>,
}

/// Response body of `POST /extract-ktp`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KtpResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<KtpData>,
}

impl KtpResponse {
    pub fn extracted(data: KtpData) -> Self {
        KtpResponse {
            success: true,
            message: "KTP data extracted successfully".to_string(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        KtpResponse {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
