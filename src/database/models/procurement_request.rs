use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Request lifecycle status. There is no enforced transition graph; any
/// authorized mutator may set any value in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Received,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcurementRequest {
    pub id: i64,
    /// Owner; immutable after creation
    pub user_id: i64,
    pub venue_id: i64,
    pub tanggal_permintaan: NaiveDate,
    pub nama_barang: String,
    pub jumlah_barang: i32,
    pub sisa_barang: Option<i32>,
    pub penggunaan: String,
    pub pic_penerima: String,
    pub link_barang: Option<String>,
    pub note: Option<String>,
    pub keterangan: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request row joined with its venue and owner names for list/detail views
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProcurementRequestDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: ProcurementRequest,
    pub venue_name: String,
    pub user_name: String,
}
