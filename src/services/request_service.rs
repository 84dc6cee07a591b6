use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

use crate::access::Principal;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ProcurementRequest, ProcurementRequestDetail, RequestStatus};

use super::{page_offset, Paginated};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Validation failed")]
    Validation(HashMap<String, String>),
    #[error("Procurement request not found: {0}")]
    NotFound(i64),
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
}

/// Incoming procurement request fields. There is deliberately no owner
/// field here: the owner is always the requesting principal, so an owner
/// value smuggled into the payload is dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestInput {
    #[serde(default)]
    pub venue_id: Option<i64>,
    #[serde(default)]
    pub tanggal_permintaan: Option<String>,
    #[serde(default)]
    pub nama_barang: Option<String>,
    #[serde(default)]
    pub jumlah_barang: Option<i64>,
    #[serde(default)]
    pub sisa_barang: Option<i64>,
    #[serde(default)]
    pub penggunaan: Option<String>,
    #[serde(default)]
    pub pic_penerima: Option<String>,
    #[serde(default)]
    pub link_barang: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ValidatedRequest {
    venue_id: i64,
    tanggal_permintaan: NaiveDate,
    nama_barang: String,
    jumlah_barang: i32,
    sisa_barang: Option<i32>,
    penggunaan: String,
    pic_penerima: String,
    link_barang: Option<String>,
    note: Option<String>,
    keterangan: Option<String>,
    status: RequestStatus,
}

impl RequestInput {
    /// Validate against the create/update rules. On update, `existing`
    /// supplies the prior value for every field the payload omits; on
    /// create it is `None` and an omitted status defaults to pending.
    pub(crate) fn validate(
        &self,
        existing: Option<&ProcurementRequest>,
    ) -> Result<ValidatedRequest, HashMap<String, String>> {
        let mut errors = HashMap::new();

        let venue_id = self.venue_id.or(existing.map(|e| e.venue_id));
        if venue_id.is_none() {
            errors.insert("venue_id".to_string(), "Venue is required".to_string());
        }

        let tanggal_permintaan = match &self.tanggal_permintaan {
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.insert(
                        "tanggal_permintaan".to_string(),
                        "Request date is invalid".to_string(),
                    );
                    None
                }
            },
            None => existing.map(|e| e.tanggal_permintaan),
        };
        if tanggal_permintaan.is_none() && !errors.contains_key("tanggal_permintaan") {
            errors.insert(
                "tanggal_permintaan".to_string(),
                "Request date is required".to_string(),
            );
        }

        let nama_barang = self
            .nama_barang
            .as_deref()
            .map(|s| s.trim().to_string())
            .or(existing.map(|e| e.nama_barang.clone()));
        match nama_barang.as_deref() {
            None | Some("") => {
                errors.insert(
                    "nama_barang".to_string(),
                    "Item name is required".to_string(),
                );
            }
            Some(name) if name.len() > 255 => {
                errors.insert(
                    "nama_barang".to_string(),
                    "Item name must be at most 255 characters".to_string(),
                );
            }
            Some(_) => {}
        }

        let jumlah_barang = self
            .jumlah_barang
            .or(existing.map(|e| i64::from(e.jumlah_barang)));
        match jumlah_barang {
            None => {
                errors.insert(
                    "jumlah_barang".to_string(),
                    "Item quantity is required".to_string(),
                );
            }
            Some(n) if n < 1 => {
                errors.insert(
                    "jumlah_barang".to_string(),
                    "Item quantity must be at least 1".to_string(),
                );
            }
            Some(n) if n > i64::from(i32::MAX) => {
                errors.insert(
                    "jumlah_barang".to_string(),
                    "Item quantity is out of range".to_string(),
                );
            }
            Some(_) => {}
        }

        let sisa_barang = self.sisa_barang.or(existing.and_then(|e| {
            e.sisa_barang.map(i64::from)
        }));
        if let Some(n) = sisa_barang {
            if n < 0 {
                errors.insert(
                    "sisa_barang".to_string(),
                    "Remaining quantity cannot be negative".to_string(),
                );
            } else if n > i64::from(i32::MAX) {
                errors.insert(
                    "sisa_barang".to_string(),
                    "Remaining quantity is out of range".to_string(),
                );
            }
        }

        let penggunaan = self
            .penggunaan
            .as_deref()
            .map(|s| s.trim().to_string())
            .or(existing.map(|e| e.penggunaan.clone()));
        if penggunaan.as_deref().unwrap_or("").is_empty() {
            errors.insert(
                "penggunaan".to_string(),
                "Usage description is required".to_string(),
            );
        }

        let pic_penerima = self
            .pic_penerima
            .as_deref()
            .map(|s| s.trim().to_string())
            .or(existing.map(|e| e.pic_penerima.clone()));
        match pic_penerima.as_deref() {
            None | Some("") => {
                errors.insert(
                    "pic_penerima".to_string(),
                    "Recipient PIC is required".to_string(),
                );
            }
            Some(pic) if pic.len() > 255 => {
                errors.insert(
                    "pic_penerima".to_string(),
                    "Recipient PIC must be at most 255 characters".to_string(),
                );
            }
            Some(_) => {}
        }

        let link_barang = match self.link_barang.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let raw = raw.trim();
                if url::Url::parse(raw).is_err() {
                    errors.insert(
                        "link_barang".to_string(),
                        "Item link must be a valid URL".to_string(),
                    );
                }
                Some(raw.to_string())
            }
            Some(_) => None,
            None => existing.and_then(|e| e.link_barang.clone()),
        };

        let status = match self.status.as_deref() {
            Some("pending") => Some(RequestStatus::Pending),
            Some("approved") => Some(RequestStatus::Approved),
            Some("rejected") => Some(RequestStatus::Rejected),
            Some("received") => Some(RequestStatus::Received),
            Some(_) => {
                errors.insert("status".to_string(), "Status is invalid".to_string());
                None
            }
            None => Some(existing.map(|e| e.status).unwrap_or_default()),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedRequest {
            venue_id: venue_id.expect("validated above"),
            tanggal_permintaan: tanggal_permintaan.expect("validated above"),
            nama_barang: nama_barang.expect("validated above"),
            jumlah_barang: jumlah_barang.expect("validated above") as i32,
            sisa_barang: sisa_barang.map(|n| n as i32),
            penggunaan: penggunaan.expect("validated above"),
            pic_penerima: pic_penerima.expect("validated above"),
            link_barang,
            note: self.note.clone().or(existing.and_then(|e| e.note.clone())),
            keterangan: self
                .keterangan
                .clone()
                .or(existing.and_then(|e| e.keterangan.clone())),
            status: status.expect("validated above"),
        })
    }
}

pub struct RequestService {
    pool: PgPool,
}

impl RequestService {
    pub async fn new() -> Result<Self, RequestError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Newest-first page of requests visible to the principal.
    pub async fn list(
        &self,
        principal: Principal,
        page: Option<i64>,
    ) -> Result<Paginated<ProcurementRequestDetail>, RequestError> {
        let per_page = config::config().api.page_size;
        let (page, offset) = page_offset(page, per_page);
        let owner_filter = principal.request_read_scope().owner_filter();

        let mut sql = String::from(
            "SELECT pr.*, v.name AS venue_name, u.name AS user_name \
             FROM procurement_requests pr \
             JOIN venues v ON v.id = pr.venue_id \
             JOIN users u ON u.id = pr.user_id",
        );
        if owner_filter.is_some() {
            sql.push_str(" WHERE pr.user_id = $3");
        }
        sql.push_str(" ORDER BY pr.created_at DESC, pr.id DESC LIMIT $1 OFFSET $2");

        let mut query = sqlx::query_as::<_, ProcurementRequestDetail>(&sql)
            .bind(per_page)
            .bind(offset);
        if let Some(owner_id) = owner_filter {
            query = query.bind(owner_id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let total: i64 = match owner_filter {
            Some(owner_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM procurement_requests WHERE user_id = $1")
                    .bind(owner_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM procurement_requests")
                .fetch_one(&self.pool)
                .await?,
        };

        Ok(Paginated::new(rows, page, per_page, total))
    }

    /// Every request row visible to the principal, newest first. Feeds the
    /// dashboard and summary aggregations.
    pub async fn scoped_rows(
        &self,
        principal: Principal,
        limit: Option<i64>,
    ) -> Result<Vec<ProcurementRequestDetail>, RequestError> {
        let owner_filter = principal.request_read_scope().owner_filter();

        let mut sql = String::from(
            "SELECT pr.*, v.name AS venue_name, u.name AS user_name \
             FROM procurement_requests pr \
             JOIN venues v ON v.id = pr.venue_id \
             JOIN users u ON u.id = pr.user_id",
        );
        if owner_filter.is_some() {
            sql.push_str(" WHERE pr.user_id = $1");
        }
        sql.push_str(" ORDER BY pr.created_at DESC, pr.id DESC");
        if limit.is_some() {
            sql.push_str(if owner_filter.is_some() {
                " LIMIT $2"
            } else {
                " LIMIT $1"
            });
        }

        let mut query = sqlx::query_as::<_, ProcurementRequestDetail>(&sql);
        if let Some(owner_id) = owner_filter {
            query = query.bind(owner_id);
        }
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Scoped single-row read: a row outside the principal's read scope
    /// resolves as not found rather than leaking its existence.
    pub async fn get(
        &self,
        principal: Principal,
        id: i64,
    ) -> Result<ProcurementRequestDetail, RequestError> {
        let row = sqlx::query_as::<_, ProcurementRequestDetail>(
            "SELECT pr.*, v.name AS venue_name, u.name AS user_name \
             FROM procurement_requests pr \
             JOIN venues v ON v.id = pr.venue_id \
             JOIN users u ON u.id = pr.user_id \
             WHERE pr.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RequestError::NotFound(id))?;

        if !principal.request_read_scope().permits(row.request.user_id) {
            return Err(RequestError::NotFound(id));
        }
        Ok(row)
    }

    /// Unscoped fetch for mutation paths, where a foreign row must produce
    /// an authorization failure instead of a silent not-found.
    async fn get_unscoped(&self, id: i64) -> Result<ProcurementRequest, RequestError> {
        sqlx::query_as::<_, ProcurementRequest>(
            "SELECT * FROM procurement_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RequestError::NotFound(id))
    }

    /// Edit-form fetch; mutation rights are checked up front so the form
    /// is only served to principals who could actually submit it.
    pub async fn get_for_edit(
        &self,
        principal: Principal,
        id: i64,
    ) -> Result<ProcurementRequest, RequestError> {
        let existing = self.get_unscoped(id).await?;
        if !principal.can_update_request(existing.user_id) {
            return Err(RequestError::Forbidden(
                "You can only edit your own procurement requests",
            ));
        }
        Ok(existing)
    }

    /// Create with the owner forced to the requesting principal.
    pub async fn create(
        &self,
        principal: Principal,
        input: RequestInput,
    ) -> Result<ProcurementRequest, RequestError> {
        let validated = input.validate(None).map_err(RequestError::Validation)?;
        self.check_venue_exists(validated.venue_id).await?;

        let request = sqlx::query_as::<_, ProcurementRequest>(
            "INSERT INTO procurement_requests \
             (user_id, venue_id, tanggal_permintaan, nama_barang, jumlah_barang, sisa_barang, \
              penggunaan, pic_penerima, link_barang, note, keterangan, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(principal.id)
        .bind(validated.venue_id)
        .bind(validated.tanggal_permintaan)
        .bind(&validated.nama_barang)
        .bind(validated.jumlah_barang)
        .bind(validated.sisa_barang)
        .bind(&validated.penggunaan)
        .bind(&validated.pic_penerima)
        .bind(&validated.link_barang)
        .bind(&validated.note)
        .bind(&validated.keterangan)
        .bind(validated.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(request_id = request.id, user_id = principal.id, "procurement request created");
        Ok(request)
    }

    /// Full replace-by-field update; fields absent from the payload keep
    /// their prior value and the owner never changes.
    pub async fn update(
        &self,
        principal: Principal,
        id: i64,
        input: RequestInput,
    ) -> Result<ProcurementRequest, RequestError> {
        let existing = self.get_unscoped(id).await?;
        if !principal.can_update_request(existing.user_id) {
            return Err(RequestError::Forbidden(
                "You can only update your own procurement requests",
            ));
        }

        let validated = input
            .validate(Some(&existing))
            .map_err(RequestError::Validation)?;
        if validated.venue_id != existing.venue_id {
            self.check_venue_exists(validated.venue_id).await?;
        }

        let request = sqlx::query_as::<_, ProcurementRequest>(
            "UPDATE procurement_requests SET \
             venue_id = $1, tanggal_permintaan = $2, nama_barang = $3, jumlah_barang = $4, \
             sisa_barang = $5, penggunaan = $6, pic_penerima = $7, link_barang = $8, \
             note = $9, keterangan = $10, status = $11, updated_at = now() \
             WHERE id = $12 RETURNING *",
        )
        .bind(validated.venue_id)
        .bind(validated.tanggal_permintaan)
        .bind(&validated.nama_barang)
        .bind(validated.jumlah_barang)
        .bind(validated.sisa_barang)
        .bind(&validated.penggunaan)
        .bind(&validated.pic_penerima)
        .bind(&validated.link_barang)
        .bind(&validated.note)
        .bind(&validated.keterangan)
        .bind(validated.status)
        .bind(existing.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    /// Hard delete by the owner or a superadmin.
    pub async fn delete(&self, principal: Principal, id: i64) -> Result<(), RequestError> {
        let existing = self.get_unscoped(id).await?;
        if !principal.can_delete_request(existing.user_id) {
            return Err(RequestError::Forbidden(
                "You can only delete your own procurement requests",
            ));
        }

        sqlx::query("DELETE FROM procurement_requests WHERE id = $1")
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(request_id = existing.id, "procurement request deleted");
        Ok(())
    }

    async fn check_venue_exists(&self, venue_id: i64) -> Result<(), RequestError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM venues WHERE id = $1)")
                .bind(venue_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            let mut errors = HashMap::new();
            errors.insert(
                "venue_id".to_string(),
                "Selected venue does not exist".to_string(),
            );
            return Err(RequestError::Validation(errors));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_input() -> RequestInput {
        RequestInput {
            venue_id: Some(3),
            tanggal_permintaan: Some("2025-01-15".to_string()),
            nama_barang: Some("Proyektor".to_string()),
            jumlah_barang: Some(10),
            sisa_barang: None,
            penggunaan: Some("Rapat bulanan".to_string()),
            pic_penerima: Some("Budi".to_string()),
            link_barang: None,
            note: None,
            keterangan: None,
            status: None,
        }
    }

    #[test]
    fn create_defaults_status_to_pending() {
        let v = base_input().validate(None).unwrap();
        assert_eq!(v.status, RequestStatus::Pending);
        assert_eq!(v.venue_id, 3);
        assert_eq!(v.jumlah_barang, 10);
    }

    #[test]
    fn owner_in_payload_is_dropped_at_the_boundary() {
        // A spoofed user_id deserializes into nothing; the insert path only
        // ever binds the principal's id.
        let input: RequestInput = serde_json::from_value(json!({
            "user_id": 99,
            "venue_id": 3,
            "tanggal_permintaan": "2025-01-15",
            "nama_barang": "Proyektor",
            "jumlah_barang": 10,
            "penggunaan": "Rapat bulanan",
            "pic_penerima": "Budi"
        }))
        .unwrap();
        assert!(input.validate(None).is_ok());
    }

    #[test]
    fn rejects_zero_quantity() {
        let mut input = base_input();
        input.jumlah_barang = Some(0);
        let errors = input.validate(None).unwrap_err();
        assert_eq!(
            errors.get("jumlah_barang").unwrap(),
            "Item quantity must be at least 1"
        );
    }

    #[test]
    fn rejects_negative_remaining_quantity() {
        let mut input = base_input();
        input.sisa_barang = Some(-1);
        let errors = input.validate(None).unwrap_err();
        assert!(errors.contains_key("sisa_barang"));
    }

    #[test]
    fn remaining_quantity_is_not_checked_against_requested() {
        let mut input = base_input();
        input.sisa_barang = Some(500);
        let v = input.validate(None).unwrap();
        assert_eq!(v.sisa_barang, Some(500));
    }

    #[test]
    fn rejects_malformed_date_and_url() {
        let mut input = base_input();
        input.tanggal_permintaan = Some("15-01-2025".to_string());
        input.link_barang = Some("not a url".to_string());
        let errors = input.validate(None).unwrap_err();
        assert!(errors.contains_key("tanggal_permintaan"));
        assert!(errors.contains_key("link_barang"));
    }

    #[test]
    fn accepts_http_item_link() {
        let mut input = base_input();
        input.link_barang = Some("https://tokopedia.com/item/123".to_string());
        let v = input.validate(None).unwrap();
        assert_eq!(
            v.link_barang.as_deref(),
            Some("https://tokopedia.com/item/123")
        );
    }

    #[test]
    fn rejects_unknown_status_value() {
        let mut input = base_input();
        input.status = Some("cancelled".to_string());
        let errors = input.validate(None).unwrap_err();
        assert_eq!(errors.get("status").unwrap(), "Status is invalid");
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = RequestInput::default().validate(None).unwrap_err();
        for field in [
            "venue_id",
            "tanggal_permintaan",
            "nama_barang",
            "jumlah_barang",
            "penggunaan",
            "pic_penerima",
        ] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    fn existing_row() -> ProcurementRequest {
        ProcurementRequest {
            id: 1,
            user_id: 7,
            venue_id: 3,
            tanggal_permintaan: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            nama_barang: "Proyektor".to_string(),
            jumlah_barang: 10,
            sisa_barang: Some(4),
            penggunaan: "Rapat bulanan".to_string(),
            pic_penerima: "Budi".to_string(),
            link_barang: None,
            note: Some("urgent".to_string()),
            keterangan: None,
            status: RequestStatus::Approved,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn update_keeps_prior_values_for_omitted_fields() {
        let existing = existing_row();
        let input = RequestInput {
            nama_barang: Some("Proyektor Epson".to_string()),
            ..RequestInput::default()
        };
        let v = input.validate(Some(&existing)).unwrap();
        assert_eq!(v.nama_barang, "Proyektor Epson");
        assert_eq!(v.venue_id, 3);
        assert_eq!(v.jumlah_barang, 10);
        assert_eq!(v.sisa_barang, Some(4));
        // Status is not reset to pending on update
        assert_eq!(v.status, RequestStatus::Approved);
        assert_eq!(v.note.as_deref(), Some("urgent"));
    }

    #[test]
    fn update_may_move_status_backwards() {
        // No transition graph: received back to pending is allowed
        let mut existing = existing_row();
        existing.status = RequestStatus::Received;
        let input = RequestInput {
            status: Some("pending".to_string()),
            ..RequestInput::default()
        };
        let v = input.validate(Some(&existing)).unwrap();
        assert_eq!(v.status, RequestStatus::Pending);
    }
}
