use std::collections::HashMap;

use serde::Deserialize;
use sqlx::PgPool;

use crate::access::Principal;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ProcurementRequestDetail, Venue, VenueStatus};

use super::{page_offset, Paginated};

#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("Validation failed")]
    Validation(HashMap<String, String>),
    #[error("Venue not found: {0}")]
    NotFound(i64),
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
}

/// Incoming venue fields; string-typed so every constraint failure maps to
/// a field-keyed reason instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
struct ValidatedVenue {
    name: String,
    description: Option<String>,
    address: Option<String>,
    status: VenueStatus,
}

impl VenueInput {
    fn validate(&self) -> Result<ValidatedVenue, HashMap<String, String>> {
        let mut errors = HashMap::new();

        let name = self.name.as_deref().unwrap_or("").trim().to_string();
        if name.is_empty() {
            errors.insert("name".to_string(), "Venue name is required".to_string());
        } else if name.len() > 255 {
            errors.insert(
                "name".to_string(),
                "Venue name must be at most 255 characters".to_string(),
            );
        }

        let status = match self.status.as_deref() {
            Some("active") => Some(VenueStatus::Active),
            Some("inactive") => Some(VenueStatus::Inactive),
            Some(_) => {
                errors.insert("status".to_string(), "Venue status is invalid".to_string());
                None
            }
            None => {
                errors.insert("status".to_string(), "Venue status is required".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedVenue {
            name,
            description: self.description.clone(),
            address: self.address.clone(),
            status: status.expect("status validated above"),
        })
    }
}

pub struct VenueService {
    pool: PgPool,
}

impl VenueService {
    pub async fn new() -> Result<Self, VenueError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Newest-first venue page; readable by every authenticated principal.
    pub async fn list(&self, page: Option<i64>) -> Result<Paginated<Venue>, VenueError> {
        let per_page = config::config().api.page_size;
        let (page, offset) = page_offset(page, per_page);

        let venues = sqlx::query_as::<_, Venue>(
            "SELECT * FROM venues ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated::new(venues, page, per_page, total))
    }

    /// Venues offered on the request-creation form. UI convenience only;
    /// request creation itself accepts any existing venue.
    pub async fn list_active(&self) -> Result<Vec<Venue>, VenueError> {
        let venues = sqlx::query_as::<_, Venue>(
            "SELECT * FROM venues WHERE status = 'active' ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(venues)
    }

    pub async fn get(&self, id: i64) -> Result<Venue, VenueError> {
        sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(VenueError::NotFound(id))
    }

    /// Venue detail with its referencing requests, reduced to the
    /// principal's read scope.
    pub async fn get_with_requests(
        &self,
        principal: Principal,
        id: i64,
    ) -> Result<(Venue, Vec<ProcurementRequestDetail>), VenueError> {
        let venue = self.get(id).await?;

        let mut sql = String::from(
            "SELECT pr.*, v.name AS venue_name, u.name AS user_name \
             FROM procurement_requests pr \
             JOIN venues v ON v.id = pr.venue_id \
             JOIN users u ON u.id = pr.user_id \
             WHERE pr.venue_id = $1",
        );
        if principal.request_read_scope().owner_filter().is_some() {
            sql.push_str(" AND pr.user_id = $2");
        }
        sql.push_str(" ORDER BY pr.created_at DESC, pr.id DESC");

        let mut query = sqlx::query_as::<_, ProcurementRequestDetail>(&sql).bind(id);
        if let Some(owner_id) = principal.request_read_scope().owner_filter() {
            query = query.bind(owner_id);
        }
        let requests = query.fetch_all(&self.pool).await?;

        Ok((venue, requests))
    }

    pub async fn create(
        &self,
        principal: Principal,
        input: VenueInput,
    ) -> Result<Venue, VenueError> {
        if !principal.can_create_venue() {
            return Err(VenueError::Forbidden("Only superadmins can create venues"));
        }

        let validated = input.validate().map_err(VenueError::Validation)?;
        self.check_name_unique(&validated.name, None).await?;

        let venue = sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (name, description, address, status) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&validated.name)
        .bind(&validated.description)
        .bind(&validated.address)
        .bind(validated.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(venue_id = venue.id, "venue created");
        Ok(venue)
    }

    pub async fn update(
        &self,
        principal: Principal,
        id: i64,
        input: VenueInput,
    ) -> Result<Venue, VenueError> {
        if !principal.can_update_venue() {
            return Err(VenueError::Forbidden("Only superadmins can update venues"));
        }

        // 404 before validation so a missing id never reads as a field error
        let existing = self.get(id).await?;

        let validated = input.validate().map_err(VenueError::Validation)?;
        // Renaming a venue to its own current name is a no-op and passes
        self.check_name_unique(&validated.name, Some(existing.id))
            .await?;

        let venue = sqlx::query_as::<_, Venue>(
            "UPDATE venues SET name = $1, description = $2, address = $3, status = $4, \
             updated_at = now() WHERE id = $5 RETURNING *",
        )
        .bind(&validated.name)
        .bind(&validated.description)
        .bind(&validated.address)
        .bind(validated.status)
        .bind(existing.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(venue)
    }

    /// Hard delete, blocked while procurement requests still reference the
    /// venue.
    pub async fn delete(&self, principal: Principal, id: i64) -> Result<(), VenueError> {
        if !principal.can_delete_venue() {
            return Err(VenueError::Forbidden("Only superadmins can delete venues"));
        }

        let venue = self.get(id).await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM procurement_requests WHERE venue_id = $1")
                .bind(venue.id)
                .fetch_one(&self.pool)
                .await?;
        if references > 0 {
            let mut errors = HashMap::new();
            errors.insert(
                "venue".to_string(),
                "Cannot delete a venue that still has procurement requests".to_string(),
            );
            return Err(VenueError::Validation(errors));
        }

        sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(venue.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(venue_id = venue.id, "venue deleted");
        Ok(())
    }

    /// Case-sensitive, exact-match uniqueness; `exclude_id` carves out the
    /// row being updated.
    async fn check_name_unique(
        &self,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), VenueError> {
        let count: i64 = match exclude_id {
            Some(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM venues WHERE name = $1 AND id <> $2")
                    .bind(name)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM venues WHERE name = $1")
                .bind(name)
                .fetch_one(&self.pool)
                .await?,
        };

        if count > 0 {
            let mut errors = HashMap::new();
            errors.insert("name".to_string(), "Venue name already exists".to_string());
            return Err(VenueError::Validation(errors));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: Option<&str>, status: Option<&str>) -> VenueInput {
        VenueInput {
            name: name.map(str::to_string),
            description: None,
            address: None,
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn accepts_minimal_valid_input() {
        let v = input(Some("Lippo"), Some("active")).validate().unwrap();
        assert_eq!(v.name, "Lippo");
        assert_eq!(v.status, VenueStatus::Active);
        assert!(v.description.is_none());
    }

    #[test]
    fn rejects_missing_name_and_status() {
        let errors = input(None, None).validate().unwrap_err();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("status"));
    }

    #[test]
    fn rejects_blank_name() {
        let errors = input(Some("   "), Some("active")).validate().unwrap_err();
        assert!(errors.contains_key("name"));
    }

    #[test]
    fn rejects_unknown_status() {
        let errors = input(Some("Lippo"), Some("closed")).validate().unwrap_err();
        assert_eq!(errors.get("status").unwrap(), "Venue status is invalid");
    }

    #[test]
    fn trims_name_before_storing() {
        let v = input(Some("  Lippo  "), Some("inactive")).validate().unwrap();
        assert_eq!(v.name, "Lippo");
        assert_eq!(v.status, VenueStatus::Inactive);
    }
}
