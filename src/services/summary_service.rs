use serde::Serialize;
use sqlx::PgPool;

use crate::access::Principal;
use crate::database::manager::DatabaseManager;
use crate::database::models::{ProcurementRequestDetail, RequestStatus};
use crate::stats::{StatusTally, VenueUsage};

use super::request_service::{RequestError, RequestService};

/// Dashboard counters for the superadmin view. Rejected/received counts are
/// intentionally absent here; consumers tolerate missing counters.
#[derive(Debug, Serialize)]
pub struct AdminDashboardStats {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub approved_requests: i64,
    pub total_venues: i64,
}

#[derive(Debug, Serialize)]
pub struct UserRequestStats {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub approved_requests: i64,
    pub rejected_requests: i64,
}

impl From<StatusTally> for UserRequestStats {
    fn from(tally: StatusTally) -> Self {
        Self {
            total_requests: tally.total,
            pending_requests: tally.pending,
            approved_requests: tally.approved,
            rejected_requests: tally.rejected,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminSummaryStats {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub approved_requests: i64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DashboardPayload {
    Superadmin {
        stats: AdminDashboardStats,
        recent_requests: Vec<ProcurementRequestDetail>,
    },
    User {
        stats: UserRequestStats,
        user_requests: Vec<ProcurementRequestDetail>,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SummaryPayload {
    Superadmin {
        stats: AdminSummaryStats,
        venue_stats: Vec<VenueUsage>,
        recent_activity: Vec<ProcurementRequestDetail>,
        can_manage_all: bool,
    },
    User {
        stats: UserRequestStats,
        user_requests: Vec<ProcurementRequestDetail>,
        can_manage_all: bool,
    },
}

pub struct SummaryService {
    pool: PgPool,
    requests: RequestService,
}

impl SummaryService {
    pub async fn new() -> Result<Self, RequestError> {
        let pool = DatabaseManager::pool().await?;
        let requests = RequestService::new().await?;
        Ok(Self { pool, requests })
    }

    pub async fn dashboard(&self, principal: Principal) -> Result<DashboardPayload, RequestError> {
        if principal.is_superadmin() {
            let tally = self.tally_all().await?;
            let total_venues: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM venues WHERE status = 'active'")
                    .fetch_one(&self.pool)
                    .await?;
            let recent_requests = self.requests.scoped_rows(principal, Some(5)).await?;

            Ok(DashboardPayload::Superadmin {
                stats: AdminDashboardStats {
                    total_requests: tally.total,
                    pending_requests: tally.pending,
                    approved_requests: tally.approved,
                    total_venues,
                },
                recent_requests,
            })
        } else {
            let user_requests = self.requests.scoped_rows(principal, None).await?;
            let tally =
                StatusTally::from_statuses(user_requests.iter().map(|r| r.request.status));

            Ok(DashboardPayload::User {
                stats: tally.into(),
                user_requests,
            })
        }
    }

    pub async fn summary(&self, principal: Principal) -> Result<SummaryPayload, RequestError> {
        if principal.is_superadmin() {
            let tally = self.tally_all().await?;
            let venue_stats = self.top_venues(5).await?;
            let recent_activity = self.requests.scoped_rows(principal, Some(10)).await?;

            Ok(SummaryPayload::Superadmin {
                stats: AdminSummaryStats {
                    total_requests: tally.total,
                    pending_requests: tally.pending,
                    approved_requests: tally.approved,
                },
                venue_stats,
                recent_activity,
                can_manage_all: true,
            })
        } else {
            let user_requests = self.requests.scoped_rows(principal, None).await?;
            let tally =
                StatusTally::from_statuses(user_requests.iter().map(|r| r.request.status));

            Ok(SummaryPayload::User {
                stats: tally.into(),
                user_requests,
                can_manage_all: false,
            })
        }
    }

    /// System-wide tally; only reachable through superadmin paths where the
    /// read scope is the full row set.
    async fn tally_all(&self) -> Result<StatusTally, RequestError> {
        let statuses: Vec<RequestStatus> =
            sqlx::query_scalar("SELECT status FROM procurement_requests")
                .fetch_all(&self.pool)
                .await?;
        Ok(StatusTally::from_statuses(statuses))
    }

    /// Most-requested venues, count descending with id as the tie-break so
    /// the ranking is stable between invocations.
    async fn top_venues(&self, limit: i64) -> Result<Vec<VenueUsage>, RequestError> {
        let rows = sqlx::query_as::<_, VenueUsage>(
            "SELECT v.id, v.name, COUNT(pr.id) AS request_count \
             FROM venues v \
             LEFT JOIN procurement_requests pr ON pr.venue_id = v.id \
             GROUP BY v.id, v.name \
             ORDER BY request_count DESC, v.id ASC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
