//! Status aggregation over scope-filtered procurement request rows.
//!
//! Counts are recomputed from the caller's row set on every invocation;
//! there is no caching. Row sets are small and none of this sits on a
//! latency-critical path.

use serde::Serialize;

use crate::database::models::RequestStatus;

/// Counters partitioned by request status. The invariant
/// `total == pending + approved + rejected + received` holds for any
/// input; views are free to serialize only a subset of the counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub received: i64,
}

impl StatusTally {
    /// Single pass over an already scope-filtered collection.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = RequestStatus>,
    {
        let mut tally = StatusTally::default();
        for status in statuses {
            tally.record(status);
        }
        tally
    }

    pub fn record(&mut self, status: RequestStatus) {
        self.total += 1;
        match status {
            RequestStatus::Pending => self.pending += 1,
            RequestStatus::Approved => self.approved += 1,
            RequestStatus::Rejected => self.rejected += 1,
            RequestStatus::Received => self.received += 1,
        }
    }
}

/// Venue row with the number of procurement requests referencing it.
/// Ordered descending by count; ties break on venue id ascending so
/// repeated invocations return the same ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VenueUsage {
    pub id: i64,
    pub name: String,
    pub request_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn tally_is_a_partition_of_the_input() {
        let statuses = vec![
            Pending, Approved, Pending, Rejected, Received, Approved, Pending,
        ];
        let tally = StatusTally::from_statuses(statuses);

        assert_eq!(tally.total, 7);
        assert_eq!(tally.pending, 3);
        assert_eq!(tally.approved, 2);
        assert_eq!(tally.rejected, 1);
        assert_eq!(tally.received, 1);
        assert_eq!(
            tally.total,
            tally.pending + tally.approved + tally.rejected + tally.received
        );
    }

    #[test]
    fn empty_input_tallies_to_zero() {
        let tally = StatusTally::from_statuses(std::iter::empty());
        assert_eq!(tally, StatusTally::default());
    }

    #[test]
    fn record_accumulates_incrementally() {
        let mut tally = StatusTally::default();
        tally.record(Pending);
        tally.record(Received);
        assert_eq!(tally.total, 2);
        assert_eq!(tally.pending, 1);
        assert_eq!(tally.received, 1);
        assert_eq!(tally.approved + tally.rejected, 0);
    }
}
