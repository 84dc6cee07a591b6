use sgp_procurement_api::database::models::RequestStatus;
use sgp_procurement_api::stats::StatusTally;

#[test]
fn tally_partitions_any_status_mix() {
    use RequestStatus::*;

    let cases: Vec<Vec<RequestStatus>> = vec![
        vec![],
        vec![Pending],
        vec![Received, Received, Received],
        vec![Pending, Approved, Rejected, Received],
        vec![Approved, Pending, Approved, Pending, Rejected, Pending],
    ];

    for statuses in cases {
        let expected_total = statuses.len() as i64;
        let tally = StatusTally::from_statuses(statuses);
        assert_eq!(tally.total, expected_total);
        assert_eq!(
            tally.total,
            tally.pending + tally.approved + tally.rejected + tally.received,
            "tally must partition the input: {:?}",
            tally
        );
    }
}

#[test]
fn tally_counts_each_status_bucket() {
    use RequestStatus::*;

    let tally = StatusTally::from_statuses(vec![
        Pending, Pending, Approved, Rejected, Received, Received,
    ]);

    assert_eq!(tally.pending, 2);
    assert_eq!(tally.approved, 1);
    assert_eq!(tally.rejected, 1);
    assert_eq!(tally.received, 2);
    assert_eq!(tally.total, 6);
}

#[test]
fn status_serializes_as_lowercase_wire_values() {
    assert_eq!(
        serde_json::to_value(RequestStatus::Pending).unwrap(),
        "pending"
    );
    assert_eq!(
        serde_json::to_value(RequestStatus::Received).unwrap(),
        "received"
    );

    // Omitted status defaults to pending
    assert_eq!(RequestStatus::default(), RequestStatus::Pending);
}

#[test]
fn tally_serializes_all_counters() {
    let tally = StatusTally::from_statuses(vec![RequestStatus::Approved]);
    let value = serde_json::to_value(tally).unwrap();

    assert_eq!(value["total"], 1);
    assert_eq!(value["approved"], 1);
    assert_eq!(value["pending"], 0);
    assert_eq!(value["rejected"], 0);
    assert_eq!(value["received"], 0);
}
