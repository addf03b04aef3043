use prometheus::{Counter, Histogram, Registry};
use std::sync::Arc;

pub struct AclMetrics {
    pub updates_committed: Counter,
    pub cas_conflicts: Counter,
    pub retries_exhausted: Counter,
    pub store_errors: Counter,
    pub corrupted_reads: Counter,
    pub rights_index_failures: Counter,
    pub events_dispatched: Counter,
    pub update_latency: Histogram,
    pub registry: Registry,
}

impl AclMetrics {
    pub fn new() -> Arc<Self> {
        let registry = Registry::new();

        let updates_committed = Counter::new(
            "acl_updates_committed_total",
            "Total number of committed ACL updates",
        )
        .expect("Failed to create acl_updates_committed counter");

        let cas_conflicts = Counter::new(
            "acl_cas_conflicts_total",
            "Total number of conditional ACL writes that lost a race",
        )
        .expect("Failed to create acl_cas_conflicts counter");

        let retries_exhausted = Counter::new(
            "acl_retries_exhausted_total",
            "Total number of ACL updates abandoned after too many conflicts",
        )
        .expect("Failed to create acl_retries_exhausted counter");

        let store_errors = Counter::new(
            "acl_store_errors_total",
            "Total number of ACL store calls that failed or timed out",
        )
        .expect("Failed to create acl_store_errors counter");

        let corrupted_reads = Counter::new(
            "acl_corrupted_reads_total",
            "Total number of stored ACLs read back as empty because they could not be decoded",
        )
        .expect("Failed to create acl_corrupted_reads counter");

        let rights_index_failures = Counter::new(
            "acl_rights_index_failures_total",
            "Total number of rights index updates that failed after a committed ACL write",
        )
        .expect("Failed to create acl_rights_index_failures counter");

        let events_dispatched = Counter::new(
            "acl_events_dispatched_total",
            "Total number of mailbox events handed to listeners",
        )
        .expect("Failed to create acl_events_dispatched counter");

        let update_latency = Histogram::with_opts(prometheus::HistogramOpts::new(
            "acl_update_latency_seconds",
            "ACL update latency including retries",
        ))
        .expect("Failed to create acl_update_latency histogram");

        registry
            .register(Box::new(updates_committed.clone()))
            .unwrap();
        registry.register(Box::new(cas_conflicts.clone())).unwrap();
        registry
            .register(Box::new(retries_exhausted.clone()))
            .unwrap();
        registry.register(Box::new(store_errors.clone())).unwrap();
        registry.register(Box::new(corrupted_reads.clone())).unwrap();
        registry
            .register(Box::new(rights_index_failures.clone()))
            .unwrap();
        registry
            .register(Box::new(events_dispatched.clone()))
            .unwrap();
        registry.register(Box::new(update_latency.clone())).unwrap();

        Arc::new(Self {
            updates_committed,
            cas_conflicts,
            retries_exhausted,
            store_errors,
            corrupted_reads,
            rights_index_failures,
            events_dispatched,
            update_latency,
            registry,
        })
    }
}
