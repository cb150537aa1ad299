//! Job execution metrics.
//!
//! Recording is a no-op until the binary installs a global recorder.

use bulkq_core::{JobKind, JobStatus};
use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const JOBS_STARTED: &str = "bulkq_jobs_started_total";
pub const JOBS_FINISHED: &str = "bulkq_jobs_finished_total";
pub const JOBS_REVOKED: &str = "bulkq_jobs_revoked_total";
pub const RECORDS_INSERTED: &str = "bulkq_records_inserted_total";
pub const RUNNING_JOBS: &str = "bulkq_running_jobs";

pub fn describe_metrics() {
    describe_counter!(JOBS_STARTED, "Jobs picked up by a worker");
    describe_counter!(JOBS_FINISHED, "Jobs that reached a terminal status");
    describe_counter!(JOBS_REVOKED, "Running jobs aborted after a terminate revoke");
    describe_counter!(RECORDS_INSERTED, "Records committed by bulk insert jobs");
    describe_gauge!(RUNNING_JOBS, "Jobs currently tracked by the worker");
}

pub fn record_job_started(kind: &JobKind) {
    counter!(JOBS_STARTED, "kind" => kind.name()).increment(1);
}

pub fn record_job_finished(kind: &JobKind, status: JobStatus) {
    counter!(JOBS_FINISHED, "kind" => kind.name(), "status" => status.as_str()).increment(1);
}

pub fn record_job_revoked() {
    counter!(JOBS_REVOKED).increment(1);
}

pub fn record_records_inserted(count: u64) {
    counter!(RECORDS_INSERTED).increment(count);
}

pub fn set_running_jobs(count: usize) {
    gauge!(RUNNING_JOBS).set(count as f64);
}
