pub mod job_queue;
pub mod record_store;

pub use job_queue::{JobBroker, JobQueue};
pub use record_store::{RecordSource, RecordStore};
