pub mod postgres_record_store;

pub use postgres_record_store::PostgresRecordStore;
