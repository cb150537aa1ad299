use async_trait::async_trait;
use bulkq_core::{
    models::Record,
    traits::{RecordSource, RecordStore},
    BulkqError, BulkqResult,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

use crate::database::INSERT_CHUNK_SIZE;

pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> BulkqResult<Record> {
        Ok(Record {
            id: row.try_get("id")?,
            field1: row.try_get("field1")?,
            field2: row.try_get("field2")?,
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self, next_record))]
    async fn insert_batch(&self, count: u64, next_record: &RecordSource) -> BulkqResult<u64> {
        if count == 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(BulkqError::Storage)?;
        let mut inserted = 0u64;
        let mut offset = 0u64;

        while offset < count {
            let end = offset + (count - offset).min(INSERT_CHUNK_SIZE as u64);
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO records (field1, field2) ");
            builder.push_values((offset..end).map(next_record), |mut row, record| {
                row.push_bind(record.field1).push_bind(record.field2);
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(BulkqError::Storage)?;
            inserted += result.rows_affected();
            offset = end;
        }

        tx.commit().await.map_err(BulkqError::Storage)?;

        debug!("Inserted {} records", inserted);
        Ok(inserted)
    }

    async fn count(&self) -> BulkqResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM records")
            .fetch_one(&self.pool)
            .await
            .map_err(BulkqError::Storage)?;

        Ok(row.try_get("count")?)
    }

    async fn list_all(&self) -> BulkqResult<Vec<Record>> {
        let rows = sqlx::query("SELECT id, field1, field2 FROM records ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(BulkqError::Storage)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> BulkqResult<u64> {
        let mut tx = self.pool.begin().await.map_err(BulkqError::Storage)?;

        let result = sqlx::query("DELETE FROM records")
            .execute(&mut *tx)
            .await
            .map_err(BulkqError::Storage)?;

        tx.commit().await.map_err(BulkqError::Storage)?;

        debug!("Deleted {} records", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> BulkqResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(BulkqError::Storage)?;
        Ok(())
    }
}
