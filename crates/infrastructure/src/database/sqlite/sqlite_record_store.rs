use async_trait::async_trait;
use bulkq_core::{
    models::Record,
    traits::{RecordSource, RecordStore},
    BulkqError, BulkqResult,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use crate::database::INSERT_CHUNK_SIZE;

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> BulkqResult<Record> {
        Ok(Record {
            id: row.try_get("id")?,
            field1: row.try_get("field1")?,
            field2: row.try_get("field2")?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
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
            let mut builder: QueryBuilder<Sqlite> =
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

        // 提交前任何失败都会随 tx 的 drop 回滚
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
