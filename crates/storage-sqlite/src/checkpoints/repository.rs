use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use orderdeck_core::errors::Result;
use orderdeck_core::feed::{CheckpointStoreTrait, ResumeToken};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::watch_checkpoints;

/// Persists each watcher's last processed resume token, so a restart can
/// request replay from it instead of resubscribing from "now".
pub struct CheckpointRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CheckpointRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        CheckpointRepository { pool, writer }
    }
}

#[async_trait]
impl CheckpointStoreTrait for CheckpointRepository {
    fn load(&self, watcher: &str) -> Result<Option<ResumeToken>> {
        let mut conn = get_connection(&self.pool)?;
        let token = watch_checkpoints::table
            .find(watcher)
            .select(watch_checkpoints::token)
            .first::<i64>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(token)
    }

    async fn save(&self, watcher: &str, token: ResumeToken) -> Result<()> {
        let watcher = watcher.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection, _changes| -> Result<()> {
                let now = Utc::now().to_rfc3339();
                diesel::insert_into(watch_checkpoints::table)
                    .values((
                        watch_checkpoints::watcher.eq(&watcher),
                        watch_checkpoints::token.eq(token),
                        watch_checkpoints::updated_at.eq(&now),
                    ))
                    .on_conflict(watch_checkpoints::watcher)
                    .do_update()
                    .set((
                        watch_checkpoints::token.eq(token),
                        watch_checkpoints::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, write_actor::spawn_writer};
    use crate::feed::SqliteChangeFeed;
    use tempfile::tempdir;

    fn create_test_repository() -> (CheckpointRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();

        let pool = create_pool(&db_path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let feed = SqliteChangeFeed::new(Arc::clone(&pool));
        let writer = spawn_writer((*pool).clone(), feed.publisher());
        (CheckpointRepository::new(Arc::clone(&pool), writer), temp_dir)
    }

    #[tokio::test]
    async fn test_load_of_unknown_watcher_is_none() {
        let (repo, _temp_dir) = create_test_repository();
        assert_eq!(repo.load("order-watcher").unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let (repo, _temp_dir) = create_test_repository();
        repo.save("order-watcher", 42).await.unwrap();
        assert_eq!(repo.load("order-watcher").unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_token() {
        let (repo, _temp_dir) = create_test_repository();
        repo.save("order-watcher", 7).await.unwrap();
        repo.save("order-watcher", 9).await.unwrap();
        assert_eq!(repo.load("order-watcher").unwrap(), Some(9));
    }
}
