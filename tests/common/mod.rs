//! Common test utilities

use tempfile::TempDir;

use cubank::{db, Config};

/// A fresh SQLite database in a temp directory, dropped with the test.
pub struct TestDb {
    pub pool: sqlx::SqlitePool,
    pub config: Config,
    _dir: TempDir,
}

/// Setup test database - fresh file, full schema
pub async fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");

    let config = Config {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        database_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        session_ttl_hours: 24,
    };

    let pool = db::connect(&config).await.expect("Failed to connect to DB");
    db::init_schema(&pool).await.expect("Failed to init schema");

    TestDb {
        pool,
        config,
        _dir: dir,
    }
}
