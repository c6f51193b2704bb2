use std::time::Duration;

use sea_orm::sea_query::{
    Index, IndexCreateStatement, IndexOrder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::entity::work;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let url = config.connection_url();
    let mut opt = ConnectOptions::new(url);

    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("gallery_server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Ensure the listing index exists.
///
/// Schema-sync doesn't create ordered secondary indexes, so the
/// `submitted_at DESC` index is created here, idempotently.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = submitted_at_index();
    let sql = match db.get_database_backend() {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        other => {
            warn!(backend = ?other, "Skipping index creation for unsupported backend");
            return Ok(());
        }
    };

    db.execute_unprepared(&sql).await?;
    info!("Ensured index idx_works_submitted_at exists");
    Ok(())
}

fn submitted_at_index() -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name("idx_works_submitted_at")
        .table(work::Entity)
        .col((work::Column::SubmittedAt, IndexOrder::Desc))
        .to_owned()
}
