use sqlx::PgPool;
use tracing::debug;

/// Create the six game tables and their indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    debug!("schema ready");
    Ok(())
}
