//! Redshift warehouse backend
//!
//! Redshift speaks the PostgreSQL wire protocol. Every statement goes
//! through the simple query protocol, which is what `COPY` and multi-part
//! DDL need and which returns all values as text.
//!
//! TLS uses rustls with the Mozilla root set, negotiated per `[CLUSTER] SSLMODE`.

use crate::error::{DbError, DbResult};
use crate::traits::Warehouse;
use async_trait::async_trait;
use dwh_core::sql_utils::quote_literal;
use dwh_core::{ClusterConfig, Dialect, SslMode};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio_postgres::config::SslMode as PgSslMode;
use tokio_postgres::{Client, SimpleQueryMessage};
use tokio_postgres_rustls::MakeRustlsConnect;

/// Redshift warehouse backend over a single client connection
pub struct RedshiftBackend {
    client: Client,
}

impl RedshiftBackend {
    /// Connect to the cluster described by `[CLUSTER]`
    pub async fn connect(cluster: &ClusterConfig) -> DbResult<Self> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&cluster.host)
            .port(cluster.port)
            .dbname(&cluster.database)
            .user(&cluster.user)
            .password(cluster.password.expose_secret())
            .ssl_mode(pg_ssl_mode(cluster.ssl_mode));

        log::debug!(
            "Connecting to {}:{}/{} as {} (sslmode={})",
            cluster.host,
            cluster.port,
            cluster.database,
            cluster.user,
            cluster.ssl_mode
        );
        let (client, connection) = config
            .connect(tls_connector()?)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Redshift connection closed: {e}");
            }
        });

        Ok(Self { client })
    }

    async fn simple_query(&self, sql: &str) -> DbResult<Vec<SimpleQueryMessage>> {
        Ok(self.client.simple_query(sql).await?)
    }

    /// Text values of the first column of every row
    async fn first_column(&self, sql: &str) -> DbResult<Vec<Option<String>>> {
        let mut values = Vec::new();
        for message in self.simple_query(sql).await? {
            if let SimpleQueryMessage::Row(row) = message {
                values.push(row.try_get(0)?.map(str::to_string));
            }
        }
        Ok(values)
    }

    /// Run a `SELECT COUNT(*)` and parse its single value
    async fn count(&self, sql: &str) -> DbResult<usize> {
        let value = self.first_column(sql).await?.into_iter().next().flatten();
        let value = value.unwrap_or_default();
        value.parse::<usize>().map_err(|e| {
            DbError::ExecutionError(format!("unexpected COUNT(*) value '{value}': {e}"))
        })
    }

    async fn transaction(&self, action: &str, sql: &str) -> DbResult<()> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| DbError::TransactionError {
                action: action.to_string(),
                message: DbError::from(e).to_string(),
            })
    }
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
    }
}

/// rustls connector that verifies the server against the webpki roots
fn tls_connector() -> DbResult<MakeRustlsConnect> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DbError::ConnectionError(format!("TLS setup failed: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}

#[async_trait]
impl Warehouse for RedshiftBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        let affected = self
            .simple_query(sql)
            .await?
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(rows) => Some(*rows as usize),
                _ => None,
            })
            .sum();
        Ok(affected)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        Ok(self.client.batch_execute(sql).await?)
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction("begin", "BEGIN").await
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction("commit", "COMMIT").await
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction("rollback", "ROLLBACK").await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = {}",
            quote_literal(name)
        );
        Ok(self.count(&sql).await? > 0)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.count(&format!("SELECT COUNT(*) FROM ({}) AS counted", sql))
            .await
    }

    async fn query_one(&self, sql: &str) -> DbResult<Option<String>> {
        Ok(self.first_column(sql).await?.into_iter().next().flatten())
    }

    async fn column_names(&self, table: &str) -> DbResult<Vec<String>> {
        let sql = format!(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = {} ORDER BY ordinal_position",
            quote_literal(table)
        );
        let names: Vec<String> = self.first_column(&sql).await?.into_iter().flatten().collect();
        if names.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(names)
    }

    fn db_type(&self) -> &'static str {
        "redshift"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn local_cluster(ssl_mode: SslMode) -> ClusterConfig {
        ClusterConfig {
            host: "127.0.0.1".to_string(),
            database: "dwh".to_string(),
            user: "dwhuser".to_string(),
            password: SecretString::new("Passw0rd".to_string()),
            port: 1,
            ssl_mode,
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        for mode in [SslMode::Disable, SslMode::Prefer, SslMode::Require] {
            let err = match RedshiftBackend::connect(&local_cluster(mode)).await {
                Ok(_) => panic!("nothing listens on port 1"),
                Err(err) => err,
            };
            assert!(matches!(err, DbError::ConnectionError(_)), "sslmode={mode}");
            assert!(!err.to_string().contains("Passw0rd"));
        }
    }

    #[test]
    fn test_ssl_mode_maps_to_driver_mode() {
        assert!(matches!(pg_ssl_mode(SslMode::Disable), PgSslMode::Disable));
        assert!(matches!(pg_ssl_mode(SslMode::Prefer), PgSslMode::Prefer));
        assert!(matches!(pg_ssl_mode(SslMode::Require), PgSslMode::Require));
    }

    #[test]
    fn test_tls_connector_builds_with_bundled_roots() {
        assert!(tls_connector().is_ok());
    }
}
