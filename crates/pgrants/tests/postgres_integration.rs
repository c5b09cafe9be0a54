//! Inspection against a real PostgreSQL.
//!
//! Uses `POSTGRES_HOST`/`POSTGRES_PORT` when set, otherwise starts a
//! container with testcontainers.
//!
//! Run with: cargo nextest run -p pgrants --features test-postgres --test postgres_integration
//!
//! Note: Requires Docker to be running when no server is configured.

#![cfg(feature = "test-postgres")]

use indexmap::IndexMap;
use pgrants::{Config, DbPool, Inspector, PrivilegeCatalog, RowsOrSql};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::NoTls;

const APP_DB: &str = "pgrants_app";

/// A running server and the container backing it, if we started one.
struct Server {
    conninfo: String,
    _container: Option<ContainerAsync<Postgres>>,
}

async fn server() -> Server {
    if let Ok(host) = std::env::var("POSTGRES_HOST") {
        let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
        return Server {
            conninfo: format!("host={host} port={port} user=postgres password=postgres dbname=postgres"),
            _container: None,
        };
    }

    let container = Postgres::default()
        .start()
        .await
        .expect("failed to start postgres container");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    Server {
        conninfo: format!("host={host} port={port} user=postgres password=postgres dbname=postgres"),
        _container: Some(container),
    }
}

async fn connect(conninfo: &str) -> tokio_postgres::Client {
    let (client, connection) = tokio_postgres::connect(conninfo, NoTls).await.unwrap();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {e}");
        }
    });
    client
}

/// Create roles and a database with a known set of grants.
async fn seed(conninfo: &str) {
    let admin = connect(conninfo).await;
    // CREATE DATABASE cannot run inside the implicit transaction of a
    // multi-statement batch.
    admin
        .batch_execute(&format!("DROP DATABASE IF EXISTS {APP_DB}"))
        .await
        .unwrap();
    admin
        .batch_execute(
            "DROP ROLE IF EXISTS alice;
             DROP ROLE IF EXISTS svc_etl;
             CREATE ROLE alice;
             CREATE ROLE svc_etl;",
        )
        .await
        .unwrap();
    admin
        .batch_execute(&format!("CREATE DATABASE {APP_DB}"))
        .await
        .unwrap();
    admin
        .batch_execute(&format!("GRANT CONNECT ON DATABASE {APP_DB} TO alice"))
        .await
        .unwrap();

    let app = connect(&format!("{conninfo} dbname={APP_DB}")).await;
    app.batch_execute(
        "CREATE SCHEMA sales;
         CREATE SCHEMA scratch;
         CREATE TABLE sales.orders (id int);
         CREATE TABLE sales.items (id int);
         GRANT USAGE ON SCHEMA sales TO alice;
         GRANT SELECT ON sales.orders TO alice;
         GRANT SELECT ON ALL TABLES IN SCHEMA sales TO svc_etl;",
    )
    .await
    .unwrap();
}

fn config() -> Config {
    let mut managed_privileges = IndexMap::new();
    managed_privileges.insert("DATABASE".to_string(), vec!["CONNECT".to_string()]);
    managed_privileges.insert("SCHEMA".to_string(), vec!["USAGE".to_string()]);
    managed_privileges.insert("TABLE".to_string(), vec!["SELECT".to_string()]);
    Config {
        databases_query: Some(RowsOrSql::rows([APP_DB])),
        roles_blacklist_query: Some(RowsOrSql::rows(["postgres", "pg_*", "svc_*"])),
        managed_schemas_query: Some(RowsOrSql::rows(["sales"])),
        managed_privileges,
        ..Default::default()
    }
}

#[tokio::test]
async fn inspects_seeded_instance() {
    let server = server().await;
    seed(&server.conninfo).await;

    let pool = DbPool::from_conninfo(&server.conninfo).unwrap();
    let catalog = PrivilegeCatalog::builtin();
    let instance = Inspector::new(&pool, &catalog)
        .inspect(&config())
        .await
        .unwrap();

    assert_eq!(instance.current_role, "postgres");
    assert!(instance.server_version_num >= 90600);
    assert_eq!(instance.databases.keys().collect::<Vec<_>>(), [APP_DB]);
    let schemas = &instance.databases[APP_DB].schemas;
    assert_eq!(schemas.keys().collect::<Vec<_>>(), ["sales"]);
    assert_eq!(schemas["sales"].owner, "postgres");

    assert!(instance.managed_roles.contains("alice"));
    assert!(instance.managed_roles.contains("public"));
    assert!(!instance.managed_roles.contains("svc_etl"));
    assert!(!instance.managed_roles.contains("postgres"));

    let grants: Vec<String> = instance.grants.iter().map(ToString::to_string).collect();
    for expected in [
        format!("CONNECT ON DATABASE {APP_DB} TO alice"),
        format!("CONNECT ON DATABASE {APP_DB} TO public"),
        format!("USAGE ON SCHEMA {APP_DB}.sales TO alice"),
        format!("SELECT ON ALL TABLES IN SCHEMA {APP_DB}.sales TO alice (partial)"),
    ] {
        assert!(grants.contains(&expected), "{expected} not in {grants:#?}");
    }
    assert!(
        grants.iter().all(|g| !g.contains("svc_etl") && !g.contains("scratch")),
        "{grants:#?}"
    );

    // Same instance, managing only the maintenance database.
    let config = Config {
        databases_query: Some(RowsOrSql::rows(["postgres"])),
        ..config()
    };
    let instance = Inspector::new(&pool, &catalog)
        .inspect(&config)
        .await
        .unwrap();

    assert!(
        instance.grants.iter().all(|g| g.database == "postgres"),
        "{:#?}",
        instance.grants
    );
}
