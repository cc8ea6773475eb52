use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use log::info;
use otr_catalog::config::{get_optional, get_variable};
use otr_catalog::db::PgDb;
use otr_catalog::environment::{Config, Environment};
use otr_catalog::identity::{ClientSecrets, GoogleProvider};
use otr_catalog::render::HtmlRenderer;
use otr_catalog::routes;
use otr_catalog::session::SessionKeys;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    #[cfg(feature = "env_logging")]
    let (logger, _scope_guard) = log::initialize_env_logger();
    #[cfg(not(feature = "env_logging"))]
    let logger = log::initialize_logger();

    let main_port: u16 = get_variable("CATALOG_PORT")
        .parse()
        .expect("parse CATALOG_PORT as u16");
    let admin_port: u16 = get_variable("CATALOG_ADMIN_PORT")
        .parse()
        .expect("parse CATALOG_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("CATALOG_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from CATALOG_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let secrets_path: String = get_optional("CATALOG_CLIENT_SECRETS_PATH", "client_secrets.json".to_owned());
    info!(logger, "Reading client secrets..."; "path" => &secrets_path);
    let secrets = ClientSecrets::load(&secrets_path)?;
    let timeout = Duration::from_secs(get_optional("CATALOG_PROVIDER_TIMEOUT_SECONDS", 10));
    let provider = Arc::new(GoogleProvider::new(secrets, timeout)?);

    // a session cookie stays valid for this long even after logging out
    let session_ttl = time::Duration::hours(get_optional("CATALOG_SESSION_TTL_HOURS", 168));
    let sessions = Arc::new(SessionKeys::new(
        get_variable("CATALOG_SESSION_SECRET"),
        session_ttl,
    ));

    let config = Config::new(get_optional("CATALOG_LATEST_COUNT", 10));
    let environment = Environment::new(
        logger.clone(),
        db,
        provider,
        sessions,
        Arc::new(HtmlRenderer),
        config,
    );

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver is gone once shutdown has begun
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let routes = routes::make_catalog_routes(environment.clone())
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route()
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
