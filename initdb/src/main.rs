//! Creates or upgrades the catalog schema by applying the migrations in
//! `CATALOG_MIGRATIONS_DIR` (default `./migrations`).

use std::env;

use movine::Movine;
use postgres::{Client, NoTls};

use log::{debug, info, initialize_logger, o};

const DEFAULT_MIGRATIONS_DIR: &str = "./migrations";

fn main() {
    dotenv::dotenv().ok();

    let connection_string = env::var("CATALOG_DB_CONNECTION_STRING")
        .expect("could not read CATALOG_DB_CONNECTION_STRING");
    let migrations_dir =
        env::var("CATALOG_MIGRATIONS_DIR").unwrap_or_else(|_| DEFAULT_MIGRATIONS_DIR.to_owned());

    let logger = initialize_logger().new(o!("migrations_dir" => migrations_dir.clone()));

    debug!(logger, "Connecting to database...");

    let mut client =
        Client::connect(&connection_string, NoTls).expect("could not connect to database");

    let mut movine = Movine::new(&mut client);
    movine.set_migration_dir(&migrations_dir);

    if movine.status().is_err() {
        debug!(logger, "Initializing movine...");
        movine.initialize().expect("failed to initialize movine")
    }

    debug!(logger, "Running migrations...");
    movine.up().expect("failed to run migrations");

    info!(logger, "Catalog schema is up to date.");
}
