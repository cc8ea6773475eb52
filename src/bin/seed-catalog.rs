use std::error::Error;
use std::fs;
use std::path::PathBuf;

use dotenv::dotenv;
use serde::Deserialize;
use structopt::StructOpt;

use log::{info, initialize_logger, o, warn};
use otr_catalog::catalog::{GenreName, Profile, ProgramFields, ProgramForm};
use otr_catalog::config::get_variable;
use otr_catalog::db::{Db, PgDb};
use otr_catalog::errors::CatalogError;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "seed-catalog",
    about = "Load genres and programs from a JSON file into the catalog"
)]
struct Opt {
    /// The email address of the account that will own the records
    #[structopt(long)]
    email: String,

    /// The display name of the owning account
    #[structopt(long, default_value = "Catalog Administrator")]
    name: String,

    /// The JSON file to load
    #[structopt(parse(from_os_str))]
    file: PathBuf,
}

#[derive(Deserialize)]
struct Seed {
    genres: Vec<SeedGenre>,
}

#[derive(Deserialize)]
struct SeedGenre {
    name: String,
    #[serde(default)]
    programs: Vec<ProgramForm>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let seed: Seed = serde_json::from_str(&fs::read_to_string(&opt.file)?)?;

    let connection_string = get_variable("CATALOG_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from CATALOG_DB_CONNECTION_STRING");
    let db = PgDb::new(pool);

    let account = db
        .upsert_account(Profile {
            name: opt.name,
            picture: None,
            email: opt.email,
        })
        .await?;

    info!(logger, "Seeding catalog..."; "account_id" => account.id, "genres" => seed.genres.len());

    for genre in seed.genres {
        let name = GenreName::parse(&genre.name)?;

        let genre_id = match db.create_genre(account.id, name.clone()).await {
            Ok(created) => created.id,
            Err(CatalogError::GenreExists) => db
                .list_genres()
                .await?
                .into_iter()
                .find(|g| g.name == name.as_str())
                .map(|g| g.id)
                .ok_or(CatalogError::GenreExists)?,
            Err(e) => return Err(e.into()),
        };

        let logger = logger.new(o!("genre_id" => genre_id));
        info!(logger, "Seeding genre {}...", name.as_str());

        for form in genre.programs {
            let fields = match ProgramFields::validate(&form) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(logger, "Skipping invalid program"; "name" => &form.name, "error" => %e);
                    continue;
                }
            };

            match db.create_program(account.id, genre_id, fields).await {
                Ok(program) => info!(logger, "Created program"; "program_id" => program.id, "name" => &program.name),
                Err(CatalogError::ProgramExists) => {
                    info!(logger, "Program already present"; "name" => &form.name)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!(logger, "Done.");

    Ok(())
}
