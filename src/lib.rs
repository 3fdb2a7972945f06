pub mod access;
pub mod blob;
pub mod catalog;
pub mod config;
pub mod error;
pub mod import;
pub mod insertables;
pub mod models;
pub mod orders;
pub mod password;
pub mod schema;
pub mod store;

use config::Settings;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2;
use store::StoreError;

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

pub fn establish_connection(settings: &Settings) -> Result<PgConnection, StoreError> {
    Ok(PgConnection::establish(&settings.database_url)?)
}

pub fn initialize_db_pool(settings: &Settings) -> Result<DbPool, StoreError> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(settings.database_url.as_str());
    Ok(r2d2::Pool::builder().build(manager)?)
}
