mod controllers {
    pub mod orders;
    pub mod products;
    pub mod session;
}
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use controllers::orders;
use controllers::products;
use controllers::session;
use shop_backoffice::blob::FsBlobStore;
use shop_backoffice::catalog::MAX_IMAGE_BYTES;
use shop_backoffice::config::Settings;
use shop_backoffice::initialize_db_pool;
use std::env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    let settings = Settings::from_env()?;
    let db_pool = initialize_db_pool(&settings).context("cannot open database pool")?;
    let blobs = FsBlobStore::new(settings.media_root.clone());
    log::info!(
        "serving on port {} with media under {}",
        settings.port,
        settings.media_root.display()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(blobs.clone()))
            .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
            .service(session::get_me)
            .service(products::get_products)
            .service(products::get_suppliers)
            .service(products::create_product)
            .service(products::update_product)
            .service(products::upload_image)
            .service(products::delete_product)
            .service(orders::get_orders)
    })
    .bind(("127.0.0.1", settings.port))?
    .run()
    .await?;
    Ok(())
}
