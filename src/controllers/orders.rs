use super::session::{ControllerError, Session};
use actix_web::{get, web, HttpResponse};
use shop_backoffice::orders::list_orders;
use shop_backoffice::store::PgStore;
use shop_backoffice::DbPool;

#[get("/api/orders")]
async fn get_orders(
    pool: web::Data<DbPool>,
    session: Session,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let orders = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(list_orders(&mut PgStore::new(&mut conn), role)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(orders))
}
