use super::session::{ControllerError, Session};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use shop_backoffice::blob::FsBlobStore;
use shop_backoffice::catalog;
use shop_backoffice::insertables::NewProduct;
use shop_backoffice::store::{PgStore, ProductQuery};
use shop_backoffice::DbPool;

/// Query string of the catalog page. Values that do not parse are ignored.
#[derive(Deserialize, Debug, Default)]
pub struct CatalogParams {
    search: Option<String>,
    supplier: Option<String>,
    sort: Option<String>,
}

impl From<CatalogParams> for ProductQuery {
    fn from(params: CatalogParams) -> Self {
        ProductQuery {
            search: params
                .search
                .map(|search| search.trim().to_owned())
                .filter(|search| !search.is_empty()),
            supplier_id: params
                .supplier
                .and_then(|supplier| supplier.trim().parse().ok()),
            sort_by_stock: params.sort.as_deref() == Some("stock"),
        }
    }
}

#[get("/api/products")]
async fn get_products(
    pool: web::Data<DbPool>,
    session: Session,
    params: web::Query<CatalogParams>,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let query = ProductQuery::from(params.into_inner());
    let products = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::list_products(&mut PgStore::new(&mut conn), role, query)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(products))
}

#[get("/api/suppliers")]
async fn get_suppliers(pool: web::Data<DbPool>) -> Result<HttpResponse, ControllerError> {
    let suppliers = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::list_suppliers(&mut PgStore::new(&mut conn))?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(suppliers))
}

#[post("/api/products")]
async fn create_product(
    pool: web::Data<DbPool>,
    session: Session,
    form: web::Json<NewProduct>,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let product = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::create_product(&mut PgStore::new(&mut conn), role, &form)?)
    })
    .await??;
    Ok(HttpResponse::Created().json(product))
}

#[put("/api/products/{product_id}")]
async fn update_product(
    pool: web::Data<DbPool>,
    session: Session,
    product_id: web::Path<i32>,
    form: web::Json<NewProduct>,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let product = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::update_product(
            &mut PgStore::new(&mut conn),
            role,
            *product_id,
            &form,
        )?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(product))
}

/// Raw image body; the `Content-Type` header picks the file extension.
#[put("/api/products/{product_id}/image")]
async fn upload_image(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    blobs: web::Data<FsBlobStore>,
    session: Session,
    product_id: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let change = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::attach_image(
            &mut PgStore::new(&mut conn),
            blobs.get_ref(),
            role,
            *product_id,
            &content_type,
            &body,
        )?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(change))
}

#[delete("/api/products/{product_id}")]
async fn delete_product(
    pool: web::Data<DbPool>,
    blobs: web::Data<FsBlobStore>,
    session: Session,
    product_id: web::Path<i32>,
) -> Result<HttpResponse, ControllerError> {
    let role = session.0.role;
    let deletion = web::block(move || -> Result<_, ControllerError> {
        let mut conn = pool.get()?;
        Ok(catalog::delete_product(
            &mut PgStore::new(&mut conn),
            blobs.get_ref(),
            role,
            *product_id,
        )?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(deletion))
}
