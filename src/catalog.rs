//! Product catalog operations with role gating.
//!
//! Guests and clients get the plain name-ordered listing; managers and admins
//! may search, filter by supplier and sort by stock. Only admins change the
//! catalog.

use crate::access::require_admin;
use crate::blob::{release, BlobRemoval, BlobStore};
use crate::error::ServiceError;
use crate::insertables::NewProduct;
use crate::models::{fits_money_column, Product, ProductDetails, Role, Supplier};
use crate::store::{Entity, ProductQuery, Store};
use rust_decimal::Decimal;
use serde::Serialize;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn list_products<S: Store>(
    store: &mut S,
    role: Role,
    query: ProductQuery,
) -> Result<Vec<ProductDetails>, ServiceError> {
    let query = if role.is_staff() {
        query
    } else {
        ProductQuery::default()
    };
    Ok(store.product_details(&query)?)
}

pub fn list_suppliers<S: Store>(store: &mut S) -> Result<Vec<Supplier>, ServiceError> {
    Ok(store.suppliers()?)
}

pub fn validate(product: &NewProduct) -> Result<(), ServiceError> {
    if product.article.trim().is_empty() {
        return Err(ServiceError::validation("article", "article is required"));
    }
    if product.name.trim().is_empty() {
        return Err(ServiceError::validation("name", "name is required"));
    }
    if product.price <= Decimal::ZERO {
        return Err(ServiceError::validation("price", "price must be positive"));
    }
    if product.price.normalize().scale() > 2 || !fits_money_column(product.price) {
        return Err(ServiceError::validation(
            "price",
            "price must have at most 8 integer digits and 2 decimals",
        ));
    }
    if product.stock_quantity < 0 {
        return Err(ServiceError::validation(
            "stock_quantity",
            "stock cannot be negative",
        ));
    }
    if !(0..=100).contains(&product.discount) {
        return Err(ServiceError::validation(
            "discount",
            "discount must be between 0 and 100",
        ));
    }
    Ok(())
}

fn existing<S: Store>(store: &mut S, id: i32) -> Result<Product, ServiceError> {
    store.product(id)?.ok_or(ServiceError::NotFound {
        entity: Entity::Product,
        id,
    })
}

/// Creates a product without an image; images arrive through [`attach_image`].
pub fn create_product<S: Store>(
    store: &mut S,
    role: Role,
    product: &NewProduct,
) -> Result<Product, ServiceError> {
    require_admin(role)?;
    validate(product)?;
    let product = NewProduct {
        image: None,
        ..product.clone()
    };
    let created = store.create_product(&product)?;
    log::info!("product {} ({}) created", created.id, created.article);
    Ok(created)
}

/// Replaces every field of product `id` except its image.
pub fn update_product<S: Store>(
    store: &mut S,
    role: Role,
    id: i32,
    product: &NewProduct,
) -> Result<Product, ServiceError> {
    require_admin(role)?;
    validate(product)?;
    let previous = existing(store, id)?;
    let product = NewProduct {
        image: previous.image,
        ..product.clone()
    };
    Ok(store.update_product(id, &product)?)
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Result of storing a new product image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageChange {
    pub product: Product,
    /// What happened to the image the product had before, if any.
    pub replaced: Option<BlobRemoval>,
}

/// Stores `bytes` under a fresh key and points product `id` at it. The old
/// image is released only after the row has been updated.
pub fn attach_image<S: Store, B: BlobStore + ?Sized>(
    store: &mut S,
    blobs: &B,
    role: Role,
    id: i32,
    content_type: &str,
    bytes: &[u8],
) -> Result<ImageChange, ServiceError> {
    require_admin(role)?;
    let extension = image_extension(content_type).ok_or_else(|| {
        ServiceError::validation("image", format!("unsupported content type `{content_type}`"))
    })?;
    if bytes.is_empty() {
        return Err(ServiceError::validation("image", "image is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ServiceError::validation(
            "image",
            format!("image is larger than {MAX_IMAGE_BYTES} bytes"),
        ));
    }
    let previous = existing(store, id)?;

    let key = format!("products/{id}-{:016x}.{extension}", rand::random::<u64>());
    blobs.put(&key, bytes)?;
    let mut changes = NewProduct::from(&previous);
    changes.image = Some(key.clone());
    let product = match store.update_product(id, &changes) {
        Ok(product) => product,
        Err(err) => {
            release(blobs, &key);
            return Err(err.into());
        }
    };
    let replaced = previous.image.map(|old| release(blobs, &old));
    log::info!("product {id} image set to `{key}`, previous: {replaced:?}");
    Ok(ImageChange { product, replaced })
}

/// Outcome of a product deletion: the removed row and what happened to its image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deletion {
    pub product: Product,
    pub image: Option<BlobRemoval>,
}

/// Deletes product `id`. Once the row is gone the deletion stands, so an image
/// that cannot be removed is reported in the outcome rather than as an error.
pub fn delete_product<S: Store, B: BlobStore + ?Sized>(
    store: &mut S,
    blobs: &B,
    role: Role,
    id: i32,
) -> Result<Deletion, ServiceError> {
    require_admin(role)?;
    let product = existing(store, id)?;
    store.delete(Entity::Product, id)?;
    let image = product.image.as_deref().map(|key| release(blobs, key));
    log::info!("product {id} ({}) deleted", product.article);
    Ok(Deletion { product, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::FsBlobStore;
    use crate::store::MemoryStore;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn draft(store: &mut MemoryStore, article: &str) -> NewProduct {
        let category = store.get_or_create_category("Paper").unwrap();
        let manufacturer = store.get_or_create_manufacturer("Erich Krause").unwrap();
        let supplier = store.get_or_create_supplier("Kanc Trade").unwrap();
        NewProduct {
            article: article.to_string(),
            name: "Notebook".to_string(),
            unit: "pcs".to_string(),
            category_id: category.id,
            manufacturer_id: manufacturer.id,
            supplier_id: supplier.id,
            description: String::new(),
            price: dec!(120.00),
            stock_quantity: 4,
            discount: 10,
            image: None,
        }
    }

    #[rstest]
    #[case::zero_price(|p: &mut NewProduct| p.price = Decimal::ZERO, "price")]
    #[case::negative_stock(|p: &mut NewProduct| p.stock_quantity = -1, "stock_quantity")]
    #[case::discount_too_high(|p: &mut NewProduct| p.discount = 101, "discount")]
    #[case::blank_article(|p: &mut NewProduct| p.article = " ".to_string(), "article")]
    #[case::blank_name(|p: &mut NewProduct| p.name.clear(), "name")]
    fn invalid_products_are_rejected(
        #[case] break_it: fn(&mut NewProduct),
        #[case] expected: &str,
    ) {
        let mut store = MemoryStore::new();
        let mut product = draft(&mut store, "A112T4");
        break_it(&mut product);
        match create_product(&mut store, Role::Admin, &product) {
            Err(ServiceError::Validation { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[rstest]
    #[case(Role::Guest)]
    #[case(Role::Client)]
    #[case(Role::Manager)]
    fn only_admins_create(#[case] role: Role) {
        let mut store = MemoryStore::new();
        let product = draft(&mut store, "A112T4");
        assert!(matches!(
            create_product(&mut store, role, &product),
            Err(ServiceError::Forbidden)
        ));
        assert_eq!(store.count(Entity::Product).unwrap(), 0);
    }

    #[test]
    fn client_supplied_images_are_ignored() {
        let mut store = MemoryStore::new();
        let mut product = draft(&mut store, "A112T4");
        product.image = Some("products/elsewhere.jpg".to_string());
        let created = create_product(&mut store, Role::Admin, &product).unwrap();
        assert_eq!(created.image, None);
        let updated = update_product(&mut store, Role::Admin, created.id, &product).unwrap();
        assert_eq!(updated.image, None);
    }

    #[test]
    fn prices_need_cents_precision() {
        let mut store = MemoryStore::new();
        let mut product = draft(&mut store, "A112T4");
        product.price = dec!(10.005);
        assert!(matches!(
            create_product(&mut store, Role::Admin, &product),
            Err(ServiceError::Validation { field: "price", .. })
        ));
        product.price = dec!(10.50);
        assert!(create_product(&mut store, Role::Admin, &product).is_ok());
    }

    #[test]
    fn content_types_map_to_extensions() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[test]
    fn uploading_an_image_replaces_and_releases_the_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let mut store = MemoryStore::new();
        let product = draft(&mut store, "A112T4");
        let created = create_product(&mut store, Role::Admin, &product).unwrap();

        let first = attach_image(&mut store, &blobs, Role::Admin, created.id, "image/jpeg", b"one").unwrap();
        assert_eq!(first.replaced, None);
        let first_key = first.product.image.clone().unwrap();
        assert!(first_key.starts_with(&format!("products/{}-", created.id)));
        assert!(blobs.exists(&first_key).unwrap());

        let second = attach_image(&mut store, &blobs, Role::Admin, created.id, "image/png", b"two").unwrap();
        assert_eq!(second.replaced, Some(BlobRemoval::Removed));
        assert!(!blobs.exists(&first_key).unwrap());
        let second_key = second.product.image.unwrap();
        assert!(second_key.ends_with(".png"));
        assert_eq!(store.product(created.id).unwrap().unwrap().image, Some(second_key));
    }

    #[test]
    fn uploads_are_checked_before_anything_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let mut store = MemoryStore::new();
        let product = draft(&mut store, "A112T4");
        let created = create_product(&mut store, Role::Admin, &product).unwrap();

        assert!(matches!(
            attach_image(&mut store, &blobs, Role::Manager, created.id, "image/png", b"x"),
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            attach_image(&mut store, &blobs, Role::Admin, created.id, "text/plain", b"x"),
            Err(ServiceError::Validation { field: "image", .. })
        ));
        assert!(matches!(
            attach_image(&mut store, &blobs, Role::Admin, created.id, "image/png", b""),
            Err(ServiceError::Validation { field: "image", .. })
        ));
        assert!(matches!(
            attach_image(&mut store, &blobs, Role::Admin, created.id + 1, "image/png", b"x"),
            Err(ServiceError::NotFound { .. })
        ));
        assert!(!dir.path().join("products").exists());
    }

    #[test]
    fn delete_reports_the_image_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let mut store = MemoryStore::new();
        let product = draft(&mut store, "A112T4");
        let created = create_product(&mut store, Role::Admin, &product).unwrap();
        let key = attach_image(&mut store, &blobs, Role::Admin, created.id, "image/jpeg", b"img")
            .unwrap()
            .product
            .image
            .unwrap();

        let deletion = delete_product(&mut store, &blobs, Role::Admin, created.id).unwrap();
        assert_eq!(deletion.image, Some(BlobRemoval::Removed));
        assert!(!blobs.exists(&key).unwrap());
        assert!(matches!(
            delete_product(&mut store, &blobs, Role::Admin, created.id),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn unremovable_image_does_not_undo_the_delete() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let mut store = MemoryStore::new();
        let product = draft(&mut store, "A112T4");
        let created = create_product(&mut store, Role::Admin, &product).unwrap();
        let key = attach_image(&mut store, &blobs, Role::Admin, created.id, "image/jpeg", b"img")
            .unwrap()
            .product
            .image
            .unwrap();
        std::fs::remove_file(dir.path().join(&key)).unwrap();
        std::fs::create_dir_all(dir.path().join(&key).join("nested")).unwrap();

        let deletion = delete_product(&mut store, &blobs, Role::Admin, created.id).unwrap();
        assert!(matches!(deletion.image, Some(BlobRemoval::Failed(_))));
        assert_eq!(store.product(created.id).unwrap(), None);
    }
}
