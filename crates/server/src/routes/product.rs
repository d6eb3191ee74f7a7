//! Product catalog route handlers.
//!
//! Reads are public and served from the cached list; writes require a seller
//! and invalidate that cache.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
};
use serde::Deserialize;
use tracing::instrument;

use greencart_core::{
    Envelope, NewProduct, ProductId,
    envelope::payload::{Empty, ProductPayload, ProductsPayload},
};

use super::json::JsonBody;
use crate::db::RepositoryError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireSeller;
use crate::services::media::ImageUpload;
use crate::state::AppState;

/// Images accepted per product.
pub const MAX_IMAGES: usize = 4;

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field carrying the product JSON.
const PRODUCT_DATA_FIELD: &str = "productData";

/// Multipart field carrying each image file.
const IMAGES_FIELD: &str = "images";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub id: ProductId,
    pub in_stock: bool,
}

fn bad_multipart(e: &MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid upload: {}", e.body_text()))
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Split the `productData` + `images` form into its parts.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(NewProduct, Vec<ImageUpload>)> {
    let mut product = None;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_multipart(&e))? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            PRODUCT_DATA_FIELD => {
                let text = field.text().await.map_err(|e| bad_multipart(&e))?;
                let parsed: NewProduct = serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(format!("Invalid product data: {e}"))
                })?;
                product = Some(parsed);
            }
            IMAGES_FIELD => {
                if images.len() == MAX_IMAGES {
                    return Err(AppError::BadRequest(format!(
                        "At most {MAX_IMAGES} images are allowed"
                    )));
                }
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| bad_multipart(&e))?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::BadRequest("Image is too large".to_string()));
                }
                let upload = ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                upload.ensure_image()?;
                images.push(upload);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let product = product.ok_or_else(|| AppError::BadRequest("Missing product data".to_string()))?;
    if images.is_empty() {
        return Err(AppError::BadRequest("At least one image is required".to_string()));
    }
    Ok((product, images))
}

/// Add a product: multipart `productData` JSON plus 1 to 4 `images`.
#[instrument(skip(state, multipart))]
pub async fn add(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
    multipart: Multipart,
) -> Result<Json<Envelope<ProductPayload>>> {
    let (product, images) = read_product_form(multipart).await?;
    // Validate before uploading anything.
    let mut product = product.normalized()?;

    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        urls.push(state.media().upload(image).await?);
    }
    add_breadcrumb("product", "Images uploaded", None);
    product.images = urls;

    let product = state.products().create(product).await?;
    state.catalog().invalidate().await;

    tracing::info!(product_id = %product.id, "Product added");
    Ok(Json(Envelope::ok_with_message(
        "Product added",
        ProductPayload { product },
    )))
}

/// All products, newest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Envelope<ProductsPayload>>> {
    let products = state.catalog().list(state.products()).await?;
    Ok(Json(Envelope::ok(ProductsPayload {
        products: products.as_ref().clone(),
    })))
}

#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Envelope<ProductPayload>>> {
    let product = state
        .products()
        .get(id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(Envelope::ok(ProductPayload { product })))
}

/// Replace a product's editable fields.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
    Path(id): Path<ProductId>,
    JsonBody(body): JsonBody<NewProduct>,
) -> Result<Json<Envelope<ProductPayload>>> {
    let product = state
        .products()
        .update(id, body.normalized()?)
        .await
        .map_err(not_found_as_product)?;
    state.catalog().invalidate().await;

    Ok(Json(Envelope::ok_with_message(
        "Product updated",
        ProductPayload { product },
    )))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<Json<Envelope<Empty>>> {
    state
        .products()
        .delete(id)
        .await
        .map_err(not_found_as_product)?;
    state.catalog().invalidate().await;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(Envelope::message("Product deleted")))
}

/// Toggle whether a product is in stock.
#[instrument(skip(state))]
pub async fn change_stock(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
    JsonBody(body): JsonBody<StockRequest>,
) -> Result<Json<Envelope<ProductPayload>>> {
    let product = state
        .products()
        .set_stock(body.id, body.in_stock)
        .await
        .map_err(not_found_as_product)?;
    state.catalog().invalidate().await;

    Ok(Json(Envelope::ok_with_message(
        "Stock updated",
        ProductPayload { product },
    )))
}

fn not_found_as_product(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => product_not_found(),
        other => other.into(),
    }
}
