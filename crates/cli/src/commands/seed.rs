//! Seed the catalog with the built-in sample products.

use greencart_core::{NewProduct, catalog::sample_products};
use greencart_server::db::{ProductRepository, products::PgProductRepository};

use super::connect;

/// Insert the sample catalog.
///
/// Skips when products already exist unless `force` is set.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn products(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let repo = PgProductRepository::new(connect().await?);

    let existing = repo.list().await?.len();
    if existing > 0 && !force {
        tracing::info!(existing, "Products already present, skipping (use --force to insert anyway)");
        return Ok(());
    }

    let samples = sample_products();
    let total = samples.len();
    // Oldest first so the listing shows them in sample order.
    for product in samples.into_iter().rev() {
        let name = product.name.clone();
        repo.create(NewProduct {
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            offer_price: product.offer_price,
            in_stock: product.in_stock,
            rating: product.rating,
            images: product.images,
        })
        .await?;
        tracing::debug!(%name, "Inserted sample product");
    }

    tracing::info!(total, "Seeded sample products");
    Ok(())
}
