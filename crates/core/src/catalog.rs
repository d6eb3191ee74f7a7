//! Read-only views over an in-memory product catalog.
//!
//! These are the presentational rules the storefront applies after fetching
//! the product list: search filtering, category pages, the product detail
//! view with related products, and a built-in sample catalog used when the
//! backend cannot be reached (and for seeding a fresh database).

use chrono::{DateTime, Utc};

use crate::types::{Price, Product, ProductId, Rating};

/// How many related products the detail view shows.
pub const RELATED_LIMIT: usize = 5;

/// How many products the home page "best sellers" row shows.
pub const BEST_SELLERS_LIMIT: usize = 5;

/// Whether `product`'s name contains `query`, ignoring case.
///
/// An empty query matches everything. The query is used as typed, so
/// whitespace is part of the substring.
#[must_use]
pub fn matches_query(product: &Product, query: &str) -> bool {
    query.is_empty() || product.name.to_lowercase().contains(&query.to_lowercase())
}

/// Products whose name matches `query`, in catalog order.
///
/// Stock is not considered; see [`listing`] for what the product grid shows.
#[must_use]
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| matches_query(p, query)).collect()
}

/// The "all products" grid: name matches `query` and the product is in stock.
#[must_use]
pub fn listing<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| matches_query(p, query) && p.in_stock)
        .collect()
}

/// In-stock products of `category`, compared case-insensitively.
#[must_use]
pub fn category_listing<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    let category = category.trim().to_lowercase();
    products
        .iter()
        .filter(|p| p.in_stock && p.category.to_lowercase() == category)
        .collect()
}

/// The first `limit` in-stock products.
#[must_use]
pub fn best_sellers(products: &[Product], limit: usize) -> Vec<&Product> {
    products.iter().filter(|p| p.in_stock).take(limit).collect()
}

/// Look up a product by id.
#[must_use]
pub fn find(products: &[Product], id: ProductId) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

/// Up to `limit` other products sharing `product`'s category.
#[must_use]
pub fn related<'a>(products: &'a [Product], product: &Product, limit: usize) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.id != product.id && p.category == product.category)
        .take(limit)
        .collect()
}

/// Product page state: the product, its related products, and which image is
/// currently shown large.
///
/// The image selection lives here rather than on the product, so refetching
/// the catalog does not reset it unless the image disappears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail<'a> {
    product: &'a Product,
    related: Vec<&'a Product>,
    main_image: Option<String>,
}

impl<'a> ProductDetail<'a> {
    /// Build the detail view for `id`, or `None` if the product does not exist.
    #[must_use]
    pub fn new(products: &'a [Product], id: ProductId) -> Option<Self> {
        let product = find(products, id)?;
        Some(Self {
            product,
            related: related(products, product, RELATED_LIMIT),
            main_image: product.images.first().cloned(),
        })
    }

    #[must_use]
    pub const fn product(&self) -> &'a Product {
        self.product
    }

    #[must_use]
    pub fn related(&self) -> &[&'a Product] {
        &self.related
    }

    /// The image shown large; defaults to the first image.
    #[must_use]
    pub fn main_image(&self) -> Option<&str> {
        self.main_image.as_deref()
    }

    /// Show `image` large. Returns `false` (and keeps the current selection)
    /// if it is not one of the product's images.
    pub fn select_image(&mut self, image: &str) -> bool {
        if self.product.images.iter().any(|i| i == image) {
            self.main_image = Some(image.to_owned());
            true
        } else {
            false
        }
    }

    /// Thumbnail images, in product order.
    pub fn thumbnails(&self) -> impl Iterator<Item = &'a str> {
        self.product.images.iter().map(String::as_str)
    }
}

/// Stable key for an image path: its file name without directories or extension.
///
/// ```
/// use greencart_core::catalog::image_key;
///
/// assert_eq!(image_key("/images/potato_image_1.png"), "potato_image_1");
/// assert_eq!(image_key("banana"), "banana");
/// ```
#[must_use]
pub fn image_key(path: &str) -> &str {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

// =============================================================================
// Sample catalog
// =============================================================================

struct Sample {
    name: &'static str,
    category: &'static str,
    price_cents: u32,
    offer_cents: u32,
    rating: u8,
    in_stock: bool,
    image: &'static str,
    description: &'static [&'static str],
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "Potato 500g",
        category: "Vegetables",
        price_cents: 250,
        offer_cents: 200,
        rating: 4,
        in_stock: true,
        image: "potato_image_1",
        description: &["Fresh and organic", "Rich in carbohydrates", "Ideal for curries and fries"],
    },
    Sample {
        name: "Tomato 1 kg",
        category: "Vegetables",
        price_cents: 400,
        offer_cents: 350,
        rating: 4,
        in_stock: true,
        image: "tomato_image",
        description: &["Juicy and ripe", "Rich in Vitamin C", "Perfect for salads and sauces"],
    },
    Sample {
        name: "Carrot 500g",
        category: "Vegetables",
        price_cents: 300,
        offer_cents: 250,
        rating: 5,
        in_stock: true,
        image: "carrot_image",
        description: &["Sweet and crunchy", "Good for eyesight", "Ideal for juices and salads"],
    },
    Sample {
        name: "Spinach 500g",
        category: "Vegetables",
        price_cents: 180,
        offer_cents: 150,
        rating: 3,
        in_stock: false,
        image: "spinach_image_1",
        description: &["Rich in iron", "High in vitamins", "Perfect for soups and salads"],
    },
    Sample {
        name: "Apple 1 kg",
        category: "Fruits",
        price_cents: 650,
        offer_cents: 560,
        rating: 5,
        in_stock: true,
        image: "apple_image",
        description: &["Crisp and juicy", "Rich in fiber", "Boosts immunity"],
    },
    Sample {
        name: "Banana 1 kg",
        category: "Fruits",
        price_cents: 250,
        offer_cents: 200,
        rating: 4,
        in_stock: true,
        image: "banana_image_1",
        description: &["Sweet and ripe", "High in potassium", "Great for smoothies and snacking"],
    },
    Sample {
        name: "Whole Milk 1 L",
        category: "Dairy",
        price_cents: 180,
        offer_cents: 160,
        rating: 4,
        in_stock: true,
        image: "milk_image",
        description: &["Pure and fresh", "Rich in calcium", "Ideal for tea, coffee, and desserts"],
    },
    Sample {
        name: "Paneer 200g",
        category: "Dairy",
        price_cents: 300,
        offer_cents: 280,
        rating: 4,
        in_stock: true,
        image: "paneer_image",
        description: &["Soft and fresh", "Rich in protein", "Ideal for curries and snacks"],
    },
    Sample {
        name: "Orange Juice 1 L",
        category: "Drinks",
        price_cents: 450,
        offer_cents: 399,
        rating: 3,
        in_stock: true,
        image: "orange_juice_image",
        description: &["No added sugar", "Rich in Vitamin C", "Best served chilled"],
    },
    Sample {
        name: "Basmati Rice 5kg",
        category: "Grains",
        price_cents: 1_500,
        offer_cents: 1_350,
        rating: 5,
        in_stock: true,
        image: "basmati_rice_image",
        description: &["Long grain and aromatic", "Perfect for biryani and pulao", "Premium quality"],
    },
    Sample {
        name: "Brown Bread 400g",
        category: "Bakery",
        price_cents: 150,
        offer_cents: 120,
        rating: 4,
        in_stock: true,
        image: "brown_bread_image",
        description: &["Soft and healthy", "Made from whole wheat", "Ideal for breakfast and sandwiches"],
    },
    Sample {
        name: "Eggs 12 pcs",
        category: "Dairy",
        price_cents: 350,
        offer_cents: 320,
        rating: 4,
        in_stock: false,
        image: "eggs_image",
        description: &["Farm fresh", "Rich in protein", "Ideal for breakfast and baking"],
    },
];

/// Built-in sample catalog with ids starting at 1.
///
/// Every product has a non-zero offer price below its list price.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    let created_at = DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default();

    SAMPLES
        .iter()
        .zip(1..)
        .map(|(sample, id)| Product {
            id: ProductId::new(id),
            name: sample.name.to_owned(),
            description: sample.description.iter().map(|&line| line.to_owned()).collect(),
            category: sample.category.to_owned(),
            price: Price::from_unsigned_cents(sample.price_cents),
            offer_price: Price::from_unsigned_cents(sample.offer_cents),
            in_stock: sample.in_stock,
            rating: Rating::new(sample.rating).unwrap_or_default(),
            images: vec![format!("/images/{}.png", sample.image)],
            created_at,
            updated_at: created_at,
        })
        .collect()
}
