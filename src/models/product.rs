use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{
    NewProduct as DomainNewProduct, Product as DomainProduct, ProductCategory, ProductSize,
    UpdateProduct as DomainUpdateProduct,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub size: String,
    pub images: String,
    pub description: String,
    pub stock: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub price_cents: i64,
    pub size: &'a str,
    pub images: String,
    pub description: &'a str,
    pub stock: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProduct<'a> {
    pub name: Option<&'a str>,
    pub category: Option<&'a str>,
    pub price_cents: Option<i64>,
    pub size: Option<&'a str>,
    pub images: Option<String>,
    pub description: Option<&'a str>,
    pub stock: Option<i32>,
    pub updated_at: NaiveDateTime,
}

fn encode_images(images: &[String]) -> String {
    serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string())
}

fn decode_images(id: i32, raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(images) => images,
        Err(err) => {
            log::warn!("Product {id} has unreadable images `{raw}`: {err}");
            Vec::new()
        }
    }
}

impl From<Product> for DomainProduct {
    fn from(value: Product) -> Self {
        let category = ProductCategory::try_from(value.category.as_str()).unwrap_or_else(|err| {
            log::warn!("Product {}: {err}", value.id);
            ProductCategory::EauDeParfum
        });
        let size = ProductSize::try_from(value.size.as_str()).unwrap_or_else(|err| {
            log::warn!("Product {}: {err}", value.id);
            ProductSize::default()
        });
        let images = decode_images(value.id, &value.images);

        Self {
            id: value.id,
            name: value.name,
            category,
            price_cents: value.price_cents,
            size,
            images,
            description: value.description,
            stock: value.stock,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewProduct> for NewProduct<'a> {
    fn from(value: &'a DomainNewProduct) -> Self {
        Self {
            name: value.name.as_str(),
            category: value.category.as_str(),
            price_cents: value.price_cents,
            size: value.size.as_str(),
            images: encode_images(&value.images),
            description: value.description.as_str(),
            stock: value.stock,
        }
    }
}

impl<'a> From<&'a DomainUpdateProduct> for UpdateProduct<'a> {
    fn from(value: &'a DomainUpdateProduct) -> Self {
        Self {
            name: value.name.as_deref(),
            category: value.category.map(|category| category.as_str()),
            price_cents: value.price_cents,
            size: value.size.map(|size| size.as_str()),
            images: value.images.as_deref().map(encode_images),
            description: value.description.as_deref(),
            stock: value.stock,
            updated_at: value.updated_at,
        }
    }
}
