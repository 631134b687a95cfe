use std::io::{Read, Seek};

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use csv::Trim;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::product::{
    MAX_PRODUCT_IMAGES, NewProduct, ProductCategory, ProductSize, UpdateProduct,
};
use crate::forms::{parse_price_cents, sanitize_inline_text, sanitize_multiline_text};

/// Maximum allowed length for a product name.
const NAME_MAX_LEN: usize = 128;
const NAME_MAX_LEN_VALIDATOR: u64 = NAME_MAX_LEN as u64;

/// Maximum allowed length for a product description.
const DESCRIPTION_MAX_LEN: u64 = 4000;

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that can occur while processing product forms.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("unknown category `{value}`")]
    InvalidCategory { value: String },
    #[error("unknown size `{value}`")]
    InvalidSize { value: String },
    #[error("invalid price `{value}`")]
    InvalidPrice { value: String },
    #[error("invalid stock `{value}`")]
    InvalidStock { value: String },
    #[error("at most {MAX_PRODUCT_IMAGES} images are allowed")]
    TooManyImages,
    /// The uploaded CSV is missing required columns.
    #[error("upload is missing the required `name`, `category` or `price` headers")]
    MissingRequiredHeaders,
    /// A CSV row could not be turned into a product.
    #[error("row {row}: {source}")]
    UploadRow {
        row: usize,
        #[source]
        source: Box<ProductFormError>,
    },
    /// The uploaded CSV did not contain any usable products.
    #[error("upload contains no products")]
    EmptyUpload,
    #[error("failed to read the upload: {0}")]
    Io(#[from] std::io::Error),
    /// CSV parsing failures.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Form payload of the back-office "Add product" and "Edit product" dialogs.
///
/// The dialog submits up to three `images` fields, so the payload is decoded
/// with `serde_html_form`, which collects repeated keys.
#[derive(Debug, Deserialize, Validate, Default)]
pub struct ProductForm {
    #[validate(length(min = 1, max = NAME_MAX_LEN_VALIDATOR))]
    pub name: String,
    pub category: String,
    /// Decimal price as typed, e.g. `89.99`.
    pub price: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(length(max = DESCRIPTION_MAX_LEN))]
    pub description: String,
    #[serde(default)]
    pub stock: Option<String>,
}

/// Fully validated product fields shared by the create and edit paths.
struct ProductFields {
    name: String,
    category: ProductCategory,
    price_cents: i64,
    size: ProductSize,
    images: Vec<String>,
    description: String,
    stock: i32,
}

impl ProductForm {
    fn into_fields(self) -> ProductFormResult<ProductFields> {
        self.validate()?;

        let name = sanitize_inline_text(&self.name);
        if name.is_empty() {
            return Err(ProductFormError::EmptyName);
        }

        let category = ProductCategory::try_from(self.category.as_str()).map_err(|err| {
            ProductFormError::InvalidCategory { value: err.value }
        })?;

        let size = match self.size.as_deref().map(str::trim) {
            None | Some("") => ProductSize::default(),
            Some(value) => ProductSize::try_from(value)
                .map_err(|err| ProductFormError::InvalidSize { value: err.value })?,
        };

        let price_cents =
            parse_price_cents(&self.price).ok_or_else(|| ProductFormError::InvalidPrice {
                value: self.price.trim().to_string(),
            })?;

        let images: Vec<String> = self
            .images
            .iter()
            .map(|image| image.trim())
            .filter(|image| !image.is_empty())
            .map(str::to_string)
            .collect();
        if images.len() > MAX_PRODUCT_IMAGES {
            return Err(ProductFormError::TooManyImages);
        }

        let stock = match self.stock.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(value) => value
                .parse::<i32>()
                .ok()
                .filter(|stock| *stock >= 0)
                .ok_or_else(|| ProductFormError::InvalidStock {
                    value: value.to_string(),
                })?,
        };

        Ok(ProductFields {
            name,
            category,
            price_cents,
            size,
            images,
            description: sanitize_multiline_text(&self.description),
            stock,
        })
    }

    /// Validates and sanitizes the payload into a domain `NewProduct`.
    pub fn into_new_product(self) -> ProductFormResult<NewProduct> {
        let fields = self.into_fields()?;

        Ok(
            NewProduct::new(fields.name, fields.category, fields.price_cents)
                .with_size(fields.size)
                .with_images(fields.images)
                .with_description(fields.description)
                .with_stock(fields.stock),
        )
    }

    /// Validates and sanitizes the payload into a patch touching every
    /// editable field.
    pub fn into_update_product(self) -> ProductFormResult<UpdateProduct> {
        let fields = self.into_fields()?;

        Ok(UpdateProduct::new()
            .name(fields.name)
            .category(fields.category)
            .price_cents(fields.price_cents)
            .size(fields.size)
            .images(fields.images)
            .description(fields.description)
            .stock(fields.stock))
    }
}

#[derive(MultipartForm)]
/// Multipart form for uploading a CSV file with new products.
pub struct UploadProductsForm {
    #[multipart(limit = "10MB")]
    /// Uploaded CSV file with `name,category,price,size,description,stock,image1,image2,image3` columns.
    pub csv: TempFile,
}

impl UploadProductsForm {
    /// Parse the uploaded CSV file into a list of [`NewProduct`] records.
    pub fn into_new_products(&mut self) -> ProductFormResult<Vec<NewProduct>> {
        self.csv.file.rewind()?;
        parse_products(self.csv.file.by_ref())
    }
}

#[derive(Deserialize)]
struct ProductCsvRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    stock: Option<String>,
    #[serde(default)]
    image1: Option<String>,
    #[serde(default)]
    image2: Option<String>,
    #[serde(default)]
    image3: Option<String>,
}

impl From<ProductCsvRow> for ProductForm {
    fn from(row: ProductCsvRow) -> Self {
        Self {
            name: row.name,
            category: row.category,
            price: row.price,
            size: row.size,
            images: [row.image1, row.image2, row.image3]
                .into_iter()
                .flatten()
                .collect(),
            description: row.description,
            stock: row.stock,
        }
    }
}

fn parse_products<R: Read>(reader: R) -> ProductFormResult<Vec<NewProduct>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let has_header = |name: &str| headers.iter().any(|header| header == name);
    if !["name", "category", "price"].into_iter().all(has_header) {
        return Err(ProductFormError::MissingRequiredHeaders);
    }

    let mut products = Vec::new();

    for (index, row) in csv_reader.deserialize::<ProductCsvRow>().enumerate() {
        let row_number = index + 2; // account for header row
        let record = row?;

        let product = ProductForm::from(record)
            .into_new_product()
            .map_err(|err| ProductFormError::UploadRow {
                row: row_number,
                source: Box::new(err),
            })?;

        products.push(product);
    }

    if products.is_empty() {
        return Err(ProductFormError::EmptyUpload);
    }

    Ok(products)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    fn form() -> ProductForm {
        ProductForm {
            name: "  Midnight   Oud ".to_string(),
            category: "Eau de Parfum".to_string(),
            price: "89.90".to_string(),
            size: Some("50ml".to_string()),
            images: vec![
                "https://cdn.example/oud-1.jpg".to_string(),
                "   ".to_string(),
                "https://cdn.example/oud-2.jpg".to_string(),
            ],
            description: "Smoky\n".to_string(),
            stock: Some("12".to_string()),
        }
    }

    #[test]
    fn valid_form_becomes_new_product() {
        let product = form().into_new_product().unwrap();

        assert_eq!(product.name, "Midnight Oud");
        assert_eq!(product.category, ProductCategory::EauDeParfum);
        assert_eq!(product.price_cents, 8990);
        assert_eq!(product.size, ProductSize::Ml50);
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.description, "Smoky");
        assert_eq!(product.stock, 12);
    }

    #[test]
    fn missing_size_and_stock_fall_back_to_defaults() {
        let product = ProductForm {
            size: None,
            stock: Some(String::new()),
            ..form()
        }
        .into_new_product()
        .unwrap();

        assert_eq!(product.size, ProductSize::Ml100);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn rejects_unknown_category() {
        let result = ProductForm {
            category: "Body Mist".to_string(),
            ..form()
        }
        .into_new_product();

        assert!(matches!(
            result,
            Err(ProductFormError::InvalidCategory { value }) if value == "Body Mist"
        ));
    }

    #[test]
    fn rejects_bad_price_and_stock() {
        let price = ProductForm {
            price: "12.345".to_string(),
            ..form()
        }
        .into_new_product();
        assert!(matches!(price, Err(ProductFormError::InvalidPrice { .. })));

        let stock = ProductForm {
            stock: Some("-1".to_string()),
            ..form()
        }
        .into_new_product();
        assert!(matches!(stock, Err(ProductFormError::InvalidStock { .. })));
    }

    #[test]
    fn rejects_more_than_three_images() {
        let result = ProductForm {
            images: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..form()
        }
        .into_new_product();

        assert!(matches!(result, Err(ProductFormError::TooManyImages)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = ProductForm {
            name: String::new(),
            ..form()
        }
        .into_new_product();

        assert!(matches!(result, Err(ProductFormError::Validation(_))));
    }

    #[test]
    fn update_patch_sets_every_field() {
        let patch = form().into_update_product().unwrap();

        assert_eq!(patch.name.as_deref(), Some("Midnight Oud"));
        assert_eq!(patch.price_cents, Some(8990));
        assert_eq!(patch.stock, Some(12));
    }

    #[test]
    fn form_decodes_repeated_image_fields() {
        let body = "name=Iris&category=Perfume+Oil&price=40&images=a.jpg&images=b.jpg";
        let form: ProductForm = serde_html_form::from_str(body).unwrap();

        assert_eq!(form.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(form.size, None);
    }

    #[test]
    fn upload_parses_rows() {
        let mut upload = build_upload_form(
            "name,category,price,size,description,stock,image1\n\
             Rose Noir,Eau de Toilette,55.00,30ml,Dark rose,4,https://cdn.example/r.jpg\n\
             Citrus,Eau de Cologne,25,,,,\n",
        );

        let products = upload.into_new_products().unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].images, vec!["https://cdn.example/r.jpg"]);
        assert_eq!(products[0].size, ProductSize::Ml30);
        assert_eq!(products[1].price_cents, 2500);
        assert!(products[1].images.is_empty());
    }

    #[test]
    fn upload_reports_failing_row() {
        let mut upload = build_upload_form(
            "name,category,price\n\
             Rose Noir,Eau de Toilette,55.00\n\
             Citrus,Shampoo,25\n",
        );

        let result = upload.into_new_products();

        assert!(matches!(result, Err(ProductFormError::UploadRow { row: 3, .. })));
    }

    #[test]
    fn upload_requires_headers() {
        let mut upload = build_upload_form("title,price\nRose,10\n");

        assert!(matches!(
            upload.into_new_products(),
            Err(ProductFormError::MissingRequiredHeaders)
        ));
    }

    #[test]
    fn upload_without_rows_is_rejected() {
        let mut upload = build_upload_form("name,category,price\n");

        assert!(matches!(
            upload.into_new_products(),
            Err(ProductFormError::EmptyUpload)
        ));
    }

    pub(crate) fn build_upload_form(csv: &str) -> UploadProductsForm {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(csv.as_bytes()).expect("write csv file");
        file.as_file_mut()
            .seek(SeekFrom::Start(0))
            .expect("seek to start");

        UploadProductsForm {
            csv: TempFile {
                file,
                content_type: None,
                file_name: Some("products.csv".to_string()),
                size: csv.len(),
            },
        }
    }
}
