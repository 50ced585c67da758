// src/models/product.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl std::str::FromStr for ProductStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(()),
        }
    }
}

// --- Produto (tabela 'products') ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Milk")]
    pub name: String,
    #[schema(example = "/images/0b7a6f3e.png")]
    pub image: Option<String>,
    #[schema(example = "M1")]
    pub product_code: String,
    #[schema(value_type = f64, example = 100)]
    pub price: Decimal,
    #[schema(example = "Dairy")]
    pub category: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Projeção mínima do dono, usada na listagem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OwnerSummary {
    #[sqlx(rename = "owner_id")]
    pub id: Uuid,
    #[sqlx(rename = "owner_name")]
    pub name: String,
    #[sqlx(rename = "owner_email")]
    pub email: String,
}

// Produto com o dono resolvido (JOIN com 'users')
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub product_code: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub owner: OwnerSummary,
}

/// Paginação por offset: `skip = (page - 1) * limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Valores ausentes, inválidos ou menores que 1 caem no padrão (1 / 10).
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v >= 1)
        };
        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit)
                .unwrap_or(Self::DEFAULT_LIMIT)
                .min(Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<ProductListing>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

// --- Histórico de preço (tabela 'price_change_logs') ---
// Somente inserção; nunca é alterado nem removido pelo fluxo normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeLog {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = f64, example = 105)]
    pub new_price: Decimal,
    pub changed_at: DateTime<Utc>,
}

/// Registro pronto para inserção; o dono vem sempre do ator autenticado.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub image: Option<String>,
    pub product_code: String,
    pub price: Decimal,
    pub category: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub owner_id: Uuid,
}

/// Filtro da listagem. `search` vazio casa com tudo.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: String,
    pub category: Option<String>,
}

// ---
// Validação Customizada
// ---
fn validate_positive_price(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("gt".into(), &0.0);
        err.message = Some("Price must be a positive number".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_date_order(
    manufacture_date: NaiveDate,
    expiry_date: NaiveDate,
) -> Result<(), ValidationError> {
    if expiry_date <= manufacture_date {
        let mut err = ValidationError::new("date_order");
        err.message = Some("Expiry date must be after manufacture date".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Input: CreateProduct
// ---
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Product code is required"))]
    pub product_code: String,

    #[validate(
        required(message = "Price must be a positive number"),
        custom(function = "validate_positive_price")
    )]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(required(message = "Manufacture date must be a valid date"))]
    pub manufacture_date: Option<NaiveDate>,

    #[validate(required(message = "Expiry date must be a valid date"))]
    pub expiry_date: Option<NaiveDate>,
}

impl CreateProductInput {
    /// Validação dos campos mais a regra entre datas (validade > fabricação).
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let (Some(made), Some(expires)) = (self.manufacture_date, self.expiry_date) {
            if let Err(e) = validate_date_order(made, expires) {
                errors.add("expiry_date", e);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_new_product(self, owner_id: Uuid) -> Result<NewProduct, ValidationErrors> {
        self.check()?;
        match (self.price, self.manufacture_date, self.expiry_date) {
            (Some(price), Some(manufacture_date), Some(expiry_date)) => Ok(NewProduct {
                name: self.name,
                image: None,
                product_code: self.product_code,
                price,
                category: self.category,
                manufacture_date,
                expiry_date,
                owner_id,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

// ---
// Input: UpdateProduct
// ---
// Atualização parcial: `None` significa "não informado" e mantém o valor salvo.
// Campos de texto vazios já chegam aqui como `None` (ver handlers::product_form).
// O preço só é governado quando presente E diferente do atual.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub product_code: Option<String>,

    #[validate(custom(function = "validate_positive_price"))]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,

    pub category: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<ProductStatus>,
}

impl UpdateProductInput {
    /// Aplica os campos informados (exceto o preço, que passa pela governança).
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(code) = &self.product_code {
            product.product_code = code.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(date) = self.manufacture_date {
            product.manufacture_date = date;
        }
        if let Some(date) = self.expiry_date {
            product.expiry_date = date;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn milk() -> CreateProductInput {
        CreateProductInput {
            name: "Milk".into(),
            product_code: "M1".into(),
            price: Some(Decimal::from(100)),
            category: "Dairy".into(),
            manufacture_date: Some(date("2024-01-01")),
            expiry_date: Some(date("2024-06-01")),
        }
    }

    #[test]
    fn valid_create_input_passes() {
        assert!(milk().check().is_ok());
    }

    #[test]
    fn expiry_on_or_before_manufacture_is_rejected() {
        let mut same_day = milk();
        same_day.expiry_date = same_day.manufacture_date;
        let errors = same_day.check().unwrap_err();
        assert!(errors.field_errors().contains_key("expiry_date"));

        let mut before = milk();
        before.expiry_date = Some(date("2023-12-31"));
        assert!(before.check().is_err());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = CreateProductInput::default().check().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "product_code", "price", "category", "manufacture_date", "expiry_date"] {
            assert!(fields.contains_key(field), "expected error for {field}");
        }
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut input = milk();
        input.price = Some(Decimal::ZERO);
        assert!(input.check().unwrap_err().field_errors().contains_key("price"));
    }

    #[test]
    fn page_request_is_lenient() {
        assert_eq!(PageRequest::parse(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(
            PageRequest::parse(Some("abc"), Some("0")),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::parse(Some("-3"), Some("5000")),
            PageRequest { page: 1, limit: 100 }
        );
        let page = PageRequest::parse(Some("3"), Some("20"));
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for limit in 1..=12 {
            let page = PageRequest { page: 1, limit };
            for total in 0..=50 {
                let expected = (total as f64 / limit as f64).ceil() as i64;
                assert_eq!(page.total_pages(total), expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn into_new_product_takes_owner_from_actor() {
        let owner = Uuid::new_v4();
        let product = milk().into_new_product(owner).unwrap();
        assert_eq!(product.owner_id, owner);
        assert_eq!(product.image, None);
        assert_eq!(product.price, Decimal::from(100));
    }

    #[test]
    fn update_applies_only_supplied_fields() {
        let now = Utc::now();
        let mut product = Product {
            id: Uuid::new_v4(),
            name: "Milk".into(),
            image: None,
            product_code: "M1".into(),
            price: Decimal::from(100),
            category: "Dairy".into(),
            manufacture_date: date("2024-01-01"),
            expiry_date: date("2024-06-01"),
            owner_id: Uuid::new_v4(),
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let input = UpdateProductInput {
            name: Some("Whole Milk".into()),
            price: Some(Decimal::from(105)),
            status: Some(ProductStatus::Inactive),
            ..Default::default()
        };

        input.apply_to(&mut product);

        assert_eq!(product.name, "Whole Milk");
        assert_eq!(product.product_code, "M1");
        assert_eq!(product.category, "Dairy");
        assert_eq!(product.status, ProductStatus::Inactive);
        // preço fica a cargo da governança
        assert_eq!(product.price, Decimal::from(100));
    }
}
