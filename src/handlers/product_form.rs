// src/handlers/product_form.rs
//
// Leitura do corpo multipart dos endpoints de produto. Campos de texto são
// aparados e, se vazios, tratados como ausentes.

use axum::extract::{multipart::MultipartError, Multipart};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    models::product::{CreateProductInput, ProductStatus, UpdateProductInput},
    storage::ImageUpload,
};

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub manufacture_date: Option<String>,
    pub expiry_date: Option<String>,
    pub status: Option<String>,
    pub image: Option<ImageUpload>,
}

fn malformed(e: MultipartError) -> AppError {
    AppError::MalformedForm(e.body_text())
}

impl ProductForm {
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await.map_err(malformed)?;

                // Navegadores enviam a parte vazia quando nenhum arquivo foi escolhido
                if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                    continue;
                }
                form.image = Some(ImageUpload { file_name, content_type, bytes });
                continue;
            }

            let value = field.text().await.map_err(malformed)?;
            let value = Some(value.trim().to_owned()).filter(|v| !v.is_empty());

            match name.as_str() {
                "name" => form.name = value,
                "productCode" | "product_code" => form.product_code = value,
                "price" => form.price = value,
                "category" => form.category = value,
                "manufactureDate" | "manufacture_date" => form.manufacture_date = value,
                "expiryDate" | "expiry_date" => form.expiry_date = value,
                "status" => form.status = value,
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Valores ilegíveis viram ausentes; a validação da criação já reporta
    /// preço e datas obrigatórios com a mesma mensagem.
    pub fn into_create_input(self) -> (CreateProductInput, Option<ImageUpload>) {
        let input = CreateProductInput {
            name: self.name.unwrap_or_default(),
            product_code: self.product_code.unwrap_or_default(),
            price: self.price.as_deref().and_then(parse_price),
            category: self.category.unwrap_or_default(),
            manufacture_date: self.manufacture_date.as_deref().and_then(parse_date),
            expiry_date: self.expiry_date.as_deref().and_then(parse_date),
        };
        (input, self.image)
    }

    /// Na atualização um valor ilegível não pode ser confundido com "não informado".
    pub fn into_update_input(self) -> Result<(UpdateProductInput, Option<ImageUpload>), AppError> {
        let mut errors = ValidationErrors::new();

        let price = parse_field(
            self.price.as_deref(),
            parse_price,
            "price",
            "Price must be a positive number",
            &mut errors,
        );
        let manufacture_date = parse_field(
            self.manufacture_date.as_deref(),
            parse_date,
            "manufacture_date",
            "Manufacture date must be a valid date",
            &mut errors,
        );
        let expiry_date = parse_field(
            self.expiry_date.as_deref(),
            parse_date,
            "expiry_date",
            "Expiry date must be a valid date",
            &mut errors,
        );
        let status = parse_field(
            self.status.as_deref(),
            |raw| raw.parse::<ProductStatus>().ok(),
            "status",
            "Status must be either active or inactive",
            &mut errors,
        );

        if !errors.errors().is_empty() {
            return Err(errors.into());
        }

        let input = UpdateProductInput {
            name: self.name,
            product_code: self.product_code,
            price,
            category: self.category,
            manufacture_date,
            expiry_date,
            status,
        };
        Ok((input, self.image))
    }
}

fn parse_field<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    field: &'static str,
    message: &'static str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        let mut err = ValidationError::new("invalid");
        err.message = Some(message.into());
        errors.add(field, err);
    }
    parsed
}

fn parse_price(raw: &str) -> Option<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Aceita `YYYY-MM-DD` ou um timestamp RFC 3339 (usa a parte da data).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
