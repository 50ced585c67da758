// src/handlers/products.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    handlers::product_form::ProductForm,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Privileged, RequireRole},
    },
    models::product::{
        CreateProductInput, PageRequest, PriceChangeLog, Product, ProductFilter, ProductPage,
        UpdateProductInput,
    },
    storage::ImageUpload,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Página (1 por padrão)
    pub page: Option<String>,
    /// Itens por página (10 por padrão, no máximo 100)
    pub limit: Option<String>,
    /// Trecho do nome, sem diferenciar maiúsculas
    pub search: Option<String>,
    /// Categoria exata
    pub category: Option<String>,
}

impl ListProductsQuery {
    fn into_parts(self) -> (PageRequest, ProductFilter) {
        let page = PageRequest::parse(self.page.as_deref(), self.limit.as_deref());
        let filter = ProductFilter {
            search: self.search.map(|s| s.trim().to_owned()).unwrap_or_default(),
            category: self
                .category
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
        };
        (page, filter)
    }
}

// Um id que não é UUID não pode existir
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::ProductNotFound)
}

fn check_image(image: Option<&ImageUpload>, max_bytes: usize) -> Result<(), AppError> {
    match image {
        Some(upload) => upload.validate(max_bytes),
        None => Ok(()),
    }
}

// ---
// Handler: create_product
// ---
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body(content = CreateProductInput, content_type = "multipart/form-data", description = "Campos do produto e image (opcional)"),
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos ou código duplicado"),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let form = ProductForm::from_multipart(&mut multipart).await?;
    let (input, image) = form.into_create_input();
    check_image(image.as_ref(), app_state.max_image_bytes)?;

    let product = app_state
        .product_service
        .create(input, image, &user.actor())
        .await?;

    Ok(ApiResponse::created(product, "Product created successfully"))
}

// ---
// Handler: list_products
// ---
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Página de produtos", body = ProductPage)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListProductsQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let (page, filter) = query.into_parts();
    let result = app_state.product_service.list(page, filter).await?;

    Ok(ApiResponse::ok(result, "Products fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(product, "Product fetched successfully"))
}

// ---
// Handler: update_product (somente superusuário)
// ---
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body(content = UpdateProductInput, content_type = "multipart/form-data", description = "Campos parciais, status e image (opcionais)"),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 400, description = "Preço fora da faixa de ±10% ou alterado há menos de 24h"),
        (status = 403, description = "Papel insuficiente"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    RequireRole(actor, ..): RequireRole<Privileged>,
    Path(id): Path<String>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let form = ProductForm::from_multipart(&mut multipart).await?;
    let (input, image) = form.into_update_input()?;
    check_image(image.as_ref(), app_state.max_image_bytes)?;

    let product = app_state
        .product_service
        .update(id, input, image, &actor, Utc::now())
        .await?;

    Ok(ApiResponse::ok(product, "Product updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido"),
        (status = 403, description = "Papel insuficiente"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    RequireRole(actor, ..): RequireRole<Privileged>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.delete(parse_id(&id)?).await?;
    tracing::debug!(product_id = %product.id, user_id = %actor.id, "delete requested");

    Ok(ApiResponse::message("Product deleted successfully"))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/price-history",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Alterações de preço, mais recentes primeiro", body = [PriceChangeLog]),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn price_history(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state.product_service.price_history(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(history, "Price history fetched successfully"))
}
