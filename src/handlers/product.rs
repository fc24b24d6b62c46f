// src/handlers/product.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use tracing::instrument;

use crate::dtos::product::{
    CreateProductRequest, ProductQuery, ProductResponse, SortBy, SortOrder, UpdateProductRequest,
};
use crate::error::AppError;
use crate::models::category::Category;
use crate::models::product::{Product, ProductStatus, LOW_STOCK_THRESHOLD};
use crate::notify::check_low_stock;
use crate::state::AppState;
use crate::validation::{validate_name, validate_price, validate_sku, validate_stock};

const PRODUCT_COLUMNS: &str =
    "id, name, sku, description, price, stock, image, status, created_at, updated_at";

/// Attributes a unique-index violation to the colliding field. Anything that
/// is not a 23505 on a known constraint is surfaced as a database error.
fn map_unique_violation(err: SqlxError, name: &str, sku: &str) -> AppError {
    if let SqlxError::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some("products_name_key") => AppError::conflict("name", name),
                Some("products_sku_key") => AppError::conflict("sku", sku),
                _ => AppError::db(err),
            };
        }
    }
    AppError::db(err)
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds the filtered/sorted listing statement. Returns the SQL plus the
/// values to bind, in placeholder order. Pure so the clause assembly is
/// testable without a database.
fn build_list_query(
    query: &ProductQuery,
) -> Result<(String, Option<ProductStatus>, Option<String>), AppError> {
    let sort = SortBy::parse(query.sort.as_deref())?;
    let order = SortOrder::parse(query.order.as_deref())?;

    let mut conditions: Vec<String> = Vec::new();
    let mut next_param = 1;

    let status_bind = query.status.map(|status| {
        conditions.push(format!("status = ${next_param}"));
        next_param += 1;
        status
    });

    if query.low_stock.unwrap_or(false) {
        conditions.push(format!("stock < {LOW_STOCK_THRESHOLD}"));
    }

    let search_bind = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| {
            conditions.push(format!(
                "(name ILIKE ${next_param} OR sku ILIKE ${next_param})"
            ));
            next_param += 1;
            format!("%{}%", escape_like(q))
        });

    let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products");
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {} {}", sort.column(), order.keyword()));

    Ok((sql, status_bind, search_bind))
}

fn dedup_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Verifies every referenced category exists before touching the join table.
async fn check_category_ids(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[i64],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
    if let Some(missing) = ids.iter().find(|id| !known.contains(id)) {
        return Err(AppError::validation(
            "categories",
            format!("unknown category id {missing}"),
        ));
    }
    Ok(())
}

async fn replace_category_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM product_category WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    if !category_ids.is_empty() {
        sqlx::query(
            "INSERT INTO product_category (product_id, category_id)
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(product_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// GET /products - List products with filters, search, and sorting
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let (sql, status_bind, search_bind) = build_list_query(&query)?;

    let mut stmt = sqlx::query_as::<_, Product>(&sql);
    if let Some(status) = status_bind {
        stmt = stmt.bind(status);
    }
    if let Some(pattern) = &search_bind {
        stmt = stmt.bind(pattern);
    }
    let products = stmt.fetch_all(&state.db_pool).await?;

    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let mut grouped: HashMap<i64, Vec<Category>> = HashMap::new();
    if !ids.is_empty() {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT pc.product_id, c.id, c.name
             FROM product_category pc
             JOIN categories c ON c.id = pc.category_id
             WHERE pc.product_id = ANY($1)
             ORDER BY c.name",
        )
        .bind(&ids)
        .fetch_all(&state.db_pool)
        .await?;
        for (product_id, id, name) in rows {
            grouped
                .entry(product_id)
                .or_default()
                .push(Category { id, name });
        }
    }

    let response = products
        .into_iter()
        .map(|p| {
            let categories = grouped.remove(&p.id).unwrap_or_default();
            ProductResponse::from_parts(p, categories)
        })
        .collect();
    Ok(Json(response))
}

// GET /products/:id - Get single product
#[instrument(skip(state), fields(id))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT c.id, c.name
         FROM product_category pc
         JOIN categories c ON c.id = pc.category_id
         WHERE pc.product_id = $1
         ORDER BY c.name",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(ProductResponse::from_parts(product, categories)))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let name = payload.name.trim().to_string();
    let sku = payload.sku.trim().to_string();
    validate_name(&name)?;
    validate_sku(&sku)?;

    let price = payload.price.unwrap_or(Decimal::ZERO);
    validate_price(price)?;
    let stock = payload.stock.unwrap_or(0);
    validate_stock(stock)?;
    let status = payload.status.unwrap_or_default();
    let category_ids = payload.categories.map(dedup_ids).unwrap_or_default();

    // Row and join entries are written in one transaction so a failed insert
    // leaves no partial association behind.
    let mut tx = state.db_pool.begin().await?;

    check_category_ids(&mut tx, &category_ids).await?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (name, sku, description, price, stock, image, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&name)
    .bind(&sku)
    .bind(&payload.description)
    .bind(price)
    .bind(stock)
    .bind(&payload.image)
    .bind(status)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_unique_violation(e, &name, &sku))?;

    replace_category_links(&mut tx, product.id, &category_ids).await?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name FROM categories WHERE id = ANY($1) ORDER BY name",
    )
    .bind(&category_ids)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_parts(product, categories)),
    ))
}

// PUT /products/:id - Update product (any subset of fields)
#[instrument(skip(state, payload), fields(id))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(mut payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let name = payload.name.as_deref().map(str::trim).map(String::from);
    let sku = payload.sku.as_deref().map(str::trim).map(String::from);
    if let Some(n) = &name {
        validate_name(n)?;
    }
    if let Some(s) = &sku {
        validate_sku(s)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }
    let category_ids = payload.categories.take().map(dedup_ids);

    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Product not found"));
    }

    if let Some(ids) = &category_ids {
        check_category_ids(&mut tx, ids).await?;
    }

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
            name = COALESCE($2, name),
            sku = COALESCE($3, sku),
            description = COALESCE($4, description),
            price = COALESCE($5, price),
            stock = COALESCE($6, stock),
            image = COALESCE($7, image),
            status = COALESCE($8, status),
            updated_at = now()
         WHERE id = $1
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&name)
    .bind(&sku)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.stock)
    .bind(&payload.image)
    .bind(payload.status)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            name.as_deref().unwrap_or_default(),
            sku.as_deref().unwrap_or_default(),
        )
    })?;

    if let Some(ids) = &category_ids {
        replace_category_links(&mut tx, product.id, ids).await?;
    }

    let categories = sqlx::query_as::<_, Category>(
        "SELECT c.id, c.name
         FROM product_category pc
         JOIN categories c ON c.id = pc.category_id
         WHERE pc.product_id = $1
         ORDER BY c.name",
    )
    .bind(product.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    // Evaluated only after the write is durable; the notifier cannot fail
    // the request. Fires on every stock edit below threshold, no debouncing.
    if payload.stock.is_some() {
        check_low_stock(state.notifier.as_ref(), &product.name, product.stock);
    }

    Ok(Json(ProductResponse::from_parts(product, categories)))
}

// DELETE /products/:id - Delete product (join rows cascade, categories stay)
#[instrument(skip(state), fields(id))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
