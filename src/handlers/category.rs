// src/handlers/category.rs
use axum::{extract::State, http::StatusCode, Json};

use crate::dtos::category::{CategoryResponse, CreateCategoryRequest};
use crate::error::AppError;
use crate::models::category::Category;
use crate::state::AppState;
use crate::validation::validate_category_name;

pub async fn list_categories(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&db_pool)
            .await?;

    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

// POST /categories - find-or-create by name, for inline creation from the
// product form's multi-select.
pub async fn create_category(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let name = req.name.trim().to_string();
    validate_category_name(&name)?;

    let existing = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = $1")
        .bind(&name)
        .fetch_optional(&db_pool)
        .await?;
    if let Some(category) = existing {
        return Ok((StatusCode::OK, Json(CategoryResponse::from(category))));
    }

    // A concurrent create of the same name resolves through the unique index;
    // DO UPDATE makes RETURNING yield the surviving row either way.
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id, name",
    )
    .bind(&name)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}
