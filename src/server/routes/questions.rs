use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, NewQuestion, Question},
    server::{app::AppState, error::ApiResponse},
    telemetry::QUESTIONS_SERVED_CNTR,
};

#[derive(Deserialize)]
pub(super) struct RandomQuery {
    pub(super) category: String,
    pub(super) num: i64,
}

fn served(query: &str, questions: &[Question]) {
    QUESTIONS_SERVED_CNTR
        .with_label_values(&[query])
        .inc_by(questions.len() as f64);
}

async fn all_questions(State(pool): State<SqlitePool>) -> ApiResponse<Json<Vec<Question>>> {
    let questions = questions::get_all_questions(&pool).await?;
    served("all", &questions);
    Ok(Json(questions))
}

async fn questions_by_category(
    State(pool): State<SqlitePool>,
    Path(category): Path<String>,
) -> ApiResponse<Json<Vec<Question>>> {
    let questions = questions::find_by_category(&pool, &category).await?;
    tracing::debug!("Found {} questions in {category}", questions.len());
    served("by_category", &questions);
    Ok(Json(questions))
}

async fn random_questions(
    State(pool): State<SqlitePool>,
    query: Result<Query<RandomQuery>, QueryRejection>,
) -> ApiResponse<Json<Vec<Question>>> {
    let Query(RandomQuery { category, num }) = query?;
    let questions = questions::find_random_questions_by_category(&pool, &category, num).await?;
    served("random", &questions);
    Ok(Json(questions))
}

async fn question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<Json<Question>> {
    Ok(Json(questions::get_question_by_id(&pool, id).await?))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    Json(new_question): Json<NewQuestion>,
) -> ApiResponse<(StatusCode, Json<Question>)> {
    let id = questions::create_question(&pool, &new_question).await?;
    tracing::info!("Created question {id} in {}", new_question.category);
    Ok((
        StatusCode::CREATED,
        Json(questions::get_question_by_id(&pool, id).await?),
    ))
}

async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(question): Json<NewQuestion>,
) -> ApiResponse<Json<Question>> {
    questions::update_question(&pool, id, &question).await?;
    Ok(Json(questions::get_question_by_id(&pool, id).await?))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<StatusCode> {
    questions::delete_question(&pool, id).await?;
    tracing::info!("Deleted question {id}");
    Ok(StatusCode::OK)
}

async fn categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<Vec<String>>> {
    Ok(Json(questions::list_categories(&pool).await?))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(all_questions).post(create_question))
        .route("/questions/category/{category}", get(questions_by_category))
        .route("/questions/random", get(random_questions))
        .route(
            "/questions/{id}",
            get(question).put(update_question).delete(delete_question),
        )
        .route("/categories", get(categories))
        .with_state(state)
}
