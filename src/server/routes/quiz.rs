use std::collections::HashSet;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, Question},
    server::{
        app::AppState,
        error::{ApiError, ApiResponse},
    },
    telemetry::{QUESTIONS_SERVED_CNTR, QUIZ_ANSWERS_CNTR},
};

use super::questions::RandomQuery;

/// A question as shown to a quiz taker, without its answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question_title: String,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
}

impl From<Question> for QuizQuestion {
    fn from(q: Question) -> Self {
        QuizQuestion {
            id: q.id,
            question_title: q.question_title,
            option1: q.option1,
            option2: q.option2,
            option3: q.option3,
            option4: q.option4,
        }
    }
}

#[derive(Deserialize, Serialize)]
pub struct QuizResponse {
    pub id: i64,
    pub response: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct QuizScore {
    pub total: usize,
    pub correct: usize,
}

async fn quiz(
    State(pool): State<SqlitePool>,
    query: Result<Query<RandomQuery>, QueryRejection>,
) -> ApiResponse<Json<Vec<QuizQuestion>>> {
    let Query(RandomQuery { category, num }) = query?;
    let questions = questions::find_random_questions_by_category(&pool, &category, num).await?;
    QUESTIONS_SERVED_CNTR
        .with_label_values(&["quiz"])
        .inc_by(questions.len() as f64);
    Ok(Json(questions.into_iter().map(QuizQuestion::from).collect()))
}

async fn score(
    State(pool): State<SqlitePool>,
    Json(responses): Json<Vec<QuizResponse>>,
) -> ApiResponse<Json<QuizScore>> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = responses.iter().find(|r| !seen.insert(r.id)) {
        return Err(ApiError::InvalidParameter(format!(
            "question {} is answered more than once",
            duplicate.id
        )));
    }

    let mut correct = 0;
    for response in &responses {
        let question = match questions::get_question_by_id(&pool, response.id).await {
            Ok(question) => question,
            Err(sqlx::Error::RowNotFound) => {
                tracing::warn!("Answer for unknown question {}", response.id);
                continue;
            }
            Err(error) => return Err(error.into()),
        };
        let result = if question.right_answer == response.response {
            correct += 1;
            "correct"
        } else {
            "wrong"
        };
        QUIZ_ANSWERS_CNTR
            .with_label_values(&[question.category.as_str(), result])
            .inc();
    }
    Ok(Json(QuizScore {
        total: responses.len(),
        correct,
    }))
}

pub fn quiz_router(state: AppState) -> Router {
    Router::new()
        .route("/quiz", get(quiz))
        .route("/quiz/score", post(score))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::queries::questions::{create_question, new_question};
    use crate::db::test_pool;
    use crate::server::app::router;

    use super::*;

    #[tokio::test]
    async fn quiz_hides_answers() {
        let pool = test_pool().await;
        for n in 0..4 {
            create_question(&pool, &new_question(&format!("q{n}"), "math")).await.unwrap();
        }
        let app = router(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/quiz?category=math&num=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let items = raw.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|q| q.get("right_answer").is_none()));
    }

    #[tokio::test]
    async fn score_counts_correct_answers() {
        let pool = test_pool().await;
        let first = create_question(&pool, &new_question("1+1", "math")).await.unwrap();
        let second = create_question(&pool, &new_question("2+2", "math")).await.unwrap();
        let app = router(pool);

        let responses = vec![
            QuizResponse { id: first, response: "a".to_owned() },
            QuizResponse { id: second, response: "b".to_owned() },
            QuizResponse { id: 999, response: "a".to_owned() },
        ];
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz/score")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&responses).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let score: QuizScore = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(score, QuizScore { total: 3, correct: 1 });
    }

    #[tokio::test]
    async fn score_rejects_repeated_answers() {
        let pool = test_pool().await;
        let id = create_question(&pool, &new_question("1+1", "math")).await.unwrap();
        let app = router(pool);

        let responses: Vec<QuizResponse> = (0..5)
            .map(|_| QuizResponse { id, response: "a".to_owned() })
            .collect();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz/score")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&responses).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quiz_without_count_is_json_bad_request() {
        let app = router(test_pool().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/quiz?category=math")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(raw["message"].as_str().unwrap().contains("num"));
    }
}
