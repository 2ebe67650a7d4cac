use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::DbError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question_title: String,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub right_answer: String,
    pub difficulty_level: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question_title: String,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub right_answer: String,
    pub difficulty_level: Option<String>,
    pub category: String,
}

const QUESTION_COLUMNS: &str = "id, question_title, option1, option2, option3, option4, right_answer, difficulty_level, category";

pub async fn find_by_category(pool: &SqlitePool, category: &str) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM question WHERE question.category = ?1 ORDER BY id"
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Random sample without replacement of up to `num_q` questions of a category.
///
/// Sampling is done by the store (`ORDER BY RANDOM()`), so every call sorts the
/// whole category. Negative counts are rejected before touching the database.
pub async fn find_random_questions_by_category(
    pool: &SqlitePool,
    category: &str,
    num_q: i64,
) -> Result<Vec<Question>, DbError> {
    if num_q < 0 {
        return Err(DbError::InvalidParameter(format!(
            "number of questions must not be negative, got {num_q}"
        )));
    }
    if num_q == 0 {
        return Ok(vec![]);
    }
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM question WHERE question.category = ?1 ORDER BY RANDOM() LIMIT ?2"
    ))
    .bind(category)
    .bind(num_q)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM question WHERE question.id = ?1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM question ORDER BY id"))
        .fetch_all(pool)
        .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM question")
        .fetch_one(pool)
        .await
}

pub async fn list_categories(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar("SELECT DISTINCT category FROM question ORDER BY category")
        .fetch_all(pool)
        .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
INSERT INTO question (question_title, option1, option2, option3, option4, right_answer, difficulty_level, category)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&question.question_title)
    .bind(&question.option1)
    .bind(&question.option2)
    .bind(&question.option3)
    .bind(&question.option4)
    .bind(&question.right_answer)
    .bind(&question.difficulty_level)
    .bind(&question.category)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_question(
    pool: &SqlitePool,
    id: i64,
    question: &NewQuestion,
) -> sqlx::Result<()> {
    let mut conn = pool.acquire().await?;

    let affected = sqlx::query(
        r#"
        UPDATE question SET question_title=?1, option1=?2, option2=?3, option3=?4, option4=?5,
            right_answer=?6, difficulty_level=?7, category=?8
        WHERE question.id = ?9
        "#,
    )
    .bind(&question.question_title)
    .bind(&question.option1)
    .bind(&question.option2)
    .bind(&question.option3)
    .bind(&question.option4)
    .bind(&question.right_answer)
    .bind(&question.difficulty_level)
    .bind(&question.category)
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let mut conn = pool.acquire().await?;

    let affected = sqlx::query("DELETE FROM question WHERE question.id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Replaces the stored questions with `questions`, keeping their ids.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    let existing_ids: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM question")
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
    let new_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();

    for id in existing_ids.difference(&new_ids) {
        sqlx::query("DELETE FROM question WHERE question.id = ?1")
            .bind(*id)
            .execute(&mut *tx)
            .await?;
    }
    for question in questions {
        // upsert covers both the update of existing ids and the insert of new ones
        sqlx::query(
            r#"
INSERT INTO question (id, question_title, option1, option2, option3, option4, right_answer, difficulty_level, category)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT (id) DO UPDATE SET
    question_title = excluded.question_title,
    option1 = excluded.option1,
    option2 = excluded.option2,
    option3 = excluded.option3,
    option4 = excluded.option4,
    right_answer = excluded.right_answer,
    difficulty_level = excluded.difficulty_level,
    category = excluded.category
            "#,
        )
        .bind(question.id)
        .bind(question.question_title)
        .bind(question.option1)
        .bind(question.option2)
        .bind(question.option3)
        .bind(question.option4)
        .bind(question.right_answer)
        .bind(question.difficulty_level)
        .bind(question.category)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn new_question(title: &str, category: &str) -> NewQuestion {
    NewQuestion {
        question_title: title.to_owned(),
        option1: Some("a".to_owned()),
        option2: Some("b".to_owned()),
        option3: Some("c".to_owned()),
        option4: Some("d".to_owned()),
        right_answer: "a".to_owned(),
        difficulty_level: Some("Easy".to_owned()),
        category: category.to_owned(),
    }
}
