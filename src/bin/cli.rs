use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use quiz_app::db::queries::questions::{get_all_questions, import_questions};
use quiz_app::db::{establish_connection, run_migrations, Question};
use quiz_app::telemetry::init_tracing;

const QUESTIONS_FILE: &str = "questions.csv";

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Database path
    db_path: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import questions from a directory with questions.csv
    Import { path: PathBuf },
    /// Export questions to a directory as questions.csv
    Export { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let db_path = cli.db_path.display().to_string();
    let pool = establish_connection(&db_path, 1)
        .await
        .context("Cannot connect to DB")?;
    run_migrations(&pool).await?;
    match cli.command {
        Commands::Export { path } => export_data(&pool, &path).await.context("Cannot export"),
        Commands::Import { path } => import_data(&pool, &path).await.context("Cannot import"),
    }
}

fn write_to(path: &Path, data: Vec<impl Serialize>) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);
    for line in data {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_from<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = std::fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        let record: T = record?;
        out.push(record);
    }
    Ok(out)
}

async fn export_data(pool: &SqlitePool, path: &Path) -> anyhow::Result<()> {
    let questions = get_all_questions(pool).await?;
    if !path.exists() {
        std::fs::create_dir_all(path)?
    }
    tracing::info!("Exporting {} questions", questions.len());
    write_to(&path.join(QUESTIONS_FILE), questions)
}

async fn import_data(pool: &SqlitePool, path: &Path) -> anyhow::Result<()> {
    let questions: Vec<Question> = read_from(&path.join(QUESTIONS_FILE))?;
    tracing::info!("Importing {} questions", questions.len());
    import_questions(pool, questions).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, category: &str) -> Question {
        Question {
            id,
            question_title: format!("Question {id}"),
            option1: Some("yes".to_owned()),
            option2: Some("no".to_owned()),
            option3: None,
            option4: None,
            right_answer: "yes".to_owned(),
            difficulty_level: None,
            category: category.to_owned(),
        }
    }

    #[tokio::test]
    async fn export_then_import_into_fresh_db() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.db");
        let target_path = dir.path().join("target.db");
        let dump = dir.path().join("dump");

        let source = establish_connection(source_path.to_str().unwrap(), 1).await.unwrap();
        run_migrations(&source).await.unwrap();
        import_questions(&source, vec![question(3, "math"), question(7, "history")])
            .await
            .unwrap();
        export_data(&source, &dump).await.unwrap();
        assert!(dump.join(QUESTIONS_FILE).exists());

        let target = establish_connection(target_path.to_str().unwrap(), 1).await.unwrap();
        run_migrations(&target).await.unwrap();
        import_data(&target, &dump).await.unwrap();

        assert_eq!(
            get_all_questions(&target).await.unwrap(),
            vec![question(3, "math"), question(7, "history")]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_from::<Question>(&dir.path().join(QUESTIONS_FILE)).is_err());
    }
}
