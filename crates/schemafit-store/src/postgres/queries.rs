use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use schemafit_core::{BenchmarkRun, EnvBenchmarkRun, Error, PredictionRecord, Result};

fn db_err(err: sqlx::Error) -> Error {
    Error::Storage(err.to_string())
}

const CREATE_PIPELINE_RESULTS: &str = r#"
create table if not exists pipeline_results (
    id bigserial primary key,
    job_id text not null,
    table_name text not null,
    pipeline_name text not null,
    env_id text not null,
    original_column text not null,
    fitted_column text,
    fitted_schema text,
    explanation text,
    timestamp timestamptz not null default now()
)
"#;

const CREATE_BENCHMARK_RESULTS: &str = r#"
create table if not exists benchmark_results (
    id bigserial primary key,
    run_id text not null,
    pipeline_name text not null,
    accuracy double precision not null,
    schema_accuracy double precision not null,
    total_tests bigint not null,
    timestamp timestamptz not null default now()
)
"#;

const CREATE_ENV_BENCHMARK_RESULTS: &str = r#"
create table if not exists env_benchmark_results (
    id bigserial primary key,
    run_id text not null,
    pipeline_name text not null,
    env_id text not null,
    accuracy double precision not null,
    schema_accuracy double precision not null,
    total_tests bigint not null,
    timestamp timestamptz not null default now()
)
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for ddl in [
        CREATE_PIPELINE_RESULTS,
        CREATE_BENCHMARK_RESULTS,
        CREATE_ENV_BENCHMARK_RESULTS,
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(db_err)?;
    }
    Ok(())
}

pub async fn insert_prediction(pool: &PgPool, record: &PredictionRecord) -> Result<()> {
    sqlx::query(
        r#"
        insert into pipeline_results
          (job_id, table_name, pipeline_name, env_id, original_column,
           fitted_column, fitted_schema, explanation)
        values ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&record.job_id)
    .bind(&record.table_name)
    .bind(&record.pipeline_name)
    .bind(&record.env_id)
    .bind(&record.original_column)
    .bind(&record.fitted_column)
    .bind(&record.fitted_schema)
    .bind(&record.explanation)
    .execute(pool)
    .await
    .map_err(db_err)?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct PredictionRow {
    job_id: String,
    table_name: String,
    pipeline_name: String,
    env_id: String,
    original_column: String,
    fitted_column: Option<String>,
    fitted_schema: Option<String>,
    explanation: Option<String>,
    timestamp: DateTime<Utc>,
}

pub async fn predictions_for_pipeline(
    pool: &PgPool,
    pipeline_name: &str,
) -> Result<Vec<PredictionRecord>> {
    let rows = sqlx::query_as::<_, PredictionRow>(
        r#"
        select job_id, table_name, pipeline_name, env_id, original_column,
               fitted_column, fitted_schema, explanation, timestamp
        from pipeline_results
        where pipeline_name = $1
        order by job_id, timestamp
        "#,
    )
    .bind(pipeline_name)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(|row| PredictionRecord {
            job_id: row.job_id,
            table_name: row.table_name,
            pipeline_name: row.pipeline_name,
            env_id: row.env_id,
            original_column: row.original_column,
            fitted_column: row.fitted_column,
            fitted_schema: row.fitted_schema,
            explanation: row.explanation,
            timestamp: Some(row.timestamp),
        })
        .collect())
}

pub async fn distinct_pipeline_names(pool: &PgPool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "select distinct pipeline_name from pipeline_results order by pipeline_name",
    )
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    Ok(names)
}

pub async fn insert_benchmark_run(pool: &PgPool, run: &BenchmarkRun) -> Result<()> {
    sqlx::query(
        r#"
        insert into benchmark_results
          (run_id, pipeline_name, accuracy, schema_accuracy, total_tests)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&run.run_id)
    .bind(&run.pipeline_name)
    .bind(run.accuracy)
    .bind(run.schema_accuracy)
    .bind(run.total_tests)
    .execute(pool)
    .await
    .map_err(db_err)?;

    Ok(())
}

pub async fn insert_env_benchmark_run(pool: &PgPool, run: &EnvBenchmarkRun) -> Result<()> {
    sqlx::query(
        r#"
        insert into env_benchmark_results
          (run_id, pipeline_name, env_id, accuracy, schema_accuracy, total_tests)
        values ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&run.run_id)
    .bind(&run.pipeline_name)
    .bind(&run.env_id)
    .bind(run.accuracy)
    .bind(run.schema_accuracy)
    .bind(run.total_tests)
    .execute(pool)
    .await
    .map_err(db_err)?;

    Ok(())
}

/// A persisted per-environment benchmark row, as read back from storage.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnvBenchmarkRow {
    pub run_id: String,
    pub pipeline_name: String,
    pub env_id: String,
    pub accuracy: f64,
    pub schema_accuracy: f64,
    pub total_tests: i64,
    pub timestamp: DateTime<Utc>,
}

pub async fn env_benchmark_history(
    pool: &PgPool,
    pipeline_name: &str,
    env_id: Option<&str>,
) -> Result<Vec<EnvBenchmarkRow>> {
    let rows = match env_id {
        Some(env_id) => {
            sqlx::query_as::<_, EnvBenchmarkRow>(
                r#"
                select run_id, pipeline_name, env_id, accuracy, schema_accuracy,
                       total_tests, timestamp
                from env_benchmark_results
                where pipeline_name = $1 and env_id = $2
                order by timestamp desc
                "#,
            )
            .bind(pipeline_name)
            .bind(env_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, EnvBenchmarkRow>(
                r#"
                select run_id, pipeline_name, env_id, accuracy, schema_accuracy,
                       total_tests, timestamp
                from env_benchmark_results
                where pipeline_name = $1
                order by timestamp desc
                "#,
            )
            .bind(pipeline_name)
            .fetch_all(pool)
            .await
        }
    }
    .map_err(db_err)?;

    Ok(rows)
}
