//! Parameter binding for PostgreSQL queries.

use crate::models::QueryParam;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::types::Json;

pub(crate) type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Bind one parameter to a query.
pub(crate) fn bind_param<'q>(query: PgQuery<'q>, param: &'q QueryParam) -> PgQuery<'q> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => query.bind(Json(v)),
    }
}

/// Build a query with every parameter bound in order.
pub(crate) fn bind_all<'q>(sql: &'q str, params: &'q [QueryParam]) -> PgQuery<'q> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, param| bind_param(query, param))
}
