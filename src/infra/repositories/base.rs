//! Query helpers shared by every store.

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, Select,
};

use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

/// Fetch one page of `select` together with the total row count.
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    params: &PaginationParams,
) -> AppResult<(Vec<E::Model>, u64)>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    let paginator = select.paginate(db, params.limit());
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(params.page() - 1).await?;
    Ok((models, total))
}

/// Case-insensitive substring match on a column
pub(crate) fn icontains<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

/// Case-insensitive match of `term` against any of `columns`
pub(crate) fn search_any<C: ColumnTrait>(columns: Vec<C>, term: &str) -> Condition {
    columns
        .into_iter()
        .fold(Condition::any(), |cond, column| cond.add(icontains(column, term)))
}

/// Case-insensitive equality, used for uniqueness checks
pub(crate) fn iequals<C: ColumnTrait>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

/// Map a failed `UPDATE ... WHERE id` to not-found.
pub(crate) fn update_error(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated => AppError::NotFound,
        other => AppError::from(other),
    }
}

/// SQL for a bigint sum that is never NULL
pub(crate) fn sum_bigint(column: &str) -> SimpleExpr {
    Expr::cust(format!("COALESCE(SUM({}), 0)::BIGINT", column))
}
