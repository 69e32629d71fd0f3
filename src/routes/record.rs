use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::{
    database::is_foreign_key_violation,
    models::{
        dto::{
            CreatedRecord, DateQuery, FilterQuery, MonthQuery, MonthlyReport, NewRecord,
            RecordResponse, UserSummary,
        },
        Error, Month, RecordFilter, Scope, TokenClaim,
    },
    AppState,
};

use super::middlewares::{admin_guard, auth_guard};

#[derive(OpenApi)]
#[openapi(paths(
    create_record_handler,
    list_records_handler,
    user_records_handler,
    records_by_date_handler,
    admin_records_by_date_handler,
    filter_records_handler,
    monthly_report_handler
))]
/// Defines the OpenAPI spec for record endpoints
pub struct RecordsApi;

/// Used to group record endpoints together in the OpenAPI documentation
pub const RECORD_API_GROUP: &str = "RECORD";

/// Builds a router for record routes. All of them need a token; admin-only ones also need the admin role.
pub fn record_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/admin-records-by-date", get(admin_records_by_date_handler))
        .route_layer(middleware::from_fn(admin_guard));

    Router::new()
        .route("/records", get(list_records_handler).post(create_record_handler))
        .route("/records/:user_id", get(user_records_handler))
        .route("/records-by-date", get(records_by_date_handler))
        .route("/filter-records", get(filter_records_handler))
        .route("/monthly-report", get(monthly_report_handler))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state, auth_guard))
}

/// Narrows `filter` to what `caller` may see
fn scope(filter: RecordFilter, caller: &TokenClaim) -> Result<RecordFilter, Error> {
    match filter.scoped_to(caller) {
        Scope::Allowed(filter) => Ok(filter),
        Scope::Forbidden => {
            debug!(user_id = caller.id, "denied access to another user's records");
            Err(Error::forbidden())
        }
    }
}

fn parse_month(month: &str) -> Result<Month, Error> {
    month
        .parse()
        .map_err(|_| Error::new(StatusCode::BAD_REQUEST, "Invalid month"))
}

async fn fetch(state: &AppState, filter: &RecordFilter) -> Result<Vec<RecordResponse>, Error> {
    let records = state.db.list_records(filter).await?;
    Ok(records.into_iter().map(RecordResponse::from).collect())
}

/// Stores one record. It belongs to the caller unless an admin names another user.
#[utoipa::path(
    post,
    path = "/records",
    tag = RECORD_API_GROUP,
    request_body = NewRecord,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 201, description = "Record saved", body = CreatedRecord),
        (status = 400, description = "User does not exist"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Only admins may file records for other users"),
    )
)]
pub async fn create_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Json(body): Json<NewRecord>,
) -> Result<(StatusCode, Json<CreatedRecord>), Error> {
    let owner = match body.user_id {
        None => caller.id,
        Some(id) if id == caller.id => id,
        Some(id) if caller.is_admin() => {
            if state.db.get_user_by_id(id).await?.is_none() {
                return Err(Error::new(StatusCode::BAD_REQUEST, "User does not exist"));
            }
            id
        }
        Some(_) => return Err(Error::forbidden()),
    };

    // a token can outlive its user; the foreign key catches that
    let record = state
        .db
        .create_record(body.date, &body.task, owner)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                Error::new(StatusCode::BAD_REQUEST, "User does not exist")
            } else {
                Error::from(err)
            }
        })?;
    info!(record_id = record.id, user_id = owner, "record saved");
    Ok((StatusCode::CREATED, Json(CreatedRecord::from(record))))
}

/// Every record an admin can see, or the caller's own records otherwise
#[utoipa::path(
    get,
    path = "/records",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Records, newest first", body = [RecordResponse]),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
) -> Result<Json<Vec<RecordResponse>>, Error> {
    let filter = scope(RecordFilter::default(), &caller)?;
    Ok(Json(fetch(&state, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/records/{user_id}",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("user_id" = i32, Path, description = "Owner of the records")
    ),
    responses(
        (status = 200, description = "Records of one user, newest first", body = [RecordResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the user nor an admin"),
    )
)]
pub async fn user_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<RecordResponse>>, Error> {
    let filter = scope(RecordFilter::for_user(user_id), &caller)?;
    Ok(Json(fetch(&state, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/records-by-date",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("date" = String, Query, description = "Day to match, YYYY-MM-DD"),
        ("userId" = Option<i32>, Query, description = "Owner of the records; defaults to the caller for non-admins")
    ),
    responses(
        (status = 200, description = "Records on that date", body = [RecordResponse]),
        (status = 400, description = "Malformed query"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the user nor an admin"),
    )
)]
pub async fn records_by_date_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<RecordResponse>>, Error> {
    let filter = RecordFilter {
        user_id: query.user_id,
        ..Default::default()
    }
    .with_date(Some(query.date));
    let filter = scope(filter, &caller)?;
    Ok(Json(fetch(&state, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/admin-records-by-date",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("date" = String, Query, description = "Day to match, YYYY-MM-DD"),
        ("userId" = Option<i32>, Query, description = "Optionally narrow to one user")
    ),
    responses(
        (status = 200, description = "Records of all users on that date", body = [RecordResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn admin_records_by_date_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<RecordResponse>>, Error> {
    let filter = RecordFilter {
        user_id: query.user_id,
        ..Default::default()
    }
    .with_date(Some(query.date));
    Ok(Json(fetch(&state, &filter).await?))
}

#[utoipa::path(
    get,
    path = "/filter-records",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("date" = Option<String>, Query, description = "Exact day, YYYY-MM-DD"),
        ("userId" = Option<i32>, Query, description = "Owner of the records"),
        ("search" = Option<String>, Query, description = "Case-insensitive text contained in the task"),
        ("month" = Option<String>, Query, description = "Month, YYYY-MM")
    ),
    responses(
        (status = 200, description = "Records matching every given criterion", body = [RecordResponse]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the user nor an admin"),
    )
)]
pub async fn filter_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<RecordResponse>>, Error> {
    let month = query.month.as_deref().map(parse_month).transpose()?;
    let filter = RecordFilter {
        user_id: query.user_id,
        ..Default::default()
    }
    .with_date(query.date)
    .with_month(month)
    .with_search(query.search);
    let filter = scope(filter, &caller)?;
    Ok(Json(fetch(&state, &filter).await?))
}

/// Records of one month along with how many each user filed
#[utoipa::path(
    get,
    path = "/monthly-report",
    tag = RECORD_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("month" = String, Query, description = "Month, YYYY-MM"),
        ("userId" = Option<i32>, Query, description = "Owner of the records")
    ),
    responses(
        (status = 200, description = "Monthly report", body = MonthlyReport),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the user nor an admin"),
    )
)]
pub async fn monthly_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyReport>, Error> {
    let month = parse_month(&query.month)?;
    let filter = RecordFilter {
        user_id: query.user_id,
        ..Default::default()
    }
    .with_month(Some(month));
    let filter = scope(filter, &caller)?;

    let records = fetch(&state, &filter).await?;
    let users = state.db.count_records_by_user(&filter).await?;

    Ok(Json(MonthlyReport {
        month: month.to_string(),
        from: month.start(),
        to: month.end(),
        total: records.len(),
        users: users.into_iter().map(UserSummary::from).collect(),
        records,
    }))
}
