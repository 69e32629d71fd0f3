use std::time::Duration;

use crate::models::{
    record_filter::escape_like, Record, RecordFilter, RecordWithUser, Role, User,
    UserRecordCount,
};
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Result};

const RECORD_LISTING: &str = r#"
    SELECT r.id, r.date, r.task, r.user_id, u.name
    FROM record r
    JOIN app_user u ON u.id = r.user_id
"#;

const RECORD_COUNTS: &str = r#"
    SELECT u.id AS user_id, u.name, COUNT(r.id) AS count
    FROM record r
    JOIN app_user u ON u.id = r.user_id
"#;

/// Connects to a PostgreSQL database with the given `db_url`, returning a connection pool for accessing it
pub async fn connect_sqlx(db_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .idle_timeout(Duration::from_secs(30))
        .max_connections(32)
        .min_connections(4)
        .connect(db_url)
        .await
}

/// Appends a `WHERE` clause narrowing the join of `record r` and `app_user u` to `filter`
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    builder.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        builder.push(" AND r.user_id = ").push_bind(user_id);
    }
    if let Some(date) = filter.date {
        builder.push(" AND r.date = ").push_bind(date);
    }
    if let Some(month) = filter.month {
        builder
            .push(" AND r.date >= ")
            .push_bind(month.start())
            .push(" AND r.date < ")
            .push_bind(month.end());
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND r.task ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)))
            .push(" ESCAPE '\\'");
    }
}

fn record_listing_query(filter: &RecordFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(RECORD_LISTING);
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY r.date DESC, r.id DESC");
    builder
}

fn record_counts_query(filter: &RecordFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(RECORD_COUNTS);
    push_filter(&mut builder, filter);
    builder.push(" GROUP BY u.id, u.name ORDER BY count DESC, u.name ASC");
    builder
}

/// Whether `err` is a violation of a unique constraint (SQLSTATE 23505)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Whether `err` is a violation of a foreign key constraint (SQLSTATE 23503)
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

pub struct PostgreDatabase {
    sqlx_db: PgPool,
}

impl PostgreDatabase {
    pub fn new(sqlx_db: PgPool) -> Self {
        PostgreDatabase { sqlx_db }
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.sqlx_db).await
    }

    /// Create a new user. `email` is expected to be lowercased already.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO app_user (name, email, hashed_password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, hashed_password, role, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(role.as_str())
        .fetch_one(&self.sqlx_db)
        .await
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: i32) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, hashed_password, role, created_at
            FROM app_user
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.sqlx_db)
        .await
    }

    /// Get a user by email, ignoring case and surrounding whitespace
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, hashed_password, role, created_at
            FROM app_user
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.sqlx_db)
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, hashed_password, role, created_at
            FROM app_user
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&self.sqlx_db)
        .await
    }

    /// Deletes the user with `user_id`, returning whether a row was removed.
    /// Their records go with them through `ON DELETE CASCADE`.
    pub async fn delete_user(&self, user_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(user_id)
            .execute(&self.sqlx_db)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn create_record(&self, date: NaiveDate, task: &str, user_id: i32) -> Result<Record> {
        sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO record (date, task, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, date, task, user_id, created_at
            "#,
        )
        .bind(date)
        .bind(task)
        .bind(user_id)
        .fetch_one(&self.sqlx_db)
        .await
    }

    /// Records matching `filter` with their owner's name, newest date first
    pub async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<RecordWithUser>> {
        let mut query = record_listing_query(filter);
        query
            .build_query_as::<RecordWithUser>()
            .fetch_all(&self.sqlx_db)
            .await
    }

    /// Per-user record counts for `filter`, busiest user first
    pub async fn count_records_by_user(&self, filter: &RecordFilter) -> Result<Vec<UserRecordCount>> {
        let mut query = record_counts_query(filter);
        query
            .build_query_as::<UserRecordCount>()
            .fetch_all(&self.sqlx_db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Month;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn unfiltered_listing_joins_and_sorts() {
        let builder = record_listing_query(&RecordFilter::default());
        assert_eq!(
            squash(builder.sql()),
            "SELECT r.id, r.date, r.task, r.user_id, u.name FROM record r \
             JOIN app_user u ON u.id = r.user_id WHERE TRUE \
             ORDER BY r.date DESC, r.id DESC"
        );
    }

    #[test]
    fn every_criterion_binds_a_parameter() {
        let filter = RecordFilter {
            user_id: Some(3),
            date: NaiveDate::from_ymd_opt(2024, 5, 14),
            month: Some("2024-05".parse::<Month>().unwrap()),
            search: Some("report".to_string()),
        };
        let builder = record_listing_query(&filter);
        let sql = squash(builder.sql());
        assert!(sql.contains("AND r.user_id = $1"), "{sql}");
        assert!(sql.contains("AND r.date = $2"), "{sql}");
        assert!(sql.contains("AND r.date >= $3 AND r.date < $4"), "{sql}");
        assert!(sql.contains("AND r.task ILIKE $5 ESCAPE '\\'"), "{sql}");
    }

    #[test]
    fn month_filter_is_half_open() {
        let filter = RecordFilter::default().with_month("2024-05".parse().ok());
        let sql = squash(record_listing_query(&filter).sql());
        assert!(sql.contains("r.date >= $1 AND r.date < $2"), "{sql}");
        assert!(!sql.contains("<="), "{sql}");
    }

    #[test]
    fn counts_group_by_user() {
        let sql = squash(record_counts_query(&RecordFilter::for_user(1)).sql());
        assert!(sql.starts_with("SELECT u.id AS user_id, u.name, COUNT(r.id) AS count"), "{sql}");
        assert!(sql.ends_with("GROUP BY u.id, u.name ORDER BY count DESC, u.name ASC"), "{sql}");
    }

    async fn seed(db: &PostgreDatabase) -> sqlx::Result<(User, User)> {
        let ada = db.create_user("Ada", "ada@example.com", "x", Role::User).await?;
        let bob = db.create_user("Bob", "bob@example.com", "x", Role::Admin).await?;
        for (day, task, owner) in [
            ((2024, 4, 30), "April wrap-up", ada.id),
            ((2024, 5, 1), "Sprint planning", ada.id),
            ((2024, 5, 31), "Write 100% coverage report", ada.id),
            ((2024, 6, 1), "June kickoff", bob.id),
            ((2024, 5, 15), "Review budget", bob.id),
        ] {
            let (y, m, d) = day;
            db.create_record(NaiveDate::from_ymd_opt(y, m, d).unwrap(), task, owner)
                .await?;
        }
        Ok((ada, bob))
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn month_filter_keeps_only_that_month(pool: PgPool) -> sqlx::Result<()> {
        let db = PostgreDatabase::new(pool);
        seed(&db).await?;

        let filter = RecordFilter::default().with_month("2024-05".parse().ok());
        let records = db.list_records(&filter).await?;
        let month: Month = "2024-05".parse().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| month.contains(r.date)));
        assert!(records.windows(2).all(|w| w[0].date >= w[1].date));

        let counts = db.count_records_by_user(&filter).await?;
        assert_eq!(counts[0].name, "Ada");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn search_matches_wildcards_literally(pool: PgPool) -> sqlx::Result<()> {
        let db = PostgreDatabase::new(pool);
        seed(&db).await?;

        let filter = RecordFilter::default().with_search(Some("100%".to_string()));
        let records = db.list_records(&filter).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ada");

        let filter = RecordFilter::default().with_search(Some("%".to_string()));
        assert_eq!(db.list_records(&filter).await?.len(), 1);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn deleting_a_user_removes_only_that_user(pool: PgPool) -> sqlx::Result<()> {
        let db = PostgreDatabase::new(pool);
        let (ada, bob) = seed(&db).await?;

        assert!(db.delete_user(ada.id).await?);
        assert!(!db.delete_user(ada.id).await?);

        let users = db.list_users().await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, bob.id);
        let records = db.list_records(&RecordFilter::default()).await?;
        assert!(records.iter().all(|r| r.user_id == bob.id));
        assert_eq!(records.len(), 2);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn constraint_violations_are_recognised(pool: PgPool) -> sqlx::Result<()> {
        let db = PostgreDatabase::new(pool);
        let (ada, _) = seed(&db).await?;

        let duplicate = db
            .create_user("Ada again", "ada@example.com", "x", Role::User)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&duplicate));
        assert!(!is_foreign_key_violation(&duplicate));

        db.delete_user(ada.id).await?;
        let orphan = db
            .create_record(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), "Ghost", ada.id)
            .await
            .unwrap_err();
        assert!(is_foreign_key_violation(&orphan));
        assert!(!is_unique_violation(&orphan));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn email_lookup_ignores_case(pool: PgPool) -> sqlx::Result<()> {
        let db = PostgreDatabase::new(pool);
        seed(&db).await?;
        let user = db.get_user_by_email("  ADA@Example.com ").await?;
        assert_eq!(user.map(|u| u.name).as_deref(), Some("Ada"));
        assert!(db.get_user_by_email("nobody@example.com").await?.is_none());
        Ok(())
    }
}
