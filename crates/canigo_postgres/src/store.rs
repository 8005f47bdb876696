//! Postgres implementations of the canigo_core store ports.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) so building never needs a live database.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use canigo_core::error::CanigoError;
use canigo_core::ports::{PassLevelStore, PlaceStore, Result, UserStore};
use canigo_core::types::{PassLevel, Place, Role, User};

/// Unique and foreign-key violations are caller errors; everything else
/// is an opaque store failure.
fn db_error(err: sqlx::Error, conflict: &str) -> CanigoError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CanigoError::conflict(conflict.to_string());
        }
        if db.is_foreign_key_violation() {
            return CanigoError::conflict(format!(
                "referenced record is missing or still in use ({})",
                db.constraint().unwrap_or("foreign key")
            ));
        }
    }
    CanigoError::store(anyhow!(err))
}

fn to_db_int(field: &str, value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| CanigoError::invalid_input(format!("{field} is out of range")))
}

fn from_db_int(field: &str, value: i32) -> std::result::Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("negative {field} in stored row: {value}"))
}

fn corrupt_row(e: String) -> CanigoError {
    CanigoError::store(anyhow!(e))
}

// ── Row types ─────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    age: i32,
    phone_number: String,
    address: Option<String>,
    email: String,
    password_hash: String,
    role: String,
    pass_level_id: Uuid,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(r: UserRow) -> std::result::Result<Self, String> {
        let role: Role = r
            .role
            .parse()
            .map_err(|_| format!("unknown role '{}' for user {}", r.role, r.id))?;
        Ok(User {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            age: from_db_int("age", r.age)?,
            phone_number: r.phone_number,
            address: r.address,
            email: r.email,
            password_hash: r.password_hash,
            role,
            pass_level_id: r.pass_level_id,
            password_changed_at: r.password_changed_at,
            password_reset_token: r.password_reset_token,
            password_reset_expires: r.password_reset_expires,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PassLevelRow {
    id: Uuid,
    level: String,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<PassLevelRow> for PassLevel {
    fn from(r: PassLevelRow) -> Self {
        PassLevel {
            id: r.id,
            level: r.level,
            owner_id: r.owner_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlaceRow {
    id: Uuid,
    address: String,
    phone_number: String,
    age_require: i32,
    pass_level_ids: Vec<Uuid>,
    owner_id: Option<Uuid>,
}

impl TryFrom<PlaceRow> for Place {
    type Error = String;

    fn try_from(r: PlaceRow) -> std::result::Result<Self, String> {
        Ok(Place {
            id: r.id,
            address: r.address,
            phone_number: r.phone_number,
            age_require: from_db_int("age_require", r.age_require)?,
            pass_level_ids: r.pass_level_ids,
            owner_id: r.owner_id,
        })
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, age, phone_number, address, email, \
     password_hash, role, pass_level_id, password_changed_at, \
     password_reset_token, password_reset_expires";

// ── PgUserStore ───────────────────────────────────────────────

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM canigo.users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(|r| r.try_into().map_err(corrupt_row)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM canigo.users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(|r| r.try_into().map_err(corrupt_row)).transpose()
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM canigo.users \
             WHERE password_reset_token = $1 AND password_reset_expires > $2"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(|r| r.try_into().map_err(corrupt_row)).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM canigo.users ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(corrupt_row))
            .collect()
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO canigo.users
                (id, first_name, last_name, age, phone_number, address, email,
                 password_hash, role, pass_level_id, password_changed_at,
                 password_reset_token, password_reset_expires)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(to_db_int("age", user.age)?)
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.pass_level_id)
        .bind(user.password_changed_at)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("email {} is already registered", user.email)))?;
        tracing::debug!(user_id = %user.id, "user inserted");
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE canigo.users SET
                first_name = $2, last_name = $3, age = $4, phone_number = $5,
                address = $6, email = $7, password_hash = $8, role = $9,
                pass_level_id = $10, password_changed_at = $11,
                password_reset_token = $12, password_reset_expires = $13
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(to_db_int("age", user.age)?)
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.pass_level_id)
        .bind(user.password_changed_at)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("email {} is already registered", user.email)))?;
        if done.rows_affected() == 0 {
            return Err(CanigoError::not_found("No user found"));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM canigo.users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(done.rows_affected() > 0)
    }
}

// ── PgPassLevelStore ──────────────────────────────────────────

pub struct PgPassLevelStore {
    pool: PgPool,
}

impl PgPassLevelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PassLevelStore for PgPassLevelStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PassLevel>> {
        let row = sqlx::query_as::<_, PassLevelRow>(
            "SELECT id, level, owner_id, created_at, updated_at \
             FROM canigo.pass_levels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(PassLevel::from))
    }

    async fn list(&self) -> Result<Vec<PassLevel>> {
        let rows = sqlx::query_as::<_, PassLevelRow>(
            "SELECT id, level, owner_id, created_at, updated_at \
             FROM canigo.pass_levels ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(PassLevel::from).collect())
    }

    async fn insert(&self, pass: &PassLevel) -> Result<()> {
        sqlx::query(
            "INSERT INTO canigo.pass_levels (id, level, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(pass.id)
        .bind(&pass.level)
        .bind(pass.owner_id)
        .bind(pass.created_at)
        .bind(pass.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("pass level {} already exists", pass.level)))?;
        Ok(())
    }

    async fn update(&self, pass: &PassLevel) -> Result<()> {
        let done = sqlx::query(
            "UPDATE canigo.pass_levels SET level = $2, owner_id = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(pass.id)
        .bind(&pass.level)
        .bind(pass.owner_id)
        .bind(pass.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("pass level {} already exists", pass.level)))?;
        if done.rows_affected() == 0 {
            return Err(CanigoError::not_found("No pass level found"));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM canigo.pass_levels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "pass level is still in use"))?;
        Ok(done.rows_affected() > 0)
    }
}

// ── PgPlaceStore ──────────────────────────────────────────────

pub struct PgPlaceStore {
    pool: PgPool,
}

impl PgPlaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaceStore for PgPlaceStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Place>> {
        let row = sqlx::query_as::<_, PlaceRow>(
            "SELECT id, address, phone_number, age_require, pass_level_ids, owner_id \
             FROM canigo.places WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        row.map(|r| r.try_into().map_err(corrupt_row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Place>> {
        let rows = sqlx::query_as::<_, PlaceRow>(
            "SELECT id, address, phone_number, age_require, pass_level_ids, owner_id \
             FROM canigo.places ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(corrupt_row))
            .collect()
    }

    async fn insert(&self, place: &Place) -> Result<()> {
        sqlx::query(
            "INSERT INTO canigo.places \
                (id, address, phone_number, age_require, pass_level_ids, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(place.id)
        .bind(&place.address)
        .bind(&place.phone_number)
        .bind(to_db_int("age_require", place.age_require)?)
        .bind(&place.pass_level_ids)
        .bind(place.owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("a place already exists at {}", place.address)))?;
        Ok(())
    }

    async fn update(&self, place: &Place) -> Result<()> {
        let done = sqlx::query(
            "UPDATE canigo.places SET address = $2, phone_number = $3, age_require = $4, \
                pass_level_ids = $5, owner_id = $6 \
             WHERE id = $1",
        )
        .bind(place.id)
        .bind(&place.address)
        .bind(&place.phone_number)
        .bind(to_db_int("age_require", place.age_require)?)
        .bind(&place.pass_level_ids)
        .bind(place.owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, &format!("a place already exists at {}", place.address)))?;
        if done.rows_affected() == 0 {
            return Err(CanigoError::not_found("No place found"));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM canigo.places WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(done.rows_affected() > 0)
    }
}
