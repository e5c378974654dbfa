//! PostgreSQL-backed account ports: users, tokens, connections.
//!
//! Rows load through validated domain constructors; a row that fails
//! validation surfaces as a query error rather than a malformed aggregate.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageParams;
use uuid::Uuid;

use crate::domain::ports::{
    AdminUserUpdate, ConnectionRepository, PagedResult, RepositoryError, TokenRepository,
    UserListFilter, UserRepository,
};
use crate::domain::token::{TokenFingerprint, TokenRecord};
use crate::domain::user::{
    AccountType, DisplayName, EmailAddress, PasswordHash, ProfileUpdate, User, UserId, UserSummary,
};

use super::diesel_error_mapping::{map_insert_error, map_pool_error, map_query_error};
use super::models::{AuthTokenRow, ConnectionRow, UserChangeset, UserRow};
use super::pool::DbPool;
use super::schema::{auth_tokens, connections, users};

fn row_to_user(row: UserRow) -> Result<User, RepositoryError> {
    let UserRow {
        id,
        email,
        password_hash,
        display_name,
        account_type,
        headline,
        bio,
        avatar_path,
        is_active,
        is_verified,
        created_at,
    } = row;

    let email = EmailAddress::new(email).map_err(|err| RepositoryError::query(err.to_string()))?;
    let password_hash =
        PasswordHash::new(password_hash).map_err(|err| RepositoryError::query(err.to_string()))?;
    let display_name =
        DisplayName::new(display_name).map_err(|err| RepositoryError::query(err.to_string()))?;
    let account_type = AccountType::parse(&account_type)
        .map_err(|err| RepositoryError::query(err.to_string()))?;

    Ok(User {
        id: UserId::from_uuid(id),
        email,
        password_hash,
        display_name,
        account_type,
        headline,
        bio,
        avatar_path,
        is_active,
        is_verified,
        created_at,
    })
}

fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: *user.id.as_uuid(),
        email: user.email.as_str().to_owned(),
        password_hash: user.password_hash.as_str().to_owned(),
        display_name: user.display_name.as_str().to_owned(),
        account_type: user.account_type.as_str().to_owned(),
        headline: user.headline.clone(),
        bio: user.bio.clone(),
        avatar_path: user.avatar_path.clone(),
        is_active: user.is_active,
        is_verified: user.is_verified,
        created_at: user.created_at,
    }
}

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(user_to_row(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, "email"))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.load_user(*id.as_uuid()).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_user).transpose()
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let changeset = UserChangeset {
            display_name: update
                .display_name
                .as_ref()
                .map(|name| name.as_str().to_owned()),
            headline: update.headline.clone(),
            bio: update.bio.clone(),
            ..UserChangeset::default()
        };
        self.apply_changeset(id, changeset).await
    }

    async fn set_avatar_path(
        &self,
        id: UserId,
        path: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let changeset = UserChangeset {
            avatar_path: Some(path.to_owned()),
            ..UserChangeset::default()
        };
        self.apply_changeset(id, changeset).await
    }

    async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter()
            .map(|row| row_to_user(row).map(|user| user.summary()))
            .collect()
    }

    async fn list(&self, filter: &UserListFilter, params: PageParams) -> PagedResult<User> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |filter: &UserListFilter| {
            let mut query = users::table.into_boxed();
            if let Some(account_type) = filter.account_type {
                query = query.filter(users::account_type.eq(account_type.as_str().to_owned()));
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{search}%");
                query = query.filter(
                    users::display_name
                        .ilike(pattern.clone())
                        .or(users::email.ilike(pattern)),
                );
            }
            query
        };

        let total: i64 = apply_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;

        let rows: Vec<UserRow> = apply_filter(filter)
            .order(users::created_at.desc())
            .offset(i64::try_from(params.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(params.limit()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        let users = rows
            .into_iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, u64::try_from(total).unwrap_or(0)))
    }

    async fn admin_update(
        &self,
        id: UserId,
        update: &AdminUserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let changeset = UserChangeset {
            display_name: update
                .display_name
                .as_ref()
                .map(|name| name.as_str().to_owned()),
            account_type: update
                .account_type
                .map(|account_type| account_type.as_str().to_owned()),
            is_active: update.is_active,
            is_verified: update.is_verified,
            ..UserChangeset::default()
        };
        self.apply_changeset(id, changeset).await
    }

    async fn deactivate(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::is_active.eq(false))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }
}

impl DieselUserRepository {
    async fn apply_changeset(
        &self,
        id: UserId,
        changeset: UserChangeset,
    ) -> Result<Option<User>, RepositoryError> {
        {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let touched = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
                .set(changeset)
                .execute(&mut conn)
                .await
                .map_err(map_query_error)?;
            if touched == 0 {
                return Ok(None);
            }
        }
        self.load_user(*id.as_uuid()).await
    }
}

/// Diesel-backed implementation of the token repository port.
#[derive(Clone)]
pub struct DieselTokenRepository {
    pool: DbPool,
}

impl DieselTokenRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for DieselTokenRepository {
    async fn insert(&self, record: &TokenRecord) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = AuthTokenRow {
            fingerprint: record.fingerprint.as_str().to_owned(),
            user_id: *record.user_id.as_uuid(),
            expires_at: record.expires_at,
            issued_at: record.issued_at,
        };
        diesel::insert_into(auth_tokens::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, "token"))
    }

    async fn find(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<TokenRecord>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = auth_tokens::table
            .filter(auth_tokens::fingerprint.eq(fingerprint.as_str()))
            .select(AuthTokenRow::as_select())
            .first::<AuthTokenRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(row.map(|row| TokenRecord {
            fingerprint: TokenFingerprint::from_stored(row.fingerprint),
            user_id: UserId::from_uuid(row.user_id),
            expires_at: row.expires_at,
            issued_at: row.issued_at,
        }))
    }

    async fn delete(&self, fingerprint: &TokenFingerprint) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            auth_tokens::table.filter(auth_tokens::fingerprint.eq(fingerprint.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the connection repository port.
///
/// Edges are written in both directions so that `connections_of` is a single
/// indexed scan.
#[derive(Clone)]
pub struct DieselConnectionRepository {
    pool: DbPool,
}

impl DieselConnectionRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for DieselConnectionRepository {
    async fn connections_of(&self, user: UserId) -> Result<Vec<UserId>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let peers: Vec<Uuid> = connections::table
            .filter(connections::user_id.eq(user.as_uuid()))
            .select(connections::peer_id)
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(peers.into_iter().map(UserId::from_uuid).collect())
    }

    async fn connect(&self, user: UserId, peer: UserId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = Utc::now();
        let rows = vec![
            ConnectionRow {
                user_id: *user.as_uuid(),
                peer_id: *peer.as_uuid(),
                created_at: now,
            },
            ConnectionRow {
                user_id: *peer.as_uuid(),
                peer_id: *user.as_uuid(),
                created_at: now,
            },
        ];
        diesel::insert_into(connections::table)
            .values(rows)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, "connection"))
    }

    async fn disconnect(&self, user: UserId, peer: UserId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            connections::table.filter(
                connections::user_id
                    .eq(user.as_uuid())
                    .and(connections::peer_id.eq(peer.as_uuid()))
                    .or(connections::user_id
                        .eq(peer.as_uuid())
                        .and(connections::peer_id.eq(user.as_uuid()))),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion edge cases; query paths are covered by integration
    //! tests against a live database.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            display_name: "Ada Lovelace".into(),
            account_type: "student".into(),
            headline: None,
            bio: None,
            avatar_path: None,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_rows_convert(valid_row: UserRow) {
        let user = row_to_user(valid_row).expect("valid row converts");
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.account_type, AccountType::Student);
    }

    #[rstest]
    fn unknown_account_types_fail_conversion(mut valid_row: UserRow) {
        valid_row.account_type = "superuser".into();
        let err = row_to_user(valid_row).expect_err("unknown role must fail");
        assert!(matches!(err, RepositoryError::Query { .. }));
    }

    #[rstest]
    fn user_round_trips_through_its_row(valid_row: UserRow) {
        let user = row_to_user(valid_row).expect("valid row converts");
        let row = user_to_row(&user);
        let again = row_to_user(row).expect("round trip converts");
        assert_eq!(user, again);
    }
}
