//! PostgreSQL-backed marketplace ports: service taxonomy and requests.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncConnection;
use pagination::PageParams;
use uuid::Uuid;

use crate::domain::ports::{
    PagedResult, RepositoryError, RequestListFilter, ServiceCatalogRepository,
    ServiceRequestRepository,
};
use crate::domain::services::{
    ServiceCategory, ServiceRequest, ServiceRequestStatus, ServiceSubcategory,
};
use crate::domain::user::{EmailAddress, UserId};

use super::diesel_error_mapping::{map_pool_error, map_query_error};
use super::models::{ServiceCategoryRow, ServiceRequestRow, ServiceSubcategoryRow};
use super::pool::DbPool;
use super::schema::{service_categories, service_requests, service_subcategories};

fn row_to_category(row: ServiceCategoryRow) -> ServiceCategory {
    ServiceCategory {
        id: row.id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
    }
}

fn row_to_subcategory(row: ServiceSubcategoryRow) -> ServiceSubcategory {
    ServiceSubcategory {
        id: row.id,
        category_id: row.category_id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
    }
}

fn request_to_row(request: &ServiceRequest) -> ServiceRequestRow {
    ServiceRequestRow {
        id: request.id,
        subcategory_id: request.subcategory_id,
        user_id: request.user_id.map(|id| *id.as_uuid()),
        contact_name: request.contact_name.clone(),
        contact_email: request.contact_email.as_str().to_owned(),
        project_details: request.project_details.clone(),
        budget: request.budget.clone(),
        timeline: request.timeline.clone(),
        status: request.status.as_str().to_owned(),
        created_at: request.created_at,
    }
}

fn row_to_request(row: ServiceRequestRow) -> Result<ServiceRequest, RepositoryError> {
    let contact_email = EmailAddress::new(row.contact_email)
        .map_err(|err| RepositoryError::query(err.to_string()))?;
    let status = ServiceRequestStatus::parse(&row.status)
        .map_err(|err| RepositoryError::query(err.to_string()))?;
    Ok(ServiceRequest {
        id: row.id,
        subcategory_id: row.subcategory_id,
        user_id: row.user_id.map(UserId::from_uuid),
        contact_name: row.contact_name,
        contact_email,
        project_details: row.project_details,
        budget: row.budget,
        timeline: row.timeline,
        status,
        created_at: row.created_at,
    })
}

/// Diesel-backed implementation of the service catalogue port.
#[derive(Clone)]
pub struct DieselServiceCatalogRepository {
    pool: DbPool,
}

impl DieselServiceCatalogRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceCatalogRepository for DieselServiceCatalogRepository {
    async fn categories(&self) -> Result<Vec<ServiceCategory>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ServiceCategoryRow> = service_categories::table
            .order(service_categories::name.asc())
            .select(ServiceCategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_category).collect())
    }

    async fn subcategories(
        &self,
        category: Option<Uuid>,
    ) -> Result<Vec<ServiceSubcategory>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = service_subcategories::table.into_boxed();
        if let Some(category) = category {
            query = query.filter(service_subcategories::category_id.eq(category));
        }
        let rows: Vec<ServiceSubcategoryRow> = query
            .order(service_subcategories::name.asc())
            .select(ServiceSubcategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_subcategory).collect())
    }

    async fn find_subcategory(
        &self,
        id: Uuid,
    ) -> Result<Option<ServiceSubcategory>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = service_subcategories::table
            .filter(service_subcategories::id.eq(id))
            .select(ServiceSubcategoryRow::as_select())
            .first::<ServiceSubcategoryRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(row.map(row_to_subcategory))
    }

    async fn insert_category(&self, category: &ServiceCategory) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ServiceCategoryRow {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            created_at: category.created_at,
        };
        diesel::insert_into(service_categories::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn update_category(&self, category: &ServiceCategory) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ServiceCategoryRow {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            created_at: category.created_at,
        };
        let touched = diesel::update(
            service_categories::table.filter(service_categories::id.eq(category.id)),
        )
        .set(row)
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, diesel::result::Error, _>(|conn| {
            async move {
                let removed = diesel::delete(
                    service_categories::table.filter(service_categories::id.eq(id)),
                )
                .execute(conn)
                .await?;
                if removed == 0 {
                    return Ok(false);
                }
                diesel::delete(
                    service_subcategories::table
                        .filter(service_subcategories::category_id.eq(id)),
                )
                .execute(conn)
                .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_query_error)
    }

    async fn insert_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ServiceSubcategoryRow {
            id: subcategory.id,
            category_id: subcategory.category_id,
            name: subcategory.name.clone(),
            description: subcategory.description.clone(),
            created_at: subcategory.created_at,
        };
        diesel::insert_into(service_subcategories::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn update_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ServiceSubcategoryRow {
            id: subcategory.id,
            category_id: subcategory.category_id,
            name: subcategory.name.clone(),
            description: subcategory.description.clone(),
            created_at: subcategory.created_at,
        };
        let touched = diesel::update(
            service_subcategories::table.filter(service_subcategories::id.eq(subcategory.id)),
        )
        .set(row)
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete_subcategory(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            service_subcategories::table.filter(service_subcategories::id.eq(id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the service request port.
#[derive(Clone)]
pub struct DieselServiceRequestRepository {
    pool: DbPool,
}

impl DieselServiceRequestRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRequestRepository for DieselServiceRequestRepository {
    async fn insert(&self, request: &ServiceRequest) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(service_requests::table)
            .values(request_to_row(request))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ServiceRequest>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = service_requests::table
            .filter(service_requests::id.eq(id))
            .select(ServiceRequestRow::as_select())
            .first::<ServiceRequestRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_request).transpose()
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ServiceRequestRow> = service_requests::table
            .filter(service_requests::user_id.eq(user.as_uuid()))
            .order(service_requests::created_at.desc())
            .select(ServiceRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter().map(row_to_request).collect()
    }

    async fn list(
        &self,
        filter: &RequestListFilter,
        params: PageParams,
    ) -> PagedResult<ServiceRequest> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |filter: &RequestListFilter| {
            let mut query = service_requests::table.into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(service_requests::status.eq(status.as_str()));
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{search}%");
                query = query.filter(
                    service_requests::contact_name
                        .ilike(pattern.clone())
                        .or(service_requests::contact_email.ilike(pattern)),
                );
            }
            query
        };

        let total: i64 = apply_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<ServiceRequestRow> = apply_filter(filter)
            .order(service_requests::created_at.desc())
            .offset(i64::try_from(params.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(params.limit()))
            .select(ServiceRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        let requests = rows
            .into_iter()
            .map(row_to_request)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((requests, u64::try_from(total).unwrap_or(0)))
    }

    async fn update(&self, request: &ServiceRequest) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(
            service_requests::table.filter(service_requests::id.eq(request.id)),
        )
        .set(request_to_row(request))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(service_requests::table.filter(service_requests::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}
