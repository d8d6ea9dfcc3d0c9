//! Entity-level operations over an injected row store.
//!
//! Reads degrade to empty results when the store fails (the failure is
//! logged); writes return a `RepositoryError`.

use std::sync::Arc;

use chrono::Utc;

use crate::database::{RowStore, SelectQuery, StoreError, Table};
use crate::error::RepositoryError;
use crate::models::{Business, BusinessStatus, NewBusiness, NewUser, User};
use crate::query::{BusinessFilter, UserFilter};
use crate::transform;

fn log_store_error(operation: &str, err: &StoreError) {
    match err {
        StoreError::NotFound { .. } => log::warn!("{operation}: {err}"),
        _ => log::error!("{operation}: {err}"),
    }
}

#[derive(Clone)]
pub struct BusinessRepository {
    store: Arc<dyn RowStore>,
}

impl BusinessRepository {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &BusinessFilter) -> Vec<Business> {
        match self.store.select(Table::Businesses, &filter.to_select()).await {
            Ok(rows) => rows.iter().map(transform::business_from_row).collect(),
            Err(err) => {
                log_store_error("list businesses", &err);
                Vec::new()
            }
        }
    }

    /// `None` both when no row matches and when the store is unreachable
    pub async fn get(&self, id: &str) -> Option<Business> {
        match self
            .store
            .select(Table::Businesses, &SelectQuery::by_id(id))
            .await
        {
            Ok(rows) => rows.first().map(transform::business_from_row),
            Err(err) => {
                log_store_error("get business", &err);
                None
            }
        }
    }

    pub async fn add(&self, new_business: NewBusiness) -> Result<Business, RepositoryError> {
        let row = transform::new_business_row(&new_business);
        match self.store.insert(Table::Businesses, row).await {
            Ok(created) => {
                let business = transform::business_from_row(&created);
                log::info!("Created business {} ({})", business.id, business.name);
                Ok(business)
            }
            Err(err) => {
                log_store_error("add business", &err);
                Err(RepositoryError::from_store("add business", err))
            }
        }
    }

    /// Overwrites every mutable column of the listing with `business.id`
    pub async fn update(&self, business: &Business) -> Result<Business, RepositoryError> {
        let row = transform::business_update_row(business, Utc::now());
        match self
            .store
            .update(Table::Businesses, &business.id, row)
            .await
        {
            Ok(updated) => Ok(transform::business_from_row(&updated)),
            Err(err) => {
                log_store_error("update business", &err);
                Err(RepositoryError::from_store("update business", err))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(Table::Businesses, id).await {
            Ok(()) => {
                log::info!("Deleted business {id}");
                true
            }
            Err(err) => {
                log_store_error("delete business", &err);
                false
            }
        }
    }

    /// Moderation: replaces the status through a full-record update
    pub async fn set_status(
        &self,
        id: &str,
        status: BusinessStatus,
    ) -> Result<Business, RepositoryError> {
        let mut business = self.get(id).await.ok_or(RepositoryError::NotFound {
            operation: "set business status",
        })?;
        business.status = status;
        self.update(&business).await
    }
}

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn RowStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &UserFilter) -> Vec<User> {
        match self.store.select(Table::Profiles, &filter.to_select()).await {
            Ok(rows) => rows.iter().map(transform::user_from_row).collect(),
            Err(err) => {
                log_store_error("list users", &err);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        match self
            .store
            .select(Table::Profiles, &SelectQuery::by_id(id))
            .await
        {
            Ok(rows) => rows.first().map(transform::user_from_row),
            Err(err) => {
                log_store_error("get user", &err);
                None
            }
        }
    }

    pub async fn add(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let row = transform::new_user_row(&new_user);
        match self.store.insert(Table::Profiles, row).await {
            Ok(created) => {
                let user = transform::user_from_row(&created);
                log::info!("Created profile {} ({})", user.id, user.user_type.as_str());
                Ok(user)
            }
            Err(err) => {
                log_store_error("add user", &err);
                Err(RepositoryError::from_store("add user", err))
            }
        }
    }

    pub async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let row = transform::user_update_row(user);
        match self.store.update(Table::Profiles, &user.id, row).await {
            Ok(updated) => Ok(transform::user_from_row(&updated)),
            Err(err) => {
                log_store_error("update user", &err);
                Err(RepositoryError::from_store("update user", err))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(Table::Profiles, id).await {
            Ok(()) => {
                log::info!("Deleted profile {id}");
                true
            }
            Err(err) => {
                log_store_error("delete user", &err);
                false
            }
        }
    }
}
