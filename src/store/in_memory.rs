//! In-memory request store for development and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::RequestStore;
use crate::error::StoreError;
use crate::request::{CreditRequest, StoredRequest};

#[derive(Clone, Default)]
pub struct InMemoryRequestStore {
    requests: Arc<RwLock<HashMap<String, CreditRequest>>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn create(&self, request: &CreditRequest) -> Result<String, StoreError> {
        let mut requests = self
            .requests
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        requests.insert(id.clone(), request.clone());
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<StoredRequest>, StoreError> {
        let requests = self
            .requests
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        let mut found: Vec<StoredRequest> = requests
            .iter()
            .filter(|(_, r)| r.email == email)
            .map(|(id, r)| StoredRequest {
                id: id.clone(),
                request: r.clone(),
            })
            .collect();
        found.sort_by_key(|s| s.request.created_at);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CreditType;
    use chrono::{Duration, Utc};

    fn request(email: &str, minutes_ago: i64) -> CreditRequest {
        CreditRequest {
            full_name: "Ana Torres".to_string(),
            national_id: "10203040".to_string(),
            email: email.to_string(),
            phone: "3001234567".to_string(),
            credit_type: CreditType::Education,
            amount: 600_000.0,
            term_months: 6,
            installment: 105315.13,
            purpose: "Tuition".to_string(),
            employer: "Acme".to_string(),
            job_title: "Analyst".to_string(),
            monthly_income: 3_000_000.0,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids() {
        let store = InMemoryRequestStore::new();
        let a = store.create(&request("a@x.co", 0)).await.unwrap();
        let b = store.create(&request("a@x.co", 0)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_email_filters_and_orders() {
        let store = InMemoryRequestStore::new();
        let newer = store.create(&request("a@x.co", 1)).await.unwrap();
        let older = store.create(&request("a@x.co", 10)).await.unwrap();
        store.create(&request("b@x.co", 5)).await.unwrap();

        let found = store.find_by_email("a@x.co").await.unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![older.as_str(), newer.as_str()]);
        assert!(store.find_by_email("c@x.co").await.unwrap().is_empty());
    }
}
