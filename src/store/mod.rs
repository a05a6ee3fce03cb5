//! Persistence of completed credit requests.
//!
//! The form only needs to create a record and, for the "my requests"
//! screen, look records up by applicant email. Durability, indexing and
//! uniqueness are the backend's business.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::request::{CreditRequest, StoredRequest};

pub mod firestore;
pub mod in_memory;

pub use firestore::FirestoreStore;
pub use in_memory::InMemoryRequestStore;

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a request and return the id the backend assigned to it.
    async fn create(&self, request: &CreditRequest) -> Result<String, StoreError>;

    /// All stored requests submitted with the given email.
    async fn find_by_email(&self, email: &str) -> Result<Vec<StoredRequest>, StoreError>;
}
