//! Credit request form: validation, installment estimate and submission of
//! the completed request to a document store, behind a terminal UI.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod installment;
pub mod request;
pub mod store;
pub mod submission;
pub mod ui;
pub mod validation;

pub use context::AppContext;
pub use error::{FormError, InstallmentError, StoreError};
pub use form::{Banner, CreditForm, Stage, SubmissionOutcome};
pub use request::{CreditRequest, CreditType, Field, FormInputs, StoredRequest};
pub use store::{FirestoreStore, InMemoryRequestStore, RequestStore};
