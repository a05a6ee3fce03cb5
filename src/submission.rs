//! Handing a confirmed form to the store.
//!
//! [`submit`] drives the whole exchange for callers that can hold the form
//! across the await. The terminal UI cannot, so it uses [`spawn_create`]
//! and feeds the answer back through [`CreditForm::finish_submission`].

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::context::AppContext;
use crate::error::{FormError, StoreError};
use crate::form::{CreditForm, SubmissionOutcome};
use crate::request::CreditRequest;
use crate::store::RequestStore;

/// Confirm the summary, store the record and apply the result to the form.
pub async fn submit(
    form: &mut CreditForm,
    store: &dyn RequestStore,
    context: &AppContext,
) -> Result<SubmissionOutcome, FormError> {
    let record = form.begin_submission(Utc::now())?;
    let result = store.create(&record).await;
    log_result(&record, &result);
    form.finish_submission(result, context)
}

/// Run the create call on the runtime; the receiver yields its result.
pub fn spawn_create(
    store: Arc<dyn RequestStore>,
    record: CreditRequest,
) -> oneshot::Receiver<Result<String, StoreError>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = store.create(&record).await;
        log_result(&record, &result);
        // The UI may have exited; nothing left to tell.
        let _ = tx.send(result);
    });
    rx
}

fn log_result(record: &CreditRequest, result: &Result<String, StoreError>) {
    match result {
        Ok(id) => tracing::info!(
            id = %id,
            credit_type = %record.credit_type,
            amount = record.amount,
            term_months = record.term_months,
            "credit request stored"
        ),
        Err(err) => tracing::error!(error = %err, "credit request submission failed"),
    }
}
