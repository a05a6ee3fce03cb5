use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use credit_request::submission::submit;
use credit_request::validation::{BAD_EMAIL, BAD_NATIONAL_ID, BAD_PHONE, NAME_TOO_SHORT};
use credit_request::{
    AppContext, Banner, CreditForm, CreditRequest, Field, FormError, FormInputs,
    InMemoryRequestStore, RequestStore, Stage, StoreError, StoredRequest, SubmissionOutcome,
};

/// Rejects the first `failures` creates, then delegates to memory.
struct FlakyStore {
    failures: AtomicUsize,
    inner: InMemoryRequestStore,
}

impl FlakyStore {
    fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            inner: InMemoryRequestStore::new(),
        }
    }
}

#[async_trait]
impl RequestStore for FlakyStore {
    async fn create(&self, request: &CreditRequest) -> Result<String, StoreError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Status {
                status: 500,
                body: "backend error".to_string(),
            });
        }
        self.inner.create(request).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<StoredRequest>, StoreError> {
        self.inner.find_by_email(email).await
    }
}

fn valid_form() -> CreditForm {
    let mut form = CreditForm::new();
    for (field, value) in [
        (Field::FullName, "Carlos Pérez"),
        (Field::NationalId, "1098765432"),
        (Field::Email, "carlos.perez@correo.co"),
        (Field::Phone, "3157654321"),
        (Field::CreditType, "Business"),
        (Field::Amount, "1000000"),
        (Field::Term, "12"),
        (Field::Purpose, "Working capital"),
        (Field::Employer, "Ferretería El Tornillo"),
        (Field::JobTitle, "Owner"),
        (Field::MonthlyIncome, "6000000"),
    ] {
        form.set_field(field, value).unwrap();
    }
    form
}

#[test]
fn test_full_form_reaches_summary_without_errors() {
    let mut form = valid_form();
    form.request_summary().unwrap();
    assert_eq!(form.stage(), Stage::SummaryShown);
    assert!(form.errors().is_empty());
}

#[test]
fn test_each_empty_field_blocks_summary() {
    for field in Field::ALL {
        let mut form = valid_form();
        form.set_field(field, "").unwrap();
        let err = form.request_summary().unwrap_err();
        assert_eq!(err, FormError::Incomplete { missing: vec![field] }, "{field}");
        assert_eq!(form.banner(), Some(Banner::Incomplete));
        assert_eq!(form.stage(), Stage::Editing);
    }
}

#[test]
fn test_full_pass_reports_every_personal_field() {
    let mut form = valid_form();
    form.set_field(Field::FullName, "Al").unwrap();
    form.set_field(Field::NationalId, "12345").unwrap();
    form.set_field(Field::Email, "carlos@correo").unwrap();
    form.set_field(Field::Phone, "315765432").unwrap();

    assert!(form.request_summary().is_err());
    let errors = form.errors();
    assert_eq!(errors.get(Field::FullName), Some(NAME_TOO_SHORT));
    assert_eq!(errors.get(Field::NationalId), Some(BAD_NATIONAL_ID));
    assert_eq!(errors.get(Field::Email), Some(BAD_EMAIL));
    assert_eq!(errors.get(Field::Phone), Some(BAD_PHONE));
    assert_eq!(form.banner(), Some(Banner::FixErrors));
}

#[test]
fn test_amount_below_minimum_blocks_summary() {
    let mut form = valid_form();
    form.set_field(Field::Amount, "400000").unwrap();
    assert_eq!(
        form.request_summary().unwrap_err(),
        FormError::InvalidFields { count: 1 }
    );
}

#[tokio::test]
async fn test_successful_submission_resets_and_remembers_email() {
    let store = InMemoryRequestStore::new();
    let ctx = AppContext::new();
    let mut form = valid_form();
    form.request_summary().unwrap();

    let outcome = submit(&mut form, &store, &ctx).await.unwrap();
    let SubmissionOutcome::Stored { id, email } = outcome else {
        panic!("expected the request to be stored");
    };
    assert_eq!(email, "carlos.perez@correo.co");
    assert!(form.is_submitted());
    assert_eq!(form.inputs(), &FormInputs::default());
    assert_eq!(form.installment(), None);
    assert_eq!(ctx.submitted_email().as_deref(), Some("carlos.perez@correo.co"));

    let stored = store.find_by_email("carlos.perez@correo.co").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].request.installment, 91679.99);
    assert_eq!(stored[0].request.full_name, "Carlos Pérez");
}

#[tokio::test]
async fn test_failed_submission_keeps_fields_and_allows_retry() {
    let store = FlakyStore::new(1);
    let ctx = AppContext::new();
    let mut form = valid_form();
    let before = form.inputs().clone();
    form.request_summary().unwrap();

    let outcome = submit(&mut form, &store, &ctx).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Failed);
    assert_eq!(form.stage(), Stage::Editing);
    assert_eq!(form.banner(), Some(Banner::SubmissionFailed));
    assert!(!form.summary_visible());
    assert_eq!(form.inputs(), &before);
    assert_eq!(ctx.submitted_email(), None);

    form.request_summary().unwrap();
    let retry = submit(&mut form, &store, &ctx).await.unwrap();
    assert!(matches!(retry, SubmissionOutcome::Stored { .. }));
    assert_eq!(store.inner.len(), 1);
}

#[tokio::test]
async fn test_submit_without_summary_is_refused() {
    let store = InMemoryRequestStore::new();
    let mut form = valid_form();
    let err = submit(&mut form, &store, &AppContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::WrongStage { .. }));
    assert!(store.is_empty());
}
