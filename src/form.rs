//! Form state and the submission state machine.
//!
//! `CreditForm` owns the raw inputs and everything derived from them. The
//! stage moves `Editing -> SummaryShown -> Submitting -> Success`, falling
//! back to `Editing` with a banner when the store rejects the request.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::context::AppContext;
use crate::error::{FormError, StoreError};
use crate::installment;
use crate::request::{CreditRequest, CreditType, Field, FormInputs, TERMS};
use crate::validation::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Editing,
    SummaryShown,
    Submitting,
    Success,
}

/// Form-level message shown below the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Incomplete,
    FixErrors,
    SubmissionFailed,
}

impl Banner {
    pub fn message(self) -> &'static str {
        match self {
            Banner::Incomplete => "Please complete all fields.",
            Banner::FixErrors => "Fix the errors before continuing.",
            Banner::SubmissionFailed => "Could not submit the request.",
        }
    }
}

/// Result of handing a record to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Stored { id: String, email: String },
    Failed,
}

#[derive(Debug, Clone)]
pub struct CreditForm {
    inputs: FormInputs,
    touched: BTreeSet<Field>,
    installment: Option<f64>,
    stage: Stage,
    banner: Option<Banner>,
}

impl Default for CreditForm {
    fn default() -> Self {
        Self {
            inputs: FormInputs::default(),
            touched: BTreeSet::new(),
            installment: None,
            stage: Stage::Editing,
            banner: None,
        }
    }
}

impl CreditForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &FormInputs {
        &self.inputs
    }

    pub fn value(&self, field: Field) -> &str {
        self.inputs.get(field)
    }

    /// Current estimate, absent while amount or term is empty or unusable.
    pub fn installment(&self) -> Option<f64> {
        self.installment
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner
    }

    pub fn summary_visible(&self) -> bool {
        self.stage == Stage::SummaryShown
    }

    pub fn is_submitting(&self) -> bool {
        self.stage == Stage::Submitting
    }

    /// True once the last request reached the store, until the next edit.
    pub fn is_submitted(&self) -> bool {
        self.stage == Stage::Success
    }

    /// Messages for the fields the user has edited that are currently invalid.
    pub fn errors(&self) -> ValidationReport {
        ValidationReport::of_touched(&self.inputs, &self.touched)
    }

    /// Replace a field's text. Editing from the summary hides it again.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        if self.stage == Stage::Submitting {
            return Err(FormError::WrongStage {
                action: "edit a field",
                stage: self.stage,
            });
        }

        *self.inputs.get_mut(field) = value.into();
        self.touched.insert(field);
        self.stage = Stage::Editing;

        if matches!(field, Field::Amount | Field::Term) {
            self.recompute_installment();
        }
        Ok(())
    }

    pub fn push_char(&mut self, field: Field, c: char) -> Result<(), FormError> {
        let mut value = self.inputs.get(field).to_string();
        value.push(c);
        self.set_field(field, value)
    }

    pub fn pop_char(&mut self, field: Field) -> Result<(), FormError> {
        let mut value = self.inputs.get(field).to_string();
        value.pop();
        self.set_field(field, value)
    }

    /// Step a choice field forward (or back) through its options. Starting
    /// from an empty selection picks the first (or last) option.
    pub fn cycle_option(&mut self, field: Field, forward: bool) -> Result<(), FormError> {
        let options: Vec<String> = match field {
            Field::CreditType => CreditType::ALL.iter().map(|t| t.label().to_string()).collect(),
            Field::Term => TERMS.iter().map(|t| t.to_string()).collect(),
            _ => return Ok(()),
        };

        let current = options.iter().position(|o| o == self.inputs.get(field));
        let len = options.len();
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.set_field(field, options[next].clone())
    }

    /// Full validation pass followed by the completeness and error gates.
    /// On success the summary becomes visible.
    pub fn request_summary(&mut self) -> Result<(), FormError> {
        if matches!(self.stage, Stage::Submitting) {
            return Err(FormError::WrongStage {
                action: "show the summary",
                stage: self.stage,
            });
        }

        self.touched.extend(Field::ALL);
        let report = ValidationReport::of(&self.inputs);

        let missing = self.inputs.missing();
        if !missing.is_empty() {
            tracing::debug!(?missing, "summary blocked by empty fields");
            self.banner = Some(Banner::Incomplete);
            return Err(FormError::Incomplete { missing });
        }

        if !report.is_empty() {
            tracing::debug!(count = report.len(), "summary blocked by invalid fields");
            self.banner = Some(Banner::FixErrors);
            return Err(FormError::InvalidFields {
                count: report.len(),
            });
        }

        self.banner = None;
        self.stage = Stage::SummaryShown;
        Ok(())
    }

    pub fn back_to_editing(&mut self) {
        if self.stage == Stage::SummaryShown {
            self.stage = Stage::Editing;
        }
    }

    /// Confirm the summary: snapshot the record and enter `Submitting`.
    pub fn begin_submission(&mut self, now: DateTime<Utc>) -> Result<CreditRequest, FormError> {
        match self.stage {
            Stage::SummaryShown => {}
            Stage::Submitting => return Err(FormError::AlreadySubmitting),
            stage => {
                return Err(FormError::WrongStage {
                    action: "confirm",
                    stage,
                })
            }
        }

        let installment = self.installment.ok_or(FormError::MissingInstallment)?;
        let record = CreditRequest::from_inputs(&self.inputs, installment, now)?;

        self.banner = None;
        self.stage = Stage::Submitting;
        Ok(record)
    }

    pub fn finish_submission(
        &mut self,
        result: Result<String, StoreError>,
        context: &AppContext,
    ) -> Result<SubmissionOutcome, FormError> {
        if self.stage != Stage::Submitting {
            return Err(FormError::WrongStage {
                action: "finish a submission",
                stage: self.stage,
            });
        }

        match result {
            Ok(id) => {
                let email = std::mem::take(&mut self.inputs).email;
                context.remember_email(email.clone());

                self.touched.clear();
                self.installment = None;
                self.banner = None;
                self.stage = Stage::Success;
                Ok(SubmissionOutcome::Stored { id, email })
            }
            Err(err) => {
                tracing::debug!(error = %err, "keeping fields for another attempt");
                self.banner = Some(Banner::SubmissionFailed);
                self.stage = Stage::Editing;
                Ok(SubmissionOutcome::Failed)
            }
        }
    }

    fn recompute_installment(&mut self) {
        self.installment = match installment::estimate(&self.inputs.amount, &self.inputs.term) {
            Ok(estimate) => estimate,
            Err(err) => {
                tracing::trace!(error = %err, "no installment estimate");
                None
            }
        };
    }
}
