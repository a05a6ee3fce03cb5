//! Screens and key handling for the terminal front end.

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::context::AppContext;
use crate::error::StoreError;
use crate::form::{CreditForm, SubmissionOutcome};
use crate::request::{Field, StoredRequest};
use crate::store::RequestStore;
use crate::submission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Summary,
    MyRequests,
}

type Pending<T> = oneshot::Receiver<Result<T, StoreError>>;

pub struct App {
    pub screen: Screen,
    pub form: CreditForm,
    pub focus: Field,
    pub context: AppContext,
    pub my_requests: Vec<StoredRequest>,
    pub lookup_error: Option<String>,
    pub last_stored_id: Option<String>,
    pub table_state: TableState,
    store: Arc<dyn RequestStore>,
    submission: Option<Pending<String>>,
    lookup: Option<Pending<Vec<StoredRequest>>>,
}

impl App {
    pub fn new(store: Arc<dyn RequestStore>, context: AppContext) -> Self {
        Self {
            screen: Screen::Form,
            form: CreditForm::new(),
            focus: Field::FullName,
            context,
            my_requests: Vec::new(),
            lookup_error: None,
            last_stored_id: None,
            table_state: TableState::default(),
            store,
            submission: None,
            lookup: None,
        }
    }

    pub fn is_loading_requests(&self) -> bool {
        self.lookup.is_some()
    }

    /// Route a key press to the current screen. Returns `true` to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match self.screen {
            Screen::Form => handle_form_input(self, key),
            Screen::Summary => handle_summary_input(self, key),
            Screen::MyRequests => handle_my_requests_input(self, key),
        }
    }

    pub fn poll_background(&mut self) {
        if let Some(result) = take_ready(&mut self.submission) {
            self.on_submission_result(result);
        }

        if let Some(result) = take_ready(&mut self.lookup) {
            match result {
                Ok(requests) => {
                    self.lookup_error = None;
                    self.table_state
                        .select(if requests.is_empty() { None } else { Some(0) });
                    self.my_requests = requests;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not load stored requests");
                    self.lookup_error = Some("Could not load your requests.".to_string());
                }
            }
        }
    }

    fn confirm(&mut self) -> Result<()> {
        if self.form.is_submitting() {
            return Ok(());
        }
        let record = self.form.begin_submission(Utc::now())?;
        tracing::debug!(email = %record.email, "submitting credit request");
        self.submission = Some(submission::spawn_create(self.store.clone(), record));
        Ok(())
    }

    fn on_submission_result(&mut self, result: Result<String, StoreError>) {
        match self.form.finish_submission(result, &self.context) {
            Ok(SubmissionOutcome::Stored { id, .. }) => {
                self.last_stored_id = Some(id);
                self.focus = Field::FullName;
                self.screen = Screen::MyRequests;
                self.refresh_requests();
            }
            Ok(SubmissionOutcome::Failed) => {
                self.screen = Screen::Form;
            }
            Err(err) => tracing::error!(error = %err, "submission result arrived out of order"),
        }
    }

    /// Look up the requests of the applicant remembered in the context.
    pub fn refresh_requests(&mut self) {
        let Some(email) = self.context.submitted_email() else {
            self.my_requests.clear();
            return;
        };

        let (tx, rx) = oneshot::channel();
        let store = self.store.clone();
        tokio::spawn(async move {
            let result = store.find_by_email(&email).await;
            if let Ok(found) = &result {
                tracing::debug!(count = found.len(), "loaded stored requests");
            }
            let _ = tx.send(result);
        });
        self.lookup = Some(rx);
    }
}

fn take_ready<T>(slot: &mut Option<Pending<T>>) -> Option<Result<T, StoreError>> {
    let rx = slot.as_mut()?;
    match rx.try_recv() {
        Ok(result) => {
            *slot = None;
            Some(result)
        }
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Closed) => {
            *slot = None;
            Some(Err(StoreError::Interrupted))
        }
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    let field = app.focus;
    match key.code {
        KeyCode::Tab | KeyCode::Down => app.focus = field.next(),
        KeyCode::BackTab | KeyCode::Up => app.focus = field.prev(),
        KeyCode::Left if field.is_choice() => app.form.cycle_option(field, false)?,
        KeyCode::Right | KeyCode::Char(' ') if field.is_choice() => {
            app.form.cycle_option(field, true)?
        }
        KeyCode::Char(c) if field.accepts_char(c) => {
            app.form.push_char(field, c)?;
        }
        KeyCode::Backspace if !field.is_choice() => app.form.pop_char(field)?,
        KeyCode::Enter => match app.form.request_summary() {
            Ok(()) => {
                tracing::info!("summary shown");
                app.screen = Screen::Summary;
            }
            Err(err) => {
                tracing::info!(reason = %err, "summary refused");
                if let Some((first, _)) = app.form.errors().iter().next() {
                    app.focus = first;
                } else if let Some(first) = app.form.inputs().missing().first() {
                    app.focus = *first;
                }
            }
        },
        KeyCode::Esc => return Ok(true),
        _ => {}
    }
    Ok(false)
}

fn handle_summary_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm()?,
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left if !app.form.is_submitting() => {
            app.form.back_to_editing();
            app.screen = Screen::Form;
        }
        KeyCode::Char('q') | KeyCode::Char('Q') if !app.form.is_submitting() => return Ok(true),
        _ => {}
    }
    Ok(false)
}

fn handle_my_requests_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(true),
        KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => {
            app.screen = Screen::Form;
        }
        KeyCode::Char('r') => app.refresh_requests(),
        KeyCode::Down | KeyCode::Char('j') => {
            let current = app.table_state.selected().unwrap_or(0);
            if current + 1 < app.my_requests.len() {
                app.table_state.select(Some(current + 1));
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let current = app.table_state.selected().unwrap_or(0);
            if current > 0 {
                app.table_state.select(Some(current - 1));
            }
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Banner, Stage};
    use crate::request::CreditRequest;
    use crate::store::InMemoryRequestStore;
    use async_trait::async_trait;

    struct DownStore;

    #[async_trait]
    impl RequestStore for DownStore {
        async fn create(&self, _: &CreditRequest) -> Result<String, StoreError> {
            Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn find_by_email(&self, _: &str) -> Result<Vec<StoredRequest>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn fill_form(app: &mut App) {
        type_text(app, "Ana Torres");
        press(app, KeyCode::Tab);
        type_text(app, "10203040");
        press(app, KeyCode::Tab);
        type_text(app, "ana@example.com");
        press(app, KeyCode::Tab);
        type_text(app, "3001234567");
        press(app, KeyCode::Tab);
        press(app, KeyCode::Right); // Free Investment
        press(app, KeyCode::Tab);
        type_text(app, "1000000");
        press(app, KeyCode::Tab);
        press(app, KeyCode::Right); // 6
        press(app, KeyCode::Right); // 12
        press(app, KeyCode::Tab);
        type_text(app, "Home office");
        press(app, KeyCode::Tab);
        type_text(app, "Acme");
        press(app, KeyCode::Tab);
        type_text(app, "Engineer");
        press(app, KeyCode::Tab);
        type_text(app, "4500000");
    }

    async fn settle(app: &mut App) {
        for _ in 0..100 {
            app.poll_background();
            if app.submission.is_none() && app.lookup.is_none() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("background work did not finish");
    }

    #[test]
    fn test_digit_fields_ignore_letters() {
        let store = Arc::new(InMemoryRequestStore::new());
        let mut app = App::new(store, AppContext::new());
        app.focus = Field::Phone;
        type_text(&mut app, "30a0");
        assert_eq!(app.form.value(Field::Phone), "300");

        app.focus = Field::Amount;
        type_text(&mut app, "1k500.5");
        assert_eq!(app.form.value(Field::Amount), "1500.5");
    }

    #[test]
    fn test_enter_on_incomplete_form_stays() {
        let store = Arc::new(InMemoryRequestStore::new());
        let mut app = App::new(store, AppContext::new());
        type_text(&mut app, "Ana");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(app.form.banner(), Some(Banner::Incomplete));
    }

    #[tokio::test]
    async fn test_submit_navigates_to_my_requests() {
        let store = Arc::new(InMemoryRequestStore::new());
        let ctx = AppContext::new();
        let mut app = App::new(store.clone(), ctx.clone());
        fill_form(&mut app);
        assert_eq!(app.form.installment(), Some(91679.99));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Summary);

        press(&mut app, KeyCode::Enter);
        assert!(app.form.is_submitting());
        // A second confirm while in flight is a no-op.
        press(&mut app, KeyCode::Enter);

        settle(&mut app).await;
        assert_eq!(app.screen, Screen::MyRequests);
        assert_eq!(store.len(), 1);
        assert_eq!(ctx.submitted_email().as_deref(), Some("ana@example.com"));
        assert_eq!(app.my_requests.len(), 1);
        assert_eq!(app.my_requests[0].request.term_months, 12);
        assert_eq!(app.form.stage(), Stage::Success);
        assert_eq!(app.form.value(Field::FullName), "");
    }

    #[tokio::test]
    async fn test_failed_submit_returns_to_form() {
        let mut app = App::new(Arc::new(DownStore), AppContext::new());
        fill_form(&mut app);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('y'));

        settle(&mut app).await;
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(app.form.banner(), Some(Banner::SubmissionFailed));
        assert_eq!(app.form.value(Field::Email), "ana@example.com");
        assert_eq!(app.context.submitted_email(), None);
    }

    #[test]
    fn test_back_from_summary() {
        let store = Arc::new(InMemoryRequestStore::new());
        let mut app = App::new(store, AppContext::new());
        fill_form(&mut app);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(app.form.stage(), Stage::Editing);
    }
}
