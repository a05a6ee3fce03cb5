use std::sync::{Arc, RwLock};

/// Shared application context handed to every screen that needs it.
///
/// Cloning is cheap and all clones see the same values.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    submitted_email: Arc<RwLock<Option<String>>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the email of the last request that reached the store.
    pub fn remember_email(&self, email: impl Into<String>) {
        let email = email.into();
        match self.submitted_email.write() {
            Ok(mut slot) => *slot = Some(email),
            Err(poisoned) => *poisoned.into_inner() = Some(email),
        }
    }

    pub fn submitted_email(&self) -> Option<String> {
        match self.submitted_email.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
