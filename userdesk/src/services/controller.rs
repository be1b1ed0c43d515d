//! View controller
//!
//! Owns the state a user-management screen renders: the listed records,
//! the form draft, and whether a save or delete is in flight. Store access
//! goes through `RecordsService`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use super::records::{DeleteOutcome, ImageUpload, RecordsService};
use crate::database::{NewRecord, Record, RecordChanges, RecordView};
use crate::error::{AppError, Result};

/// Whether the record list has been fetched at least once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    Loading,
    Loaded,
}

/// Whether a mutating operation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    InFlight,
}

/// Raw form inputs, exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub name: String,
    pub age: String,
    pub email: String,
}

impl Draft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            age: record.age.to_string(),
            email: record.email.clone(),
        }
    }

    /// All three fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.age.is_empty() && !self.email.is_empty()
    }

    fn to_new_record(&self) -> Result<NewRecord> {
        let age = self
            .age
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::InvalidDraft(format!("age is not a number: {:?}", self.age)))?;

        Ok(NewRecord {
            name: self.name.clone(),
            age,
            email: self.email.clone(),
        })
    }
}

/// The draft plus the record it edits, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub draft: Draft,
    pub editing: Option<Record>,
}

impl FormState {
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }
}

/// Everything a screen needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub records: Vec<RecordView>,
    pub list: ListState,
    pub form: FormState,
    pub activity: Activity,
    /// Bumped by every `load`; only the newest load may publish its list
    #[serde(skip)]
    pub load_generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            list: ListState::Loading,
            form: FormState::default(),
            activity: Activity::Idle,
            load_generation: 0,
        }
    }
}

/// Result of `ViewController::save`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A required field was empty; nothing was called
    Incomplete,
    /// Another operation is in flight; nothing was called
    Busy,
    Created(Record),
    Updated(i64),
}

/// Result of `ViewController::delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Busy,
    Deleted(DeleteOutcome),
}

/// Controller holding view state and driving `RecordsService`
///
/// Clones share state. The state lock is never held across a store call,
/// so `snapshot` and `is_busy` answer while an operation runs.
#[derive(Clone)]
pub struct ViewController {
    service: RecordsService,
    state: Arc<Mutex<ViewState>>,
}

/// Resets `activity` to idle when the operation ends, however it ends
struct InFlight {
    state: Arc<Mutex<ViewState>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.state).activity = Activity::Idle;
    }
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ViewController {
    pub fn new(service: RecordsService) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(ViewState::default())),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ViewState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).activity == Activity::InFlight
    }

    /// Fetch the record list
    ///
    /// Failures are logged and leave the previous list in place. A load
    /// overtaken by a later one discards its result.
    pub async fn load(&self) {
        let generation = {
            let mut state = lock(&self.state);
            state.list = ListState::Loading;
            state.load_generation += 1;
            state.load_generation
        };

        let result = self.service.list_records().await;

        let mut state = lock(&self.state);
        if state.load_generation != generation {
            tracing::debug!("Discarding stale record list (load {})", generation);
            return;
        }
        match result {
            Ok(records) => state.records = records,
            Err(e) => tracing::error!("Error fetching records: {}", e),
        }
        state.list = ListState::Loaded;
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.state).form.draft.name = name.into();
    }

    pub fn set_age(&self, age: impl Into<String>) {
        lock(&self.state).form.draft.age = age.into();
    }

    pub fn set_email(&self, email: impl Into<String>) {
        lock(&self.state).form.draft.email = email.into();
    }

    /// Start editing a listed record, copying its fields into the draft
    pub fn begin_edit(&self, id: i64) -> Result<()> {
        let mut state = lock(&self.state);
        let record = state
            .records
            .iter()
            .find(|view| view.record.id == id)
            .map(|view| view.record.clone())
            .ok_or(AppError::RecordNotFound(id))?;

        tracing::debug!("Editing record: {}", id);
        state.form = FormState {
            draft: Draft::from_record(&record),
            editing: Some(record),
        };
        Ok(())
    }

    /// Drop the draft and return to idle
    pub fn cancel_edit(&self) {
        lock(&self.state).form = FormState::default();
    }

    /// Save the draft, creating or updating depending on the form state
    ///
    /// On success the form is cleared and the list is reloaded. Input made
    /// while the save ran is kept. On failure the form is kept so the
    /// operator can retry.
    pub async fn save(&self, image: Option<ImageUpload>) -> Result<SaveOutcome> {
        let (form, _in_flight) = {
            let mut state = lock(&self.state);

            if state.activity == Activity::InFlight {
                tracing::debug!("Save ignored while another operation is in flight");
                return Ok(SaveOutcome::Busy);
            }
            if !state.form.draft.is_complete() {
                return Ok(SaveOutcome::Incomplete);
            }

            state.activity = Activity::InFlight;
            (state.form.clone(), self.begin())
        };

        let record = form.draft.to_new_record()?;

        let outcome = match &form.editing {
            Some(editing) => {
                self.service
                    .update_record(editing.id, RecordChanges::from(record), image.as_ref())
                    .await?;
                SaveOutcome::Updated(editing.id)
            }
            None => {
                let created = self.service.create_record(record, image.as_ref()).await?;
                SaveOutcome::Created(created)
            }
        };

        {
            let mut state = lock(&self.state);
            if state.form == form {
                state.form = FormState::default();
            }
        }
        self.load().await;

        Ok(outcome)
    }

    /// Delete a record and its image, then reload the list
    pub async fn delete(&self, id: i64) -> Result<RemoveOutcome> {
        let _in_flight = {
            let mut state = lock(&self.state);

            if state.activity == Activity::InFlight {
                tracing::debug!("Delete ignored while another operation is in flight");
                return Ok(RemoveOutcome::Busy);
            }

            state.activity = Activity::InFlight;
            self.begin()
        };

        let outcome = self.service.delete_record(id).await?;

        {
            let mut state = lock(&self.state);
            if state.form.editing.as_ref().is_some_and(|r| r.id == id) {
                state.form = FormState::default();
            }
        }
        self.load().await;

        Ok(RemoveOutcome::Deleted(outcome))
    }

    fn begin(&self) -> InFlight {
        InFlight {
            state: Arc::clone(&self.state),
        }
    }
}
