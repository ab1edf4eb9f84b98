//! Page rendering: a JSON document holding the view context plus the
//! session's pending notices.

use std::sync::Mutex;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::LOCATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::middleware::SessionId;
use crate::forms::FieldErrors;
use crate::messages::{FlashStore, Level, Message};
use crate::models::Space;

/// A rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub context: T,
}

/// Context for add and edit forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormContext<F> {
    pub form: F,
    #[serde(default)]
    pub errors: FieldErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Space>,
    /// Id of the record being edited; absent on add forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
}

impl<F> FormContext<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            errors: FieldErrors::new(),
            space: None,
            object_id: None,
        }
    }

    pub fn in_space(self, space: Option<Space>) -> Self {
        Self { space, ..self }
    }

    pub fn editing(self, id: i64) -> Self {
        Self {
            object_id: Some(id),
            ..self
        }
    }

    pub fn with_errors(self, errors: FieldErrors) -> Self {
        Self { errors, ..self }
    }
}

/// Handle on the current session's message queue.
///
/// Only sessions the client sent back are queued in the shared store. For
/// any other request, notices live until this request renders and are
/// dropped otherwise.
pub struct Notices {
    store: FlashStore,
    session: Option<Uuid>,
    local: Mutex<Vec<Message>>,
}

impl Notices {
    pub fn info(&self, text: impl Into<String>) {
        self.push(Level::Info, text.into());
    }

    pub fn success(&self, text: impl Into<String>) {
        self.push(Level::Success, text.into());
    }

    fn push(&self, level: Level, text: String) {
        match self.session {
            Some(session) => self.store.push(session, level, text),
            None => self
                .local
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(Message { level, text }),
        }
    }

    /// Render a page, consuming every notice queued so far.
    pub fn render<T: Serialize>(&self, context: T) -> Json<Page<T>> {
        let mut messages = self
            .session
            .map(|session| self.store.drain(session))
            .unwrap_or_default();
        messages.append(&mut self.local.lock().unwrap_or_else(|e| e.into_inner()));
        Json(Page { messages, context })
    }

    /// Re-render a form that failed validation.
    pub fn render_invalid<T: Serialize>(&self, context: T) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, self.render(context)).into_response()
    }
}

impl<S> FromRequestParts<S> for Notices
where
    FlashStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionId>()
            .filter(|s| s.returning)
            .map(|s| s.id);
        Ok(Self {
            store: FlashStore::from_ref(state),
            session,
            local: Mutex::new(Vec::new()),
        })
    }
}

/// A 302 redirect.
pub fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.into())]).into_response()
}
