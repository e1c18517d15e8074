//! View-model for the browser UI's modal form.
//!
//! The page holds exactly one modal. It is either closed, open to create a
//! record of some kind, or open to edit a specific record. Everything the
//! form needs to submit (method and URL) follows from that state.

use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Policy,
    Client,
}

impl EntityKind {
    /// Collection route for this kind, also the POST target
    pub fn collection_path(self) -> &'static str {
        match self {
            EntityKind::Policy => "/api/policies",
            EntityKind::Client => "/api/clients",
        }
    }

    /// Item route template as registered with the router
    pub fn item_route(self) -> &'static str {
        match self {
            EntityKind::Policy => "/api/policies/:id",
            EntityKind::Client => "/api/clients/:id",
        }
    }

    pub fn item_path(self, id: i64) -> String {
        format!("{}/{}", self.collection_path(), id)
    }
}

/// The record a listing cell points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub kind: EntityKind,
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    OpenForCreate(EntityKind),
    OpenForEdit(EntityKind, i64),
}

impl ModalState {
    pub fn open_create(kind: EntityKind) -> Self {
        ModalState::OpenForCreate(kind)
    }

    pub fn open_edit(target: EditTarget) -> Self {
        ModalState::OpenForEdit(target.kind, target.id)
    }

    pub fn close(self) -> Self {
        ModalState::Closed
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn kind(&self) -> Option<EntityKind> {
        match *self {
            ModalState::Closed => None,
            ModalState::OpenForCreate(kind) | ModalState::OpenForEdit(kind, _) => Some(kind),
        }
    }

    pub fn title(&self) -> Option<&'static str> {
        match *self {
            ModalState::Closed => None,
            ModalState::OpenForCreate(EntityKind::Policy) => Some("New policy"),
            ModalState::OpenForCreate(EntityKind::Client) => Some("New client"),
            ModalState::OpenForEdit(EntityKind::Policy, _) => Some("Edit policy"),
            ModalState::OpenForEdit(EntityKind::Client, _) => Some("Edit client"),
        }
    }

    /// Where submitting the form goes: POST to the collection when creating,
    /// PUT to the item when editing.
    pub fn submit_route(&self) -> Option<(Method, String)> {
        match *self {
            ModalState::Closed => None,
            ModalState::OpenForCreate(kind) => Some((Method::POST, kind.collection_path().to_string())),
            ModalState::OpenForEdit(kind, id) => Some((Method::PUT, kind.item_path(id))),
        }
    }
}
