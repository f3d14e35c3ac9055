use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::models::TabObservation;

/// Identity of an archive view, used to address the snapshot response.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Hands out view identities. A freshly opened view without an id cannot be
/// addressed, which aborts that capture attempt.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    next: u64,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Option<ViewId> {
        let id = self.next.checked_add(1)?;
        self.next = id;
        Some(ViewId(id))
    }
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The newly opened view has no addressable identity. Fatal to this
    /// capture attempt only.
    #[error("archive view has no addressable id")]
    MissingViewId,

    /// The other context cannot be reached. The view degrades to an empty
    /// recent list instead of failing to render.
    #[error("background context unreachable")]
    Unreachable,
}

/// One-shot snapshot delivery between the trigger and the archive view.
///
/// The listener-that-deregisters-itself pattern made explicit: `accept`
/// yields the snapshot at most once, and only to the expected view. An
/// abandoned handshake (view closed before signalling ready) is simply
/// dropped with its owner; no retry, no timeout.
#[derive(Debug, Default)]
pub enum Handshake {
    #[default]
    Idle,
    Capturing,
    AwaitingView {
        expected: ViewId,
        snapshot: Vec<TabObservation>,
    },
    Delivered {
        view: ViewId,
    },
}

impl Handshake {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Idle -> Capturing, on the user trigger.
    pub fn begin_capture(&mut self) {
        *self = Self::Capturing;
    }

    /// Capturing -> AwaitingView: arms the one-shot listener with the
    /// captured snapshot and the identity of the view that may claim it.
    pub fn offer(&mut self, expected: ViewId, snapshot: Vec<TabObservation>) {
        debug!(%expected, tabs = snapshot.len(), "handshake awaiting view");
        *self = Self::AwaitingView { expected, snapshot };
    }

    /// AwaitingView -> Delivered when `view` matches the expected identity;
    /// returns the snapshot exactly once. Any other call — wrong view, wrong
    /// state, or a second matching notification — returns `None` and leaves
    /// the state unchanged.
    pub fn accept(&mut self, view: ViewId) -> Option<Vec<TabObservation>> {
        if !matches!(self, Self::AwaitingView { expected, .. } if *expected == view) {
            return None;
        }
        match std::mem::replace(self, Self::Delivered { view }) {
            Self::AwaitingView { snapshot, .. } => {
                debug!(%view, tabs = snapshot.len(), "handshake delivered");
                Some(snapshot)
            }
            _ => unreachable!("state checked above"),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}
