use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, error, info, warn};

use crate::background::handshake::{Handshake, ViewId};
use crate::models::{TabObservation, TabRecord};
use crate::store::Database;

/// Commands from the archive view to the background context.
pub enum ArchiveCommand {
    /// The view has mounted and asks for its initial snapshot.
    ViewReady { view: ViewId },
    /// Fold a whole captured snapshot into the store, batch order.
    MergeSnapshot { tabs: Vec<TabObservation> },
    /// Persist a single tab unless a record for its url already exists.
    ArchiveTab { tab: TabObservation },
    /// Delete the records for these urls.
    ForgetTabs { urls: Vec<String> },
    /// Fetch one page of the archive, most recently visited first.
    LoadPage { offset: usize, limit: usize },
    Shutdown,
}

/// Events from the background context back to the view.
#[derive(Debug, Clone)]
pub enum ArchiveEvent {
    /// Handshake response; sent at most once per capture.
    Snapshot { tabs: Vec<TabObservation> },
    Page {
        offset: usize,
        items: Vec<TabRecord>,
        has_more: bool,
    },
}

/// Background context: owns the store and the armed handshake, services view
/// commands sequentially. Store failures are logged here and never surfaced
/// to the view's render path; the view just keeps whatever it already shows.
pub struct ArchiveWorker {
    db: Database,
    handshake: Handshake,
    event_tx: Sender<ArchiveEvent>,
    command_rx: Receiver<ArchiveCommand>,
}

impl ArchiveWorker {
    pub fn new(
        db: Database,
        handshake: Handshake,
        event_tx: Sender<ArchiveEvent>,
        command_rx: Receiver<ArchiveCommand>,
    ) -> Self {
        Self {
            db,
            handshake,
            event_tx,
            command_rx,
        }
    }

    pub fn run(mut self) {
        info!("archive worker started");
        while let Ok(command) = self.command_rx.recv() {
            match command {
                ArchiveCommand::ViewReady { view } => self.handle_view_ready(view),
                ArchiveCommand::MergeSnapshot { tabs } => self.handle_merge_snapshot(tabs),
                ArchiveCommand::ArchiveTab { tab } => self.handle_archive_tab(tab),
                ArchiveCommand::ForgetTabs { urls } => self.handle_forget_tabs(urls),
                ArchiveCommand::LoadPage { offset, limit } => self.handle_load_page(offset, limit),
                ArchiveCommand::Shutdown => {
                    info!("archive worker shutting down");
                    break;
                }
            }
        }
    }

    fn handle_view_ready(&mut self, view: ViewId) {
        match self.handshake.accept(view) {
            Some(tabs) => {
                info!(%view, tabs = tabs.len(), "delivering snapshot to view");
                self.send(ArchiveEvent::Snapshot { tabs });
            }
            // Wrong view, or the snapshot was already claimed.
            None => debug!(%view, "ignoring ready signal"),
        }
    }

    fn handle_merge_snapshot(&mut self, tabs: Vec<TabObservation>) {
        if let Err(err) = self.db.merge_batch(&tabs) {
            // Applied writes stand; no retry.
            error!("snapshot merge failed: {err}");
        }
    }

    fn handle_archive_tab(&mut self, tab: TabObservation) {
        let already_persisted = match self.db.get(&tab.url) {
            Ok(existing) => existing.is_some(),
            Err(err) => {
                error!(url = %tab.url, "archive lookup failed: {err}");
                return;
            }
        };
        if already_persisted {
            debug!(url = %tab.url, "already archived");
            return;
        }
        if let Err(err) = self.db.merge_one(&tab) {
            error!(url = %tab.url, "archive failed: {err}");
        }
    }

    fn handle_forget_tabs(&mut self, urls: Vec<String>) {
        for url in urls {
            if let Err(err) = self.db.delete(&url) {
                error!(%url, "forget failed: {err}");
            }
        }
    }

    fn handle_load_page(&mut self, offset: usize, limit: usize) {
        match self.db.scan_by_last_visit_desc(offset, limit) {
            Ok(page) => self.send(ArchiveEvent::Page {
                offset,
                items: page.items,
                has_more: page.has_more,
            }),
            Err(err) => error!(offset, limit, "page scan failed: {err}"),
        }
    }

    fn send(&self, event: ArchiveEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("archive view gone; dropping event");
        }
    }
}
