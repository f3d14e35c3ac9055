use std::collections::HashSet;
use std::sync::mpsc::{Receiver, Sender};

use tracing::warn;

use crate::background::handshake::{HandshakeError, ViewId};
use crate::background::worker::{ArchiveCommand, ArchiveEvent};
use crate::models::{dedup_by_url, TabObservation, TabRecord};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pane {
    Recent,
    Archived,
}

/// Reactive state of the archive view. Transitions are synchronous; store
/// work goes out as commands to the background worker and results come back
/// as events drained each tick. Worker-side failures never reach this state,
/// the view just keeps showing what it has.
pub struct App {
    pub running: bool,
    pub view_id: ViewId,
    /// Just-captured tabs, collapsed by url for display; shrinks as the user
    /// archives or forgets them.
    pub recent_tabs: Vec<TabObservation>,
    /// Materialized window over the persisted archive, newest visit first.
    pub archived: Vec<TabRecord>,
    pub has_more: bool,
    /// Urls selected in the currently rendered pane.
    pub selection: HashSet<String>,
    pub pane: Pane,
    pub cursor: usize,
    pub page_size: usize,
    pub status_message: Option<String>,
    command_tx: Sender<ArchiveCommand>,
    event_rx: Receiver<ArchiveEvent>,
}

impl App {
    pub fn new(
        view_id: ViewId,
        page_size: usize,
        command_tx: Sender<ArchiveCommand>,
        event_rx: Receiver<ArchiveEvent>,
    ) -> Self {
        Self {
            running: true,
            view_id,
            recent_tabs: Vec::new(),
            archived: Vec::new(),
            has_more: false,
            selection: HashSet::new(),
            pane: Pane::Recent,
            cursor: 0,
            page_size,
            status_message: None,
            command_tx,
            event_rx,
        }
    }

    /// Sent once on mount; the snapshot arrives as the response event. When
    /// the background is unreachable the view stays up with an empty recent
    /// list.
    pub fn signal_ready(&mut self) -> Result<(), HandshakeError> {
        let view = self.view_id;
        if self.command_tx.send(ArchiveCommand::ViewReady { view }).is_err() {
            self.status_message = Some("background unreachable".into());
            return Err(HandshakeError::Unreachable);
        }
        Ok(())
    }

    /// Drains pending worker events. Called once per render tick.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                ArchiveEvent::Snapshot { tabs } => self.on_snapshot(tabs),
                ArchiveEvent::Page {
                    offset,
                    items,
                    has_more,
                } => self.apply_page(offset, items, has_more),
            }
        }
    }

    fn on_snapshot(&mut self, tabs: Vec<TabObservation>) {
        self.recent_tabs = dedup_by_url(&tabs);
        self.cursor = 0;
        // Fire-and-forget: the worker logs merge failures, the view moves on.
        self.send(ArchiveCommand::MergeSnapshot { tabs });
        self.refresh_first_page();
    }

    fn apply_page(&mut self, offset: usize, items: Vec<TabRecord>, has_more: bool) {
        if offset == 0 {
            self.archived = items;
        } else {
            self.archived.extend(items);
        }
        self.has_more = has_more;
        self.clamp_cursor();
    }

    /// Removes the tab under the cursor from the recent list and persists it
    /// unless an earlier merge already did.
    pub fn archive_at_cursor(&mut self) {
        if self.pane != Pane::Recent || self.recent_tabs.is_empty() {
            return;
        }
        let tab = self.recent_tabs.remove(self.cursor.min(self.recent_tabs.len() - 1));
        self.selection.remove(&tab.url);
        self.send(ArchiveCommand::ArchiveTab { tab });
        self.refresh_first_page();
    }

    /// Deletes the tab under the cursor from the store and from both lists;
    /// pagination resets to the first page.
    pub fn forget_at_cursor(&mut self) {
        let Some(url) = self.url_at_cursor() else {
            return;
        };
        self.forget_urls(vec![url]);
    }

    /// Applies archive to every selected recent tab, then clears the
    /// selection.
    pub fn archive_selected(&mut self) {
        if self.pane != Pane::Recent || self.selection.is_empty() {
            return;
        }
        let selected: HashSet<String> = self.selection.drain().collect();
        let recent = std::mem::take(&mut self.recent_tabs);
        let mut kept = Vec::with_capacity(recent.len());
        for tab in recent {
            if selected.contains(&tab.url) {
                self.send(ArchiveCommand::ArchiveTab { tab });
            } else {
                kept.push(tab);
            }
        }
        self.recent_tabs = kept;
        self.refresh_first_page();
        self.clamp_cursor();
    }

    /// Forgets every selected tab, then clears the selection.
    pub fn forget_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let urls: Vec<String> = self.selection.drain().collect();
        self.forget_urls(urls);
    }

    fn forget_urls(&mut self, urls: Vec<String>) {
        let dropped: HashSet<&String> = urls.iter().collect();
        self.recent_tabs.retain(|t| !dropped.contains(&t.url));
        self.archived.retain(|r| !dropped.contains(&r.url));
        for url in &urls {
            self.selection.remove(url);
        }
        self.send(ArchiveCommand::ForgetTabs { urls });
        self.refresh_first_page();
        self.clamp_cursor();
    }

    /// Fetches the page after the records already shown.
    pub fn load_more(&mut self) {
        if !self.has_more {
            return;
        }
        self.send(ArchiveCommand::LoadPage {
            offset: self.archived.len(),
            limit: self.page_size,
        });
    }

    /// Toggles selection of the tab under the cursor; idempotent per url.
    pub fn toggle_selected(&mut self) {
        let Some(url) = self.url_at_cursor() else {
            return;
        };
        if !self.selection.remove(&url) {
            self.selection.insert(url);
        }
    }

    /// Selection is scoped to the rendered pane, so switching drops it.
    pub fn switch_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Recent => Pane::Archived,
            Pane::Archived => Pane::Recent,
        };
        self.selection.clear();
        self.cursor = 0;
    }

    pub fn cursor_down(&mut self) {
        let len = self.current_len();
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
        self.send(ArchiveCommand::Shutdown);
    }

    pub fn url_at_cursor(&self) -> Option<String> {
        match self.pane {
            Pane::Recent => self.recent_tabs.get(self.cursor).map(|t| t.url.clone()),
            Pane::Archived => self.archived.get(self.cursor).map(|r| r.url.clone()),
        }
    }

    fn current_len(&self) -> usize {
        match self.pane {
            Pane::Recent => self.recent_tabs.len(),
            Pane::Archived => self.archived.len(),
        }
    }

    fn refresh_first_page(&mut self) {
        self.send(ArchiveCommand::LoadPage {
            offset: 0,
            limit: self.page_size,
        });
    }

    fn clamp_cursor(&mut self) {
        let len = self.current_len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    fn send(&mut self, command: ArchiveCommand) {
        if self.command_tx.send(command).is_err() && self.status_message.is_none() {
            warn!("background unreachable; command dropped");
            self.status_message = Some("background unreachable".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::background::handshake::ViewRegistry;

    struct Harness {
        app: App,
        command_rx: Receiver<ArchiveCommand>,
        event_tx: Sender<ArchiveEvent>,
    }

    fn harness() -> Harness {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let view = ViewRegistry::new().allocate().unwrap();
        Harness {
            app: App::new(view, 20, command_tx, event_rx),
            command_rx,
            event_tx,
        }
    }

    fn observed(url: &str, title: &str) -> TabObservation {
        TabObservation::new(url, title, 1)
    }

    fn record(url: &str, last_visit: i64) -> TabRecord {
        TabRecord {
            url: url.to_string(),
            title: url.to_string(),
            favicon_url: None,
            count: 1,
            last_visit,
        }
    }

    fn drain_commands(h: &Harness) -> Vec<ArchiveCommand> {
        h.command_rx.try_iter().collect()
    }

    #[test]
    fn snapshot_event_dedups_recents_and_merges_raw_batch() {
        let mut h = harness();
        h.event_tx
            .send(ArchiveEvent::Snapshot {
                tabs: vec![
                    observed("https://a.example", "A"),
                    observed("https://a.example", "A2"),
                    observed("https://b.example", "B"),
                ],
            })
            .unwrap();
        h.app.drain_events();

        assert_eq!(h.app.recent_tabs.len(), 2);
        assert_eq!(h.app.recent_tabs[0].count, 2);
        assert_eq!(h.app.recent_tabs[0].title, "A2");

        let commands = drain_commands(&h);
        assert!(matches!(
            &commands[0],
            ArchiveCommand::MergeSnapshot { tabs } if tabs.len() == 3
        ));
        assert!(matches!(
            &commands[1],
            ArchiveCommand::LoadPage { offset: 0, limit: 20 }
        ));
    }

    #[test]
    fn archive_at_cursor_is_optimistic() {
        let mut h = harness();
        h.app.recent_tabs = vec![
            observed("https://a.example", "A"),
            observed("https://b.example", "B"),
        ];
        h.app.cursor = 1;
        h.app.archive_at_cursor();

        assert_eq!(h.app.recent_tabs.len(), 1);
        assert_eq!(h.app.recent_tabs[0].url, "https://a.example");
        let commands = drain_commands(&h);
        assert!(matches!(
            &commands[0],
            ArchiveCommand::ArchiveTab { tab } if tab.url == "https://b.example"
        ));
        assert!(matches!(&commands[1], ArchiveCommand::LoadPage { offset: 0, .. }));
    }

    #[test]
    fn forget_removes_from_both_lists_and_resets_pagination() {
        let mut h = harness();
        h.app.recent_tabs = vec![observed("https://a.example", "A")];
        h.app.archived = vec![record("https://a.example", 1), record("https://b.example", 2)];
        h.app.forget_at_cursor();

        assert!(h.app.recent_tabs.is_empty());
        assert_eq!(h.app.archived.len(), 1);
        let commands = drain_commands(&h);
        assert!(matches!(
            &commands[0],
            ArchiveCommand::ForgetTabs { urls } if urls == &vec!["https://a.example".to_string()]
        ));
        assert!(matches!(&commands[1], ArchiveCommand::LoadPage { offset: 0, .. }));
    }

    #[test]
    fn selection_toggle_is_idempotent_per_url() {
        let mut h = harness();
        h.app.recent_tabs = vec![observed("https://a.example", "A")];
        h.app.toggle_selected();
        assert!(h.app.selection.contains("https://a.example"));
        h.app.toggle_selected();
        assert!(h.app.selection.is_empty());
    }

    #[test]
    fn batch_forget_clears_selection() {
        let mut h = harness();
        h.app.pane = Pane::Archived;
        h.app.archived = (0..4).map(|i| record(&format!("https://t{i}.example"), i)).collect();
        h.app.selection.insert("https://t1.example".into());
        h.app.selection.insert("https://t3.example".into());

        h.app.forget_selected();

        assert!(h.app.selection.is_empty());
        assert_eq!(h.app.archived.len(), 2);
        let commands = drain_commands(&h);
        assert!(matches!(
            &commands[0],
            ArchiveCommand::ForgetTabs { urls } if urls.len() == 2
        ));
    }

    #[test]
    fn batch_archive_only_touches_selected_tabs() {
        let mut h = harness();
        h.app.recent_tabs = vec![
            observed("https://a.example", "A"),
            observed("https://b.example", "B"),
            observed("https://c.example", "C"),
        ];
        h.app.selection.insert("https://a.example".into());
        h.app.selection.insert("https://c.example".into());

        h.app.archive_selected();

        assert_eq!(h.app.recent_tabs.len(), 1);
        assert_eq!(h.app.recent_tabs[0].url, "https://b.example");
        assert!(h.app.selection.is_empty());
        let archived: Vec<String> = drain_commands(&h)
            .into_iter()
            .filter_map(|c| match c {
                ArchiveCommand::ArchiveTab { tab } => Some(tab.url),
                _ => None,
            })
            .collect();
        assert_eq!(archived.len(), 2);
        assert!(archived.contains(&"https://a.example".to_string()));
        assert!(archived.contains(&"https://c.example".to_string()));
    }

    #[test]
    fn load_more_continues_after_current_window() {
        let mut h = harness();
        h.event_tx
            .send(ArchiveEvent::Page {
                offset: 0,
                items: (0..20).map(|i| record(&format!("https://t{i}.example"), i)).collect(),
                has_more: true,
            })
            .unwrap();
        h.app.drain_events();
        h.app.load_more();

        let commands = drain_commands(&h);
        assert!(matches!(
            &commands[0],
            ArchiveCommand::LoadPage { offset: 20, limit: 20 }
        ));

        h.event_tx
            .send(ArchiveEvent::Page {
                offset: 20,
                items: vec![record("https://t20.example", 20)],
                has_more: false,
            })
            .unwrap();
        h.app.drain_events();
        assert_eq!(h.app.archived.len(), 21);
        assert!(!h.app.has_more);
    }

    #[test]
    fn load_more_is_a_no_op_without_more_pages() {
        let mut h = harness();
        h.app.load_more();
        assert!(drain_commands(&h).is_empty());
    }

    #[test]
    fn unreachable_background_degrades_to_empty_view() {
        let mut h = harness();
        drop(h.command_rx);
        assert!(matches!(
            h.app.signal_ready(),
            Err(HandshakeError::Unreachable)
        ));
        assert!(h.app.recent_tabs.is_empty());
        assert!(h.app.running);
        assert!(h.app.status_message.is_some());
    }

    #[test]
    fn switching_panes_drops_selection() {
        let mut h = harness();
        h.app.recent_tabs = vec![observed("https://a.example", "A")];
        h.app.toggle_selected();
        h.app.switch_pane();
        assert_eq!(h.app.pane, Pane::Archived);
        assert!(h.app.selection.is_empty());
    }
}
