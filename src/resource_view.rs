use crate::app::{AppCommand, InputMode};
use crate::dispatch::{self, DispatchError, OperationOutcome, PendingOperation, Verb};
use crate::forms::{ContainerSpec, IMAGE_FIELD};
use crate::input::Action;
use crate::item::{Glyphs, ItemTitle, Resource, ResourceItem};
use crate::model::ResourceTab;
use crate::notifications::Notification;
use crate::overlay::{
    Confirmation, ConfirmDialog, DialogButton, Overlay, OverlayAction, OverlayEvent,
};
use crate::selection::SelectionSet;
use crate::split_view::{FocusState, Routed, SplitEvent, SplitView};
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};

// Share of the body height used by the log overlay.
pub const LOG_OVERLAY_PERCENT: u16 = 90;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    None,
    Command(AppCommand),
    Notify(Notification),
    FocusChanged(FocusState),
    Unhandled(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub title: ItemTitle,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub tab: ResourceTab,
    pub rows: Vec<RowView>,
    pub cursor: Option<usize>,
    pub focus: FocusState,
    pub list_outer_width: u16,
    pub detail: String,
    pub detail_scroll: u16,
    pub filter_query: String,
    pub filtering: bool,
    pub total: usize,
    pub selected: usize,
    pub loaded: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<String>,
}

pub trait TabView {
    fn input_mode(&self) -> InputMode;
    fn handle(&mut self, action: Action) -> ViewOutcome;
    fn resize(&mut self, width: u16, height: u16);
    fn complete(&mut self, outcome: &OperationOutcome) -> Option<Notification>;
    fn set_error(&mut self, error: String);
    fn view_state(&self, glyphs: &Glyphs, frame: usize) -> ViewState;
    fn overlay(&self) -> Option<&Overlay>;
    fn overlay_mut(&mut self) -> Option<&mut Overlay>;
}

#[derive(Debug, Clone, Default)]
struct FilterState {
    query: String,
    capturing: bool,
}

#[derive(Debug)]
pub struct ResourceView<T: Resource> {
    items: Vec<ResourceItem<T>>,
    selection: SelectionSet,
    split: SplitView,
    overlay: Option<Overlay>,
    cursor: usize,
    filter: FilterState,
    detail_scroll: u16,
    next_operation: u64,
    loaded: bool,
    error: Option<String>,
    refreshed_at: Option<DateTime<Local>>,
}

impl<T: Resource> Default for ResourceView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> ResourceView<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selection: SelectionSet::new(),
            split: SplitView::new(),
            overlay: None,
            cursor: 0,
            filter: FilterState::default(),
            detail_scroll: 0,
            next_operation: 0,
            loaded: false,
            error: None,
            refreshed_at: None,
        }
    }

    pub fn items(&self) -> &[ResourceItem<T>] {
        &self.items
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|item| &item.record)
    }

    pub fn update_records(&mut self, mut update: impl FnMut(&mut T)) {
        for item in &mut self.items {
            update(&mut item.record);
        }
    }

    /// Replaces the list with a fresh fetch. Selection and working flags
    /// follow identities; everything else comes from the new records.
    pub fn set_records(&mut self, records: Vec<T>) {
        let carried = self
            .items
            .iter()
            .map(|item| (item.identity().to_string(), (item.selected, item.working)))
            .collect::<HashMap<_, _>>();
        let cursor_id = self.cursor_item().map(|item| item.identity().to_string());

        self.items = records
            .into_iter()
            .map(|record| {
                let mut item = ResourceItem::new(record);
                if let Some((selected, working)) = carried.get(item.identity()) {
                    item.selected = *selected;
                    item.working = *working;
                }
                item
            })
            .collect();
        self.resync_selection();

        let visible = self.visible_indices();
        self.cursor = cursor_id
            .and_then(|id| {
                visible
                    .iter()
                    .position(|index| self.items[*index].identity() == id)
            })
            .unwrap_or(self.cursor);
        self.clamp_cursor();

        self.loaded = true;
        self.error = None;
        self.refreshed_at = Some(Local::now());
    }

    fn resync_selection(&mut self) {
        let mapping = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.selected)
            .map(|(index, item)| (item.identity().to_string(), index))
            .collect::<HashMap<_, _>>();
        self.selection.bulk_set(mapping);
    }

    fn visible_indices(&self) -> Vec<usize> {
        let query = self.filter.query.trim().to_lowercase();
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                query.is_empty() || item.record.display_name().to_lowercase().contains(&query)
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn clamp_cursor(&mut self) {
        let visible = self.visible_indices().len();
        self.cursor = self.cursor.min(visible.saturating_sub(1));
    }

    fn cursor_index(&self) -> Option<usize> {
        self.visible_indices().get(self.cursor).copied()
    }

    pub fn cursor_item(&self) -> Option<&ResourceItem<T>> {
        self.cursor_index().and_then(|index| self.items.get(index))
    }

    fn move_cursor(&mut self, delta: isize) {
        let visible = self.visible_indices().len();
        if visible == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, visible as isize - 1) as usize;
        self.detail_scroll = 0;
    }

    fn list_page(&self) -> isize {
        // Each row takes two lines: title and description.
        (self.split.list_pane().height / 2).max(1) as isize
    }

    pub fn open_overlay(&mut self, overlay: Overlay) {
        self.split.reset_focus();
        self.overlay = Some(overlay);
        self.sync_log_viewport();
    }

    fn close_overlay(&mut self) -> ViewOutcome {
        match self.overlay.take() {
            Some(Overlay::Logs(viewer)) => ViewOutcome::Command(AppCommand::StopLogs {
                container_id: viewer.container_id,
            }),
            _ => ViewOutcome::None,
        }
    }

    fn sync_log_viewport(&mut self) {
        let (_, height) = self.split.size();
        if let Some(Overlay::Logs(viewer)) = self.overlay.as_mut() {
            let inner = (u32::from(height) * u32::from(LOG_OVERLAY_PERCENT) / 100) as usize;
            viewer.set_viewport(inner.saturating_sub(2));
        }
    }

    pub fn target_ids(&self) -> Vec<String> {
        if self.selection.count() == 0 {
            return self
                .cursor_item()
                .map(|item| vec![item.identity().to_string()])
                .unwrap_or_default();
        }
        let mut indices = self.selection.selected_indices().into_iter().collect::<Vec<_>>();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| self.items.get(index))
            .filter(|item| self.selection.is_selected(item.identity()))
            .map(|item| item.identity().to_string())
            .collect()
    }

    fn names_of(&self, targets: &[String]) -> Vec<String> {
        let wanted = targets.iter().map(String::as_str).collect::<HashSet<_>>();
        self.items
            .iter()
            .filter(|item| wanted.contains(item.identity()))
            .map(|item| item.record.display_name())
            .collect()
    }

    fn busy_target(&self, targets: &[String]) -> Option<String> {
        let wanted = targets.iter().map(String::as_str).collect::<HashSet<_>>();
        self.items
            .iter()
            .find(|item| item.working && wanted.contains(item.identity()))
            .map(|item| item.record.display_name())
    }

    pub fn toggle_selection(&mut self) {
        let Some(index) = self.cursor_index() else {
            return;
        };
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        if item.working {
            return;
        }
        item.selected = self.selection.toggle(item.record.identity(), index);
    }

    pub fn toggle_select_all(&mut self) {
        let selected = self.selection.selected_ids();
        let all_idle_selected = self
            .items
            .iter()
            .filter(|item| !item.working)
            .all(|item| selected.contains(item.identity()));

        if all_idle_selected {
            self.selection.clear();
            for item in &mut self.items {
                item.selected = false;
            }
            return;
        }

        for (index, item) in self.items.iter_mut().enumerate() {
            if item.working {
                self.selection.unselect(item.record.identity());
            } else {
                self.selection.select(item.record.identity(), index);
            }
            item.selected = !item.working;
        }
    }

    pub fn dispatch(&mut self, verb: Verb, targets: Vec<String>) -> ViewOutcome {
        match dispatch::begin(&mut self.items, verb, &targets) {
            Ok(()) => {
                self.next_operation += 1;
                let existing = self.existing(targets);
                ViewOutcome::Command(AppCommand::RunOperation(PendingOperation {
                    id: self.next_operation,
                    tab: T::TAB,
                    verb,
                    targets: existing,
                }))
            }
            Err(error) => ViewOutcome::Notify(Notification::warning(error.to_string())),
        }
    }

    fn existing(&self, targets: Vec<String>) -> Vec<String> {
        let present = self
            .items
            .iter()
            .map(|item| item.identity())
            .collect::<HashSet<_>>();
        targets
            .into_iter()
            .filter(|id| present.contains(id.as_str()))
            .collect()
    }

    pub fn confirm_removal(&mut self) -> ViewOutcome {
        let targets = self.target_ids();
        if targets.is_empty() {
            return ViewOutcome::Notify(Notification::warning(
                DispatchError::NoTargets.to_string(),
            ));
        }
        if let Some(name) = self.busy_target(&targets) {
            return ViewOutcome::Notify(Notification::warning(
                DispatchError::AlreadyWorking(name).to_string(),
            ));
        }

        let noun = T::TAB.noun();
        let names = self.names_of(&targets);
        let message = match names.as_slice() {
            [single] => format!("Are you sure you want to remove {noun} {single}?"),
            many => format!(
                "Are you sure you want to remove {} {noun}s?\n\n{}",
                many.len(),
                many.join("\n")
            ),
        };
        self.open_overlay(Overlay::Confirm(ConfirmDialog::new(
            format!("Remove {noun}"),
            message,
            vec![
                DialogButton::dismiss("Cancel"),
                DialogButton::danger(
                    "Remove",
                    OverlayAction::Dispatch {
                        verb: Verb::Remove,
                        targets,
                    },
                ),
            ],
        )));
        ViewOutcome::None
    }

    fn confirm(&mut self, confirmation: Confirmation) -> ViewOutcome {
        match confirmation.action {
            OverlayAction::Dispatch { verb, targets } => {
                let targets = self.existing(targets);
                self.dispatch(verb, targets)
            }
            OverlayAction::PullImage => {
                let reference = confirmation
                    .values
                    .get(IMAGE_FIELD)
                    .map(|value| value.trim().to_string())
                    .unwrap_or_default();
                ViewOutcome::Command(AppCommand::PullImage { reference })
            }
            OverlayAction::CreateContainer { image } => ViewOutcome::Command(
                AppCommand::CreateContainer(ContainerSpec::from_form(&image, &confirmation.values)),
            ),
        }
    }

    fn handle_filter_input(&mut self, action: Action) -> ViewOutcome {
        match action {
            Action::InputChar(ch) => {
                self.filter.query.push(ch);
                self.cursor = 0;
            }
            Action::Backspace => {
                self.filter.query.pop();
                self.clamp_cursor();
            }
            Action::SubmitInput => self.filter.capturing = false,
            Action::CancelInput => {
                self.filter = FilterState::default();
                self.clamp_cursor();
            }
            Action::Up => self.move_cursor(-1),
            Action::Down => self.move_cursor(1),
            _ => {}
        }
        ViewOutcome::None
    }

    fn handle_list_action(&mut self, action: Action) -> ViewOutcome {
        if let Some(outcome) = T::tab_action(self, &action) {
            return outcome;
        }

        match action {
            Action::Up => self.move_cursor(-1),
            Action::Down => self.move_cursor(1),
            Action::PageUp => self.move_cursor(-self.list_page()),
            Action::PageDown => self.move_cursor(self.list_page()),
            Action::Top => self.move_cursor(isize::MIN / 2),
            Action::Bottom => self.move_cursor(isize::MAX / 2),
            Action::ToggleSelect => self.toggle_selection(),
            Action::ToggleSelectAll => self.toggle_select_all(),
            Action::StartFilter => self.filter.capturing = true,
            Action::CancelInput if !self.filter.query.is_empty() => {
                self.filter = FilterState::default();
                self.clamp_cursor();
            }
            Action::Pause | Action::Unpause | Action::Start | Action::Stop => {
                let verb = match action {
                    Action::Pause => Verb::Pause,
                    Action::Unpause => Verb::Unpause,
                    Action::Start => Verb::Start,
                    _ => Verb::Stop,
                };
                if !T::VERBS.contains(&verb) {
                    return ViewOutcome::Unhandled(action);
                }
                let targets = self.target_ids();
                return self.dispatch(verb, targets);
            }
            Action::Remove if T::VERBS.contains(&Verb::Remove) => return self.confirm_removal(),
            other => return ViewOutcome::Unhandled(other),
        }
        ViewOutcome::None
    }

    fn handle_detail_action(&mut self, action: Action) -> ViewOutcome {
        let page = self.split.detail_pane().height.max(1);
        match action {
            Action::Up => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            Action::Down => {
                self.detail_scroll = self
                    .detail_scroll
                    .saturating_add(1)
                    .min(self.max_detail_scroll())
            }
            Action::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(page),
            Action::PageDown => {
                self.detail_scroll = self
                    .detail_scroll
                    .saturating_add(page)
                    .min(self.max_detail_scroll())
            }
            Action::Top => self.detail_scroll = 0,
            other => return ViewOutcome::Unhandled(other),
        }
        ViewOutcome::None
    }

    fn max_detail_scroll(&self) -> u16 {
        let lines = self.detail_text().lines().count();
        let height = usize::from(self.split.detail_pane().height);
        u16::try_from(lines.saturating_sub(height)).unwrap_or(u16::MAX)
    }

    fn detail_text(&self) -> String {
        match self.cursor_item() {
            Some(item) => serde_yaml::to_string(&item.record)
                .unwrap_or_else(|error| format!("failed to render details: {error}")),
            None => format!("No {} selected.", T::TAB.noun()),
        }
    }
}

impl<T: Resource> TabView for ResourceView<T> {
    fn input_mode(&self) -> InputMode {
        match &self.overlay {
            Some(overlay) => overlay.mode(),
            None if self.filter.capturing => InputMode::Filter,
            None => InputMode::Normal,
        }
    }

    fn handle(&mut self, action: Action) -> ViewOutcome {
        if let Some(overlay) = self.overlay.as_mut() {
            return match overlay.handle(&action) {
                OverlayEvent::Pending => ViewOutcome::None,
                OverlayEvent::Closed => self.close_overlay(),
                OverlayEvent::Confirmed(confirmation) => {
                    self.overlay = None;
                    self.confirm(confirmation)
                }
            };
        }

        match self
            .split
            .update(SplitEvent::Input(action), self.filter.capturing)
        {
            Routed::Resized => ViewOutcome::None,
            Routed::FocusChanged(focus) => ViewOutcome::FocusChanged(focus),
            Routed::Filter(action) => self.handle_filter_input(action),
            Routed::List(action) => self.handle_list_action(action),
            Routed::Detail(action) => self.handle_detail_action(action),
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.split
            .update(SplitEvent::Resize { width, height }, self.filter.capturing);
        self.sync_log_viewport();
    }

    fn complete(&mut self, outcome: &OperationOutcome) -> Option<Notification> {
        let notification = dispatch::complete(&mut self.items, outcome);
        self.resync_selection();
        self.clamp_cursor();
        notification
    }

    fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    fn view_state(&self, glyphs: &Glyphs, frame: usize) -> ViewState {
        let rows = self
            .visible_indices()
            .into_iter()
            .filter_map(|index| self.items.get(index))
            .map(|item| RowView {
                title: item.title(glyphs, frame),
                description: item.description(),
            })
            .collect::<Vec<_>>();
        let cursor = (!rows.is_empty()).then_some(self.cursor);

        ViewState {
            tab: T::TAB,
            rows,
            cursor,
            focus: self.split.focus(),
            list_outer_width: self.split.list_outer_width(),
            detail: self.detail_text(),
            detail_scroll: self.detail_scroll,
            filter_query: self.filter.query.clone(),
            filtering: self.filter.capturing,
            total: self.items.len(),
            selected: self.selection.count(),
            loaded: self.loaded,
            error: self.error.clone(),
            refreshed_at: self
                .refreshed_at
                .map(|at| at.format("%H:%M:%S").to_string()),
        }
    }

    fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    fn overlay_mut(&mut self) -> Option<&mut Overlay> {
        self.overlay.as_mut()
    }
}
