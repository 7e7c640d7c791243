use crate::app::InputMode;
use crate::dispatch::Verb;
use crate::input::Action;
use std::collections::{BTreeMap, VecDeque};

const FIELD_CHAR_LIMIT: usize = 256;
const LOG_LINE_CAP: usize = 5_000;

pub type Validator = fn(&str) -> Result<(), String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    Dispatch { verb: Verb, targets: Vec<String> },
    PullImage,
    CreateContainer { image: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub action: OverlayAction,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Pending,
    Closed,
    Confirmed(Confirmation),
}

#[derive(Debug, Clone)]
pub enum Overlay {
    Confirm(ConfirmDialog),
    Form(FormDialog),
    Logs(LogViewer),
}

impl Overlay {
    pub fn mode(&self) -> InputMode {
        match self {
            Self::Confirm(_) => InputMode::Dialog,
            Self::Form(_) => InputMode::Form,
            Self::Logs(_) => InputMode::Logs,
        }
    }

    pub fn handle(&mut self, action: &Action) -> OverlayEvent {
        match self {
            Self::Confirm(dialog) => dialog.handle(action),
            Self::Form(dialog) => dialog.handle(action),
            Self::Logs(viewer) => viewer.handle(action),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub label: String,
    pub action: Option<OverlayAction>,
    pub danger: bool,
}

impl DialogButton {
    pub fn dismiss(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: None,
            danger: false,
        }
    }

    pub fn danger(label: impl Into<String>, action: OverlayAction) -> Self {
        Self {
            label: label.into(),
            action: Some(action),
            danger: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    buttons: Vec<DialogButton>,
    selected: usize,
}

impl ConfirmDialog {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        buttons: Vec<DialogButton>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons,
            selected: 0,
        }
    }

    pub fn notice(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, vec![DialogButton::dismiss("OK")])
    }

    pub fn buttons(&self) -> &[DialogButton] {
        &self.buttons
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn step(&mut self, forward: bool) {
        let count = self.buttons.len();
        if count == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }

    pub fn handle(&mut self, action: &Action) -> OverlayEvent {
        match action {
            Action::Right | Action::NextField => {
                self.step(true);
                OverlayEvent::Pending
            }
            Action::Left | Action::PrevField => {
                self.step(false);
                OverlayEvent::Pending
            }
            Action::SubmitInput => match self
                .buttons
                .get(self.selected)
                .and_then(|button| button.action.clone())
            {
                Some(action) => OverlayEvent::Confirmed(Confirmation {
                    action,
                    values: BTreeMap::new(),
                }),
                None => OverlayEvent::Closed,
            },
            Action::CancelInput => OverlayEvent::Closed,
            _ => OverlayEvent::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub validator: Option<Validator>,
    pub value: String,
}

impl FormField {
    pub fn new(label: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: placeholder.into(),
            required: false,
            validator: None,
            value: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn validated(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FormDialog {
    pub title: String,
    fields: Vec<FormField>,
    focused: usize,
    action: OverlayAction,
    error: Option<String>,
}

impl FormDialog {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>, action: OverlayAction) -> Self {
        Self {
            title: title.into(),
            fields,
            focused: 0,
            action,
            error: None,
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn step(&mut self, forward: bool) {
        let count = self.fields.len();
        if count == 0 {
            return;
        }
        self.focused = if forward {
            (self.focused + 1) % count
        } else {
            (self.focused + count - 1) % count
        };
        self.error = None;
    }

    pub fn validate(&self) -> Result<(), String> {
        for field in &self.fields {
            let value = field.value.trim();
            if value.is_empty() {
                if field.required {
                    return Err(format!("{} is required", field.label));
                }
                continue;
            }
            if let Some(validator) = field.validator {
                validator(&field.value).map_err(|reason| format!("{}: {reason}", field.label))?;
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, action: &Action) -> OverlayEvent {
        match action {
            Action::CancelInput => OverlayEvent::Closed,
            Action::NextField | Action::Down => {
                self.step(true);
                OverlayEvent::Pending
            }
            Action::PrevField | Action::Up => {
                self.step(false);
                OverlayEvent::Pending
            }
            Action::SubmitInput => match self.validate() {
                Ok(()) => OverlayEvent::Confirmed(Confirmation {
                    action: self.action.clone(),
                    values: self
                        .fields
                        .iter()
                        .map(|field| (field.label.clone(), field.value.clone()))
                        .collect(),
                }),
                Err(message) => {
                    self.error = Some(message);
                    OverlayEvent::Pending
                }
            },
            Action::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    field.value.pop();
                }
                OverlayEvent::Pending
            }
            Action::InputChar(ch) => {
                if let Some(field) = self.fields.get_mut(self.focused)
                    && field.value.chars().count() < FIELD_CHAR_LIMIT
                {
                    field.value.push(*ch);
                }
                OverlayEvent::Pending
            }
            _ => OverlayEvent::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogViewer {
    pub container_id: String,
    pub title: String,
    lines: VecDeque<String>,
    follow: bool,
    top: usize,
    viewport: usize,
    ended: Option<String>,
}

impl LogViewer {
    pub fn new(container_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            title: title.into(),
            lines: VecDeque::new(),
            follow: true,
            top: 0,
            viewport: 1,
            ended: None,
        }
    }

    pub fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        if self.lines.len() > LOG_LINE_CAP {
            self.lines.pop_front();
            if !self.follow {
                self.top = self.top.saturating_sub(1);
            }
        }
    }

    pub fn mark_ended(&mut self, reason: impl Into<String>) {
        self.ended = Some(reason.into());
    }

    pub fn ended(&self) -> Option<&str> {
        self.ended.as_deref()
    }

    pub fn following(&self) -> bool {
        self.follow
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn set_viewport(&mut self, height: usize) {
        self.viewport = height.max(1);
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport)
    }

    pub fn visible_top(&self) -> usize {
        if self.follow {
            self.max_top()
        } else {
            self.top.min(self.max_top())
        }
    }

    pub fn visible_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(self.visible_top())
            .take(self.viewport)
            .map(String::as_str)
    }

    fn scroll_up(&mut self, amount: usize) {
        self.top = self.visible_top().saturating_sub(amount);
        self.follow = false;
    }

    fn scroll_down(&mut self, amount: usize) {
        let target = self.visible_top() + amount;
        if target >= self.max_top() {
            self.follow = true;
        } else {
            self.top = target;
        }
    }

    pub fn handle(&mut self, action: &Action) -> OverlayEvent {
        let page = self.viewport.saturating_sub(1).max(1);
        match action {
            Action::CancelInput => return OverlayEvent::Closed,
            Action::Up => self.scroll_up(1),
            Action::Down => self.scroll_down(1),
            Action::PageUp => self.scroll_up(page),
            Action::PageDown => self.scroll_down(page),
            Action::Top => {
                self.top = 0;
                self.follow = false;
            }
            Action::Bottom => self.follow = true,
            _ => {}
        }
        OverlayEvent::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfirmDialog, DialogButton, FormDialog, FormField, LogViewer, OverlayAction, OverlayEvent,
    };
    use crate::dispatch::Verb;
    use crate::input::Action;
    use std::collections::BTreeMap;

    fn remove_action() -> OverlayAction {
        OverlayAction::Dispatch {
            verb: Verb::Remove,
            targets: vec!["a".to_string()],
        }
    }

    fn not_latest(value: &str) -> Result<(), String> {
        if value.ends_with(":latest") {
            Err("pin a tag".to_string())
        } else {
            Ok(())
        }
    }

    #[test]
    fn n_right_presses_return_to_start() {
        let mut dialog = ConfirmDialog::new(
            "Remove",
            "sure?",
            vec![
                DialogButton::dismiss("Cancel"),
                DialogButton::dismiss("Later"),
                DialogButton::danger("Remove", remove_action()),
            ],
        );
        let start = dialog.selected();
        for _ in 0..dialog.buttons().len() {
            assert_eq!(dialog.handle(&Action::Right), OverlayEvent::Pending);
        }
        assert_eq!(dialog.selected(), start);
        dialog.handle(&Action::Left);
        assert_eq!(dialog.selected(), 2);
    }

    #[test]
    fn enter_on_actionless_button_or_esc_closes() {
        let mut dialog = ConfirmDialog::new(
            "Remove",
            "sure?",
            vec![
                DialogButton::dismiss("Cancel"),
                DialogButton::danger("Remove", remove_action()),
            ],
        );
        assert_eq!(dialog.handle(&Action::SubmitInput), OverlayEvent::Closed);
        dialog.handle(&Action::NextField);
        match dialog.handle(&Action::SubmitInput) {
            OverlayEvent::Confirmed(confirmation) => {
                assert_eq!(confirmation.action, remove_action());
                assert!(confirmation.values.is_empty());
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert_eq!(dialog.handle(&Action::CancelInput), OverlayEvent::Closed);
    }

    #[test]
    fn empty_button_row_never_panics() {
        let mut dialog = ConfirmDialog::new("Pulling", "wait", Vec::new());
        assert_eq!(dialog.handle(&Action::Right), OverlayEvent::Pending);
        assert_eq!(dialog.handle(&Action::SubmitInput), OverlayEvent::Closed);
    }

    #[test]
    fn required_field_blocks_then_confirms_once() {
        let mut form = FormDialog::new(
            "Pull Image",
            vec![FormField::new("Image", "nginx:latest").required()],
            OverlayAction::PullImage,
        );
        assert_eq!(form.handle(&Action::SubmitInput), OverlayEvent::Pending);
        let error = form.error().unwrap_or_default().to_string();
        assert!(!error.is_empty());
        assert!(error.contains("Image"));

        for ch in "redis".chars() {
            form.handle(&Action::InputChar(ch));
        }
        let mut confirmations = Vec::new();
        if let OverlayEvent::Confirmed(confirmation) = form.handle(&Action::SubmitInput) {
            confirmations.push(confirmation);
        }
        assert_eq!(confirmations.len(), 1);
        assert_eq!(
            confirmations[0].values,
            BTreeMap::from([("Image".to_string(), "redis".to_string())])
        );
        assert_eq!(confirmations[0].action, OverlayAction::PullImage);
    }

    #[test]
    fn first_failure_wins_and_field_change_clears_it() {
        let mut form = FormDialog::new(
            "Create",
            vec![
                FormField::new("Image", "").validated(not_latest),
                FormField::new("Name", "").required(),
            ],
            OverlayAction::PullImage,
        );
        for ch in "nginx:latest".chars() {
            form.handle(&Action::InputChar(ch));
        }
        form.handle(&Action::SubmitInput);
        assert_eq!(form.error(), Some("Image: pin a tag"));

        form.handle(&Action::NextField);
        assert_eq!(form.error(), None);
        assert_eq!(form.focused(), 1);
        form.handle(&Action::NextField);
        assert_eq!(form.focused(), 0);
        form.handle(&Action::PrevField);
        assert_eq!(form.focused(), 1);
    }

    #[test]
    fn optional_empty_fields_skip_validators() {
        let form = FormDialog::new(
            "Create",
            vec![FormField::new("Ports", "").validated(|_| Err("bad".to_string()))],
            OverlayAction::PullImage,
        );
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn log_viewer_follows_until_scrolled() {
        let mut viewer = LogViewer::new("abc", "logs");
        viewer.set_viewport(3);
        for index in 0..10 {
            viewer.push_line(format!("line {index}"));
        }
        assert!(viewer.following());
        assert_eq!(viewer.visible_top(), 7);

        viewer.handle(&Action::Up);
        assert!(!viewer.following());
        assert_eq!(viewer.visible_top(), 6);
        viewer.push_line("line 10".to_string());
        assert_eq!(viewer.visible_top(), 6);

        viewer.handle(&Action::Bottom);
        assert!(viewer.following());
        assert_eq!(viewer.visible_top(), 8);
        assert_eq!(
            viewer.visible_lines().collect::<Vec<_>>(),
            vec!["line 8", "line 9", "line 10"]
        );
        assert_eq!(viewer.handle(&Action::Quit), OverlayEvent::Pending);
        assert_eq!(viewer.handle(&Action::CancelInput), OverlayEvent::Closed);
    }
}
