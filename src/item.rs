use crate::dispatch::Verb;
use crate::input::Action;
use crate::model::{LifecycleState, ResourceTab};
use crate::resource_view::{ResourceView, ViewOutcome};
use serde::Serialize;

pub trait Resource: Clone + Serialize + Sized {
    const TAB: ResourceTab;
    const VERBS: &'static [Verb];

    fn identity(&self) -> &str;

    fn display_name(&self) -> String;

    fn lifecycle(&self) -> LifecycleState;

    fn set_lifecycle(&mut self, _state: LifecycleState) {}

    fn description(&self) -> String;

    fn tab_action(_view: &mut ResourceView<Self>, _action: &Action) -> Option<ViewOutcome> {
        None
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tone {
    Primary,
    Text,
    Muted,
    Selected,
    Success,
    Warning,
    Error,
}

impl Tone {
    pub fn for_state(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Running | LifecycleState::InUse => Self::Success,
            LifecycleState::Paused | LifecycleState::Restarting | LifecycleState::Created => {
                Self::Warning
            }
            LifecycleState::Dead => Self::Error,
            LifecycleState::Exited | LifecycleState::Unused | LifecycleState::Unknown => {
                Self::Muted
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Glyphs {
    pub selected: &'static str,
    pub unselected: &'static str,
    pub spinner: &'static [&'static str],
    nerd_fonts: bool,
}

const NERD_SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ASCII_SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

impl Glyphs {
    pub fn new(no_nerd_fonts: bool) -> Self {
        if no_nerd_fonts {
            Self {
                selected: "[x]",
                unselected: "[ ]",
                spinner: &ASCII_SPINNER,
                nerd_fonts: false,
            }
        } else {
            Self {
                selected: "󰄲",
                unselected: "󰄱",
                spinner: &NERD_SPINNER,
                nerd_fonts: true,
            }
        }
    }

    pub fn spinner_frame(&self, frame: usize) -> &'static str {
        if self.spinner.is_empty() {
            return "*";
        }
        self.spinner[frame % self.spinner.len()]
    }

    pub fn ornament(&self, tab: ResourceTab) -> &'static str {
        if !self.nerd_fonts {
            return "";
        }
        match tab {
            ResourceTab::Containers => "󰡨",
            ResourceTab::Images => "",
            ResourceTab::Volumes => "󰋊",
            ResourceTab::Networks => "󰛳",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ItemTitle {
    pub marker: String,
    pub marker_tone: Tone,
    pub label: String,
    pub label_tone: Tone,
}

#[derive(Debug, Clone)]
pub struct ResourceItem<T> {
    pub record: T,
    pub selected: bool,
    pub working: bool,
}

impl<T: Resource> ResourceItem<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            selected: false,
            working: false,
        }
    }

    pub fn identity(&self) -> &str {
        self.record.identity()
    }

    pub fn title(&self, glyphs: &Glyphs, frame: usize) -> ItemTitle {
        let (marker, marker_tone) = if self.working {
            (glyphs.spinner_frame(frame), Tone::Primary)
        } else if self.selected {
            (glyphs.selected, Tone::Selected)
        } else {
            (glyphs.unselected, Tone::Text)
        };

        let ornament = glyphs.ornament(T::TAB);
        let label = if ornament.is_empty() {
            self.record.display_name()
        } else {
            format!("{ornament} {}", self.record.display_name())
        };

        ItemTitle {
            marker: marker.to_string(),
            marker_tone,
            label,
            label_tone: Tone::for_state(self.record.lifecycle()),
        }
    }

    pub fn description(&self) -> String {
        self.record.description()
    }
}

#[cfg(test)]
mod tests {
    use super::{Glyphs, ResourceItem, Tone};
    use crate::model::{ContainerRecord, ImageRecord, LifecycleState};

    fn container(id: &str, state: LifecycleState) -> ContainerRecord {
        ContainerRecord {
            id: id.to_string(),
            name: "web".to_string(),
            image: "nginx:latest".to_string(),
            image_id: "sha256:abc".to_string(),
            state,
            status: String::new(),
            ports: Vec::new(),
            mounts: Vec::new(),
            networks: Vec::new(),
            created: "-".to_string(),
        }
    }

    fn image(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            tags: Vec::new(),
            size: "1MB".to_string(),
            created: "-".to_string(),
            used_by: Vec::new(),
        }
    }

    #[test]
    fn spinner_takes_priority_over_selection_glyph() {
        let glyphs = Glyphs::new(true);
        let mut item = ResourceItem::new(container("abc", LifecycleState::Running));
        item.selected = true;
        assert_eq!(item.title(&glyphs, 0).marker, "[x]");

        item.working = true;
        let title = item.title(&glyphs, 1);
        assert_eq!(title.marker, "/");
        assert_eq!(title.marker_tone, Tone::Primary);
    }

    #[test]
    fn title_is_pure_over_state_selection_and_work() {
        let glyphs = Glyphs::new(true);
        let item = ResourceItem::new(container("abc", LifecycleState::Paused));
        assert_eq!(item.title(&glyphs, 3), item.title(&glyphs, 3));
        let title = item.title(&glyphs, 0);
        assert_eq!(title.marker, "[ ]");
        assert_eq!(title.label, "web");
        assert_eq!(title.label_tone, Tone::Warning);
    }

    #[test]
    fn nerd_font_titles_carry_an_ornament() {
        let glyphs = Glyphs::new(false);
        let item = ResourceItem::new(container("abc", LifecycleState::Exited));
        let title = item.title(&glyphs, 0);
        assert!(title.label.ends_with(" web"));
        assert_eq!(title.label_tone, Tone::Muted);
    }

    #[test]
    fn description_handles_short_identities() {
        let short = ResourceItem::new(image("abc"));
        assert_eq!(short.description(), "abc · 1MB · unused");
        let long = ResourceItem::new(image("sha256:0123456789abcdef0123"));
        assert_eq!(long.description(), "0123456789ab · 1MB · unused");
    }
}
