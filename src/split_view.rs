use crate::input::Action;

// Share of the width given to the list pane.
const LIST_PERCENT: u16 = 45;
// List pane: border only. Detail pane: border plus one column of padding each side.
const LIST_CHROME: (u16, u16) = (2, 2);
const DETAIL_CHROME: (u16, u16) = (4, 2);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusState {
    List,
    Detail,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PaneSize {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitEvent {
    Resize { width: u16, height: u16 },
    Input(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Resized,
    FocusChanged(FocusState),
    Filter(Action),
    List(Action),
    Detail(Action),
}

#[derive(Debug, Clone)]
pub struct SplitView {
    focus: FocusState,
    width: u16,
    height: u16,
    list: PaneSize,
    detail: PaneSize,
}

impl Default for SplitView {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitView {
    pub fn new() -> Self {
        Self {
            focus: FocusState::List,
            width: 0,
            height: 0,
            list: PaneSize::default(),
            detail: PaneSize::default(),
        }
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn list_pane(&self) -> PaneSize {
        self.list
    }

    pub fn detail_pane(&self) -> PaneSize {
        self.detail
    }

    pub fn list_outer_width(&self) -> u16 {
        split_width(self.width).0
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;

        let (list_width, detail_width) = split_width(width);
        self.list = PaneSize {
            width: list_width.saturating_sub(LIST_CHROME.0),
            height: height.saturating_sub(LIST_CHROME.1),
        };
        self.detail = PaneSize {
            width: detail_width.saturating_sub(DETAIL_CHROME.0),
            height: height.saturating_sub(DETAIL_CHROME.1),
        };
    }

    pub fn reset_focus(&mut self) -> Option<FocusState> {
        if self.focus == FocusState::List {
            return None;
        }
        self.focus = FocusState::List;
        Some(self.focus)
    }

    pub fn update(&mut self, event: SplitEvent, filtering: bool) -> Routed {
        match event {
            SplitEvent::Resize { width, height } => {
                self.set_size(width, height);
                Routed::Resized
            }
            SplitEvent::Input(action) if filtering => Routed::Filter(action),
            SplitEvent::Input(Action::ToggleFocus) => {
                self.focus = match self.focus {
                    FocusState::List => FocusState::Detail,
                    FocusState::Detail => FocusState::List,
                };
                Routed::FocusChanged(self.focus)
            }
            SplitEvent::Input(action) => match self.focus {
                FocusState::List => Routed::List(action),
                FocusState::Detail => Routed::Detail(action),
            },
        }
    }
}

fn split_width(width: u16) -> (u16, u16) {
    let list = ((u32::from(width) * u32::from(LIST_PERCENT)) / 100) as u16;
    (list, width.saturating_sub(list))
}

#[cfg(test)]
mod tests {
    use super::{FocusState, PaneSize, Routed, SplitEvent, SplitView};
    use crate::input::Action;

    #[test]
    fn tab_is_an_exact_two_cycle() {
        let mut view = SplitView::new();
        assert_eq!(view.focus(), FocusState::List);
        for press in 1..=10 {
            let routed = view.update(SplitEvent::Input(Action::ToggleFocus), false);
            let expected = if press % 2 == 1 {
                FocusState::Detail
            } else {
                FocusState::List
            };
            assert_eq!(routed, Routed::FocusChanged(expected));
            assert_eq!(view.focus(), expected);
        }
    }

    #[test]
    fn active_filter_swallows_tab() {
        let mut view = SplitView::new();
        let routed = view.update(SplitEvent::Input(Action::ToggleFocus), true);
        assert_eq!(routed, Routed::Filter(Action::ToggleFocus));
        assert_eq!(view.focus(), FocusState::List);
    }

    #[test]
    fn input_follows_focus() {
        let mut view = SplitView::new();
        assert_eq!(
            view.update(SplitEvent::Input(Action::Down), false),
            Routed::List(Action::Down)
        );
        view.update(SplitEvent::Input(Action::ToggleFocus), false);
        assert_eq!(
            view.update(SplitEvent::Input(Action::Down), false),
            Routed::Detail(Action::Down)
        );
    }

    #[test]
    fn resize_reaches_both_panes_regardless_of_focus() {
        let mut view = SplitView::new();
        view.update(SplitEvent::Input(Action::ToggleFocus), false);
        let routed = view.update(
            SplitEvent::Resize {
                width: 100,
                height: 30,
            },
            false,
        );
        assert_eq!(routed, Routed::Resized);
        assert_eq!(
            view.list_pane(),
            PaneSize {
                width: 43,
                height: 28
            }
        );
        assert_eq!(
            view.detail_pane(),
            PaneSize {
                width: 51,
                height: 28
            }
        );
        assert_eq!(view.focus(), FocusState::Detail);
    }

    #[test]
    fn tiny_sizes_clamp_to_zero() {
        let mut view = SplitView::new();
        view.set_size(3, 1);
        assert_eq!(view.list_pane(), PaneSize::default());
        assert_eq!(view.detail_pane().height, 0);
        assert_eq!(view.detail_pane().width, 0);
    }

    #[test]
    fn reset_focus_reports_only_real_changes() {
        let mut view = SplitView::new();
        assert_eq!(view.reset_focus(), None);
        view.update(SplitEvent::Input(Action::ToggleFocus), false);
        assert_eq!(view.reset_focus(), Some(FocusState::List));
    }
}
