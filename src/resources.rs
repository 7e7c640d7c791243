use crate::app::AppCommand;
use crate::dispatch::{DispatchError, Verb};
use crate::forms;
use crate::input::Action;
use crate::item::Resource;
use crate::model::{
    ContainerRecord, ImageRecord, LifecycleState, NetworkRecord, ResourceTab, VolumeRecord,
    short_id,
};
use crate::notifications::Notification;
use crate::overlay::{ConfirmDialog, LogViewer, Overlay};
use crate::resource_view::{ResourceView, ViewOutcome};

impl Resource for ContainerRecord {
    const TAB: ResourceTab = ResourceTab::Containers;
    const VERBS: &'static [Verb] = &[
        Verb::Pause,
        Verb::Unpause,
        Verb::Start,
        Verb::Stop,
        Verb::Remove,
    ];

    fn identity(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        if self.name.is_empty() {
            short_id(&self.id).to_string()
        } else {
            self.name.clone()
        }
    }

    fn lifecycle(&self) -> LifecycleState {
        self.state
    }

    fn set_lifecycle(&mut self, state: LifecycleState) {
        self.state = state;
    }

    fn description(&self) -> String {
        format!("{} · {}", self.state, self.image)
    }

    fn tab_action(view: &mut ResourceView<Self>, action: &Action) -> Option<ViewOutcome> {
        match action {
            Action::ShowLogs => {
                let item = view.cursor_item()?;
                if item.working {
                    return Some(busy(item.record.display_name()));
                }
                let container_id = item.identity().to_string();
                let name = item.record.display_name();
                view.open_overlay(Overlay::Logs(LogViewer::new(
                    container_id.clone(),
                    format!("Logs: {name}"),
                )));
                Some(ViewOutcome::Command(AppCommand::StreamLogs {
                    container_id,
                    name,
                }))
            }
            Action::OpenShell => {
                let item = view.cursor_item()?;
                let name = item.record.display_name();
                if item.working {
                    return Some(busy(name));
                }
                if item.record.state != LifecycleState::Running {
                    return Some(ViewOutcome::Notify(Notification::warning(format!(
                        "Container {name} is not running"
                    ))));
                }
                Some(ViewOutcome::Command(AppCommand::OpenShell {
                    container_id: item.identity().to_string(),
                    name,
                }))
            }
            _ => None,
        }
    }
}

fn busy(name: String) -> ViewOutcome {
    ViewOutcome::Notify(Notification::warning(
        DispatchError::AlreadyWorking(name).to_string(),
    ))
}

impl Resource for ImageRecord {
    const TAB: ResourceTab = ResourceTab::Images;
    const VERBS: &'static [Verb] = &[Verb::Remove];

    fn identity(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.tags
            .first()
            .cloned()
            .unwrap_or_else(|| short_id(&self.id).to_string())
    }

    fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_usage(!self.used_by.is_empty())
    }

    fn description(&self) -> String {
        format!("{} · {} · {}", short_id(&self.id), self.size, self.lifecycle())
    }

    fn tab_action(view: &mut ResourceView<Self>, action: &Action) -> Option<ViewOutcome> {
        match action {
            Action::PullImage => {
                view.open_overlay(Overlay::Form(forms::pull_image_form()));
                Some(ViewOutcome::None)
            }
            Action::CreateContainer => {
                let item = view.cursor_item()?;
                let form = forms::create_container_form(item.identity(), &item.record.display_name());
                view.open_overlay(Overlay::Form(form));
                Some(ViewOutcome::None)
            }
            Action::Remove => {
                let targets = view.target_ids();
                let blocked = view
                    .items()
                    .iter()
                    .find(|item| {
                        targets.iter().any(|id| id == item.identity())
                            && !item.record.used_by.is_empty()
                    })
                    .map(|item| (item.record.display_name(), item.record.used_by.clone()))?;
                let (image, users) = blocked;
                view.open_overlay(Overlay::Confirm(ConfirmDialog::notice(
                    "Image in use",
                    format!(
                        "Image {image} is used by {} container(s): {}.\nCannot delete.",
                        users.len(),
                        users.join(", ")
                    ),
                )));
                Some(ViewOutcome::None)
            }
            _ => None,
        }
    }
}

impl Resource for VolumeRecord {
    const TAB: ResourceTab = ResourceTab::Volumes;
    const VERBS: &'static [Verb] = &[Verb::Remove];

    fn identity(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_usage(!self.used_by.is_empty())
    }

    fn description(&self) -> String {
        format!("{} · {}", self.driver, self.lifecycle())
    }
}

impl Resource for NetworkRecord {
    const TAB: ResourceTab = ResourceTab::Networks;
    const VERBS: &'static [Verb] = &[Verb::Remove];

    fn identity(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_usage(!self.used_by.is_empty())
    }

    fn description(&self) -> String {
        format!("{} · {} · {}", self.driver, self.scope, self.lifecycle())
    }
}
