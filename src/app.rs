use crate::config::AppConfig;
use crate::dispatch::{OperationOutcome, PendingOperation};
use crate::forms::ContainerSpec;
use crate::input::Action;
use crate::item::Glyphs;
use crate::model::{
    ContainerRecord, ImageRecord, NetworkRecord, ResourceTab, Snapshot, VolumeRecord,
};
use crate::notifications::{Notification, Notifications};
use crate::overlay::{LogViewer, Overlay};
use crate::resource_view::{ResourceView, TabView, ViewOutcome, ViewState};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Dialog,
    Form,
    Logs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Refresh(ResourceTab),
    RefreshAll,
    RunOperation(PendingOperation),
    PullImage {
        reference: String,
    },
    CreateContainer(ContainerSpec),
    StreamLogs {
        container_id: String,
        name: String,
    },
    StopLogs {
        container_id: String,
    },
    OpenShell {
        container_id: String,
        name: String,
    },
}

#[derive(Debug)]
pub enum LoopEvent {
    Refreshed {
        tab: ResourceTab,
        result: Result<Snapshot, String>,
    },
    Operation(OperationOutcome),
    Pulled {
        reference: String,
        result: Result<(), String>,
    },
    Created {
        image: String,
        result: Result<String, String>,
    },
    LogLine {
        container_id: String,
        line: String,
    },
    LogsEnded {
        container_id: String,
        error: Option<String>,
    },
    ShellExited {
        name: String,
        result: Result<(), String>,
    },
}

pub struct App {
    running: bool,
    active_tab: ResourceTab,
    containers: ResourceView<ContainerRecord>,
    images: ResourceView<ImageRecord>,
    volumes: ResourceView<VolumeRecord>,
    networks: ResourceView<NetworkRecord>,
    notifications: Notifications,
    show_help: bool,
    glyphs: Glyphs,
    spinner_frame: usize,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            running: true,
            active_tab: ResourceTab::Containers,
            containers: ResourceView::new(),
            images: ResourceView::new(),
            volumes: ResourceView::new(),
            networks: ResourceView::new(),
            notifications: Notifications::new(Duration::from_secs(config.notification_secs)),
            show_help: false,
            glyphs: Glyphs::new(config.no_nerd_fonts),
            spinner_frame: 0,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn active_tab(&self) -> ResourceTab {
        self.active_tab
    }

    pub fn tabs(&self) -> &'static [ResourceTab] {
        &ResourceTab::ALL
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn glyphs(&self) -> &Glyphs {
        &self.glyphs
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn mode(&self) -> InputMode {
        self.active_view().input_mode()
    }

    pub fn view_state(&self) -> ViewState {
        self.active_view()
            .view_state(&self.glyphs, self.spinner_frame)
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.active_view().overlay()
    }

    pub fn item_count(&self, tab: ResourceTab) -> usize {
        match tab {
            ResourceTab::Containers => self.containers.items().len(),
            ResourceTab::Images => self.images.items().len(),
            ResourceTab::Volumes => self.volumes.items().len(),
            ResourceTab::Networks => self.networks.items().len(),
        }
    }

    fn active_view(&self) -> &dyn TabView {
        self.view(self.active_tab)
    }

    fn view(&self, tab: ResourceTab) -> &dyn TabView {
        match tab {
            ResourceTab::Containers => &self.containers,
            ResourceTab::Images => &self.images,
            ResourceTab::Volumes => &self.volumes,
            ResourceTab::Networks => &self.networks,
        }
    }

    fn view_mut(&mut self, tab: ResourceTab) -> &mut dyn TabView {
        match tab {
            ResourceTab::Containers => &mut self.containers,
            ResourceTab::Images => &mut self.images,
            ResourceTab::Volumes => &mut self.volumes,
            ResourceTab::Networks => &mut self.networks,
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification, Instant::now());
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        for tab in ResourceTab::ALL {
            self.view_mut(tab).resize(width, height);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        self.notifications.prune(now);
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if action == Action::Quit {
            self.running = false;
            return AppCommand::None;
        }

        if self.show_help {
            self.show_help = false;
            if matches!(action, Action::ToggleHelp | Action::CancelInput) {
                return AppCommand::None;
            }
        }

        if self.mode() == InputMode::Normal {
            match action {
                Action::ToggleHelp => {
                    self.show_help = true;
                    return AppCommand::None;
                }
                Action::NextTab => return self.switch_tab(self.active_tab.next()),
                Action::SwitchTab(digit) => {
                    return match ResourceTab::from_digit(digit) {
                        Some(tab) => self.switch_tab(tab),
                        None => AppCommand::None,
                    };
                }
                Action::Refresh => return AppCommand::Refresh(self.active_tab),
                _ => {}
            }
        }

        let tab = self.active_tab;
        let outcome = self.view_mut(tab).handle(action);
        self.absorb(outcome)
    }

    fn switch_tab(&mut self, tab: ResourceTab) -> AppCommand {
        if tab == self.active_tab {
            return AppCommand::None;
        }
        self.active_tab = tab;
        AppCommand::Refresh(tab)
    }

    fn absorb(&mut self, outcome: ViewOutcome) -> AppCommand {
        match outcome {
            ViewOutcome::None => AppCommand::None,
            ViewOutcome::Command(command) => command,
            ViewOutcome::Notify(notification) => {
                self.notify(notification);
                AppCommand::None
            }
            ViewOutcome::FocusChanged(focus) => {
                debug!(tab = %self.active_tab, ?focus, "focus changed");
                AppCommand::None
            }
            ViewOutcome::Unhandled(Action::CancelInput) => {
                self.notifications.dismiss_all();
                AppCommand::None
            }
            ViewOutcome::Unhandled(_) => AppCommand::None,
        }
    }

    pub fn handle_loop_event(&mut self, event: LoopEvent) -> AppCommand {
        match event {
            LoopEvent::Refreshed { tab, result } => {
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot),
                    Err(error) => {
                        warn!(%tab, %error, "refresh failed");
                        self.view_mut(tab).set_error(error.clone());
                        self.notify(Notification::error(format!(
                            "Failed to refresh {}: {error}",
                            tab.title().to_lowercase()
                        )));
                    }
                }
                AppCommand::None
            }
            LoopEvent::Operation(outcome) => {
                let tab = outcome.operation.tab;
                if let Err(error) = &outcome.result {
                    warn!(%tab, verb = %outcome.operation.verb, %error, "operation failed");
                }
                if let Some(notification) = self.view_mut(tab).complete(&outcome) {
                    self.notify(notification);
                }
                if tab == ResourceTab::Containers {
                    self.sync_usage();
                }
                AppCommand::None
            }
            LoopEvent::Pulled { reference, result } => match result {
                Ok(()) => {
                    self.notify(Notification::success(format!("Image {reference} pulled")));
                    AppCommand::Refresh(ResourceTab::Images)
                }
                Err(error) => {
                    self.notify(Notification::error(format!(
                        "Failed to pull {reference}: {error}"
                    )));
                    AppCommand::None
                }
            },
            LoopEvent::Created { image, result } => match result {
                Ok(name) => {
                    self.notify(Notification::success(format!("Container {name} created")));
                    AppCommand::Refresh(ResourceTab::Containers)
                }
                Err(error) => {
                    self.notify(Notification::error(format!(
                        "Failed to create container from {image}: {error}"
                    )));
                    AppCommand::None
                }
            },
            LoopEvent::LogLine { container_id, line } => {
                if let Some(viewer) = self.log_viewer(&container_id) {
                    viewer.push_line(line);
                }
                AppCommand::None
            }
            LoopEvent::LogsEnded {
                container_id,
                error,
            } => {
                if let Some(viewer) = self.log_viewer(&container_id) {
                    viewer.mark_ended(match &error {
                        Some(error) => format!("stream failed: {error}"),
                        None => "stream ended".to_string(),
                    });
                }
                if let Some(error) = error {
                    self.notify(Notification::error(format!("Log stream failed: {error}")));
                }
                AppCommand::None
            }
            LoopEvent::ShellExited { name, result } => {
                if let Err(error) = result {
                    self.notify(Notification::error(format!(
                        "Shell in {name} failed: {error}"
                    )));
                }
                AppCommand::Refresh(ResourceTab::Containers)
            }
        }
    }

    fn log_viewer(&mut self, container_id: &str) -> Option<&mut LogViewer> {
        match self.containers.overlay_mut() {
            Some(Overlay::Logs(viewer)) if viewer.container_id == container_id => Some(viewer),
            _ => None,
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        debug!(tab = %snapshot.tab(), rows = snapshot.len(), "snapshot applied");
        match snapshot {
            Snapshot::Containers(records) => self.containers.set_records(records),
            Snapshot::Images(records) => self.images.set_records(records),
            Snapshot::Volumes(records) => self.volumes.set_records(records),
            Snapshot::Networks(records) => self.networks.set_records(records),
        }
        self.sync_usage();
    }

    fn sync_usage(&mut self) {
        let containers = self.containers.records().cloned().collect::<Vec<_>>();

        self.images.update_records(|image| {
            image.used_by = users_of(&containers, |container| {
                container.image_id == image.id || image.tags.contains(&container.image)
            });
        });
        self.volumes.update_records(|volume| {
            volume.used_by = users_of(&containers, |container| {
                container.mounts.contains(&volume.name)
            });
        });
        self.networks.update_records(|network| {
            network.used_by = users_of(&containers, |container| {
                container.networks.contains(&network.name)
            });
        });
    }

    pub fn busy_tabs(&self) -> HashSet<ResourceTab> {
        let mut busy = HashSet::new();
        if self.containers.items().iter().any(|item| item.working) {
            busy.insert(ResourceTab::Containers);
        }
        if self.images.items().iter().any(|item| item.working) {
            busy.insert(ResourceTab::Images);
        }
        if self.volumes.items().iter().any(|item| item.working) {
            busy.insert(ResourceTab::Volumes);
        }
        if self.networks.items().iter().any(|item| item.working) {
            busy.insert(ResourceTab::Networks);
        }
        busy
    }
}

fn users_of(
    containers: &[ContainerRecord],
    uses: impl Fn(&ContainerRecord) -> bool,
) -> Vec<String> {
    containers
        .iter()
        .filter(|container| uses(container))
        .map(|container| container.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, InputMode, LoopEvent};
    use crate::config::AppConfig;
    use crate::dispatch::{OperationOutcome, Verb};
    use crate::input::Action;
    use crate::model::{
        ContainerRecord, ImageRecord, LifecycleState, ResourceTab, Snapshot, VolumeRecord,
    };
    use crate::notifications::Level;
    use crate::overlay::Overlay;

    fn app() -> App {
        let mut app = App::new(&AppConfig::default());
        app.resize(120, 40);
        app
    }

    fn container(id: &str, name: &str, image_id: &str, mounts: &[&str]) -> ContainerRecord {
        ContainerRecord {
            id: id.to_string(),
            name: name.to_string(),
            image: "nginx:latest".to_string(),
            image_id: image_id.to_string(),
            state: LifecycleState::Running,
            status: "Up 2 minutes".to_string(),
            ports: Vec::new(),
            mounts: mounts.iter().map(|mount| mount.to_string()).collect(),
            networks: vec!["bridge".to_string()],
            created: "-".to_string(),
        }
    }

    fn load_containers(app: &mut App, records: Vec<ContainerRecord>) {
        app.handle_loop_event(LoopEvent::Refreshed {
            tab: ResourceTab::Containers,
            result: Ok(Snapshot::Containers(records)),
        });
    }

    #[test]
    fn quit_stops_the_app_from_any_mode() {
        let mut app = app();
        app.apply_action(Action::StartFilter);
        assert_eq!(app.mode(), InputMode::Filter);
        app.apply_action(Action::Quit);
        assert!(!app.running());
    }

    #[test]
    fn quit_from_the_log_viewer_stops_the_app() {
        let mut app = app();
        load_containers(&mut app, vec![container("c1", "web", "sha256:a", &[])]);
        app.apply_action(Action::ShowLogs);
        assert_eq!(app.mode(), InputMode::Logs);
        assert_eq!(app.apply_action(Action::Quit), AppCommand::None);
        assert!(!app.running());
    }

    #[test]
    fn digits_and_shift_tab_switch_tabs_and_request_refresh() {
        let mut app = app();
        assert_eq!(
            app.apply_action(Action::SwitchTab(3)),
            AppCommand::Refresh(ResourceTab::Volumes)
        );
        assert_eq!(app.active_tab(), ResourceTab::Volumes);
        assert_eq!(
            app.apply_action(Action::NextTab),
            AppCommand::Refresh(ResourceTab::Networks)
        );
        assert_eq!(
            app.apply_action(Action::NextTab),
            AppCommand::Refresh(ResourceTab::Containers)
        );
        assert_eq!(app.apply_action(Action::SwitchTab(1)), AppCommand::None);
        assert_eq!(app.apply_action(Action::SwitchTab(9)), AppCommand::None);
    }

    #[test]
    fn tab_switching_is_ignored_while_an_overlay_is_open() {
        let mut app = app();
        load_containers(&mut app, vec![container("c1", "web", "sha256:a", &[])]);
        app.apply_action(Action::Remove);
        assert_eq!(app.mode(), InputMode::Dialog);
        assert_eq!(app.apply_action(Action::SwitchTab(2)), AppCommand::None);
        assert_eq!(app.active_tab(), ResourceTab::Containers);
    }

    #[test]
    fn operation_round_trip_updates_state_and_notifies() {
        let mut app = app();
        load_containers(&mut app, vec![container("c1", "web", "sha256:a", &[])]);

        let operation = match app.apply_action(Action::Pause) {
            AppCommand::RunOperation(operation) => operation,
            other => panic!("expected an operation, got {other:?}"),
        };
        assert_eq!(operation.verb, Verb::Pause);
        assert!(app.busy_tabs().contains(&ResourceTab::Containers));

        app.handle_loop_event(LoopEvent::Operation(OperationOutcome {
            operation,
            result: Ok(()),
        }));
        assert!(app.busy_tabs().is_empty());
        let levels = app
            .notifications()
            .iter()
            .map(|note| note.level)
            .collect::<Vec<_>>();
        assert_eq!(levels, vec![Level::Success]);
    }

    #[test]
    fn usage_follows_the_container_list() {
        let mut app = app();
        app.handle_loop_event(LoopEvent::Refreshed {
            tab: ResourceTab::Images,
            result: Ok(Snapshot::Images(vec![ImageRecord {
                id: "sha256:a".to_string(),
                tags: vec!["nginx:latest".to_string()],
                size: "1 MB".to_string(),
                created: "-".to_string(),
                used_by: Vec::new(),
            }])),
        });
        app.handle_loop_event(LoopEvent::Refreshed {
            tab: ResourceTab::Volumes,
            result: Ok(Snapshot::Volumes(vec![VolumeRecord {
                name: "data".to_string(),
                driver: "local".to_string(),
                mountpoint: String::new(),
                scope: "local".to_string(),
                used_by: Vec::new(),
            }])),
        });
        load_containers(&mut app, vec![container("c1", "web", "sha256:a", &["data"])]);

        assert_eq!(app.images.items()[0].record.used_by, vec!["web".to_string()]);
        assert_eq!(app.volumes.items()[0].record.used_by, vec!["web".to_string()]);

        load_containers(&mut app, Vec::new());
        assert!(app.images.items()[0].record.used_by.is_empty());
    }

    #[test]
    fn refresh_failure_is_reported() {
        let mut app = app();
        app.handle_loop_event(LoopEvent::Refreshed {
            tab: ResourceTab::Networks,
            result: Err("daemon gone".to_string()),
        });
        let note = app.notifications().iter().next().cloned();
        assert!(note.is_some_and(|note| note.message.contains("daemon gone")));
    }

    #[test]
    fn escape_dismisses_notifications() {
        let mut app = app();
        app.handle_loop_event(LoopEvent::Pulled {
            reference: "nginx".to_string(),
            result: Err("not found".to_string()),
        });
        assert!(!app.notifications().is_empty());
        app.apply_action(Action::CancelInput);
        assert!(app.notifications().is_empty());
    }

    #[test]
    fn log_lines_reach_the_open_viewer_only() {
        let mut app = app();
        load_containers(&mut app, vec![container("c1", "web", "sha256:a", &[])]);
        assert_eq!(
            app.apply_action(Action::ShowLogs),
            AppCommand::StreamLogs {
                container_id: "c1".to_string(),
                name: "web".to_string(),
            }
        );
        app.handle_loop_event(LoopEvent::LogLine {
            container_id: "c1".to_string(),
            line: "hello".to_string(),
        });
        app.handle_loop_event(LoopEvent::LogLine {
            container_id: "other".to_string(),
            line: "ignored".to_string(),
        });
        match app.overlay() {
            Some(Overlay::Logs(viewer)) => assert_eq!(viewer.line_count(), 1),
            other => panic!("expected log viewer, got {other:?}"),
        }
        assert_eq!(
            app.apply_action(Action::CancelInput),
            AppCommand::StopLogs {
                container_id: "c1".to_string()
            }
        );
    }

    #[test]
    fn successful_pull_refreshes_images() {
        let mut app = app();
        let command = app.handle_loop_event(LoopEvent::Pulled {
            reference: "redis:7".to_string(),
            result: Ok(()),
        });
        assert_eq!(command, AppCommand::Refresh(ResourceTab::Images));
    }

    #[test]
    fn help_closes_on_next_key() {
        let mut app = app();
        app.apply_action(Action::ToggleHelp);
        assert!(app.show_help());
        app.apply_action(Action::CancelInput);
        assert!(!app.show_help());
    }
}
