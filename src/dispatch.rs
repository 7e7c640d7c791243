use crate::item::{Resource, ResourceItem};
use crate::model::{LifecycleState, ResourceTab};
use crate::notifications::Notification;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Verb {
    Pause,
    Unpause,
    Start,
    Stop,
    Remove,
}

impl Verb {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Remove => "remove",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Pause => "paused",
            Self::Unpause => "unpaused",
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Remove => "removed",
        }
    }

    pub fn resulting_state(self) -> Option<LifecycleState> {
        match self {
            Self::Pause => Some(LifecycleState::Paused),
            Self::Unpause | Self::Start => Some(LifecycleState::Running),
            Self::Stop => Some(LifecycleState::Exited),
            Self::Remove => None,
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub id: u64,
    pub tab: ResourceTab,
    pub verb: Verb,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub operation: PendingOperation,
    pub result: Result<(), String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    NoTargets,
    AlreadyWorking(String),
    Unsupported(Verb),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTargets => f.write_str("nothing to act on"),
            Self::AlreadyWorking(name) => write!(f, "{name} is busy, wait for it to finish"),
            Self::Unsupported(verb) => write!(f, "{verb} is not available here"),
        }
    }
}

impl std::error::Error for DispatchError {}

pub fn begin<T: Resource>(
    items: &mut [ResourceItem<T>],
    verb: Verb,
    targets: &[String],
) -> Result<(), DispatchError> {
    if !T::VERBS.contains(&verb) {
        return Err(DispatchError::Unsupported(verb));
    }
    if targets.is_empty() {
        return Err(DispatchError::NoTargets);
    }

    let wanted = targets.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut found = 0usize;
    for item in items.iter() {
        if wanted.contains(item.identity()) {
            if item.working {
                return Err(DispatchError::AlreadyWorking(item.record.display_name()));
            }
            found += 1;
        }
    }
    if found == 0 {
        return Err(DispatchError::NoTargets);
    }

    for item in items.iter_mut() {
        if wanted.contains(item.identity()) {
            item.working = true;
        }
    }
    Ok(())
}

/// Working flags are cleared for every target whether the call succeeded or not.
pub fn complete<T: Resource>(
    items: &mut Vec<ResourceItem<T>>,
    outcome: &OperationOutcome,
) -> Option<Notification> {
    let operation = &outcome.operation;
    let targets = operation
        .targets
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();

    for item in items.iter_mut() {
        if targets.contains(item.identity()) {
            item.working = false;
        }
    }

    if let Err(error) = &outcome.result {
        return Some(Notification::error(format!(
            "Failed to {} {}: {error}",
            operation.verb,
            plural_noun(operation.tab, operation.targets.len())
        )));
    }

    match operation.verb.resulting_state() {
        None => {
            let mut doomed = items
                .iter()
                .enumerate()
                .filter(|(_, item)| targets.contains(item.identity()))
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            doomed.sort_unstable_by(|left, right| right.cmp(left));
            for index in doomed {
                items.remove(index);
            }
        }
        Some(state) => {
            for item in items.iter_mut() {
                if targets.contains(item.identity()) {
                    item.record.set_lifecycle(state);
                }
            }
        }
    }

    Some(Notification::success(format!(
        "{} {}",
        capitalize(&plural_noun(operation.tab, operation.targets.len())),
        operation.verb.past_tense()
    )))
}

fn plural_noun(tab: ResourceTab, count: usize) -> String {
    if count == 1 {
        tab.noun().to_string()
    } else {
        format!("{count} {}s", tab.noun())
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
