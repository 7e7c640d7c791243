use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceTab {
    Containers,
    Images,
    Volumes,
    Networks,
}

impl ResourceTab {
    pub const ALL: [Self; 4] = [Self::Containers, Self::Images, Self::Volumes, Self::Networks];

    pub fn title(self) -> &'static str {
        match self {
            Self::Containers => "Containers",
            Self::Images => "Images",
            Self::Volumes => "Volumes",
            Self::Networks => "Networks",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Self::Containers => "container",
            Self::Images => "image",
            Self::Volumes => "volume",
            Self::Networks => "network",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Self::Containers),
            2 => Some(Self::Images),
            3 => Some(Self::Volumes),
            4 => Some(Self::Networks),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl Display for ResourceTab {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Running,
    Paused,
    Restarting,
    Created,
    Exited,
    Dead,
    InUse,
    Unused,
    Unknown,
}

impl LifecycleState {
    pub fn from_container_state(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "created" => Self::Created,
            "exited" => Self::Exited,
            "dead" | "removing" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    pub fn from_usage(in_use: bool) -> Self {
        if in_use { Self::InUse } else { Self::Unused }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Created => "created",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::InUse => "in use",
            Self::Unused => "unused",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub image_id: String,
    pub state: LifecycleState,
    pub status: String,
    pub ports: Vec<String>,
    pub mounts: Vec<String>,
    pub networks: Vec<String>,
    pub created: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ImageRecord {
    pub id: String,
    pub tags: Vec<String>,
    pub size: String,
    pub created: String,
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct VolumeRecord {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub scope: String,
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct NetworkRecord {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub internal: bool,
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Snapshot {
    Containers(Vec<ContainerRecord>),
    Images(Vec<ImageRecord>),
    Volumes(Vec<VolumeRecord>),
    Networks(Vec<NetworkRecord>),
}

impl Snapshot {
    pub fn tab(&self) -> ResourceTab {
        match self {
            Self::Containers(_) => ResourceTab::Containers,
            Self::Images(_) => ResourceTab::Images,
            Self::Volumes(_) => ResourceTab::Volumes,
            Self::Networks(_) => ResourceTab::Networks,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Containers(rows) => rows.len(),
            Self::Images(rows) => rows.len(),
            Self::Volumes(rows) => rows.len(),
            Self::Networks(rows) => rows.len(),
        }
    }
}

pub fn short_id(id: &str) -> &str {
    let trimmed = id.strip_prefix("sha256:").unwrap_or(id);
    match trimmed.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &trimmed[..end],
        None => trimmed,
    }
}

pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [(&str, i64); 4] = [
        ("TB", 1_000_000_000_000),
        ("GB", 1_000_000_000),
        ("MB", 1_000_000),
        ("kB", 1_000),
    ];

    if bytes <= 0 {
        return "0B".to_string();
    }

    for (suffix, unit) in UNITS {
        if bytes >= unit {
            let whole = bytes / unit;
            let decimal = ((bytes % unit) * 10) / unit;
            if decimal == 0 {
                return format!("{whole}{suffix}");
            }
            return format!("{whole}.{decimal}{suffix}");
        }
    }

    format!("{bytes}B")
}

pub fn format_timestamp(unix_seconds: i64) -> String {
    if unix_seconds <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::{LifecycleState, ResourceTab, format_bytes, short_id};

    #[test]
    fn digits_and_next_cycle_through_tabs() {
        assert_eq!(ResourceTab::from_digit(3), Some(ResourceTab::Volumes));
        assert_eq!(ResourceTab::from_digit(0), None);
        assert_eq!(ResourceTab::Networks.next(), ResourceTab::Containers);
        assert_eq!(ResourceTab::Containers.next(), ResourceTab::Images);
    }

    #[test]
    fn short_id_never_slices_past_the_end() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("sha256:0123456789abcdef"), "0123456789ab");
    }

    #[test]
    fn container_states_parse_loosely() {
        assert_eq!(
            LifecycleState::from_container_state("Running"),
            LifecycleState::Running
        );
        assert_eq!(
            LifecycleState::from_container_state("removing"),
            LifecycleState::Dead
        );
        assert_eq!(
            LifecycleState::from_container_state("weird"),
            LifecycleState::Unknown
        );
    }

    #[test]
    fn bytes_render_with_one_decimal() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1_500_000), "1.5MB");
        assert_eq!(format_bytes(2_000_000_000), "2GB");
    }
}
