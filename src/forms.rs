use crate::overlay::{FormDialog, FormField, OverlayAction};
use std::collections::BTreeMap;

pub const IMAGE_FIELD: &str = "Image";
pub const NAME_FIELD: &str = "Name";
pub const PORTS_FIELD: &str = "Ports";
pub const VOLUMES_FIELD: &str = "Volumes";
pub const ENV_FIELD: &str = "Environment";
pub const AUTO_START_FIELD: &str = "Auto-start";
pub const DEFAULT_NETWORK: &str = "bridge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_port: String,
    pub container_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: Option<String>,
    pub image: String,
    pub ports: Vec<PortBinding>,
    pub binds: Vec<String>,
    pub env: Vec<String>,
    pub auto_start: bool,
    pub network: String,
}

impl ContainerSpec {
    pub fn from_form(image: &str, values: &BTreeMap<String, String>) -> Self {
        let field = |label: &str| values.get(label).map(String::as_str).unwrap_or_default();
        let name = field(NAME_FIELD).trim();
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            image: image.to_string(),
            ports: parse_ports(field(PORTS_FIELD)),
            binds: parse_list(field(VOLUMES_FIELD)),
            env: parse_list(field(ENV_FIELD)),
            auto_start: parse_bool(field(AUTO_START_FIELD)),
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

pub fn pull_image_form() -> FormDialog {
    FormDialog::new(
        "Pull Image",
        vec![
            FormField::new(IMAGE_FIELD, "nginx:latest")
                .required()
                .validated(validate_image_name),
        ],
        OverlayAction::PullImage,
    )
}

pub fn create_container_form(image_id: &str, image_label: &str) -> FormDialog {
    FormDialog::new(
        format!("Create Container from {image_label}"),
        vec![
            FormField::new(NAME_FIELD, "my-container (optional)"),
            FormField::new(PORTS_FIELD, "8080:80,443:443").validated(validate_ports),
            FormField::new(VOLUMES_FIELD, "/host:/container").validated(validate_volumes),
            FormField::new(ENV_FIELD, "KEY=value,FOO=bar").validated(validate_env),
            FormField::new(AUTO_START_FIELD, "yes/no").validated(validate_bool),
        ],
        OverlayAction::CreateContainer {
            image: image_id.to_string(),
        },
    )
}

pub fn validate_image_name(input: &str) -> Result<(), String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("image name cannot be empty".to_string());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err("image name cannot contain spaces".to_string());
    }
    Ok(())
}

pub fn validate_ports(input: &str) -> Result<(), String> {
    for pair in entries(input) {
        let valid = match pair.split(':').collect::<Vec<_>>().as_slice() {
            [host, container] => {
                let container = container.split('/').next().unwrap_or_default();
                host.trim().parse::<u16>().is_ok() && container.trim().parse::<u16>().is_ok()
            }
            _ => false,
        };
        if !valid {
            return Err("invalid format, expected hostPort:containerPort".to_string());
        }
    }
    Ok(())
}

pub fn validate_volumes(input: &str) -> Result<(), String> {
    for pair in entries(input) {
        let parts = pair.split(':').collect::<Vec<_>>();
        if parts.len() != 2 || parts.iter().any(|part| part.trim().is_empty()) {
            return Err("invalid format, expected hostPath:containerPath".to_string());
        }
    }
    Ok(())
}

pub fn validate_env(input: &str) -> Result<(), String> {
    for pair in entries(input) {
        match pair.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => {}
            _ => return Err("invalid format, expected KEY=value".to_string()),
        }
    }
    Ok(())
}

pub fn validate_bool(input: &str) -> Result<(), String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "yes" | "no" => Ok(()),
        _ => Err("expected 'yes' or 'no'".to_string()),
    }
}

pub fn parse_ports(input: &str) -> Vec<PortBinding> {
    entries(input)
        .filter_map(|pair| {
            let (host, container) = pair.split_once(':')?;
            let container = container.trim();
            let container_port = if container.contains('/') {
                container.to_string()
            } else {
                format!("{container}/tcp")
            };
            Some(PortBinding {
                host_port: host.trim().to_string(),
                container_port,
            })
        })
        .collect()
}

pub fn parse_list(input: &str) -> Vec<String> {
    entries(input).map(str::to_string).collect()
}

pub fn parse_bool(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("yes")
}

/// Splits `repo[:tag]` or `repo@digest` into the pieces the pull API wants.
/// A registry port (`host:5000/app`) is not mistaken for a tag.
pub fn split_image_reference(reference: &str) -> (String, String) {
    let reference = reference.trim();
    if let Some((name, digest)) = reference.split_once('@') {
        return (name.to_string(), digest.to_string());
    }

    let name_start = reference.rfind('/').map(|index| index + 1).unwrap_or(0);
    match reference[name_start..].rfind(':') {
        Some(offset) => {
            let split = name_start + offset;
            (
                reference[..split].to_string(),
                reference[split + 1..].to_string(),
            )
        }
        None => (reference.to_string(), "latest".to_string()),
    }
}

fn entries(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}
