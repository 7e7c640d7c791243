use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }
}

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Notifications {
    ttl: Duration,
    toasts: VecDeque<Toast>,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: VecDeque::new(),
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.toasts.push_back(Toast {
            notification,
            expires_at: now + self.ttl,
        });
        while self.toasts.len() > MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.expires_at > now);
        before != self.toasts.len()
    }

    pub fn dismiss_all(&mut self) -> bool {
        let had_any = !self.toasts.is_empty();
        self.toasts.clear();
        had_any
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.toasts.iter().map(|toast| &toast.notification)
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, Notification, Notifications};
    use std::time::{Duration, Instant};

    #[test]
    fn toasts_expire_after_ttl() {
        let start = Instant::now();
        let mut notes = Notifications::new(Duration::from_secs(4));
        notes.push(Notification::error("boom"), start);
        notes.push(
            Notification::success("ok"),
            start + Duration::from_secs(2),
        );

        assert!(!notes.prune(start + Duration::from_secs(3)));
        assert!(notes.prune(start + Duration::from_secs(5)));
        let left = notes.iter().map(|note| note.level).collect::<Vec<_>>();
        assert_eq!(left, vec![Level::Success]);
        assert!(notes.prune(start + Duration::from_secs(7)));
        assert!(notes.is_empty());
    }

    #[test]
    fn stack_keeps_the_newest_few() {
        let now = Instant::now();
        let mut notes = Notifications::new(Duration::from_secs(10));
        for index in 0..6 {
            notes.push(Notification::info(format!("n{index}")), now);
        }
        let messages = notes
            .iter()
            .map(|note| note.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["n2", "n3", "n4", "n5"]);
        assert!(notes.dismiss_all());
        assert!(!notes.dismiss_all());
    }
}
