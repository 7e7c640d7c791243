use crate::config::AppConfig;
use crate::docker::DockerGateway;

const CHROME_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct WindowSize {
    pub width: u16,
    pub height: u16,
}

impl WindowSize {
    pub fn body(self) -> (u16, u16) {
        (self.width, self.height.saturating_sub(CHROME_ROWS))
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub gateway: DockerGateway,
    window: WindowSize,
}

impl AppContext {
    pub fn new(config: AppConfig, gateway: DockerGateway) -> Self {
        Self {
            config,
            gateway,
            window: WindowSize::default(),
        }
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn set_window(&mut self, width: u16, height: u16) -> bool {
        let next = WindowSize { width, height };
        if next == self.window {
            return false;
        }
        self.window = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::WindowSize;

    #[test]
    fn body_excludes_header_and_footer() {
        let size = WindowSize {
            width: 80,
            height: 24,
        };
        assert_eq!(size.body(), (80, 22));
        assert_eq!(WindowSize::default().body(), (0, 0));
    }
}
