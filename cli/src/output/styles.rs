//! Terminal stylesheet. Plain until `colorize` is called.

use owo_colors::Style;

use crate::application::services::apply::Outcome;

#[derive(Default, Clone)]
pub struct Styles {
    /// Checkmarks and changed actions (green)
    pub success: Style,
    /// Warnings and noop would-change actions (yellow)
    pub warning: Style,
    /// Failures (red)
    pub error: Style,
    /// Progress steps and refreshed services (blue)
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    /// Section titles
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }

    /// Style for an action outcome in the apply report.
    #[must_use]
    pub fn outcome(&self, outcome: Outcome) -> Style {
        match outcome {
            Outcome::Changed => self.success,
            Outcome::WouldChange => self.warning,
            Outcome::Refreshed => self.info,
            Outcome::Unchanged | Outcome::GuardSkip | Outcome::NotTriggered => self.dim,
        }
    }
}
