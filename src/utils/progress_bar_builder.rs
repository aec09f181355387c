use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Builds the spinners shown while a pipeline step runs.
pub(crate) struct ProgressBarBuilder {
    style_template: &'static str,
    message: String,
    visible: bool,
    tick: Duration,
}

impl ProgressBarBuilder {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            style_template: "{spinner:.green} [{elapsed_precise}] {msg}",
            message: message.into(),
            visible: true,
            tick: Duration::from_millis(120),
        }
    }

    /// Draw nothing, e.g. when progress output is disabled.
    pub(crate) fn hidden_if(mut self, hidden: bool) -> Self {
        self.visible = !hidden;
        self
    }

    pub(crate) fn build(self) -> Result<ProgressBar> {
        let pb = ProgressBar::new_spinner();
        if !self.visible {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        pb.set_style(ProgressStyle::default_spinner().template(self.style_template)?);
        pb.set_message(self.message);
        if self.visible {
            pb.enable_steady_tick(self.tick);
        }
        Ok(pb)
    }
}
