//! Terminal progress bars for running transfers.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Called with the bytes written so far and the total, when the total is known.
pub type ProgressCallback<'a> = dyn Fn(u64, Option<u64>) + Send + Sync + 'a;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({binary_bytes_per_sec})";

/// Hands out one progress bar per transfer, all drawn through the same `MultiProgress`
/// so log lines printed through the bridge don't tear them.
#[derive(Clone, Debug)]
pub struct Progress {
    multi: MultiProgress,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(MultiProgress::new())
    }
}

impl Progress {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }

    /// A reporter that draws nothing.
    pub fn hidden() -> Self {
        Self::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
    }

    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    /// Starts tracking a transfer labelled `label`.
    pub fn transfer(&self, label: &str, total: Option<u64>) -> Transfer {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(bar_style());
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(spinner_style());
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        bar.set_message(label.to_string());

        Transfer {
            bar: self.multi.add(bar),
        }
    }
}

/// One running transfer's bar.
#[derive(Clone, Debug)]
pub struct Transfer {
    bar: ProgressBar,
}

impl Transfer {
    pub fn update(&self, done: u64, total: Option<u64>) {
        if let Some(total) = total {
            if self.bar.length() != Some(total) {
                self.bar.disable_steady_tick();
                self.bar.set_style(bar_style());
                self.bar.set_length(total);
            }
        }
        self.bar.set_position(done);
    }

    /// A callback feeding this bar, for the provider to call while writing.
    pub fn callback(&self) -> impl Fn(u64, Option<u64>) + Send + Sync + 'static {
        let transfer = self.clone();
        move |done, total| transfer.update(done, total)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
}
