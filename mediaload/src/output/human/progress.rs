use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Live progress bars on stderr, one per run phase.
pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Phase {
    Admitting,
    Running,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Self::Admitting => "admitting",
            Self::Running => "running",
        }
    }
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));

        Self {
            inner: Mutex::new(Inner {
                multi,
                bars: HashMap::new(),
            }),
        }
    }

    /// `total = None` draws a spinner instead of a bar.
    pub(crate) fn update(&self, phase: Phase, position: u64, total: Option<u64>, message: String) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pb = inner.get_or_create_bar(phase, total.is_some());
        pb.set_message(message);

        match total {
            Some(total) => {
                pb.set_length(total);
                pb.set_position(position.min(total));
            }
            None => pb.tick(),
        }
    }

    pub(crate) fn finish_phase(&self, phase: Phase) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(b) = inner.bars.remove(&phase) {
            b.pb.finish_and_clear();
        }
    }

    /// Prints above the bars without tearing them.
    pub(crate) fn println(&self, line: &str) {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.bars.is_empty() || inner.multi.println(line).is_err() {
            println!("{line}");
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (_, b) in inner.bars.drain() {
            b.pb.finish_and_clear();
        }

        let _ = inner.multi.clear();
    }
}

struct Inner {
    multi: MultiProgress,
    bars: HashMap<Phase, PhaseProgressBar>,
}

impl Inner {
    fn get_or_create_bar(&mut self, phase: Phase, bounded: bool) -> &ProgressBar {
        let desired_kind = if bounded {
            ProgressBarKind::Bar
        } else {
            ProgressBarKind::Spinner
        };

        let needs_recreate = self
            .bars
            .get(&phase)
            .is_some_and(|b| b.kind != desired_kind);

        if needs_recreate && let Some(old) = self.bars.remove(&phase) {
            old.pb.finish_and_clear();
        }

        let entry = self
            .bars
            .entry(phase)
            .or_insert_with(|| match desired_kind {
                ProgressBarKind::Bar => {
                    let pb = self.multi.add(ProgressBar::new(0));
                    pb.set_style(bar_style());
                    pb.set_prefix(phase.label());
                    PhaseProgressBar {
                        kind: ProgressBarKind::Bar,
                        pb,
                    }
                }
                ProgressBarKind::Spinner => {
                    let pb = self.multi.add(ProgressBar::new_spinner());
                    pb.set_style(spinner_style());
                    pb.set_prefix(phase.label());
                    pb.enable_steady_tick(Duration::from_millis(120));
                    PhaseProgressBar {
                        kind: ProgressBarKind::Spinner,
                        pb,
                    }
                }
            });

        &entry.pb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressBarKind {
    Spinner,
    Bar,
}

struct PhaseProgressBar {
    kind: ProgressBarKind,
    pb: ProgressBar,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>9} [ {bar:20.cyan/blue} ] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>9} {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
