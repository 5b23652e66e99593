use std::sync::Mutex;

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressStyle};

use crate::progress::{ProgressEvent, ProgressReporter};

/// Renders progress events as terminal bars: a spinner while scrolling, a
/// percent bar per downloading item, a printed line per terminal outcome.
pub struct ConsoleReporter {
    multi: MultiProgress,
    state: Mutex<ConsoleState>,
}

#[derive(Default)]
struct ConsoleState {
    round_bar: Option<ProgressBar>,
    item_bar: Option<ProgressBar>,
    current_item: Option<String>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ConsoleState::default()),
        }
    }

    fn finish_item(&self, state: &mut ConsoleState, item: &str, status: &str) {
        if let Some(bar) = state.round_bar.take() {
            bar.finish_and_clear();
        }
        let message = format!("{} {status}", short_name(item));
        match state.item_bar.take() {
            Some(bar) if state.current_item.as_deref() == Some(item) => {
                bar.set_style(ProgressStyle::default_bar().template("{msg}").unwrap());
                bar.finish_with_message(message);
            }
            other => {
                // No bar for this item yet (skips go straight to terminal state)
                if let Some(bar) = other {
                    bar.finish();
                }
                self.multi.println(message).ok();
            }
        }
        state.current_item = None;
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleReporter {
    fn emit(&self, event: ProgressEvent) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        match event {
            ProgressEvent::Round {
                visible,
                unique_total,
                stagnant_rounds,
                ..
            } => {
                let bar = state.round_bar.get_or_insert_with(|| {
                    let bar = self.multi.add(ProgressBar::new_spinner());
                    bar.set_style(
                        ProgressStyle::default_spinner()
                            .template("{spinner} {msg}")
                            .unwrap(),
                    );
                    bar
                });
                bar.set_message(format!(
                    "scrolling: {visible} visible, {unique_total} unique, {stagnant_rounds} stagnant rounds"
                ));
                bar.tick();
            }
            ProgressEvent::Downloading {
                item,
                percent,
                rate_bytes_per_sec,
                eta_seconds,
            } => {
                if let Some(bar) = state.round_bar.take() {
                    bar.finish_and_clear();
                }
                if state.current_item.as_deref() != Some(item.as_str()) {
                    if let Some(old) = state.item_bar.take() {
                        old.finish();
                    }
                    let bar = self.multi.add(ProgressBar::new(100));
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("{msg:40} {bar:40} {pos:>3}%")
                            .unwrap()
                            .progress_chars("=>-"),
                    );
                    bar.set_message(short_name(&item).to_string());
                    state.item_bar = Some(bar);
                    state.current_item = Some(item.clone());
                }
                if let Some(bar) = &state.item_bar {
                    bar.set_position(percent.clamp(0.0, 100.0) as u64);
                    if let Some(rate) = rate_bytes_per_sec {
                        let eta = eta_seconds
                            .map(|eta| format!(", ETA {eta}s"))
                            .unwrap_or_default();
                        bar.set_message(format!(
                            "{} ({}/s{eta})",
                            short_name(&item),
                            HumanBytes(rate)
                        ));
                    }
                }
            }
            ProgressEvent::Finished { item } => self.finish_item(&mut state, &item, "Done"),
            ProgressEvent::Skipped { item } => {
                self.finish_item(&mut state, &item, "Skipped (already downloaded)");
            }
            ProgressEvent::Error { item, message } => {
                self.finish_item(&mut state, &item, &format!("Failed: {message}"));
            }
        }
    }
}

fn short_name(item: &str) -> &str {
    item.trim_end_matches('/').rsplit('/').next().unwrap_or(item)
}
