use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// File progress for multi-file analysis; hidden when stdout is not a terminal
pub struct ProgressManager {
    analyzing: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_files: usize) -> Self {
        let analyzing = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new(total_files as u64);
            if let Ok(style) =
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
            {
                pb.set_style(style.progress_chars("=> "));
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        analyzing.set_message("Analyzing files");
        Self { analyzing }
    }

    /// Count one finished file
    pub fn inc(&self, file: &str) {
        self.analyzing.set_message(file.to_string());
        self.analyzing.inc(1);
    }

    pub fn finish_with_summary(&self, duration: Duration, files: usize, references: usize, resolved: usize) {
        self.analyzing.finish_and_clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            files,
            Icons::SEARCH.style(theme().info.clone()),
            references,
            Icons::LINK.style(theme().info.clone()),
            resolved
        );
    }
}
