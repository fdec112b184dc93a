//! Progress spinner helpers using indicatif

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("    {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a spinner with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

/// Finish a spinner with a warning message
pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}

/// Clear the spinner of a step that failed, passing the result through
pub fn clear_on_error<T, E>(pb: &ProgressBar, result: Result<T, E>) -> Result<T, E> {
    if result.is_err() {
        pb.finish_and_clear();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_on_error_finishes_failed_step() {
        let pb = ProgressBar::hidden();
        let result: Result<(), &str> = clear_on_error(&pb, Err("unreadable"));
        assert!(result.is_err());
        assert!(pb.is_finished());
    }

    #[test]
    fn test_clear_on_error_leaves_running_step() {
        let pb = ProgressBar::hidden();
        let value = clear_on_error::<_, &str>(&pb, Ok(3)).unwrap();
        assert_eq!(value, 3);
        assert!(!pb.is_finished());
    }
}
