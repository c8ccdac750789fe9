//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print course info.
    pub fn course_info(title: &str, lessons: usize, instructor: Option<&str>) {
        let lessons_str = if lessons == 1 {
            "1 lesson".to_string()
        } else {
            format!("{} lessons", lessons)
        };
        match instructor {
            Some(name) => println!(
                "  {} {} ({}, {})",
                style("*").cyan(),
                style(title).bold(),
                lessons_str,
                style(name).dim()
            ),
            None => println!(
                "  {} {} ({})",
                style("*").cyan(),
                style(title).bold(),
                lessons_str
            ),
        }
    }

    /// Print a source citation.
    pub fn source(text: &str, link: Option<&str>) {
        match link {
            Some(link) => println!("  {} {} {}", style("*").cyan(), text, style(link).dim()),
            None => println!("  {} {}", style("*").cyan(), text),
        }
    }

    /// Print search result.
    pub fn search_result(course: &str, lesson: Option<u32>, score: f32, content: &str) {
        let location = match lesson {
            Some(number) => format!("{} - Lesson {}", course, number),
            None => course.to_string(),
        };
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(&location).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, respecting char boundaries.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.len() <= max_len {
        return content;
    }
    let mut cut = max_len;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &content[..cut])
}
