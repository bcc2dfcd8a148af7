//! Terminal rendering for cards, the indicator and the detail modal.
//!
//! This module provides colored output, a spinner for the loading state and
//! width-aware truncation so cards stay on one line per field.

use owo_colors::OwoColorize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use crate::detail::{Modal, ModalBody};
use crate::search::{CoverState, LoadingState, RenderedCard};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Error,
    Warning,
    Info,
    Loading,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Loading => "◐",
        Status::Search => "🔍",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Loading => println!("{} {}", icon.cyan(), msg),
        Status::Search => println!("{} {}", icon.yellow(), msg),
    }
}

/// Welcome banner for interactive mode.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");

    println!();
    println!("{}", format!("📚 Owly v{}", version).bold().cyan());
    println!("{}", "Search Open Library by subject.".dimmed());
    println!();
    println!("  {}   search a subject", "<subject>".yellow());
    println!("  {}   open the detail of card N", "<number>".yellow());
    println!("  {}   close the detail", ":close, :esc".yellow());
    println!("  {}   leave", ":quit".yellow());
    println!();
}

/// Print search results header.
pub fn print_search_header(query: &str, shown: usize, duration: Duration) {
    println!();
    println!(
        "{} Results for: \"{}\"",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    println!(
        "{} Showing {} works in {:.2}s",
        "─".repeat(30).dimmed(),
        shown.to_string().green().bold(),
        duration.as_secs_f64()
    );
    println!();
}

/// Short description of where a card's cover ended up.
pub fn cover_label(cover: &CoverState) -> String {
    match cover {
        CoverState::Loaded { bytes, .. } => format!("cover ({})", format_file_size(*bytes as u64)),
        CoverState::Fallback { .. } => "placeholder cover".to_string(),
        CoverState::Broken { .. } => "no cover".to_string(),
        CoverState::Pending { .. } => "cover still loading".to_string(),
    }
}

/// Write one card with its 1-based display number.
pub fn write_card<W: Write>(out: &mut W, number: usize, card: &RenderedCard) -> io::Result<()> {
    let width = terminal_width().saturating_sub(8).max(20);
    let cover = cover_label(&card.cover);
    let cover = match card.cover {
        CoverState::Loaded { .. } => cover.green().to_string(),
        CoverState::Pending { .. } => cover.yellow().to_string(),
        _ => cover.dimmed().to_string(),
    };

    writeln!(
        out,
        "{:>3}. {}",
        number.to_string().cyan().bold(),
        truncate_with_ellipsis(&card.title, width).bold()
    )?;
    writeln!(out, "     {}", truncate_with_ellipsis(&card.author, width))?;
    writeln!(out, "     🖼  {}", cover)
}

/// Write cards in display order, pausing `stagger` between them.
pub async fn reveal_cards<W: Write>(
    out: &mut W,
    cards: &[RenderedCard],
    stagger: Duration,
) -> io::Result<()> {
    for (i, card) in cards.iter().enumerate() {
        if i > 0 && !stagger.is_zero() {
            tokio::time::sleep(stagger).await;
        }
        write_card(out, i + 1, card)?;
        out.flush()?;
    }
    Ok(())
}

/// Print the indicator when it is visible.
pub fn print_indicator(state: &LoadingState) {
    match state {
        LoadingState::Error(_) => println!("{}", state.text().red().bold()),
        LoadingState::Loading => println!("{}", state.text().dimmed()),
        LoadingState::Idle | LoadingState::Success => {}
    }
}

/// Print the detail modal.
pub fn print_modal(modal: &Modal) {
    if !modal.visible {
        return;
    }

    let width = terminal_width().min(80);
    let rule = "─".repeat(width.saturating_sub(2));

    println!();
    println!("┌{}┐", rule.dimmed());
    match &modal.body {
        ModalBody::Loading => println!("  {}", "Loading details...".dimmed()),
        ModalBody::Details(view) => {
            println!("  {}", view.title.bold().blue());
            println!("  {} {}", "Authors:".dimmed(), view.authors);
            println!("  {}    {}", "Year:".dimmed(), view.year.yellow());
            println!();
            for line in wrap(&view.description, width.saturating_sub(4)) {
                println!("  {}", line);
            }
        }
        ModalBody::Error { title, message } => {
            println!("  {} {}", status_icon(Status::Error).red().bold(), title.red().bold());
            println!("  {}", message);
        }
    }
    println!("└{}┘", rule.dimmed());
    println!("{}", "  :close or :esc to dismiss".dimmed());
}

/// Greedy word wrap by display width.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_whitespace() {
            let w = unicode_width::UnicodeWidthStr::width(word);
            if line_width > 0 && line_width + 1 + w > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if line_width > 0 {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += w;
        }
        lines.push(line);
    }
    lines
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    // Longest prefix that fits with the ellipsis
    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn spinner_style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

/// Spinner shown while the indicator is in the loading state.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Remove the spinner from the terminal.
    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Error), "✗");
        assert_eq!(status_icon(Status::Warning), "⚠");
        assert_eq!(status_icon(Status::Search), "🔍");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
        assert_eq!(truncate_with_ellipsis("日本語の本", 7), "日本...");
    }

    #[test]
    fn test_cover_label() {
        assert_eq!(
            cover_label(&CoverState::Loaded {
                url: "u".into(),
                bytes: 2048
            }),
            "cover (2.00 KB)"
        );
        assert_eq!(
            cover_label(&CoverState::Pending { url: "u".into() }),
            "cover still loading"
        );
    }

    fn card(position: usize, title: &str) -> RenderedCard {
        RenderedCard {
            position,
            title: title.to_string(),
            author: "Someone".to_string(),
            alt: title.to_string(),
            cover: CoverState::Broken {
                url: "https://img.test/broken.png".to_string(),
            },
            work: crate::models::WorkSummary::new(format!("/works/OL{}W", position), title),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_cards_in_order_with_stagger() {
        let cards = vec![card(0, "Dune"), card(1, "Hyperion"), card(2, "Solaris")];
        let stagger = Duration::from_millis(50);
        let mut out = Vec::new();

        let started = tokio::time::Instant::now();
        reveal_cards(&mut out, &cards, stagger).await.unwrap();
        assert_eq!(started.elapsed(), stagger * 2);

        let text = String::from_utf8(out).unwrap();
        let positions: Vec<usize> = ["Dune", "Hyperion", "Solaris"]
            .iter()
            .map(|title| text.find(title).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(text.matches("no cover").count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_cards_without_stagger() {
        let cards = vec![card(0, "Dune"), card(1, "Hyperion")];
        let mut out = Vec::new();

        let started = tokio::time::Instant::now();
        reveal_cards(&mut out, &cards, Duration::ZERO).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(String::from_utf8(out).unwrap().contains("Hyperion"));

        let mut out = Vec::new();
        reveal_cards(&mut out, &[], Duration::from_secs(1)).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("a desert planet called Arrakis", 12);
        assert_eq!(lines, vec!["a desert", "planet", "called", "Arrakis"]);
        assert_eq!(wrap("", 20), Vec::<String>::new());
    }
}
