//! CLI command implementations

pub mod config;
pub mod generate;
pub mod history;
pub mod scrape;
pub mod serve;
pub mod show;
pub mod status;

use wikiquiz_core::QuizResponse;

/// Print a quiz in human-readable form
pub(crate) fn print_quiz(quiz: &QuizResponse) {
    println!(
        "📝 {}  (#{})",
        quiz.title.as_deref().unwrap_or("Untitled"),
        quiz.id
    );
    println!("   {}", quiz.url);
    println!(
        "   Generated {}",
        quiz.date_generated.format("%Y-%m-%d %H:%M UTC")
    );

    match &quiz.summary {
        Some(summary) => println!("\n{}\n", summary),
        None => println!("\n(quiz data unavailable)\n"),
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        println!("{}. {}", i + 1, q.question);
        for (letter, option) in ('a'..='z').zip(&q.options) {
            let mark = if option == &q.answer { " ✓" } else { "" };
            println!("   {}) {}{}", letter, option, mark);
        }
        println!();
    }
}

/// Truncate to `max_len` characters, marking the cut with an ellipsis
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
