//! Loads a question spreadsheet exactly as the server does and prints what it found.

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use quiz_backend::models::question::OPTION_LETTERS;
use quiz_backend::services::{
    question_bank::QuestionBank,
    spreadsheet_service::{parse_rows, SpreadsheetService},
};

#[derive(Parser, Debug)]
#[command(name = "quiz-levels")]
#[command(about = "Inspect the column mapping and level distribution of a question spreadsheet")]
struct Cli {
    /// Path to the .xlsx file
    path: PathBuf,

    /// Questions to preview per level
    #[arg(short, long, default_value_t = 2)]
    sample: usize,

    /// Print the answer key of previewed questions
    #[arg(long)]
    show_answers: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();
    let cli = Cli::parse();

    let rows = SpreadsheetService::read_rows(File::open(&cli.path)?)?;
    println!("{}: {} rows including header", cli.path.display(), rows.len());
    let (columns, questions) = parse_rows(&rows)?;

    println!("\nColumn mapping:");
    let header = rows.first().cloned().unwrap_or_default();
    for (role, name) in columns.describe(&header) {
        println!("  {:<8} -> {}", role, name);
    }

    let bank = QuestionBank::new(questions);
    println!("\n{} usable questions", bank.len());
    for (level, count) in bank.distribution() {
        println!("  level {}: {} questions", level, count);
    }

    for level in bank.levels() {
        println!("\nLevel {}:", level);
        for q in bank.all().iter().filter(|q| q.level == level).take(cli.sample) {
            println!("  [{}] {}", q.id, q.prompt);
            for (letter, option) in OPTION_LETTERS.iter().zip(&q.options) {
                println!("      {}) {}", letter, option);
            }
            if cli.show_answers {
                println!("      answer: {}", q.correct_texts().join(", "));
            }
            if q.image.is_some() {
                println!("      (has image)");
            }
        }
    }
    Ok(())
}
