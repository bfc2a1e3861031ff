use std::path::PathBuf;

use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::error::Result;
use crate::models::question::Level;
use crate::models::session::{Outcome, Session};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const HIGHLY_RECOMMENDED_AT: f64 = 85.0;

const LEVEL_DESCRIPTIONS: [&str; 5] = [
    "Basic / fundamental knowledge",
    "Intermediate knowledge",
    "Advanced knowledge",
    "Expert knowledge",
    "Maximum difficulty knowledge",
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportSummary {
    pub level: Level,
    pub points: u32,
    pub answered: usize,
    pub accuracy: f64,
    pub approved: bool,
    pub recommendation: &'static str,
}

struct PageWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            regular,
            bold,
            layer,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Page {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool, indent: f32) {
        let line_height = size * 0.45;
        // Helvetica averages roughly half an em per character.
        let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN - indent) / (size * 0.19)).max(20.0) as usize;
        for line in wrap(text, max_chars) {
            self.ensure_room(line_height);
            self.y -= line_height;
            let font = if bold { &self.bold } else { &self.regular };
            self.layer
                .use_text(line, size, Mm(MARGIN + indent), Mm(self.y), font);
        }
    }

    fn field(&mut self, label: &str, value: &str) {
        self.text(&format!("{} {}", label, value), 10.0, false, 4.0);
    }

    fn heading(&mut self, text: &str) {
        self.gap(5.0);
        self.text(text, 13.0, true, 0.0);
        self.gap(2.0);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone)]
pub struct ReportService {
    points_per_correct: u32,
    passing_percentage: f64,
    reports_dir: PathBuf,
}

impl ReportService {
    pub fn new(points_per_correct: u32, passing_percentage: f64, reports_dir: PathBuf) -> Self {
        Self {
            points_per_correct,
            passing_percentage,
            reports_dir,
        }
    }

    pub fn summarize(&self, session: &Session) -> ReportSummary {
        let accuracy = session.accuracy(self.points_per_correct);
        let recommendation = if accuracy >= HIGHLY_RECOMMENDED_AT {
            "HIGHLY RECOMMENDED CANDIDATE: shows excellent technical competence and a strong capacity to learn. Suitable for positions of responsibility."
        } else if accuracy >= self.passing_percentage {
            "RECOMMENDED CANDIDATE: meets the minimum technical requirements. Suitable for the role with complementary training."
        } else {
            "CANDIDATE NOT RECOMMENDED: does not reach the minimum required level. Consider candidates with stronger technical preparation."
        };
        ReportSummary {
            level: session.level,
            points: session.points,
            answered: session.answered(),
            accuracy,
            approved: accuracy >= self.passing_percentage,
            recommendation,
        }
    }

    pub fn file_name(session: &Session) -> String {
        let document = session
            .candidate
            .document
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| d.replace(|c: char| !c.is_ascii_alphanumeric(), "_"))
            .unwrap_or_else(|| "NO_DOC".to_string());
        format!(
            "evaluation_report_{}_{}.pdf",
            document,
            Utc::now().format("%Y%m%d_%H%M%S")
        )
    }

    pub fn render(&self, session: &Session) -> Result<Vec<u8>> {
        let summary = self.summarize(session);
        let mut w = PageWriter::new("Candidate evaluation report")?;

        w.text("CANDIDATE EVALUATION REPORT", 18.0, true, 0.0);
        w.gap(3.0);
        w.text("Candidate Evaluation System", 10.0, true, 0.0);
        w.text(
            &format!("Generated: {}", Utc::now().format("%d/%m/%Y %H:%M")),
            10.0,
            false,
            0.0,
        );

        let info = &session.candidate;
        let na = |v: &Option<String>| v.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| "N/A".to_string());
        w.heading("CANDIDATE INFORMATION");
        w.field("Full name:", if info.full_name.is_empty() { "N/A" } else { &info.full_name });
        w.field("Identity document:", &na(&info.document));
        w.field("Email:", &na(&info.email));
        w.field("Phone:", &na(&info.phone));
        w.field("Evaluation date:", &session.started_at.format("%Y-%m-%d").to_string());

        w.heading("RESULTS SUMMARY");
        w.field("Highest level reached:", &format!("{} of {}", summary.level, Level::MAX));
        w.field("Total score:", &format!("{} points", summary.points));
        w.field("Questions answered:", &summary.answered.to_string());
        w.field("Accuracy:", &format!("{:.1}%", summary.accuracy));
        w.field("STATUS:", if summary.approved { "APPROVED" } else { "NOT APPROVED" });

        w.heading("DETAILED ANALYSIS BY LEVEL");
        for (idx, description) in LEVEL_DESCRIPTIONS.iter().enumerate() {
            let level = idx as u8 + 1;
            let (status, detail) = if level <= summary.level.get() {
                (
                    "COMPLETED",
                    format!("The candidate showed competence in {}", description.to_lowercase()),
                )
            } else {
                ("NOT EVALUATED", "Level not reached during the evaluation".to_string())
            };
            w.text(&format!("Level {}: {} - {}", level, description, status), 10.0, true, 4.0);
            w.text(&detail, 10.0, false, 8.0);
        }

        w.heading("RECOMMENDATION FOR HUMAN RESOURCES");
        w.text(summary.recommendation, 11.0, false, 4.0);

        if !session.answers.is_empty() {
            w.heading("ANSWER DETAIL");
            for (n, answer) in session.answers.iter().enumerate() {
                let mark = match answer.outcome {
                    Outcome::Correct => "correct",
                    Outcome::Partial => "partial",
                    Outcome::Incorrect => "incorrect",
                };
                w.text(
                    &format!(
                        "{}. [Level {}] {} - {} (+{})",
                        n + 1,
                        answer.level,
                        answer.question_text,
                        mark,
                        answer.points_awarded
                    ),
                    9.0,
                    false,
                    4.0,
                );
            }
        }

        w.gap(8.0);
        w.text(
            "This report was generated automatically by the Candidate Evaluation System.",
            8.0,
            false,
            0.0,
        );
        w.text(
            "For technical questions or clarifications, contact the Systems department.",
            8.0,
            false,
            0.0,
        );

        w.finish()
    }

    /// Renders the report and keeps a copy under the reports directory.
    pub async fn write(&self, session: &Session) -> Result<(String, Vec<u8>)> {
        let bytes = self.render(session)?;
        let name = Self::file_name(session);
        tokio::fs::create_dir_all(&self.reports_dir).await?;
        tokio::fs::write(self.reports_dir.join(&name), &bytes).await?;
        tracing::info!("Report {} written for {}", name, session.code);
        Ok((name, bytes))
    }
}
