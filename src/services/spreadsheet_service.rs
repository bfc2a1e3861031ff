use std::io::{Read, Seek};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use calamine::{Data, Reader, Xlsx};

use crate::error::{Error, Result};
use crate::models::question::{option_index, AnswerKey, Level, Question, OPTION_LETTERS};

const PROMPT_HEADERS: &[&str] = &["PREGUNTA", "QUESTION", "PROMPT"];
const ANSWER_HEADERS: &[&str] = &["RESPUESTA CORRECTA 1", "RESPUESTA CORRECTA", "RESPUESTA", "CORRECT", "ANSWER"];
const LEVEL_HEADERS: &[&str] = &["NIVEL", "LEVEL", "DIFICULTAD"];
const IMAGE_HEADERS: &[&str] = &["IMAGEN", "IMAGE"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub prompt: usize,
    pub options: Vec<usize>,
    pub answer: usize,
    pub level: usize,
    pub image: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> Result<Self> {
        let normalized: Vec<String> = header.iter().map(|h| h.trim().to_uppercase()).collect();
        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| normalized.iter().position(|h| h == name))
        };

        let prompt = find(PROMPT_HEADERS)
            .ok_or_else(|| Error::Spreadsheet("question column not found".to_string()))?;
        let answer = find(ANSWER_HEADERS)
            .ok_or_else(|| Error::Spreadsheet("correct answer column not found".to_string()))?;
        let level = find(LEVEL_HEADERS)
            .ok_or_else(|| Error::Spreadsheet("level column not found".to_string()))?;
        let image = find(IMAGE_HEADERS);

        let options: Vec<usize> = OPTION_LETTERS
            .iter()
            .map_while(|letter| normalized.iter().position(|h| *h == letter.to_string()))
            .collect();
        if options.len() < 2 {
            return Err(Error::Spreadsheet(
                "at least option columns A and B are required".to_string(),
            ));
        }

        Ok(Self {
            prompt,
            options,
            answer,
            level,
            image,
        })
    }

    pub fn describe(&self, header: &[String]) -> Vec<(String, String)> {
        let name = |idx: usize| header.get(idx).cloned().unwrap_or_default();
        let mut out = vec![
            ("prompt".to_string(), name(self.prompt)),
            ("answer".to_string(), name(self.answer)),
            ("level".to_string(), name(self.level)),
        ];
        let opts: Vec<String> = self.options.iter().map(|&i| name(i)).collect();
        out.push(("options".to_string(), opts.join(", ")));
        if let Some(img) = self.image {
            out.push(("image".to_string(), name(img)));
        }
        out
    }
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// First integer in the cell, clamped to the level range. Blank or digit-free cells are level 1.
pub fn extract_level(raw: &str) -> Level {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Level::MIN;
    }
    // A digit run too long for i64 is still above the top level.
    digits.parse::<i64>().map(Level::clamped).unwrap_or(Level::MAX)
}

pub fn parse_answer_key(raw: &str, options: &[String]) -> AnswerKey {
    if let Some(idx) = option_index(raw, options) {
        return AnswerKey::single(idx);
    }

    if raw.contains(',') || raw.contains(';') {
        let parts: Vec<Option<usize>> = raw
            .split([',', ';'])
            .filter(|p| !p.trim().is_empty())
            .map(|p| option_index(p, options))
            .collect();
        if !parts.is_empty() && parts.iter().all(Option::is_some) {
            return AnswerKey::new(parts.into_iter().flatten().collect());
        }
    }

    tracing::warn!("Unrecognized answer key '{}', defaulting to option A", raw);
    AnswerKey::single(0)
}

/// Accepts only `data:image/...;base64,` URLs whose payload decodes.
pub fn parse_image(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("data:image/") {
        return None;
    }
    let (_, payload) = trimmed.split_once(";base64,")?;
    STANDARD.decode(payload.trim()).ok()?;
    Some(trimmed.to_string())
}

pub fn parse_row(row_number: u32, cells: &[String], columns: &ColumnMap) -> Option<Question> {
    let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

    let prompt = cell(columns.prompt).trim();
    let answer_raw = cell(columns.answer).trim();
    if prompt.is_empty() || prompt.eq_ignore_ascii_case("nan") || answer_raw.is_empty() {
        return None;
    }

    let mut options: Vec<String> = Vec::with_capacity(columns.options.len());
    for &idx in &columns.options {
        let value = cell(idx).trim();
        if value.is_empty() {
            break;
        }
        options.push(value.to_string());
    }
    if options.len() < 2 {
        return None;
    }

    let answer = parse_answer_key(answer_raw, &options);
    Some(Question {
        id: row_number,
        level: extract_level(cell(columns.level)),
        prompt: prompt.to_string(),
        options,
        answer,
        image: columns.image.and_then(|idx| parse_image(cell(idx))),
    })
}

/// Parses header plus data rows. Level 1 questions come first, the rest keep sheet order.
pub fn parse_rows(rows: &[Vec<String>]) -> Result<(ColumnMap, Vec<Question>)> {
    let (header, data) = rows
        .split_first()
        .ok_or_else(|| Error::Spreadsheet("worksheet is empty".to_string()))?;
    let columns = ColumnMap::from_header(header)?;

    let parsed: Vec<Question> = data
        .iter()
        .enumerate()
        .filter_map(|(i, row)| parse_row(i as u32 + 1, row, &columns))
        .collect();

    let (mut ordered, rest): (Vec<Question>, Vec<Question>) =
        parsed.into_iter().partition(|q| q.level == Level::MIN);
    ordered.extend(rest);

    if ordered.is_empty() {
        return Err(Error::Spreadsheet("no usable questions in worksheet".to_string()));
    }
    Ok((columns, ordered))
}

pub struct SpreadsheetService;

impl SpreadsheetService {
    pub fn read_rows<RS: Read + Seek>(reader: RS) -> Result<Vec<Vec<String>>> {
        let mut workbook: Xlsx<RS> = Xlsx::new(reader)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Spreadsheet("workbook has no worksheets".to_string()))??;
        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    pub fn load_from_reader<RS: Read + Seek>(reader: RS) -> Result<Vec<Question>> {
        let rows = Self::read_rows(reader)?;
        let (columns, questions) = parse_rows(&rows)?;
        if let Some(header) = rows.first() {
            for (role, column) in columns.describe(header) {
                tracing::debug!("Column mapping: {} -> '{}'", role, column);
            }
        }
        tracing::info!(
            "Loaded {} questions from {} data rows",
            questions.len(),
            rows.len().saturating_sub(1)
        );
        Ok(questions)
    }

    pub fn load_from_path(path: &Path) -> Result<Vec<Question>> {
        tracing::info!("Loading questions from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| {
            tracing::error!("Cannot open question spreadsheet {}: {}", path.display(), e);
            Error::Spreadsheet(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::load_from_reader(std::io::BufReader::new(file))
    }
}
