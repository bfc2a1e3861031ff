use std::collections::HashMap;

use rust_xlsxwriter::*;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::models::session::Session;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook with one row per registered candidate.
    pub fn generate_results_xlsx(
        candidates: &[Candidate],
        sessions: &HashMap<String, Session>,
        points_per_correct: u32,
        passing_percentage: f64,
    ) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Results")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x334155);
        let border_color = Color::RGB(0xCBD5E1);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let passed_color = Color::RGB(0x16A34A);
        let failed_color = Color::RGB(0xDC2626);

        let columns: [(&str, f64); 12] = [
            ("#", 5.0),
            ("Code", 12.0),
            ("Full name", 28.0),
            ("Document", 16.0),
            ("Email", 28.0),
            ("Phone", 16.0),
            ("Status", 14.0),
            ("Level", 8.0),
            ("Points", 10.0),
            ("Answered", 10.0),
            ("Accuracy %", 12.0),
            ("Finished", 18.0),
        ];
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_bold()
            .set_font_size(16)
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 32)?;
        worksheet.merge_range(0, 0, 0, (columns.len() - 1) as u16, "Evaluation results", &title_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 1;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 2;
        for (idx, candidate) in candidates.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };
            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let dash = "—";
            let info = &candidate.info;

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &candidate.code, &center_fmt)?;
            worksheet.write_string_with_format(row, 2, &info.full_name, &base_fmt.clone().set_bold())?;
            worksheet.write_string_with_format(row, 3, info.document.as_deref().unwrap_or(dash), &base_fmt)?;
            worksheet.write_string_with_format(row, 4, info.email.as_deref().unwrap_or(dash), &base_fmt)?;
            worksheet.write_string_with_format(row, 5, info.phone.as_deref().unwrap_or(dash), &base_fmt)?;

            let status = match candidate.status {
                CandidateStatus::Pending => "Pending",
                CandidateStatus::InProgress => "In progress",
                CandidateStatus::Completed => "Completed",
            };
            worksheet.write_string_with_format(row, 6, status, &center_fmt)?;

            match sessions.get(&candidate.code) {
                Some(session) => {
                    let accuracy = session.accuracy(points_per_correct);
                    let accuracy_color = if accuracy >= passing_percentage { passed_color } else { failed_color };
                    worksheet.write_number_with_format(row, 7, session.level.get() as f64, &center_fmt)?;
                    worksheet.write_number_with_format(row, 8, session.points as f64, &center_fmt)?;
                    worksheet.write_number_with_format(row, 9, session.answered() as f64, &center_fmt)?;
                    worksheet.write_number_with_format(
                        row,
                        10,
                        (accuracy * 10.0).round() / 10.0,
                        &center_fmt.clone().set_bold().set_font_color(accuracy_color),
                    )?;
                    let finished = session
                        .finished_at
                        .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
                        .unwrap_or_else(|| dash.to_string());
                    worksheet.write_string_with_format(row, 11, &finished, &center_fmt)?;
                }
                None => {
                    for col in 7..columns.len() as u16 {
                        worksheet.write_string_with_format(row, col, dash, &center_fmt)?;
                    }
                }
            }
        }

        let total_row = data_start_row + candidates.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let completed = candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Completed)
            .count();
        let summary = format!("Total: {} candidates | Completed: {}", candidates.len(), completed);
        worksheet.merge_range(total_row, 0, total_row, (columns.len() - 1) as u16, &summary, &summary_fmt)?;

        worksheet.set_freeze_panes(2, 0)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::CandidateInfo;
    use calamine::{Reader, Xlsx};
    use chrono::Utc;
    use std::io::Cursor;

    #[test]
    fn exports_one_row_per_candidate() {
        let now = Utc::now();
        let candidates = vec![
            Candidate {
                code: "AAAA2222".into(),
                info: CandidateInfo {
                    full_name: "Ana".into(),
                    ..Default::default()
                },
                status: CandidateStatus::Completed,
                created_at: now,
                updated_at: now,
            },
            Candidate {
                code: "BBBB3333".into(),
                info: CandidateInfo {
                    full_name: "Luis".into(),
                    ..Default::default()
                },
                status: CandidateStatus::Pending,
                created_at: now,
                updated_at: now,
            },
        ];
        let mut session = Session::new("AAAA2222", candidates[0].info.clone());
        session.points = 30;
        let sessions = HashMap::from([(session.code.clone(), session)]);

        let buffer = ExportService::generate_results_xlsx(&candidates, &sessions, 10, 70.0).unwrap();
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(buffer)).unwrap();
        let range = workbook.worksheet_range("Results").unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(crate::services::spreadsheet_service::cell_text).collect())
            .collect();
        assert_eq!(rows[1][1], "Code");
        assert_eq!(rows[2][1], "AAAA2222");
        assert_eq!(rows[2][8], "30");
        assert_eq!(rows[3][2], "Luis");
        assert_eq!(rows[3][8], "—");
    }
}
