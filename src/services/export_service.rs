use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus};

pub struct ExportService;

const COLUMNS: [(&str, f64); 9] = [
    ("#", 6.0),
    ("Student", 28.0),
    ("Job", 30.0),
    ("Company", 26.0),
    ("Status", 16.0),
    ("Applied on", 18.0),
    ("Resume", 36.0),
    ("Cover letter", 50.0),
    ("Last update", 20.0),
];

fn status_color(status: ApplicationStatus) -> Color {
    match status {
        ApplicationStatus::Pending => Color::RGB(0x3B82F6),
        ApplicationStatus::UnderReview => Color::RGB(0xF59E0B),
        ApplicationStatus::Shortlisted => Color::RGB(0x8B5CF6),
        ApplicationStatus::Selected => Color::RGB(0x10B981),
        ApplicationStatus::Rejected => Color::RGB(0xEF4444),
    }
}

/// Per-status totals in display order, zero rows omitted.
pub fn status_summary(applications: &[Application]) -> String {
    ApplicationStatus::ALL
        .iter()
        .filter_map(|status| {
            let n = applications.iter().filter(|a| a.status == *status).count();
            (n > 0).then(|| format!("{}: {}", status, n))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

impl ExportService {
    /// Styled single-sheet workbook of the given applications.
    pub fn applications_xlsx(applications: &[Application]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Applications")?;

        let header_bg = Color::RGB(0x0F172A);
        let title_bg = Color::RGB(0x1E293B);
        let border = Color::RGB(0xE2E8F0);
        let last_col = (COLUMNS.len() - 1) as u16;

        for (i, (_, width)) in COLUMNS.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(title_bg)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        worksheet.merge_range(0, 0, 0, last_col, "Applications report", &title)?;

        let subtitle = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(title_bg)
            .set_align(FormatAlign::CenterAcross);
        let generated = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
        worksheet.merge_range(
            1,
            0,
            1,
            last_col,
            &format!("Generated {}  •  {} application(s)", generated, applications.len()),
            &subtitle,
        )?;

        let header = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border);
        let header_row = 2;
        worksheet.set_row_height(header_row, 26)?;
        for (i, (name, _)) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header)?;
        }

        let first_row = header_row + 1;
        for (idx, app) in applications.iter().enumerate() {
            let row = first_row + idx as u32;
            let bg = if idx % 2 == 0 { Color::RGB(0xF8FAFC) } else { Color::White };
            let base = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border);
            let center = base.clone().set_align(FormatAlign::Center);
            let wrap = base.clone().set_text_wrap();
            let status = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(status_color(app.status))
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin)
                .set_border_color(border);

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center)?;
            worksheet.write_string_with_format(row, 1, app.student_name.as_deref().unwrap_or("-"), &base)?;
            worksheet.write_string_with_format(row, 2, app.job_title.as_deref().unwrap_or("-"), &base)?;
            worksheet.write_string_with_format(row, 3, app.company_name.as_deref().unwrap_or("-"), &base)?;
            worksheet.write_string_with_format(row, 4, app.status.as_str(), &status)?;
            worksheet.write_string_with_format(
                row,
                5,
                &app.application_date.format("%Y-%m-%d").to_string(),
                &center,
            )?;
            worksheet.write_string_with_format(row, 6, app.resume_url.as_deref().unwrap_or("-"), &wrap)?;
            worksheet.write_string_with_format(row, 7, app.cover_letter.as_deref().unwrap_or("-"), &wrap)?;
            worksheet.write_string_with_format(
                row,
                8,
                &app.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                &center,
            )?;
        }

        let summary_row = first_row + applications.len() as u32 + 1;
        let summary = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border);
        worksheet.merge_range(
            summary_row,
            0,
            summary_row,
            1,
            &format!("Total: {}", applications.len()),
            &summary,
        )?;
        let by_status = status_summary(applications);
        worksheet.merge_range(
            summary_row,
            2,
            summary_row,
            last_col,
            if by_status.is_empty() { "-" } else { &by_status },
            &summary,
        )?;

        worksheet.set_freeze_panes(first_row, 0)?;
        let last_row = (first_row + applications.len() as u32).saturating_sub(1).max(header_row);
        worksheet.autofilter(header_row, 0, last_row, last_col)?;

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn application(status: ApplicationStatus) -> Application {
        Application {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: Some("Ann Lee".into()),
            job_id: Uuid::new_v4(),
            job_title: Some("Backend intern".into()),
            company_id: None,
            company_name: Some("Acme".into()),
            status,
            application_date: Utc::now(),
            cover_letter: None,
            resume_url: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_only_present_statuses() {
        let apps = vec![
            application(ApplicationStatus::Pending),
            application(ApplicationStatus::Rejected),
            application(ApplicationStatus::Pending),
        ];
        assert_eq!(status_summary(&apps), "Pending: 2 | Rejected: 1");
        assert_eq!(status_summary(&[]), "");
    }

    #[test]
    fn workbook_is_a_zip_archive() {
        let bytes = ExportService::applications_xlsx(&[application(ApplicationStatus::Selected)]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        let empty = ExportService::applications_xlsx(&[]).unwrap();
        assert_eq!(&empty[..2], b"PK");
    }
}
