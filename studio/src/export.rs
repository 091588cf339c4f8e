//! Document export to md, txt, html and Word-compatible doc.

use shared_types::{slugify, ExportFormat, Section};

use crate::markdown::{escape_html, render_to_html};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export format not supported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub fn export_document(
    title: &str,
    sections: &[Section],
    format: ExportFormat,
) -> Result<ExportedDocument, ExportError> {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|section| section.order);

    let body = match format {
        ExportFormat::Md => to_markdown(&ordered),
        ExportFormat::Txt => to_plain_text(&ordered),
        ExportFormat::Html => to_html(title, &ordered),
        ExportFormat::Doc => to_word_html(title, &ordered),
        ExportFormat::Pdf => return Err(ExportError::Unsupported(format.to_string())),
    };

    Ok(ExportedDocument {
        filename: export_filename(title, format),
        mime: format.mime(),
        bytes: body.into_bytes(),
    })
}

pub fn export_filename(title: &str, format: ExportFormat) -> String {
    let slug = slugify(title);
    let stem = if slug.is_empty() { "document" } else { slug.as_str() };
    format!("{stem}.{}", format.as_str())
}

fn to_markdown(sections: &[&Section]) -> String {
    sections
        .iter()
        .map(|s| format!("# {}\n\n{}\n\n", s.title, s.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_plain_text(sections: &[&Section]) -> String {
    sections
        .iter()
        .map(|s| {
            let underline = "=".repeat(s.title.chars().count());
            format!("{}\n{}\n\n{}\n\n", s.title, underline, s.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_body(title: &str, sections: &[&Section]) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(title));
    for section in sections {
        body.push_str(&format!(
            "<section id=\"{}\">\n<h2>{}</h2>\n{}</section>\n",
            section.slug(),
            escape_html(&section.title),
            render_to_html(&section.content)
        ));
    }
    body
}

fn to_html(title: &str, sections: &[&Section]) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        html_body(title, sections)
    )
}

fn to_word_html(title: &str, sections: &[&Section]) -> String {
    format!(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" xmlns:w=\"urn:schemas-microsoft-com:office:word\" xmlns=\"http://www.w3.org/TR/REC-html40\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        html_body(title, sections)
    )
}
