//! Document templates and initial section sets.

use shared_types::{DocumentTemplate, Section};

pub const DEFAULT_SECTION_TITLE: &str = "Main Content";

const BUILTIN_TEMPLATES: &[(&str, &str, &[&str])] = &[
    (
        "research-paper",
        "Research Paper",
        &[
            "Abstract",
            "Introduction",
            "Literature Review",
            "Methodology",
            "Results",
            "Discussion",
            "Conclusion",
            "References",
        ],
    ),
    (
        "thesis",
        "Thesis",
        &[
            "Abstract",
            "Acknowledgements",
            "Introduction",
            "Literature Review",
            "Methodology",
            "Findings",
            "Discussion",
            "Conclusion",
            "Bibliography",
        ],
    ),
    ("essay", "Essay", &["Introduction", "Body", "Conclusion"]),
    (
        "literature-review",
        "Literature Review",
        &["Introduction", "Themes", "Gaps", "Conclusion"],
    ),
    (
        "lab-report",
        "Lab Report",
        &[
            "Title",
            "Abstract",
            "Introduction",
            "Materials and Methods",
            "Results",
            "Discussion",
            "References",
        ],
    ),
    ("blank", "Blank Document", &[DEFAULT_SECTION_TITLE]),
];

pub fn builtin_templates() -> Vec<DocumentTemplate> {
    BUILTIN_TEMPLATES
        .iter()
        .map(|(id, name, sections)| DocumentTemplate {
            id: (*id).to_string(),
            name: (*name).to_string(),
            sections: sections.iter().map(|s| (*s).to_string()).collect(),
        })
        .collect()
}

pub fn find_template(id: &str) -> Option<DocumentTemplate> {
    let id = id.trim();
    builtin_templates()
        .into_iter()
        .find(|template| template.id.eq_ignore_ascii_case(id))
}

/// One empty section per title, in order. No titles means one "Main Content" section.
pub fn initial_sections(titles: &[String]) -> Vec<Section> {
    if titles.is_empty() {
        return vec![Section::new(DEFAULT_SECTION_TITLE, 0)];
    }
    titles
        .iter()
        .enumerate()
        .map(|(order, title)| Section::new(title.clone(), order as u32))
        .collect()
}
