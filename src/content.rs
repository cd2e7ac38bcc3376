use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::llm::FieldSpec;

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

/// Crawled content arrives as markdown or as a full HTML document. HTML is
/// reduced to the visible text of its `<body>`; anything else passes through.
pub fn prepare_content(content: &str) -> String {
    if looks_like_html(content) {
        if let Some(text) = extract_body_text(content) {
            return format_text(&text);
        }
    }
    content.trim().to_string()
}

fn looks_like_html(content: &str) -> bool {
    let head = content.trim_start();
    if !head.starts_with('<') {
        return false;
    }
    let lower = head.to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.contains("<html") || lower.contains("<body")
}

pub fn extract_body_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&BODY_SELECTOR)
        .next()
        .map(|element| element.text().collect::<Vec<_>>().join("\n"))
        .filter(|text| !text.trim().is_empty())
}

/// Trims every line and drops the blank ones.
pub fn format_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(line);
    }

    result
}

pub fn build_prompt(content: &str, fields: &[FieldSpec]) -> String {
    let field_lines = fields
        .iter()
        .map(|field| format!("{}: {}", field.name, field.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut result = String::with_capacity(content.len() + field_lines.len() + 250);
    result.push_str("Extract the following information from the provided content.\n");
    result.push_str("If a field cannot be found, return \"N/A\". Format the response as JSON.\n\n");
    result.push_str("Fields to extract:\n");
    result.push_str(&field_lines);
    result.push_str("\n\nContent:\n");
    result.push_str(content);
    result.push_str("\n\nReturn only the JSON object with the extracted fields.");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_passes_through() {
        let md = "\n# Title\n\nSome *text*\n";
        assert_eq!(prepare_content(md), "# Title\n\nSome *text*");
    }

    #[test]
    fn html_document_is_reduced_to_body_text() {
        let html = r#"<!DOCTYPE html>
            <html><head><title>Ignored</title><style>p {}</style></head>
            <body>
                <h1>Acme Corp</h1>
                <p>Founded in   1999</p>
            </body></html>"#;

        let text = prepare_content(html);
        assert!(text.contains("Acme Corp"));
        assert!(text.contains("Founded in   1999"));
        assert!(!text.contains("Ignored"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn fragments_without_document_markers_are_untouched() {
        assert_eq!(prepare_content("<p>just a fragment</p>"), "<p>just a fragment</p>");
    }

    #[test]
    fn format_text_drops_blank_lines() {
        assert_eq!(format_text("  a \n\n   \n b\n"), "a\nb");
    }

    #[test]
    fn prompt_lists_fields_in_order() {
        let fields = vec![
            FieldSpec {
                name: "company".into(),
                description: "Company name".into(),
            },
            FieldSpec {
                name: "founded".into(),
                description: "Year founded".into(),
            },
        ];

        let prompt = build_prompt("Acme, since 1999", &fields);
        let company = prompt.find("company: Company name").unwrap();
        let founded = prompt.find("founded: Year founded").unwrap();
        assert!(company < founded);
        assert!(prompt.contains("Content:\nAcme, since 1999"));
        assert!(prompt.contains("\"N/A\""));
    }
}
