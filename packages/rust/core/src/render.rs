//! Output writer: persists generated fragments to a per-product directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, instrument};

use copydesk_catalog::SpecEntry;
use copydesk_shared::{CopydeskError, GeneratedContent, Result};

pub const DESCRIPTION_HTML: &str = "description.html";
pub const DESCRIPTION_MD: &str = "description.md";
pub const SPEC_TABLE_HTML: &str = "spec-table.html";
pub const META_TXT: &str = "meta.txt";
pub const TITLE_TXT: &str = "title.txt";
pub const CONTENT_JSON: &str = "content.json";

/// Which files to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// HTML fragments, meta, title and `content.json`.
    #[default]
    Html,
    /// Everything in `Html` plus `description.md`.
    Markdown,
    /// `content.json` only.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = CopydeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(CopydeskError::validation(format!(
                "unknown output format '{other}' (expected html, markdown or json)"
            ))),
        }
    }
}

#[derive(Serialize)]
struct ContentFile<'a> {
    #[serde(flatten)]
    content: &'a GeneratedContent,
    specs: &'a [SpecEntry],
}

/// Directory name for a product code: `03/185` → `03-185`.
pub fn code_slug(code: &str) -> String {
    let slug: String = code
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "product".to_string()
    } else {
        slug.to_string()
    }
}

/// Write the fragments under `out_root/<code-slug>/`. Returns the written
/// file paths in write order.
#[instrument(skip_all, fields(code = %content.code, format = %format))]
pub fn write_outputs(
    out_root: &Path,
    content: &GeneratedContent,
    specs: &[SpecEntry],
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let dir = out_root.join(code_slug(&content.code));
    std::fs::create_dir_all(&dir).map_err(|e| CopydeskError::io(&dir, e))?;

    let json = serde_json::to_string_pretty(&ContentFile { content, specs })
        .map_err(|e| CopydeskError::Conversion(format!("content serialization failed: {e}")))?;

    let mut files: Vec<(&str, String)> = Vec::new();
    if format != OutputFormat::Json {
        files.push((DESCRIPTION_HTML, content.description_html.clone()));
        files.push((SPEC_TABLE_HTML, content.spec_table_html.clone()));
        files.push((META_TXT, format!("{}\n", content.meta_description)));
        files.push((TITLE_TXT, format!("{}\n", content.title)));
    }
    if format == OutputFormat::Markdown {
        files.push((DESCRIPTION_MD, to_markdown(content, specs)?));
    }
    files.push((CONTENT_JSON, json));

    files
        .iter()
        .map(|(name, body)| write_atomic(&dir, name, body))
        .collect()
}

/// Description as Markdown with the spec table appended.
pub fn to_markdown(content: &GeneratedContent, specs: &[SpecEntry]) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .build();
    let body = converter
        .convert(&content.description_html)
        .map_err(|e| CopydeskError::Conversion(format!("htmd conversion failed: {e}")))?;

    let mut md = format!("# {}\n\n{}\n", content.title, body.trim());
    if !specs.is_empty() {
        // htmd has no table support; rows are emitted directly.
        md.push_str("\n## Technical Specifications\n\n| Specification | Value |\n| --- | --- |\n");
        for entry in specs {
            md.push_str(&format!(
                "| {} | {} |\n",
                entry.key.replace('|', "\\|"),
                entry.value.replace('|', "\\|")
            ));
        }
    }
    Ok(md)
}

fn write_atomic(dir: &Path, filename: &str, body: &str) -> Result<PathBuf> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, body).map_err(|e| CopydeskError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| CopydeskError::io(&target, e))?;

    debug!(file = %filename, size = body.len(), "wrote output");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn content() -> GeneratedContent {
        GeneratedContent {
            code: "03/185".into(),
            title: "Hilti TE1000 AVR Electric Breaker".into(),
            category: "Breaking & Drilling".into(),
            description_html: "<p>The Hilti TE1000 is a breaker.</p><ul class=\"product-features\"><li>Low vibration</li></ul>".into(),
            spec_table_html: "<table class=\"technical-specifications\"><tbody></tbody></table>".into(),
            meta_description: "Hire the Hilti TE1000.".into(),
            style_confidence: 0.5,
            samples_used: 2,
            style: Default::default(),
            enrichment_sources: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    fn specs() -> Vec<SpecEntry> {
        vec![SpecEntry {
            key: "Weight".into(),
            value: "29.9kg".into(),
        }]
    }

    #[test]
    fn slugs_codes() {
        assert_eq!(code_slug("03/185"), "03-185");
        assert_eq!(code_slug(" 12-004 "), "12-004");
        assert_eq!(code_slug("//"), "product");
    }

    #[test]
    fn parses_formats() {
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn writes_html_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = write_outputs(dir.path(), &content(), &specs(), OutputFormat::Html).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [DESCRIPTION_HTML, SPEC_TABLE_HTML, META_TXT, TITLE_TXT, CONTENT_JSON]);

        let product_dir = dir.path().join("03-185");
        let title = std::fs::read_to_string(product_dir.join(TITLE_TXT)).unwrap();
        assert_eq!(title.trim(), "Hilti TE1000 AVR Electric Breaker");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(product_dir.join(CONTENT_JSON)).unwrap())
                .unwrap();
        assert_eq!(json["code"], "03/185");
        assert_eq!(json["specs"][0]["key"], "Weight");

        // No temp files left behind.
        assert!(std::fs::read_dir(&product_dir)
            .unwrap()
            .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")));
    }

    #[test]
    fn json_format_writes_only_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = write_outputs(dir.path(), &content(), &[], OutputFormat::Json).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("03-185/content.json"));
    }

    #[test]
    fn markdown_includes_spec_rows() {
        let md = to_markdown(&content(), &specs()).unwrap();
        assert!(md.starts_with("# Hilti TE1000 AVR Electric Breaker"));
        assert!(md.contains("The Hilti TE1000 is a breaker."));
        assert!(md.contains("Low vibration"));
        assert!(md.contains("| Weight | 29.9kg |"));
    }
}
