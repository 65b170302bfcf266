//! Output types returned by the conversion entry points.

use crate::error::ParseWarning;
use crate::pipeline::assemble::Document;
use crate::pipeline::slug::HeadingRef;
use serde::Serialize;

/// Result of a Markdown → PDF conversion.
///
/// `pdf` is omitted when serialized; the rest describes the run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    #[serde(skip)]
    pub pdf: Vec<u8>,

    /// Resolved document title, if any.
    pub title: Option<String>,

    /// Headings in document order, with their anchor ids.
    pub headings: Vec<HeadingRef>,

    /// Non-fatal problems, in the order they occurred.
    pub warnings: Vec<ParseWarning>,
}

/// Result of the browser-free half of a conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Transformed {
    pub document: Document,
    pub headings: Vec<HeadingRef>,
    pub warnings: Vec<ParseWarning>,
}

impl Transformed {
    /// Attach the exported PDF bytes.
    pub fn into_output(self, pdf: Vec<u8>) -> ConversionOutput {
        ConversionOutput {
            pdf,
            title: self.document.title,
            headings: self.headings,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::assemble;
    use crate::tables::{ConfigResolver, ConfigTables};

    #[test]
    fn serialized_output_skips_pdf_bytes() {
        let tables = ConfigTables::builtin();
        let config = ConfigResolver::new(&tables)
            .resolve("a4", "latin", "color")
            .unwrap();
        let transformed = Transformed {
            document: assemble("<h1>Report</h1>".into(), None, config),
            headings: vec![HeadingRef {
                level: 1,
                raw_text: "Report".into(),
                anchor_id: "report".into(),
            }],
            warnings: vec![ParseWarning::UnknownPagingTag { tag: "x".into() }],
        };
        let output = transformed.into_output(b"%PDF".to_vec());
        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("pdf").is_none());
        assert_eq!(json["title"], "Report");
        assert_eq!(json["headings"][0]["anchor_id"], "report");
        assert_eq!(json["warnings"][0]["UnknownPagingTag"]["tag"], "x");
    }
}
