//! Filing markup → plain text.
//!
//! DART documents are loosely formed XML. Every text node becomes its own line, so
//! section titles such as `<TITLE>Ⅰ. 모집 또는 매출에 관한 사항</TITLE>` start a line and
//! tag or attribute names never reach the index.

use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("static regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

/// Extract the text nodes of `xml`, one per line.
///
/// Malformed input is tolerated: mismatched end tags are ignored, undecodable entities are
/// kept verbatim, and a fatal parse error keeps whatever text was read before it. Input
/// without any markup comes back as its own (whitespace-collapsed) text.
pub fn extract_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut lines: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        let s = s.trim();
        if !s.is_empty() {
            lines.push(s.to_string());
        }
    };

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => match t.unescape_with(resolve_html_entity) {
                Ok(s) => push(s.as_ref()),
                Err(_) => push(String::from_utf8_lossy(&t).as_ref()),
            },
            Ok(Event::CData(c)) => push(String::from_utf8_lossy(&c).as_ref()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "markup parse stopped at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
        }
    }

    let text = lines.join("\n");
    let text = INLINE_SPACE.replace_all(&text, " ");
    BLANK_LINES.replace_all(&text, "\n\n").into_owned()
}

// Filings are authored in HTML-ish editors and carry entities XML does not predefine.
fn resolve_html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some(" "),
        "middot" => Some("·"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_nodes_become_lines_without_tags() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<DOCUMENT xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <DOCUMENT-NAME ACODE="11301">증권발행실적보고서</DOCUMENT-NAME>
  <BODY>
    <TITLE ATOC="Y" AASSOCNOTE="D-0-1-0-0">Ⅰ. 모집   또는 매출에 관한 사항</TITLE>
    <P><SPAN USERMARK="F-14">총발행금액</SPAN>&nbsp;100,000,000원 &amp; 기타</P>
  </BODY>
</DOCUMENT>"#;
        assert_eq!(
            extract_text(xml),
            "증권발행실적보고서\nⅠ. 모집 또는 매출에 관한 사항\n총발행금액\n100,000,000원 & 기타"
        );
    }

    #[test]
    fn cdata_and_unknown_entities_are_kept() {
        let xml = "<P><![CDATA[A < B]]></P><P>R&D&unknown;</P>";
        assert_eq!(extract_text(xml), "A < B\nR&D&unknown;");
    }

    #[test]
    fn mismatched_end_tags_do_not_lose_text() {
        let xml = "<BODY><P>첫째</SPAN><P>둘째</BODY>";
        assert_eq!(extract_text(xml), "첫째\n둘째");
    }

    #[test]
    fn plain_text_passes_through_collapsed() {
        let text = "Ⅰ. 개요\t\t본문\n\n\n\nⅡ. 조건";
        assert_eq!(extract_text(text), "Ⅰ. 개요 본문\n\nⅡ. 조건");
    }
}
