//! Parse sitemap.xml and sitemap index documents.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::error::{HarvestError, HarvestResult};

/// What a sitemap entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A page listed in a `<urlset>`.
    Page,
    /// A nested sitemap listed in a `<sitemapindex>`.
    Sitemap,
}

/// An entry from a sitemap.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    pub kind: EntryKind,
    pub lastmod: Option<DateTime<Utc>>,
    pub priority: Option<f32>,
}

/// Parse a sitemap XML string into entries, in document order.
/// Handles both urlset and sitemap index documents.
pub fn parse_sitemap(xml: &str) -> HarvestResult<Vec<SitemapEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut open: Option<EntryKind> = None;
    let mut current_tag = String::new();
    let mut loc = String::new();
    let mut lastmod = String::new();
    let mut priority = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" | "sitemap" => {
                        open = Some(if name == "url" {
                            EntryKind::Page
                        } else {
                            EntryKind::Sitemap
                        });
                        loc.clear();
                        lastmod.clear();
                        priority.clear();
                        current_tag.clear();
                    }
                    _ => current_tag = name,
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (name.as_str(), open) {
                    ("url", Some(EntryKind::Page)) | ("sitemap", Some(EntryKind::Sitemap)) => {
                        if !loc.is_empty() {
                            entries.push(SitemapEntry {
                                url: loc.clone(),
                                kind: open.unwrap_or(EntryKind::Page),
                                lastmod: parse_date(&lastmod),
                                priority: priority.trim().parse::<f32>().ok(),
                            });
                        }
                        open = None;
                    }
                    _ => current_tag.clear(),
                }
            }
            Ok(Event::Text(e)) if open.is_some() => {
                let text = e.unescape().unwrap_or_default();
                let field = field_for(&current_tag, &mut loc, &mut lastmod, &mut priority);
                if let Some(field) = field {
                    *field = text.trim().to_string();
                }
            }
            Ok(Event::CData(e)) if open.is_some() => {
                let text = String::from_utf8_lossy(&e);
                let field = field_for(&current_tag, &mut loc, &mut lastmod, &mut priority);
                if let Some(field) = field {
                    *field = text.trim().to_string();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HarvestError::Parse(format!(
                    "sitemap XML error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn field_for<'a>(
    tag: &str,
    loc: &'a mut String,
    lastmod: &'a mut String,
    priority: &'a mut String,
) -> Option<&'a mut String> {
    match tag {
        "loc" => Some(loc),
        "lastmod" => Some(lastmod),
        "priority" => Some(priority),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Try RFC 3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // W3C date-only form
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url>
            <loc>https://www.fandango.com/</loc>
            <priority>1.0</priority>
          </url>
          <url>
            <loc>https://www.fandango.com/movies-in-theaters</loc>
            <lastmod>2024-01-15</lastmod>
            <priority>0.5</priority>
          </url>
          <url>
            <loc>https://www.fandango.com/movie-news?a=1&amp;b=2</loc>
            <lastmod>2024-02-01T10:30:00+02:00</lastmod>
          </url>
        </urlset>"#;

        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Page));
        assert_eq!(entries[0].url, "https://www.fandango.com/");
        assert_eq!(entries[0].priority, Some(1.0));
        assert!(entries[0].lastmod.is_none());
        assert_eq!(
            entries[1].lastmod.unwrap().to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
        assert_eq!(entries[2].url, "https://www.fandango.com/movie-news?a=1&b=2");
        assert_eq!(
            entries[2].lastmod.unwrap().to_rfc3339(),
            "2024-02-01T08:30:00+00:00"
        );
        assert_eq!(entries[2].priority, None);
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap>
            <loc>https://example.com/sitemap-movies.xml</loc>
            <lastmod>2023-12-01</lastmod>
          </sitemap>
          <sitemap>
            <loc>https://example.com/sitemap-theaters.xml</loc>
          </sitemap>
        </sitemapindex>"#;

        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Sitemap));
        assert!(entries[0].url.ends_with("sitemap-movies.xml"));
        assert!(entries[0].lastmod.is_some());
        assert!(entries[1].url.ends_with("sitemap-theaters.xml"));
    }

    #[test]
    fn test_entries_without_loc_are_dropped() {
        let xml = "<urlset><url><priority>0.3</priority></url>\
                   <url><loc>http://x/</loc></url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "http://x/");
    }

    #[test]
    fn test_cdata_loc() {
        let xml = "<urlset><url><loc><![CDATA[ https://x.com/a?b=1&c=2 ]]></loc>\
                   <lastmod><![CDATA[2024-03-01]]></lastmod></url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://x.com/a?b=1&c=2");
        assert!(entries[0].lastmod.is_some());
    }

    #[test]
    fn test_mismatched_tags_are_parse_errors() {
        let err = parse_sitemap("<urlset><url><loc>http://x</url></urlset>").unwrap_err();
        assert!(matches!(err, HarvestError::Parse(_)));
    }

    /// Fuzz test: sitemap parser must never panic on arbitrary input.
    #[test]
    fn test_fuzz_sitemap_parser() {
        let fuzz_inputs = [
            "",
            "not xml at all",
            "<",
            "<url>",
            "<url><loc>",
            "<<<>>>",
            "<urlset><url></url></urlset>",
            "<urlset><url><loc></loc></url></urlset>",
            "<urlset><url><loc>http://x</loc><priority>not-a-number</priority></url></urlset>",
            "<urlset><url><loc>http://x</loc><lastmod>not-a-date</lastmod></url></urlset>",
            &"<url>".repeat(10000),
            "\x00\x01\x02\x03",
            "<?xml version=\"1.0\"?><urlset></urlset>",
            "<sitemapindex></sitemapindex>",
        ];

        for input in &fuzz_inputs {
            // Must not panic; Err or an empty Vec are both fine
            let _ = parse_sitemap(input);
        }
    }
}
