use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

use crate::filter::MatchResult;
use crate::sources::FeedSource;

/// Presentation surface for the matches of each source.
pub trait Renderer {
    /// Called once per selected source, in selection order. An empty `matches`
    /// must be rendered as an explicit "no matches" notice.
    fn render_source(&mut self, source: &FeedSource, matches: &MatchResult) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Markdown-flavoured plain text, one section per source.
pub struct TerminalRenderer<W: Write> {
    out: W,
    show_date: bool,
    width: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, show_date: bool) -> Self {
        Self {
            out,
            show_date,
            width: 80,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Converts summary HTML to wrapped text, falling back to the raw summary.
fn summary_text(summary: &str, width: usize) -> String {
    match html2text::from_read(summary.as_bytes(), width) {
        Ok(text) => text.trim_end().to_string(),
        Err(e) => {
            warn!("render: failed to convert summary HTML to text: {}", e);
            summary.to_string()
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_source(&mut self, source: &FeedSource, matches: &MatchResult) -> Result<()> {
        writeln!(self.out, "## {}", source.name).context("failed to write output")?;
        writeln!(self.out)?;

        if matches.is_empty() {
            writeln!(self.out, "No matching items.")?;
            writeln!(self.out)?;
            return Ok(());
        }

        for (entry, date) in matches {
            match date {
                Some(date) if self.show_date => writeln!(
                    self.out,
                    "**[{}]({})**  *({})*",
                    entry.title,
                    entry.link,
                    date.format("%Y-%m-%d")
                )?,
                _ => writeln!(self.out, "**[{}]({})**", entry.title, entry.link)?,
            }

            if let Some(summary) = &entry.summary {
                writeln!(self.out, "{}", summary_text(summary, self.width))?;
            }
            writeln!(self.out, "---")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("failed to flush output")
    }
}

#[derive(Serialize)]
struct JsonItem<'a> {
    title: &'a str,
    link: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSource<'a> {
    source: &'a str,
    url: &'a str,
    items: Vec<JsonItem<'a>>,
}

/// One JSON object per source per line.
pub struct JsonRenderer<W: Write> {
    out: W,
    show_date: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W, show_date: bool) -> Self {
        Self { out, show_date }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render_source(&mut self, source: &FeedSource, matches: &MatchResult) -> Result<()> {
        let record = JsonSource {
            source: &source.name,
            url: &source.url,
            items: matches
                .iter()
                .map(|(entry, date)| JsonItem {
                    title: &entry.title,
                    link: &entry.link,
                    date: date.filter(|_| self.show_date),
                    summary: entry.summary.as_deref(),
                })
                .collect(),
        };

        serde_json::to_writer(&mut self.out, &record).context("failed to serialize matches")?;
        writeln!(self.out).context("failed to write output")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::NormalizedEntry;

    fn source() -> FeedSource {
        FeedSource::new("Example", "https://example.com/feed")
    }

    fn matches() -> MatchResult {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10);
        vec![
            (
                NormalizedEntry {
                    title: "GPT-5 launched".into(),
                    link: "https://example.com/gpt5".into(),
                    date,
                    summary: Some("<p>Big news</p>".into()),
                },
                date,
            ),
            (
                NormalizedEntry {
                    title: "Undated".into(),
                    link: "https://example.com/undated".into(),
                    date: None,
                    summary: None,
                },
                None,
            ),
        ]
    }

    #[test]
    fn terminal_output_with_dates() {
        let mut renderer = TerminalRenderer::new(Vec::new(), true);
        renderer.render_source(&source(), &matches()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(text.starts_with("## Example\n"));
        assert!(text.contains("**[GPT-5 launched](https://example.com/gpt5)**  *(2024-01-10)*\n"));
        assert!(text.contains("Big news"));
        assert!(!text.contains("<p>"));
        assert!(text.contains("**[Undated](https://example.com/undated)**\n"));
        assert_eq!(text.matches("---").count(), 2);
    }

    #[test]
    fn terminal_output_without_dates() {
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.render_source(&source(), &matches()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(!text.contains("2024-01-10"));
    }

    #[test]
    fn terminal_no_matches_notice() {
        let mut renderer = TerminalRenderer::new(Vec::new(), true);
        renderer.render_source(&source(), &Vec::new()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("No matching items."));
    }

    #[test]
    fn json_lines() {
        let mut renderer = JsonRenderer::new(Vec::new(), true);
        renderer.render_source(&source(), &matches()).unwrap();
        renderer.render_source(&source(), &Vec::new()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["source"], "Example");
        assert_eq!(lines[0]["items"][0]["date"], "2024-01-10");
        assert!(lines[0]["items"][1].get("date").is_none());
        assert_eq!(lines[1]["items"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn json_without_dates_omits_date_field() {
        let mut renderer = JsonRenderer::new(Vec::new(), false);
        renderer.render_source(&source(), &matches()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        let line: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(line["items"].as_array().unwrap().len(), 2);
        assert_eq!(line["items"][0]["title"], "GPT-5 launched");
        assert!(line["items"][0].get("date").is_none());
        assert_eq!(line["items"][0]["summary"], "<p>Big news</p>");
        assert!(!text.contains("2024-01-10"));
    }
}
