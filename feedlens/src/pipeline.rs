use anyhow::Result;
use tracing::info;

use crate::fetcher::FeedFetcher;
use crate::filter::{self, FilterConfig};
use crate::render::Renderer;
use crate::sources::SourceCatalog;

/// Counts for one rendered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub fetched: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
}

impl RunSummary {
    pub fn total_matched(&self) -> usize {
        self.sources.iter().map(|s| s.matched).sum()
    }
}

/// Fetches, filters and renders each selected source in turn.
///
/// Sources are handled one at a time in selection order; a source that
/// cannot be fetched shows up as having no matches. Only an unknown source
/// name or a renderer error aborts the run.
pub async fn run<S: AsRef<str>>(
    catalog: &SourceCatalog,
    selection: &[S],
    fetcher: &FeedFetcher,
    config: &FilterConfig,
    renderer: &mut dyn Renderer,
) -> Result<RunSummary> {
    let selected = catalog.select(selection)?;
    info!(
        sources = selected.len(),
        keywords = ?config.keywords(),
        start = %config.date_range().start(),
        end = %config.date_range().end(),
        max_items = config.max_items(),
        "running feed pipeline"
    );

    let mut summary = RunSummary::default();
    for source in selected {
        info!("fetching {} ({})", source.name, source.url);
        let entries = fetcher.fetch(&source.url).await;
        let matches = filter::filter(&entries, config);
        renderer.render_source(source, &matches)?;

        summary.sources.push(SourceSummary {
            name: source.name.clone(),
            fetched: entries.len(),
            matched: matches.len(),
        });
    }
    renderer.finish()?;

    info!("pipeline finished: {} matches", summary.total_matched());
    Ok(summary)
}
