//! Search command - ranked bookmark search.

use crate::app::App;
use crate::OutputFormat;
use std::time::Instant;
use tagmark_core::{parse_query, Config, SearchOptions, SearchResult, SortBy, SortOrder};

/// Options given as flags; these win over the inline query syntax.
#[derive(Debug, Default)]
pub struct Overrides {
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub favorite: bool,
    pub archived: bool,
    pub sort: Option<SortBy>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
}

/// Combine inline syntax, flags and configured defaults into search options.
///
/// Precedence is flag, then inline syntax, then configuration.
pub fn build_options(config: &Config, input: &str, overrides: Overrides) -> anyhow::Result<SearchOptions> {
    let mut options = parse_query(input)?;
    let has_inline = |prefix: &str| input.split_whitespace().any(|part| part.starts_with(prefix));

    for tag in overrides.tags {
        options = options.with_tag(tag);
    }
    if let Some(category) = overrides.category {
        options = options.with_category(category);
    }
    if overrides.favorite {
        options = options.with_favorite(true);
    }
    if overrides.archived {
        options = options.with_archived(true);
    }

    options.sort_by = match overrides.sort {
        Some(sort) => sort,
        None if has_inline("sort:") => options.sort_by,
        None => config.search.sort_by()?,
    };
    options.sort_order = match overrides.order {
        Some(order) => order,
        None if has_inline("order:") => options.sort_order,
        None => config.search.sort_order()?,
    };
    options.limit = overrides
        .limit
        .or(options.limit)
        .or(Some(config.search.default_limit));

    Ok(options)
}

/// Run the search command.
pub fn run(
    config: Config,
    input: &str,
    overrides: Overrides,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let options = build_options(&config, input, overrides)?;
    let app = App::new(config)?;

    // JSON consumers always get an array, even from an empty database
    if app.index.is_empty() && matches!(output, OutputFormat::Text) {
        eprintln!("No bookmarks yet. Add one with 'tagmark add <url>'.");
        return Ok(());
    }

    let start = Instant::now();
    let results = app.bookmarks.search(&options);
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            for result in &results {
                let bookmark = &result.bookmark;
                let star = if bookmark.favorite { "★" } else { " " };

                if options.query.is_empty() {
                    println!("{} {}  {}", star, bookmark.id, bookmark.title);
                } else {
                    println!("{} {}  {} [{}]", star, bookmark.id, bookmark.title, result.score);
                }
                if !bookmark.url.is_empty() {
                    println!("    {}", bookmark.url);
                }
                if !bookmark.tags.is_empty() {
                    println!("    #{}", bookmark.tags.join(" #"));
                }
            }

            eprintln!();
            eprintln!(
                "Found {} results in {:.3}ms",
                results.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", render_json(&results)?);
        }
    }

    Ok(())
}

fn render_json(results: &[SearchResult]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_apply() {
        let mut config = Config::default();
        config.search.default_limit = 7;
        config.search.default_sort = "title".to_string();
        config.search.default_order = "asc".to_string();

        let options = build_options(&config, "rust", Overrides::default()).unwrap();
        assert_eq!(options.query, "rust");
        assert_eq!(options.sort_by, SortBy::Title);
        assert_eq!(options.sort_order, SortOrder::Asc);
        assert_eq!(options.limit, Some(7));
    }

    #[test]
    fn test_inline_beats_config() {
        let mut config = Config::default();
        config.search.default_sort = "title".to_string();

        let options =
            build_options(&config, "rust sort:relevance limit:3", Overrides::default()).unwrap();
        assert_eq!(options.sort_by, SortBy::Relevance);
        assert_eq!(options.limit, Some(3));
    }

    #[test]
    fn test_flags_beat_inline() {
        let overrides = Overrides {
            tags: vec!["web".to_string()],
            favorite: true,
            sort: Some(SortBy::CreatedAt),
            limit: Some(0),
            ..Default::default()
        };
        let options = build_options(&Config::default(), "#rust sort:title limit:3", overrides).unwrap();

        assert_eq!(options.tags, vec!["rust", "web"]);
        assert_eq!(options.favorite, Some(true));
        assert_eq!(options.sort_by, SortBy::CreatedAt);
        assert_eq!(options.effective_limit(), None);
    }

    #[test]
    fn test_json_output_of_no_results_is_array() {
        assert_eq!(render_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_json_output_fields() {
        let results = vec![SearchResult::new(
            tagmark_core::Bookmark::new("b1", "Rust", "https://rust-lang.org"),
            10,
            vec![tagmark_core::MatchedField::Title],
        )];
        let value: serde_json::Value = serde_json::from_str(&render_json(&results).unwrap()).unwrap();
        assert_eq!(value[0]["score"], 10);
        assert_eq!(value[0]["matchedFields"][0], "title");
        assert_eq!(value[0]["bookmark"]["id"], "b1");
    }

    #[test]
    fn test_bad_inline_syntax() {
        assert!(build_options(&Config::default(), "is:shiny", Overrides::default()).is_err());
    }
}
