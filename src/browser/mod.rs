use anyhow::{Context, Result};

/// Pages of the web app that `open` can jump to
#[derive(Debug, Clone, PartialEq)]
pub enum Page<'a> {
    Leaderboard(Option<&'a str>),
    Tournament(&'a str),
    Scoring(&'a str),
    Dashboard,
}

/// Build the web app URL for a page
pub fn page_url(app_url: &str, page: &Page) -> String {
    let base = app_url.trim_end_matches('/');
    match page {
        Page::Leaderboard(Some(id)) => format!("{}/leaderboards/{}", base, id),
        Page::Leaderboard(None) => format!("{}/leaderboards", base),
        Page::Tournament(id) => format!("{}/tournaments/{}", base, id),
        Page::Scoring(match_id) => format!("{}/scoring/{}", base, match_id),
        Page::Dashboard => format!("{}/dashboard", base),
    }
}

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_urls() {
        let app = "https://y-ultimate.example.org/";
        assert_eq!(
            page_url(app, &Page::Leaderboard(Some("t1"))),
            "https://y-ultimate.example.org/leaderboards/t1"
        );
        assert_eq!(
            page_url(app, &Page::Leaderboard(None)),
            "https://y-ultimate.example.org/leaderboards"
        );
        assert_eq!(
            page_url(app, &Page::Tournament("t1")),
            "https://y-ultimate.example.org/tournaments/t1"
        );
        assert_eq!(
            page_url(app, &Page::Scoring("m9")),
            "https://y-ultimate.example.org/scoring/m9"
        );
        assert_eq!(page_url(app, &Page::Dashboard), "https://y-ultimate.example.org/dashboard");
    }
}
