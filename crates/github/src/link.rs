//! Cursor extraction from the `Link` response header.

use projects::RawCursors;
use reqwest::Url;

/// Reads the `after` cursor from the `rel="next"` link and the `before`
/// cursor from the `rel="prev"` link. Unparseable entries are ignored.
///
/// ```text
/// <https://api.github.com/orgs/o/projectsV2?per_page=50&after=Y3I6NTA%3D>; rel="next"
/// ```
pub fn parse_link_header(value: &str) -> RawCursors {
    let mut after = None;
    let mut before = None;

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let Some(target) = parts.next() else {
            continue;
        };
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let rel = parts
            .filter_map(|param| param.trim().strip_prefix("rel="))
            .map(|rel| rel.trim_matches('"'))
            .next();
        let Ok(url) = Url::parse(target) else {
            continue;
        };
        match rel {
            Some("next") => after = query_value(&url, "after"),
            Some("prev") => before = query_value(&url, "before"),
            _ => {}
        }
    }

    RawCursors::from_raw(after.as_deref(), before.as_deref())
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_prev_links_yield_both_cursors() {
        let header = "<https://api.github.com/orgs/octo-org/projectsV2/3/items?per_page=50&after=Y3Vyc29yOjUw>; rel=\"next\", \
                      <https://api.github.com/orgs/octo-org/projectsV2/3/items?per_page=50&before=Y3Vyc29yOjE%3D>; rel=\"prev\"";

        let cursors = parse_link_header(header);

        assert_eq!(cursors.after.unwrap().as_str(), "Y3Vyc29yOjUw");
        assert_eq!(cursors.before.unwrap().as_str(), "Y3Vyc29yOjE=");
    }

    #[test]
    fn first_and_last_links_are_ignored() {
        let header = "<https://api.github.com/users/octocat/projectsV2?per_page=10>; rel=\"first\"";

        assert_eq!(parse_link_header(header), RawCursors::none());
    }

    #[test]
    fn empty_cursor_values_are_absent() {
        let header = "<https://api.github.com/users/octocat/projectsV2?after=>; rel=\"next\"";

        assert_eq!(parse_link_header(header).after, None);
    }

    #[test]
    fn garbage_is_tolerated() {
        assert_eq!(parse_link_header("not a link header"), RawCursors::none());
        assert_eq!(parse_link_header(""), RawCursors::none());
    }
}
