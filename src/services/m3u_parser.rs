use lazy_static::lazy_static;
use regex::Regex;
use std::str::Lines;

use crate::models::{ChannelRecord, Source, UNKNOWN_CHANNEL_NAME};
use crate::services::url_validator;

const EXTINF_PREFIX: &str = "#EXTINF:";

lazy_static! {
    /// tvg-logo="..." attribute on an EXTINF line
    static ref LOGO_REGEX: Regex = Regex::new(r#"tvg-logo="([^"]*)""#).unwrap();
    /// group-title="..." attribute on an EXTINF line
    static ref GROUP_REGEX: Regex = Regex::new(r#"group-title="([^"]*)""#).unwrap();
}

/// Metadata collected from an EXTINF line, waiting for its location line
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingChannel {
    name: String,
    logo: Option<String>,
    group: Option<String>,
}

#[derive(Debug)]
enum ParserState {
    AwaitingMetadata,
    AwaitingLocation(PendingChannel),
}

fn capture_attr(regex: &Regex, line: &str) -> Option<String> {
    regex
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an EXTINF line
/// Format: #EXTINF:duration tvg-logo="..." group-title="...",Title
///
/// The title is whatever follows the last comma. A missing comma or blank
/// title falls back to `UNKNOWN_CHANNEL_NAME`; missing attributes are `None`.
fn parse_extinf(line: &str) -> PendingChannel {
    let name = line
        .rfind(',')
        .map(|idx| line[idx + 1..].trim())
        .filter(|title| !title.is_empty())
        .unwrap_or(UNKNOWN_CHANNEL_NAME)
        .to_string();

    PendingChannel {
        name,
        logo: capture_attr(&LOGO_REGEX, line),
        group: capture_attr(&GROUP_REGEX, line),
    }
}

/// Lazy channel iterator over one playlist document.
///
/// Each EXTINF line replaces any pending metadata; the next accepted
/// location line completes it. Location lines with nothing pending,
/// other `#` directives and blank lines are skipped. Restart by calling
/// [`channels`] again on the same text.
pub struct ChannelParser<'a> {
    lines: Lines<'a>,
    source: Source,
    state: ParserState,
    emitted: usize,
}

impl<'a> ChannelParser<'a> {
    pub fn new(content: &'a str, source: Source) -> Self {
        Self {
            lines: content.lines(),
            source,
            state: ParserState::AwaitingMetadata,
            emitted: 0,
        }
    }
}

impl Iterator for ChannelParser<'_> {
    type Item = ChannelRecord;

    fn next(&mut self) -> Option<ChannelRecord> {
        for line in self.lines.by_ref() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with(EXTINF_PREFIX) {
                self.state = ParserState::AwaitingLocation(parse_extinf(trimmed));
                continue;
            }

            // Other directives (#EXTM3U, #EXTVLCOPT, ...) and comments
            if trimmed.starts_with('#') {
                continue;
            }

            if !url_validator::is_acceptable(trimmed) {
                continue;
            }

            let pending = match std::mem::replace(&mut self.state, ParserState::AwaitingMetadata) {
                ParserState::AwaitingLocation(pending) => pending,
                ParserState::AwaitingMetadata => continue,
            };

            let record = ChannelRecord {
                id: ChannelRecord::make_id(self.source, self.emitted, &pending.name),
                name: pending.name,
                url: trimmed.to_string(),
                logo: pending.logo,
                group: pending.group,
                source: self.source,
            };
            self.emitted += 1;
            return Some(record);
        }

        None
    }
}

/// Iterate the channels of a playlist document without collecting them
pub fn channels(content: &str, source: Source) -> ChannelParser<'_> {
    ChannelParser::new(content, source)
}

/// Parse a whole playlist document into channel records, in document order
pub fn parse_playlist(content: &str, source: Source) -> Vec<ChannelRecord> {
    tracing::debug!("Parsing {} playlist, content length: {}", source, content.len());

    let records: Vec<ChannelRecord> = channels(content, source).collect();

    tracing::info!("Found {} valid channels in {}", records.len(), source);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let pending = parse_extinf(line);

        assert_eq!(pending.name, "Globo HD");
        assert_eq!(pending.logo.as_deref(), Some("http://logo.com/globo.png"));
        assert_eq!(pending.group.as_deref(), Some("TV"));
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let pending = parse_extinf("#EXTINF:-1,Canal Teste");

        assert_eq!(pending.name, "Canal Teste");
        assert!(pending.logo.is_none());
        assert!(pending.group.is_none());
    }

    #[test]
    fn test_parse_extinf_malformed() {
        assert_eq!(parse_extinf("#EXTINF:-1 tvg-logo=\"x.png\"").name, UNKNOWN_CHANNEL_NAME);
        assert_eq!(parse_extinf("#EXTINF:-1,   ").name, UNKNOWN_CHANNEL_NAME);
        assert!(parse_extinf("#EXTINF:-1 group-title=\"\",A").group.is_none());
    }

    #[test]
    fn test_title_after_last_comma() {
        let pending = parse_extinf(r#"#EXTINF:-1 group-title="News,World",Channel, Extra"#);
        assert_eq!(pending.name, "Extra");
        assert_eq!(pending.group.as_deref(), Some("News,World"));
    }

    #[test]
    fn test_end_to_end_single_record() {
        let text = "#EXTINF:-1 tvg-logo=\"l.png\" group-title=\"Sports\",ESPN HD\nhttp://stream/espn.m3u8\n";
        let records = parse_playlist(text, Source::Global);

        assert_eq!(
            records,
            vec![ChannelRecord {
                id: "global-0-ESPN HD".to_string(),
                name: "ESPN HD".to_string(),
                url: "http://stream/espn.m3u8".to_string(),
                logo: Some("l.png".to_string()),
                group: Some("Sports".to_string()),
                source: Source::Global,
            }]
        );
    }

    #[test]
    fn test_trailing_metadata_without_url() {
        let records = parse_playlist("#EXTM3U\n#EXTINF:-1,Lonely\n", Source::Global);
        assert!(records.is_empty());
    }

    #[test]
    fn test_bare_urls_ignored() {
        let text = "#EXTM3U\nhttp://a/1.m3u8\nhttp://a/2.m3u8\n";
        assert_eq!(parse_playlist(text, Source::Global).len(), 0);
    }

    #[test]
    fn test_no_orphan_url_after_completed_record() {
        let text = "#EXTINF:-1,One\nhttp://a/1\nhttp://a/2\n#EXTINF:-1,Two\nhttp://a/3\n";
        let records = parse_playlist(text, Source::Regional);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "http://a/1");
        assert_eq!(records[1].url, "http://a/3");
        assert_eq!(records[1].id, "regional-1-Two");
    }

    #[test]
    fn test_superseded_metadata_dropped() {
        let text = "#EXTINF:-1,First\n#EXTINF:-1,Second\nhttp://a/2\n";
        let records = parse_playlist(text, Source::Global);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Second");
        assert_eq!(records[0].id, "global-0-Second");
    }

    #[test]
    fn test_rejected_url_keeps_pending_metadata() {
        let text = "#EXTINF:-1,Chan\nftp://nope\n#EXTVLCOPT:network-caching=1000\n\nrtmp://live/chan\n";
        let records = parse_playlist(text, Source::Global);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "rtmp://live/chan");
    }

    #[test]
    fn test_crlf_and_whitespace() {
        let text = "#EXTM3U\r\n  #EXTINF:-1 group-title=\"Kids\",Toons  \r\n   https://cdn/toons.m3u8   \r\n";
        let records = parse_playlist(text, Source::Global);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Toons");
        assert_eq!(records[0].url, "https://cdn/toons.m3u8");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let text = "#EXTINF:-1,A\nhttp://a\n#EXTINF:-1,B\nhttp://b\n";
        let first: Vec<_> = channels(text, Source::Global).collect();
        let second: Vec<_> = channels(text, Source::Global).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lazy_iteration() {
        let text = "#EXTINF:-1,A\nhttp://a\n#EXTINF:-1,B\nhttp://b\n";
        let mut iter = channels(text, Source::Global);
        assert_eq!(iter.next().map(|c| c.name), Some("A".to_string()));
        assert_eq!(iter.next().map(|c| c.id), Some("global-1-B".to_string()));
        assert!(iter.next().is_none());
    }
}
