use url::Url;

use crate::error::PipelineError;
use crate::models::ContentType;

const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
    "youtu.be",
];

/// Decide whether a URL points at a video platform or a generic webpage.
///
/// Pure function over the URL; the only failure is a malformed or
/// non-http(s) input.
pub fn classify(raw: &str) -> Result<ContentType, PipelineError> {
    let parsed = Url::parse(raw)
        .map_err(|e| PipelineError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(PipelineError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                raw, other
            )))
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| PipelineError::InvalidUrl(format!("{}: missing host", raw)))?;

    if VIDEO_HOSTS.contains(&host.to_lowercase().as_str()) {
        Ok(ContentType::Video)
    } else {
        Ok(ContentType::Article)
    }
}

/// Extract the 11-character video id from the common YouTube URL forms:
/// watch?v=, youtu.be/, /embed/, /shorts/, /live/, /v/ and /e/.
pub fn video_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    if !VIDEO_HOSTS.contains(&host.as_str()) {
        return None;
    }

    if host == "youtu.be" {
        let id = parsed.path_segments()?.next()?;
        return valid_id(id).then(|| id.to_string());
    }

    // watch?v=<id>
    if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
        if valid_id(&v) {
            return Some(v.into_owned());
        }
    }

    // /embed/<id>, /shorts/<id>, /live/<id>, /v/<id>, /e/<id>
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    for window in segments.windows(2) {
        if matches!(window[0], "embed" | "shorts" | "live" | "v" | "e") && valid_id(window[1]) {
            return Some(window[1].to_string());
        }
    }

    None
}

fn valid_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_urls_classify_as_video() {
        assert_eq!(
            classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            ContentType::Video
        );
        assert_eq!(
            classify("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            ContentType::Video
        );
        assert_eq!(
            classify("https://m.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            ContentType::Video
        );
    }

    #[test]
    fn everything_else_classifies_as_article() {
        assert_eq!(
            classify("https://medium.com/@someone/a-post-123").unwrap(),
            ContentType::Article
        );
        assert_eq!(
            classify("http://example.com/blog/entry").unwrap(),
            ContentType::Article
        );
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(matches!(
            classify("not a url"),
            Err(PipelineError::InvalidUrl(_))
        ));
        assert!(matches!(
            classify("ftp://example.com/file"),
            Err(PipelineError::InvalidUrl(_))
        ));
        assert!(matches!(
            classify("/relative/path"),
            Err(PipelineError::InvalidUrl(_))
        ));
    }

    #[test]
    fn video_id_from_watch_url() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn video_id_from_short_and_embed_urls() {
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn video_id_rejects_non_video_urls() {
        assert_eq!(video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(video_id("https://www.youtube.com/feed/subscriptions"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?v=tooshort"), None);
    }
}
