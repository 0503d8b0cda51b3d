/// Normalized text: a cleaned body plus any trailing hashtag cluster,
/// split off in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub body: String,
    pub hashtags: Vec<String>,
}

/// Deterministic cleanup applied to every extraction result and to
/// generated posts, regardless of where the text came from.
///
/// In order: collapse whitespace runs within each line, collapse blank
/// line runs to exactly one, strip styling markup, then split a
/// trailing `#token` cluster off the body. Idempotent.
pub fn normalize(raw: &str) -> NormalizedText {
    let cleaned = collapse(raw);
    let (body, hashtags) = split_trailing_hashtags(&cleaned);
    NormalizedText { body, hashtags }
}

fn collapse(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true; // drops leading blank lines too

    for line in raw.lines() {
        let stripped = strip_styling(line);
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(collapsed);
            previous_blank = false;
        }
    }

    while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }

    lines.join("\n")
}

/// Remove characters used purely for styling: emphasis asterisks and
/// backticks anywhere, and markdown heading markers at line starts.
/// A leading `#` with no following space (a hashtag) is left alone.
fn strip_styling(line: &str) -> String {
    let trimmed = line.trim_start();

    let without_heading = {
        let after_hashes = trimmed.trim_start_matches('#');
        if after_hashes.len() < trimmed.len() && after_hashes.starts_with(' ') {
            after_hashes.trim_start()
        } else {
            trimmed
        }
    };

    without_heading
        .chars()
        .filter(|c| *c != '*' && *c != '`')
        .collect()
}

fn is_hashtag(token: &str) -> bool {
    token.len() > 1
        && token.starts_with('#')
        && token[1..].chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Split a suffix made only of `#token` groups off the text, keeping
/// the tags in their original order.
fn split_trailing_hashtags(text: &str) -> (String, Vec<String>) {
    let mut rest = text.trim_end();
    let mut tags_reversed: Vec<String> = Vec::new();

    loop {
        let (head, last) = match rest.rfind(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim_start()),
            None => ("", rest),
        };

        if last.is_empty() || !is_hashtag(last) {
            break;
        }

        tags_reversed.push(last.to_string());
        rest = head.trim_end();
        if rest.is_empty() {
            break;
        }
    }

    tags_reversed.reverse();
    (rest.to_string(), tags_reversed)
}
