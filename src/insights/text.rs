//! Post-processing of generated text.

use regex::Regex;
use std::sync::OnceLock;

/// Most key points kept when falling back to plain sentences
const MAX_SENTENCE_POINTS: usize = 4;

/// Sentences this short are fragments, not findings
const MIN_SENTENCE_CHARS: usize = 10;

const FINDING_MARKERS: [&str; 3] = ["key point", "finding", "contribution"];

/// A `-`, `•`, `*` or `+` bullet, or a `1.` / `1)` number, then the point
const BULLET_PATTERN: &str = r"^(?:[-•*+]|\d+[.)])\s+(.+)$";

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(BULLET_PATTERN).expect("bullet pattern compiles"))
}

/// Remove markdown emphasis and heading markers and reflow wrapped lines.
///
/// Lines inside a paragraph are joined with single spaces, a word split by a
/// hyphen at a line break is rejoined, headings become their own paragraph,
/// and paragraphs stay separated by a blank line.
pub fn clean_markdown(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for raw in text.lines() {
        let is_heading = raw.trim_start().starts_with('#');
        let line = strip_markers(raw);
        let line = line.trim();

        if line.is_empty() || is_heading {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            if is_heading && !line.is_empty() {
                paragraphs.push(line.to_string());
            }
            continue;
        }
        join_line(&mut current, line);
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
        .iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pull a list of key points out of a model response.
///
/// Bullet and numbered lines win. With fewer than two of those, the sentences
/// of the first paragraph that talks about findings are used, and failing
/// that the first few sentences of the text.
pub fn extract_key_points(text: &str) -> Vec<String> {
    let mut points: Vec<String> = text
        .lines()
        .filter_map(|line| bullet_pattern().captures(line.trim()))
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_markers(m.as_str()).trim().to_string())
        .filter(|point| !point.is_empty())
        .collect();

    if points.len() < 2 {
        let cleaned = clean_markdown(text);
        points = cleaned
            .split("\n\n")
            .filter(|p| {
                let lower = p.to_lowercase();
                FINDING_MARKERS.iter().any(|marker| lower.contains(marker))
            })
            .map(sentences)
            .find(|found| found.len() >= 2)
            .unwrap_or_else(|| {
                sentences(&cleaned)
                    .into_iter()
                    .take(MAX_SENTENCE_POINTS)
                    .collect()
            });
    }

    points.iter().map(|point| format_point(point)).collect()
}

fn strip_markers(line: &str) -> String {
    line.replace("**", "")
        .replace("__", "")
        .replace(['*', '#'], "")
}

fn join_line(current: &mut String, line: &str) {
    if current.is_empty() {
        current.push_str(line);
        return;
    }

    let mut before_hyphen = current.chars().rev().skip(1);
    let hyphenated = current.ends_with('-')
        && before_hyphen.next().is_some_and(char::is_alphabetic)
        && line.chars().next().is_some_and(char::is_lowercase);

    if hyphenated {
        current.pop();
    } else {
        current.push(' ');
    }
    current.push_str(line);
}

fn sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Capitalise and terminate a point
fn format_point(point: &str) -> String {
    let mut chars = point.chars();
    let mut formatted = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    if !formatted.ends_with(['.', '!', '?']) {
        formatted.push('.');
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_pattern() {
        assert!(Regex::new(BULLET_PATTERN).is_ok());

        let pattern = bullet_pattern();
        for line in ["- dash", "• dot", "* star", "+ plus", "1. first", "12) twelfth"] {
            assert!(pattern.is_match(line), "{}", line);
        }
        for line in ["-nospace", "plain text", "1.5 is a number", "**bold** start"] {
            assert!(!pattern.is_match(line), "{}", line);
        }
        assert_eq!(&pattern.captures("3. third point").unwrap()[1], "third point");
    }

    #[test]
    fn test_clean_markdown_strips_markers_and_reflows() {
        let text = "## Summary\nThis paper **introduces** a\nnew method for *graph* learning.\n\nIt   scales well.";
        assert_eq!(
            clean_markdown(text),
            "Summary\n\nThis paper introduces a new method for graph learning.\n\nIt scales well."
        );
    }

    #[test]
    fn test_clean_markdown_rejoins_hyphenated_words() {
        let text = "a new method for natural language process-\ning that improves results";
        assert_eq!(
            clean_markdown(text),
            "a new method for natural language processing that improves results"
        );
    }

    #[test]
    fn test_clean_markdown_keeps_real_dashes() {
        assert_eq!(clean_markdown("state-of-the-\nArt"), "state-of-the- Art");
        assert_eq!(clean_markdown("snake_case stays"), "snake_case stays");
    }

    #[test]
    fn test_clean_markdown_empty() {
        assert_eq!(clean_markdown(""), "");
        assert_eq!(clean_markdown("\n\n  \n"), "");
        assert_eq!(clean_markdown("###"), "");
    }

    #[test]
    fn test_extract_bullets() {
        let text = "Main findings:\n- a **faster** solver\n• lower memory use!\n2. works on graphs\n";
        assert_eq!(
            extract_key_points(text),
            vec![
                "A faster solver.".to_string(),
                "Lower memory use!".to_string(),
                "Works on graphs.".to_string(),
            ]
        );
    }

    #[test]
    fn test_bold_lines_are_not_bullets() {
        let text = "**Contributions** are listed below.\n* the first contribution\n* the second contribution";
        assert_eq!(
            extract_key_points(text),
            vec![
                "The first contribution.".to_string(),
                "The second contribution.".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_from_findings_paragraph() {
        let text = "The paper is about robots.\n\n\
                    The key findings are clear. Robots learn faster with feedback. \
                    Simulation transfers to hardware.";
        assert_eq!(
            extract_key_points(text),
            vec![
                "The key findings are clear.".to_string(),
                "Robots learn faster with feedback.".to_string(),
                "Simulation transfers to hardware.".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_falls_back_to_first_sentences() {
        let text = "First long sentence here. Second long sentence here. Tiny. \
                    Third long sentence here. Fourth long sentence here. Fifth long sentence here.";
        let points = extract_key_points(text);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], "First long sentence here.");
        assert_eq!(points[3], "Fourth long sentence here.");
    }

    #[test]
    fn test_extract_nothing() {
        assert!(extract_key_points("").is_empty());
    }
}
