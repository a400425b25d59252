//! SEO scoring
//!
//! Pure, synchronous scoring of compiled markdown against the primary
//! keyword. No failure mode: malformed or empty input scores with defensive
//! defaults. Operates on the markdown structure directly (H1 = leading `# `
//! line, H2 = `## ` lines, first paragraph = first non-heading block).

use crate::documents::SeoScore;
use regex_lite::Regex;

/// Score compiled content against the primary keyword
pub fn score(content: &str, primary_keyword: &str) -> SeoScore {
    if content.trim().is_empty() || primary_keyword.trim().is_empty() {
        return SeoScore::default();
    }

    let keyword = primary_keyword.to_lowercase();
    let lines: Vec<&str> = content.lines().collect();

    let h1 = lines
        .iter()
        .find(|l| l.starts_with("# "))
        .map(|l| l.trim_start_matches("# ").trim())
        .unwrap_or_default();
    let keyword_in_h1 = h1.to_lowercase().contains(&keyword);

    let first_paragraph = first_paragraph(&lines);
    let keyword_in_first_paragraph = first_paragraph.to_lowercase().contains(&keyword);

    let keyword_in_h2 = lines
        .iter()
        .filter(|l| l.starts_with("## ") && !l.starts_with("###"))
        .any(|l| l.to_lowercase().contains(&keyword));

    let text = strip_markdown(content);
    let word_count = text.split_whitespace().filter(|w| !w.is_empty()).count();

    let keyword_occurrences = count_occurrences(&text.to_lowercase(), &keyword);
    let entity_density = if word_count > 0 {
        let density = (keyword_occurrences as f64 / word_count as f64) * 100.0;
        (density * 100.0).round() / 100.0
    } else {
        0.0
    };

    SeoScore {
        keyword_in_h1,
        keyword_in_first_paragraph,
        keyword_in_h2,
        entity_density,
        word_count,
    }
}

/// First contiguous non-heading, non-blank block of text
fn first_paragraph(lines: &[&str]) -> String {
    let mut paragraph = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        if trimmed.starts_with('#') {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        paragraph.push(trimmed);
    }
    paragraph.join(" ")
}

/// Drop markdown syntax so word counting sees prose only
fn strip_markdown(content: &str) -> String {
    let heading_re = Regex::new(r"(?m)^#{1,6}\s+").unwrap();
    let bullet_re = Regex::new(r"(?m)^\s*[-*]\s+").unwrap();
    let emphasis_re = Regex::new(r"\*{1,2}").unwrap();

    let text = heading_re.replace_all(content, "");
    let text = bullet_re.replace_all(&text, "");
    emphasis_re.replace_all(&text, "").to_string()
}

/// Non-overlapping occurrence count
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = "\
# Best Hiking Boots for Every Trail

Finding the best hiking boots starts with understanding your feet. \
This guide covers **fit**, durability, and price.

## How We Tested Hiking Boots

We walked 400 miles in 24 pairs.

### Lab Notes

- waterproofing soak test
- outsole wear measurement

## Budget Picks

Cheap does not mean bad.
";

    #[test]
    fn test_score_full_document() {
        let result = score(CONTENT, "hiking boots");

        assert!(result.keyword_in_h1);
        assert!(result.keyword_in_first_paragraph);
        assert!(result.keyword_in_h2);
        assert!(result.word_count > 30);
        assert!(result.entity_density > 0.0);
    }

    #[test]
    fn test_score_case_insensitive() {
        let result = score(CONTENT, "HIKING BOOTS");
        assert!(result.keyword_in_h1);
        assert!(result.keyword_in_first_paragraph);
    }

    #[test]
    fn test_keyword_absent() {
        let result = score(CONTENT, "trail running shoes");
        assert!(!result.keyword_in_h1);
        assert!(!result.keyword_in_first_paragraph);
        assert!(!result.keyword_in_h2);
        assert_eq!(result.entity_density, 0.0);
    }

    #[test]
    fn test_h3_does_not_count_as_h2() {
        let content = "# Title\n\nIntro text.\n\n### lab notes keyword here\n";
        let result = score(content, "keyword");
        assert!(!result.keyword_in_h2);
    }

    #[test]
    fn test_defensive_defaults() {
        assert_eq!(score("", "keyword"), SeoScore::default());
        assert_eq!(score("   \n", "keyword"), SeoScore::default());
        assert_eq!(score("some content", ""), SeoScore::default());
    }

    #[test]
    fn test_entity_density_rounding() {
        // 1 occurrence in 8 words = 12.5%
        let content = "# t\n\nalpha beta gamma delta epsilon zeta eta boots";
        let result = score(content, "boots");
        assert_eq!(result.word_count, 9);
        assert_eq!(result.entity_density, 11.11);
    }
}
