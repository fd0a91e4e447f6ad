use serde::Serialize;

const CATEGORY_PREFIXES: [&str; 5] = ["Security:", "Performance:", "Style:", "Critical:", "Recommendations:"];
const NUMBERED_PREFIXES: [&str; 5] = ["1.", "2.", "3.", "4.", "5."];
const BULLET_PREFIXES: [&str; 3] = ["-", "•", "*"];

/// One display block of a review response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ReviewBlock {
    SectionHeader(String),
    Numbered(String),
    Bullet(String),
    Category(String),
    /// Consecutive plain lines joined by spaces
    Paragraph(String),
}

/// Split a review into display blocks.
///
/// Lines are trimmed and blank lines skipped. `###` headings, numbered
/// items 1-5, bullets and category labels each become their own block;
/// everything else accumulates into the current paragraph.
pub fn parse_review(text: &str) -> Vec<ReviewBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, blocks: &mut Vec<ReviewBlock>| {
        if !paragraph.is_empty() {
            blocks.push(ReviewBlock::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let block = if line.starts_with("###") {
            Some(ReviewBlock::SectionHeader(line.replace("###", "").trim().to_string()))
        } else if NUMBERED_PREFIXES.iter().any(|p| line.starts_with(p)) {
            Some(ReviewBlock::Numbered(line.to_string()))
        } else if BULLET_PREFIXES.iter().any(|p| line.starts_with(p)) {
            Some(ReviewBlock::Bullet(line.to_string()))
        } else if CATEGORY_PREFIXES.iter().any(|p| line.starts_with(p)) {
            Some(ReviewBlock::Category(line.to_string()))
        } else {
            None
        };

        match block {
            Some(block) => {
                flush(&mut paragraph, &mut blocks);
                blocks.push(block);
            }
            None => paragraph.push(line),
        }
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML fragment for a review, one `div` per block
pub fn render_review_html(text: &str) -> String {
    parse_review(text)
        .iter()
        .map(|block| {
            let (class, text) = match block {
                ReviewBlock::SectionHeader(t) => ("section-header", t),
                ReviewBlock::Numbered(t) | ReviewBlock::Bullet(t) => ("bullet-point", t),
                ReviewBlock::Category(t) => ("category-header", t),
                ReviewBlock::Paragraph(t) => ("review-text", t),
            };
            format!("<div class=\"{}\">{}</div>", class, escape_html(text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_blocks() {
        let review = "\
### Summary
The code is small
but has issues.

Security: none found
1. Critical Issues
- uses print
* returns None
• no docstring
Recommendations: add tests
Closing words.";

        assert_eq!(
            parse_review(review),
            vec![
                ReviewBlock::SectionHeader("Summary".into()),
                ReviewBlock::Paragraph("The code is small but has issues.".into()),
                ReviewBlock::Category("Security: none found".into()),
                ReviewBlock::Numbered("1. Critical Issues".into()),
                ReviewBlock::Bullet("- uses print".into()),
                ReviewBlock::Bullet("* returns None".into()),
                ReviewBlock::Bullet("• no docstring".into()),
                ReviewBlock::Category("Recommendations: add tests".into()),
                ReviewBlock::Paragraph("Closing words.".into()),
            ]
        );
    }

    #[test]
    fn test_numbering_stops_at_five() {
        assert_eq!(
            parse_review("6. Sixth item"),
            vec![ReviewBlock::Paragraph("6. Sixth item".into())]
        );
    }

    #[test]
    fn test_render_escapes() {
        let html = render_review_html("### <b>Title</b>\nuse a < b");
        assert_eq!(
            html,
            "<div class=\"section-header\">&lt;b&gt;Title&lt;/b&gt;</div>\n<div class=\"review-text\">use a &lt; b</div>"
        );
    }

    #[test]
    fn test_render_neutralises_script_tags() {
        let html = render_review_html("<script>alert('x')</script>");
        assert_eq!(html, "<div class=\"review-text\">&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</div>");
        assert!(!html.contains("<script>"));
    }
}
