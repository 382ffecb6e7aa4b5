//! Placeholder cover images for content without a picture of its own.
//!
//! Renders a small SVG card with the content title and type label.

use crate::models::{Asset, ContentType};

const WIDTH: u32 = 600;
const HEIGHT: u32 = 600;
const MAX_LINE_CHARS: usize = 18;
const MAX_LINES: usize = 4;

/// Render the placeholder as an uploadable SVG asset.
pub fn render(title: &str, content_type: ContentType) -> Asset {
    let svg = render_svg(title, content_type);
    Asset::new(
        format!("{}-cover.svg", content_type.as_str()),
        "image/svg+xml",
        svg.into_bytes(),
    )
}

pub fn render_svg(title: &str, content_type: ContentType) -> String {
    let (from, to) = palette(content_type);
    let lines = wrap(title.trim(), MAX_LINE_CHARS, MAX_LINES);

    let line_height = 56;
    let first_y = HEIGHT as usize / 2 - (lines.len().saturating_sub(1) * line_height) / 2;
    let text: String = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            format!(
                r##"<text x="50%" y="{}" text-anchor="middle" font-family="sans-serif" font-size="44" font-weight="700" fill="#ffffff">{}</text>"##,
                first_y + i * line_height,
                escape(line)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">"#,
            r#"<stop offset="0%" stop-color="{from}"/><stop offset="100%" stop-color="{to}"/>"#,
            r#"</linearGradient></defs>"#,
            r#"<rect width="100%" height="100%" fill="url(#bg)"/>"#,
            "{text}",
            r##"<text x="50%" y="{label_y}" text-anchor="middle" font-family="sans-serif" font-size="24" fill="#ffffffcc">{label}</text>"##,
            "</svg>"
        ),
        w = WIDTH,
        h = HEIGHT,
        from = from,
        to = to,
        text = text,
        label_y = HEIGHT - 48,
        label = escape(content_type.label()),
    )
}

fn palette(content_type: ContentType) -> (&'static str, &'static str) {
    match content_type {
        ContentType::Image => ("#8b5cf6", "#ec4899"),
        ContentType::Blog => ("#0ea5e9", "#6366f1"),
        ContentType::Video => ("#f97316", "#ef4444"),
        ContentType::Music => ("#10b981", "#0ea5e9"),
        ContentType::Code => ("#334155", "#0f172a"),
    }
}

/// Greedy word wrap. Overlong words are cut, the last line gets an ellipsis
/// when text is dropped.
fn wrap(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word: String = word.chars().take(width).collect();
        let needed = if current.is_empty() { word.chars().count() } else { current.chars().count() + 1 + word.chars().count() };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(width.saturating_sub(1)).collect();
            *last = format!("{}…", kept);
        }
    }

    if lines.is_empty() {
        lines.push("Untitled".to_string());
    }
    lines
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_contains_title_and_label() {
        let asset = render("My <Blog> & Notes", ContentType::Blog);
        assert_eq!(asset.mime_type, "image/svg+xml");
        assert_eq!(asset.file_name, "blog-cover.svg");

        let svg = String::from_utf8(asset.bytes).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("My &lt;Blog&gt; &amp;"));
        assert!(svg.contains("Blog Post"));
        assert!(!svg.contains("<Blog>"));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a short one", 18, 4), vec!["a short one"]);
        assert_eq!(
            wrap("the quick brown fox jumps over", 10, 4),
            vec!["the quick", "brown fox", "jumps over"]
        );
        let long = wrap("one two three four five six seven eight", 5, 2);
        assert_eq!(long.len(), 2);
        assert!(long[1].ends_with('…'));
        assert_eq!(wrap("   ", 10, 2), vec!["Untitled"]);
    }
}
