//! Minimal markup used by the `html` value format.

pub const CHECKBOX_CHECKED: &str = r#"<i class="fas fa-check-square"></i>"#;
pub const CHECKBOX_UNCHECKED: &str = r#"<i class="fas fa-square"></i>"#;

pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inserts `<br />` before every line break, keeping the break itself.
pub fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
                let pair = if c == '\r' { '\n' } else { '\r' };
                if chars.peek() == Some(&pair) {
                    out.push(pair);
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

pub fn is_font_awesome(image: &str) -> bool {
    image.split_whitespace().any(|part| part.starts_with("fa-"))
}

/// Whether a list entry references an icon, optionally as `image|text`.
pub fn is_image_entry(entry: &str) -> bool {
    let image = entry.split('|').next().unwrap_or(entry).trim();
    let lower = image.to_ascii_lowercase();
    lower.ends_with(".png") || lower.ends_with(".jpg") || is_font_awesome(image)
}

pub fn icon_html(image: &str, title: &str) -> String {
    let title = escape_attr(title);
    if is_font_awesome(image) {
        let class = if image.starts_with("fa-") {
            format!("fas {image}")
        } else {
            image.to_string()
        };
        format!(
            r#"<i class="{}" data-bs-toggle="tooltip" title="{}"></i>"#,
            escape_attr(&class),
            title
        )
    } else {
        format!(
            r#"<img class="admidio-icon-info" src="{}" data-bs-toggle="tooltip" title="{}" alt="{}" />"#,
            escape_attr(image),
            title,
            title
        )
    }
}
