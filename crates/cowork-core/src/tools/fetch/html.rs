//! Minimal single-pass HTML to text / HTML to Markdown conversion.
//!
//! No HTML parser crate is pulled in for this; like the teacher's
//! original tag stripper, it walks the byte stream once and reacts to
//! tag names as they close, which is enough for the common
//! article/blog-post shape this tool is meant for and avoids dragging
//! in a full DOM for a best-effort conversion.

pub fn html_to_text(html: &str) -> String {
    let stripped = strip_script_and_style(html);
    let raw = strip_all_tags(&stripped);
    normalize_lines(&decode_entities(&raw))
}

pub fn html_to_markdown(html: &str) -> String {
    let stripped = strip_script_and_style(html);
    let raw = tags_to_markdown(&stripped);
    normalize_lines(&decode_entities(&raw))
}

fn strip_script_and_style(html: &str) -> String {
    let mut result = html.to_string();
    for (open, close) in [("<script", "</script>"), ("<style", "</style>")] {
        while let Some(start) = result.find(open) {
            match result[start..].find(close) {
                Some(end) => {
                    result = format!("{}{}", &result[..start], &result[start + end + close.len()..]);
                }
                None => break,
            }
        }
    }
    result
}

fn strip_all_tags(html: &str) -> String {
    let mut output = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => output.push(c),
            _ => {}
        }
    }
    output
}

/// Walks the same single pass as [`strip_all_tags`] but renders a
/// handful of common tags as their Markdown equivalent instead of
/// dropping them.
fn tags_to_markdown(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    let mut tag_buf = String::new();

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag_buf.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                render_tag_markdown(&tag_buf, &mut out);
            }
            _ if in_tag => tag_buf.push(c),
            _ => out.push(c),
        }
    }
    out
}

fn render_tag_markdown(tag: &str, out: &mut String) {
    let closing = tag.starts_with('/');
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_lowercase();

    match name.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" if !closing => {
            let level: usize = name[1..].parse().unwrap_or(1);
            out.push('\n');
            out.push_str(&"#".repeat(level));
            out.push(' ');
        }
        "strong" | "b" => out.push_str("**"),
        "em" | "i" => out.push('*'),
        "code" | "pre" => out.push('`'),
        "li" if !closing => out.push_str("\n- "),
        "br" => out.push('\n'),
        "p" | "div" | "tr" if !closing => out.push('\n'),
        _ => {}
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn normalize_lines(s: &str) -> String {
    s.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_drops_script_and_tags() {
        let html = "<html><head><script>evil()</script></head><body><p>Hello <b>world</b></p></body></html>";
        assert_eq!(html_to_text(html), "Hello world");
    }

    #[test]
    fn markdown_renders_headings_and_lists() {
        let html = "<h1>Title</h1><ul><li>one</li><li>two</li></ul>";
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
    }
}
