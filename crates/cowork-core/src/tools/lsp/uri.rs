//! file:// URI <-> filesystem path conversion with percent-encoding,
//! kept separate from `client.rs` since both the session and the
//! individual tools need it.

use std::path::{Path, PathBuf};

pub fn path_to_uri(path: &Path) -> Result<String, String> {
    let abs_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(|e| e.to_string())?.join(path)
    };

    let path_str = abs_path.to_string_lossy().replace('\\', "/");
    let encoded = percent_encode_path(&path_str);

    #[cfg(windows)]
    {
        Ok(format!("file:///{encoded}"))
    }
    #[cfg(not(windows))]
    {
        Ok(format!("file://{encoded}"))
    }
}

pub fn uri_to_path(uri: &str) -> PathBuf {
    let path_part = uri.strip_prefix("file://").unwrap_or(uri);
    #[cfg(windows)]
    let path_part = path_part.strip_prefix('/').unwrap_or(path_part);
    PathBuf::from(percent_decode_path(path_part))
}

fn percent_encode_path(path: &str) -> String {
    let mut result = String::with_capacity(path.len() * 2);
    for c in path.chars() {
        match c {
            ' ' => result.push_str("%20"),
            '#' => result.push_str("%23"),
            '%' => result.push_str("%25"),
            '?' => result.push_str("%3F"),
            '[' => result.push_str("%5B"),
            ']' => result.push_str("%5D"),
            '/' | ':' | '@' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' => {
                result.push(c)
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '~' => {
                result.push(c)
            }
            c => {
                for byte in c.to_string().bytes() {
                    result.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    result
}

fn percent_decode_path(encoded: &str) -> String {
    let mut result = String::with_capacity(encoded.len());
    let mut chars = encoded.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                    continue;
                }
            }
            result.push('%');
            result.push_str(&hex);
        } else {
            result.push(c);
        }
    }
    result
}

/// Language id LSP servers expect in `textDocument/didOpen`, keyed by
/// file extension, falling back to `plaintext`.
pub fn language_id_for(path: &Path) -> &'static str {
    match path.file_name().and_then(|n| n.to_str()) {
        Some("Dockerfile") => return "dockerfile",
        Some("Makefile") => return "makefile",
        _ => {}
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("ts") => "typescript",
        Some("tsx") => "typescriptreact",
        Some("js") => "javascript",
        Some("jsx") => "javascriptreact",
        Some("go") => "go",
        Some("java") => "java",
        Some("c") => "c",
        Some("h") => "c",
        Some("cpp") | Some("cc") | Some("cxx") => "cpp",
        Some("hpp") => "cpp",
        Some("rb") => "ruby",
        Some("php") => "php",
        Some("json") => "json",
        Some("yaml") | Some("yml") => "yaml",
        Some("toml") => "toml",
        Some("md") => "markdown",
        Some("sh") => "shellscript",
        Some("lua") => "lua",
        Some("kt") => "kotlin",
        Some("swift") => "swift",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_path() {
        let path = Path::new("/tmp/some dir/file.rs");
        let uri = path_to_uri(path).unwrap();
        assert!(uri.contains("%20"));
        assert_eq!(uri_to_path(&uri), path.to_path_buf());
    }

    #[test]
    fn language_id_falls_back_to_plaintext() {
        assert_eq!(language_id_for(Path::new("main.rs")), "rust");
        assert_eq!(language_id_for(Path::new("notes.txt")), "plaintext");
        assert_eq!(language_id_for(Path::new("Dockerfile")), "dockerfile");
    }
}
