use std::path::{Path, PathBuf};

/// Kind of content being handed off
/// Selects the `text` or `image` segment of the share URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Image,
}

impl PayloadKind {
    /// URI path segment for this kind
    pub fn segment(&self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Image => "image",
        }
    }
}

/// Content for a single post operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Free text message
    Text(String),
    /// Path to an image readable by the receiving app
    ImagePath(PathBuf),
}

impl Payload {
    /// Get the payload kind
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text(_) => PayloadKind::Text,
            Payload::ImagePath(_) => PayloadKind::Image,
        }
    }

    /// Get a preview string (truncated for logging)
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            Payload::Text(text) => {
                let first_line = text.lines().next().unwrap_or("");
                if first_line.chars().count() > max_chars {
                    let cut: String = first_line.chars().take(max_chars).collect();
                    format!("{}...", cut)
                } else {
                    first_line.to_string()
                }
            }
            Payload::ImagePath(path) => format!("[Image: {}]", path.display()),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<&Path> for Payload {
    fn from(path: &Path) -> Self {
        Payload::ImagePath(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind_segment() {
        assert_eq!(Payload::from("hi").kind().segment(), "text");
        assert_eq!(
            Payload::from(Path::new("/tmp/a.png")).kind().segment(),
            "image"
        );
    }

    #[test]
    fn test_payload_preview() {
        let text = Payload::Text("こんにちは世界\nsecond line".to_string());
        assert_eq!(text.preview(5), "こんにちは...");
        assert_eq!(text.preview(50), "こんにちは世界");

        let image = Payload::ImagePath(PathBuf::from("/tmp/test.png"));
        assert_eq!(image.preview(10), "[Image: /tmp/test.png]");
    }
}
