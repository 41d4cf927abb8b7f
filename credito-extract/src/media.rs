//! Accepted document media types

use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    /// `image/<subtype>`, subtype lowercased
    Image(String),
}

impl MediaType {
    /// Infer from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(MediaType::Pdf),
            "png" => Some(MediaType::Image("png".into())),
            "jpg" | "jpeg" => Some(MediaType::Image("jpeg".into())),
            "webp" => Some(MediaType::Image("webp".into())),
            "gif" => Some(MediaType::Image("gif".into())),
            "heic" => Some(MediaType::Image("heic".into())),
            "heif" => Some(MediaType::Image("heif".into())),
            _ => None,
        }
    }

    pub fn mime(&self) -> String {
        match self {
            MediaType::Pdf => "application/pdf".to_string(),
            MediaType::Image(sub) => format!("image/{sub}"),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "application/pdf" {
            return Ok(MediaType::Pdf);
        }
        match lower.strip_prefix("image/") {
            Some(sub) if !sub.is_empty() && !sub.contains('/') => Ok(MediaType::Image(sub.to_string())),
            _ => Err(format!(
                "unsupported media type {s:?} (expected application/pdf or image/*)"
            )),
        }
    }
}
