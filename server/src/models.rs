use serde::{Deserialize, Serialize};

/// A published book. Field names on the wire match the upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub book_name: String,
    pub author_name: String,
    /// `/uploads/<file>`, or empty when no cover was sent.
    pub book_image: String,
    pub birth_year: String,
    pub death_year: String,
    pub language: String,
    pub genre: String,
    pub literary_movement: String,
    pub important_themes: String,
    pub key_characters: String,
    pub book_summary: String,
    pub youtube_link: String,
    pub book_link: String,
    /// Public path of the generated page, `/books/book_<id>.html`.
    pub html_link: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Book {
    pub fn page_file_name(&self) -> String {
        page_file_name(&self.id)
    }
}

pub fn page_file_name(id: &str) -> String {
    format!("book_{}.html", id)
}

/// An image attached to an upload, held in memory until it is staged.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Lowercased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Browsers send an empty file part when the input was left blank.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_is_lowercased() {
        let image = ImageUpload {
            file_name: "Cover.JPG".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(image.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn image_without_extension() {
        let image = ImageUpload {
            file_name: "cover".to_string(),
            bytes: vec![1],
        };
        assert_eq!(image.extension(), None);
        assert!(!image.is_empty());
    }

    #[test]
    fn blank_file_part_is_empty() {
        let image = ImageUpload {
            file_name: String::new(),
            bytes: Vec::new(),
        };
        assert!(image.is_empty());
    }

    #[test]
    fn page_file_name_uses_id() {
        assert_eq!(page_file_name("42"), "book_42.html");
    }
}
