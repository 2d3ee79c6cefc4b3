//! Turning an upload into a published book.
//!
//! Publishing writes up to three artifacts: the cover image, the rendered
//! page and the database row. The files are staged first and only renamed
//! into place inside the row's transaction, so a failure at any step leaves
//! neither orphaned files nor a row pointing at a missing file.

use crate::database::StoreError;
use crate::models::{Book, ImageUpload};
use crate::render;
use crate::staging::{self, StageError, StagedFile};
use crate::state::AppState;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use thiserror::Error;

pub const IMAGE_FIELD: &str = "bookImage";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Request is not a multipart form: {0}")]
    Rejected(#[from] MultipartRejection),
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Staging error: {0}")]
    Stage(#[from] StageError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Publish task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Text fields of the upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub book_name: String,
    pub author_name: String,
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
}

impl BookForm {
    /// Stores `value` under the form field `name`. Returns `false` for
    /// names the form does not know.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "bookName" => &mut self.book_name,
            "authorName" => &mut self.author_name,
            "birthYear" => &mut self.birth_year,
            "deathYear" => &mut self.death_year,
            "language" => &mut self.language,
            "genre" => &mut self.genre,
            "literaryMovement" => &mut self.literary_movement,
            "importantThemes" => &mut self.important_themes,
            "keyCharacters" => &mut self.key_characters,
            "bookSummary" => &mut self.book_summary,
            "youtubeLink" => &mut self.youtube_link,
            "bookLink" => &mut self.book_link,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.book_name.trim().is_empty() {
            return Err(UploadError::MissingField("bookName"));
        }
        if self.author_name.trim().is_empty() {
            return Err(UploadError::MissingField("authorName"));
        }
        Ok(())
    }

    fn into_book(self, id: String, book_image: String, now: String) -> Book {
        Book {
            html_link: format!("/books/{}", crate::models::page_file_name(&id)),
            id,
            book_name: self.book_name,
            author_name: self.author_name,
            book_image,
            birth_year: self.birth_year,
            death_year: self.death_year,
            language: self.language,
            genre: self.genre,
            literary_movement: self.literary_movement,
            important_themes: self.important_themes,
            key_characters: self.key_characters,
            book_summary: self.book_summary,
            youtube_link: self.youtube_link,
            book_link: self.book_link,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Drains a multipart body into the form and the first cover image.
pub async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(BookForm, Option<ImageUpload>), UploadError> {
    let mut form = BookForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or("").to_string();
            let bytes = field.bytes().await?.to_vec();
            if image.is_none() {
                image = Some(ImageUpload { file_name, bytes });
            }
            continue;
        }

        let value = field.text().await?;
        if !form.set_field(&name, value) {
            tracing::debug!("Ignoring unknown form field {:?}", name);
        }
    }

    Ok((form, image))
}

/// Validates the form, writes the cover and page, and stores the record.
/// Returns the stored book together with its rendered page.
pub fn publish_book(
    state: &AppState,
    form: BookForm,
    image: Option<ImageUpload>,
) -> Result<(Book, String), UploadError> {
    form.validate()?;

    let id = state.ids.next_id();
    let now = chrono::Local::now().to_rfc3339();
    let mut stages = Vec::with_capacity(2);

    let book_image = match image.filter(|image| !image.is_empty()) {
        Some(image) => {
            // Keeping extension so the file is served with the right type
            let file_name = match image.extension() {
                Some(ext) => format!("{}.{}", id, ext),
                None => id.clone(),
            };
            stages.push(StagedFile::write(
                &state.dirs.uploads,
                &file_name,
                &image.bytes,
            )?);
            format!("/uploads/{}", file_name)
        }
        None => String::new(),
    };

    let book = form.into_book(id, book_image, now);
    let html = render::book_page(&book);
    stages.push(StagedFile::write(
        &state.dirs.books,
        &book.page_file_name(),
        html.as_bytes(),
    )?);

    let mut store = state.store()?;
    let mut committed = Vec::new();
    let result = store.create_with(&book, || -> Result<(), UploadError> {
        committed = staging::commit_all(stages)?;
        Ok(())
    });
    drop(store);

    if let Err(e) = result {
        // Files were renamed into place but the row never committed
        staging::remove_all(&committed);
        return Err(e);
    }

    tracing::info!("Published book {} ({})", book.id, book.book_name);
    Ok((book, html))
}

/// Re-renders the page of an already stored book and writes it again.
pub fn regenerate_page(state: &AppState, book: &Book) -> Result<String, UploadError> {
    let html = render::book_page(book);
    StagedFile::write(&state.dirs.books, &book.page_file_name(), html.as_bytes())?.commit()?;
    tracing::info!("Regenerated page for book {}", book.id);
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::BookStore;
    use crate::ids::SequentialIds;
    use crate::state::ContentDirs;
    use std::fs;
    use std::path::Path;

    fn moby_dick() -> BookForm {
        let mut form = BookForm::default();
        for (name, value) in [
            ("bookName", "Moby Dick"),
            ("authorName", "Herman Melville"),
            ("birthYear", "1819"),
            ("deathYear", "1891"),
            ("bookSummary", "Call me Ishmael.\nSome years ago..."),
            ("youtubeLink", "https://youtube.com/embed/x"),
            ("bookLink", ""),
        ] {
            assert!(form.set_field(name, value.to_string()));
        }
        form
    }

    fn test_state(root: &Path) -> AppState {
        AppState::new(
            BookStore::open_in_memory().unwrap(),
            SequentialIds::new(""),
            ContentDirs::under(root),
        )
    }

    fn file_count(dir: &Path) -> usize {
        match fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn unknown_field_is_rejected_by_set_field() {
        let mut form = BookForm::default();
        assert!(!form.set_field("password", "x".to_string()));
        assert_eq!(form, BookForm::default());
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut form = moby_dick();
        form.book_name = "  ".to_string();
        assert!(matches!(
            form.validate(),
            Err(UploadError::MissingField("bookName"))
        ));
    }

    #[test]
    fn publish_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (book, html) = publish_book(&state, moby_dick(), None).unwrap();

        assert_eq!(book.id, "1");
        assert_eq!(book.book_image, "");
        assert_eq!(book.book_link, "");
        assert_eq!(book.html_link, "/books/book_1.html");
        assert_eq!(book.created_at, book.updated_at);
        assert!(!html.contains("<img src="));

        let page = state.dirs.books.join("book_1.html");
        assert_eq!(fs::read_to_string(page).unwrap(), html);
        assert_eq!(file_count(&state.dirs.uploads), 0);

        let stored = state.store().unwrap().get_by_id("1").unwrap().unwrap();
        assert_eq!(stored, book);
    }

    #[test]
    fn publish_with_image_writes_cover() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let image = ImageUpload {
            file_name: "whale.PNG".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };

        let (book, html) = publish_book(&state, moby_dick(), Some(image)).unwrap();

        assert_eq!(book.book_image, "/uploads/1.png");
        assert!(html.contains(r#"src="/uploads/1.png""#));
        let cover = state.dirs.uploads.join("1.png");
        assert_eq!(fs::read(cover).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn blank_file_part_counts_as_no_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let image = ImageUpload {
            file_name: String::new(),
            bytes: Vec::new(),
        };

        let (book, _) = publish_book(&state, moby_dick(), Some(image)).unwrap();
        assert_eq!(book.book_image, "");
        assert_eq!(file_count(&state.dirs.uploads), 0);
    }

    #[test]
    fn missing_field_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut form = moby_dick();
        form.author_name.clear();

        let result = publish_book(&state, form, None);

        assert!(matches!(
            result,
            Err(UploadError::MissingField("authorName"))
        ));
        assert_eq!(file_count(&state.dirs.books), 0);
        assert!(state.store().unwrap().list().unwrap().is_empty());
    }

    #[test]
    fn duplicate_id_leaves_no_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::open_in_memory().unwrap();
        // Both uploads get id "1"
        let state = AppState::new(
            store,
            SequentialIds::starting_at("", 1),
            ContentDirs::under(dir.path()),
        );
        publish_book(&state, moby_dick(), None).unwrap();
        let first_page = fs::read_to_string(state.dirs.books.join("book_1.html")).unwrap();

        let colliding = AppState {
            ids: std::sync::Arc::new(SequentialIds::starting_at("", 1)),
            ..state.clone()
        };
        let mut form = moby_dick();
        form.book_name = "Typee".to_string();
        let image = ImageUpload {
            file_name: "typee.jpg".to_string(),
            bytes: vec![1, 2, 3],
        };

        let result = publish_book(&colliding, form, Some(image));

        assert!(matches!(result, Err(UploadError::Store(_))));
        assert_eq!(file_count(&state.dirs.uploads), 0);
        assert_eq!(file_count(&state.dirs.books), 1);
        assert_eq!(
            fs::read_to_string(state.dirs.books.join("book_1.html")).unwrap(),
            first_page
        );
    }

    #[test]
    fn regenerate_restores_missing_page() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (book, html) = publish_book(&state, moby_dick(), None).unwrap();
        let page = state.dirs.books.join(book.page_file_name());
        fs::remove_file(&page).unwrap();

        let regenerated = regenerate_page(&state, &book).unwrap();

        assert_eq!(regenerated, html);
        assert_eq!(fs::read_to_string(page).unwrap(), html);
    }

    #[test]
    fn failed_page_rename_removes_cover_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        // Occupy the page path so renaming the staged page fails after the
        // cover has already been moved into place
        fs::create_dir_all(state.dirs.books.join("book_1.html").join("occupied")).unwrap();
        let image = ImageUpload {
            file_name: "whale.png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let result = publish_book(&state, moby_dick(), Some(image));

        assert!(matches!(result, Err(UploadError::Stage(_))));
        assert!(!state.dirs.uploads.join("1.png").exists());
        assert_eq!(file_count(&state.dirs.uploads), 0);
        assert!(state.store().unwrap().get_by_id("1").unwrap().is_none());
    }
}
