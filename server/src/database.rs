use crate::models::Book;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("Book store lock poisoned")]
    Poisoned,
}

const BOOK_COLUMNS: &str = "id, book_name, author_name, book_image, birth_year, death_year, \
     language, genre, literary_movement, important_themes, key_characters, book_summary, \
     youtube_link, book_link, html_link, created_at, updated_at";

/// Single-table store for published books. Rows are only ever inserted.
pub struct BookStore {
    conn: Connection,
}

impl BookStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Optimize for local performance
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = BookStore { conn };
        store.sync_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = BookStore {
            conn: Connection::open_in_memory()?,
        };
        store.sync_schema()?;
        Ok(store)
    }

    /// Creates the `books` table if it is missing. Existing rows are left alone.
    pub fn sync_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                book_name TEXT NOT NULL,
                author_name TEXT NOT NULL,
                book_image TEXT NOT NULL DEFAULT '',
                birth_year TEXT NOT NULL DEFAULT '',
                death_year TEXT NOT NULL DEFAULT '',
                language TEXT NOT NULL DEFAULT '',
                genre TEXT NOT NULL DEFAULT '',
                literary_movement TEXT NOT NULL DEFAULT '',
                important_themes TEXT NOT NULL DEFAULT '',
                key_characters TEXT NOT NULL DEFAULT '',
                book_summary TEXT NOT NULL DEFAULT '',
                youtube_link TEXT NOT NULL DEFAULT '',
                book_link TEXT NOT NULL DEFAULT '',
                html_link TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    pub fn create(&mut self, book: &Book) -> Result<Book, StoreError> {
        self.create_with(book, || Ok::<(), StoreError>(()))?;
        Ok(book.clone())
    }

    /// Inserts `book` and runs `finalize` inside the same transaction. The
    /// row is committed only if `finalize` succeeds; otherwise it is rolled
    /// back and the error returned.
    pub fn create_with<E, F>(&mut self, book: &Book, finalize: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce() -> Result<(), E>,
    {
        let tx = self.conn.transaction().map_err(StoreError::from)?;
        insert_book(&tx, book).map_err(StoreError::from)?;
        finalize()?;
        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }

    /// All books in insertion order.
    pub fn list(&self) -> Result<Vec<Book>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM books ORDER BY rowid", BOOK_COLUMNS))?;
        let book_iter = stmt.query_map([], book_from_row)?;

        let mut books = Vec::new();
        for book in book_iter {
            books.push(book?);
        }
        Ok(books)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
                [id],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }
}

fn insert_book(conn: &Connection, book: &Book) -> Result<(), rusqlite::Error> {
    conn.execute(
        &format!(
            "INSERT INTO books ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            BOOK_COLUMNS
        ),
        params![
            book.id,
            book.book_name,
            book.author_name,
            book.book_image,
            book.birth_year,
            book.death_year,
            book.language,
            book.genre,
            book.literary_movement,
            book.important_themes,
            book.key_characters,
            book.book_summary,
            book.youtube_link,
            book.book_link,
            book.html_link,
            book.created_at,
            book.updated_at,
        ],
    )?;
    Ok(())
}

fn book_from_row(row: &Row<'_>) -> Result<Book, rusqlite::Error> {
    Ok(Book {
        id: row.get(0)?,
        book_name: row.get(1)?,
        author_name: row.get(2)?,
        book_image: row.get(3)?,
        birth_year: row.get(4)?,
        death_year: row.get(5)?,
        language: row.get(6)?,
        genre: row.get(7)?,
        literary_movement: row.get(8)?,
        important_themes: row.get(9)?,
        key_characters: row.get(10)?,
        book_summary: row.get(11)?,
        youtube_link: row.get(12)?,
        book_link: row.get(13)?,
        html_link: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_book(id: &str, name: &str) -> Book {
        Book {
            id: id.to_string(),
            book_name: name.to_string(),
            author_name: "Herman Melville".to_string(),
            book_image: String::new(),
            birth_year: "1819".to_string(),
            death_year: "1891".to_string(),
            language: "English".to_string(),
            genre: "Adventure".to_string(),
            literary_movement: "Romanticism".to_string(),
            important_themes: "Obsession".to_string(),
            key_characters: "Ishmael, Ahab".to_string(),
            book_summary: "Call me Ishmael.\nSome years ago...".to_string(),
            youtube_link: "https://youtube.com/embed/x".to_string(),
            book_link: String::new(),
            html_link: format!("/books/book_{}.html", id),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn create_then_get_returns_same_record() {
        let mut store = BookStore::open_in_memory().unwrap();
        let book = sample_book("1", "Moby Dick");

        let created = store.create(&book).unwrap();
        assert_eq!(created, book);

        let fetched = store.get_by_id("1").unwrap().unwrap();
        assert_eq!(fetched, book);
        assert!(!fetched.html_link.is_empty());
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = BookStore::open_in_memory().unwrap();
        assert!(store.get_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn list_returns_every_book() {
        let mut store = BookStore::open_in_memory().unwrap();
        store.create(&sample_book("a", "Moby Dick")).unwrap();
        store.create(&sample_book("b", "Typee")).unwrap();

        let books = store.list().unwrap();
        assert_eq!(books.len(), 2);
        assert!(books.iter().any(|b| b.book_name == "Moby Dick"));
        assert!(books.iter().any(|b| b.book_name == "Typee"));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = BookStore::open_in_memory().unwrap();
        store.create(&sample_book("dup", "Moby Dick")).unwrap();
        assert!(store.create(&sample_book("dup", "Typee")).is_err());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn failed_finalize_rolls_back_insert() {
        let mut store = BookStore::open_in_memory().unwrap();
        let result = store.create_with(&sample_book("1", "Moby Dick"), || {
            Err::<(), StoreError>(StoreError::Poisoned)
        });

        assert!(matches!(result, Err(StoreError::Poisoned)));
        assert!(store.get_by_id("1").unwrap().is_none());
    }

    #[test]
    fn schema_sync_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.db");

        {
            let mut store = BookStore::open(&path).unwrap();
            store.create(&sample_book("1", "Moby Dick")).unwrap();
        }

        let store = BookStore::open(&path).unwrap();
        store.sync_schema().unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
