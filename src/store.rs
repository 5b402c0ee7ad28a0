//! Book storage seam.
//!
//! Persistence belongs to the surrounding application; the export pipeline
//! only needs to look books up. [`MemoryStore`] backs the CLI, the HTTP
//! surface and the tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde::Deserialize;

use crate::book::Book;
use crate::error::{Error, Result};

/// Create/read/update/delete access to books.
pub trait BookStore: Send + Sync {
    fn find_book_by_id(&self, id: &str) -> Result<Option<Book>>;

    fn create_book(&self, book: Book) -> Result<Book>;

    fn update_book(&self, book: Book) -> Result<Book>;

    fn delete_book(&self, id: &str) -> Result<()>;

    /// All books owned by `user_id`.
    fn list_books(&self, user_id: &str) -> Result<Vec<Book>>;
}

/// Fetch a book and verify the requester owns it.
///
/// Missing books are [`Error::NotFound`]; books owned by someone else are
/// [`Error::Unauthorized`].
pub fn find_owned_book<S: BookStore + ?Sized>(store: &S, id: &str, requester: &str) -> Result<Book> {
    let book = store
        .find_book_by_id(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    if !book.is_owned_by(requester) {
        return Err(Error::Unauthorized(id.to_string()));
    }
    Ok(book)
}

/// In-memory store keyed by book id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<BTreeMap<String, Book>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BookFile {
    Many(Vec<Book>),
    One(Box<Book>),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.books.write() {
            for book in books {
                map.insert(book.id.clone(), book);
            }
        }
        store
    }

    /// Load a JSON file holding either one book or an array of books.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let books = match serde_json::from_slice::<BookFile>(&data)? {
            BookFile::Many(books) => books,
            BookFile::One(book) => vec![*book],
        };
        log::debug!("loaded {} book(s) from {}", books.len(), path.as_ref().display());
        Ok(Self::with_books(books))
    }

    pub fn len(&self) -> usize {
        self.books.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every stored book, in order.
    pub fn book_ids(&self) -> Vec<String> {
        self.books
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn poisoned() -> Error {
        Error::Io(std::io::Error::other("book store lock poisoned"))
    }
}

impl BookStore for MemoryStore {
    fn find_book_by_id(&self, id: &str) -> Result<Option<Book>> {
        let map = self.books.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn create_book(&self, book: Book) -> Result<Book> {
        book.validate()?;
        let mut map = self.books.write().map_err(|_| Self::poisoned())?;
        map.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    fn update_book(&self, book: Book) -> Result<Book> {
        let mut map = self.books.write().map_err(|_| Self::poisoned())?;
        match map.get_mut(&book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(book)
            }
            None => Err(Error::NotFound(book.id)),
        }
    }

    fn delete_book(&self, id: &str) -> Result<()> {
        let mut map = self.books.write().map_err(|_| Self::poisoned())?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn list_books(&self, user_id: &str) -> Result<Vec<Book>> {
        let map = self.books.read().map_err(|_| Self::poisoned())?;
        Ok(map
            .values()
            .filter(|b| b.is_owned_by(user_id))
            .cloned()
            .collect())
    }
}
