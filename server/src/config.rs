use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Default request body limit (25 MiB), enough for a cover image.
pub const DEFAULT_UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "book-pages", version, about = "Publish a static page for each uploaded book")]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "BOOK_PAGES_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "BOOK_PAGES_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "BOOK_PAGES_DATABASE", default_value = "books.db")]
    pub database: PathBuf,

    /// Directory served at `/`; generated pages go to its `books/` subdirectory
    #[arg(long, env = "BOOK_PAGES_PUBLIC", default_value = "public")]
    pub public_dir: PathBuf,

    /// Directory for uploaded cover images, served at `/uploads`
    #[arg(long, env = "BOOK_PAGES_UPLOADS", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Maximum request body size in bytes
    #[arg(long, env = "BOOK_PAGES_UPLOAD_LIMIT", default_value_t = DEFAULT_UPLOAD_LIMIT)]
    pub upload_limit: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind, self.port).parse()
    }
}
