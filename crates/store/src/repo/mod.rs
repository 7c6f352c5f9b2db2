mod article;
mod digest;
mod theme;
mod writer;

pub use self::article::ArticleStore;
pub use self::digest::DigestRepository;
pub use self::theme::ThemeStore;
pub use self::writer::{DigestWriter, StoreReport};
