// Adapters layer: concrete implementations of the domain ports (HTTP, SQLite, language model).

pub mod adzuna;
pub mod chat_drafter;
pub mod sqlite_store;
