//! Database query functions organized by domain.

pub mod book_labels;
pub mod books;
pub mod history;
pub mod labels;
pub mod roles;
pub mod workspaces;
