pub mod colors;
pub mod history;
pub mod selection;
pub mod tools;
