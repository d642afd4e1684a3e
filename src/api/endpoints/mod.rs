pub mod chronology;
pub mod health;
pub mod page;
