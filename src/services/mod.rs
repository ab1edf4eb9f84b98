//! Domain services shared by more than one set of handlers.

pub mod news;
