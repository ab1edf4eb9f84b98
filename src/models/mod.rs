//! Domain models for e-cidadania.
//!
//! # Core Concepts
//!
//! - [`Space`]: A bounded participation area, addressed by its `url` slug.
//! - [`Proposal`]: A citizen-submitted item for discussion inside a space.
//! - [`Post`]: A news article. Posts flagged `pub_index` surface on the site index.
//! - [`StaticPage`]: Informational pages linked from the site footer.
//! - [`User`]: An account with a set of named [`Permission`]s.
//!
//! Spaces, static pages and users are administered from the command line;
//! the web layer only reads them.

mod permission;
mod post;
mod proposal;
mod space;
mod static_page;
mod user;

pub use permission::*;
pub use post::*;
pub use proposal::*;
pub use space::*;
pub use static_page::*;
pub use user::*;
