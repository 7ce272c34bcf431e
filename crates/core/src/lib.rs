// https://www.cgsecurity.org/wiki/File_Carving
// https://en.wikipedia.org/wiki/File_carving

//! Session plumbing for a file carver: candidate records, the sealed
//! magic registry, and footer search over committed bytes.
//!
//! The format recognizers themselves live in their own crates and plug in
//! through [`RegistryBuilder::register`].

mod candidate;
mod error;
mod footer;
mod registry;

pub use candidate::*;
pub use error::*;
pub use footer::*;
pub use registry::*;
