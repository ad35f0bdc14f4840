//! Feed serialization.
//!
//! - [`rss`]: RSS 2.0 document built with `quick-xml`
//!
//! The finished bytes are written by [`crate::utils::write_replacing`], which
//! replaces the previous feed file in one rename.

pub mod rss;
