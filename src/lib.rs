//! The library code for the `quire` blog generator. A build is a linear batch
//! transform, each step finishing before the next starts:
//!
//! 1. Loading source posts and their front-matter from disk ([`crate::parser`])
//! 2. Normalizing them into [`crate::post::Post`]s: defaults, slug and date
//!    validation, Markdown rendering ([`crate::post`], [`crate::markdown`])
//! 3. Rendering the post pages and the index, about and writing pages
//!    through the theme, minifying the result ([`crate::render`],
//!    [`crate::minify`])
//! 4. Deriving the sitemap and the RSS feed from the published posts
//!    ([`crate::sitemap`], [`crate::feed`])
//! 5. Writing the output tree and the passthrough assets ([`crate::write`])
//!
//! [`crate::build::build_site`] ties the steps together.
//!
//! Drafts (`published: false`) go through every step but the listings: they
//! get a page of their own and nothing links to it.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod logging;
pub mod markdown;
pub mod minify;
pub mod parser;
pub mod post;
pub mod render;
pub mod sitemap;
pub mod value;
pub mod write;
