//! Support for creating an RSS 2.0 feed from a list of posts.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rss::validation::Validate;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ImageBuilder, Item, ItemBuilder};

use crate::config::SiteMeta;
use crate::post::Post;

/// RFC 822 date format used by RSS, e.g. `Tue, 05 Mar 2024 00:00:00 +0000`.
const RFC822: &str = "%a, %d %b %Y %H:%M:%S %z";

/// How long, in minutes, readers may cache the feed.
const TTL_MINUTES: &str = "60";

/// Creates the RSS document for `posts`, which must be the published posts in
/// the order they should appear (newest first). `generated_at` is only used
/// for the channel's `pubDate`, `lastBuildDate` and copyright year, so two
/// builds at the same instant produce identical feeds.
pub fn feed(site: &SiteMeta, posts: &[&Post], generated_at: DateTime<Utc>) -> Result<String> {
    let build_date = generated_at.format(RFC822).to_string();

    let channel = ChannelBuilder::default()
        .title(site.title.as_str())
        .link(site.absolute(""))
        .description(site.description.as_str())
        .language(Some(site.language.clone()))
        .copyright(Some(format!("{} {}", generated_at.year(), site.author)))
        .managing_editor(Some(site.author.clone()))
        .webmaster(Some(site.author.clone()))
        .pub_date(Some(build_date.clone()))
        .last_build_date(Some(build_date))
        .generator(Some(env!("CARGO_PKG_NAME").to_owned()))
        .ttl(Some(TTL_MINUTES.to_owned()))
        .image(Some(
            ImageBuilder::default()
                .url(site.absolute("images/logo.png"))
                .title(site.title.as_str())
                .link(site.absolute(""))
                .build(),
        ))
        .items(posts.iter().map(|post| item(site, post)).collect::<Vec<Item>>())
        .build();

    channel.validate().map_err(|err| Error::Validation(err.to_string()))?;

    let buf = channel.pretty_write_to(Vec::new(), b' ', 2)?;
    Ok(String::from_utf8(buf)?)
}

fn item(site: &SiteMeta, post: &Post) -> Item {
    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(site.post_url(&post.slug)))
        .description(Some(post.description.clone()))
        .guid(Some(
            GuidBuilder::default()
                .value(post.slug.as_str())
                .permalink(false)
                .build(),
        ))
        .categories(
            post.categories
                .iter()
                .map(|c| CategoryBuilder::default().name(c.as_str()).build())
                .collect::<Vec<_>>(),
        )
        .author(Some(site.author.clone()))
        .pub_date(Some(pub_date(post.date)))
        .build()
}

/// Formats a post date as midnight UTC in RFC 822 form.
pub fn pub_date(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().format(RFC822).to_string())
        .unwrap_or_default()
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the assembled channel isn't valid RSS (e.g. a malformed
    /// link or date).
    #[error("invalid feed: {0}")]
    Validation(String),

    /// Returned when the channel can't be serialized.
    #[error("writing feed: {0}")]
    Rss(#[from] rss::Error),

    /// Returned when the serialized feed isn't UTF-8.
    #[error("writing feed: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
