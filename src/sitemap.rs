//! Sitemap generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use chrono::NaiveDate;

use crate::config::SiteMeta;
use crate::post::Post;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Single URL entry in the sitemap
struct UrlEntry {
    loc: String,
    lastmod: NaiveDate,
    changefreq: &'static str,
    priority: &'static str,
}

/// Builds the sitemap for the home page, the about page and every post in
/// `posts`. `posts` must only hold published posts. The home and about
/// entries are stamped with `today`.
pub fn sitemap(site: &SiteMeta, posts: &[&Post], today: NaiveDate) -> String {
    let mut urls = vec![
        UrlEntry {
            loc: site.absolute(""),
            lastmod: today,
            changefreq: "daily",
            priority: "1.0",
        },
        UrlEntry {
            loc: site.absolute("about.html"),
            lastmod: today,
            changefreq: "monthly",
            priority: "0.8",
        },
    ];
    urls.extend(posts.iter().map(|post| UrlEntry {
        loc: site.post_url(&post.slug),
        lastmod: post.date,
        changefreq: "monthly",
        priority: "0.7",
    }));

    let mut xml = String::with_capacity(256 * urls.len());
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{}">"#, SITEMAP_NS));
    xml.push('\n');
    for entry in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod.format("%Y-%m-%d")));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
