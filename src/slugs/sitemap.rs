//! XML sitemap rendering

use super::SlugTable;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render a sitemap listing the site root and every mapped page
///
/// The root gets priority 1.0, pages 0.8; all entries change daily.
///
/// # Examples
///
/// ```
/// use folio::slugs::{build_mappings, render_sitemap, PageNode, SlugTable};
///
/// let table = SlugTable::from_mappings(build_mappings(&[PageNode::new("a", "About", None)]));
/// let xml = render_sitemap("https://example.com/", &table);
/// assert!(xml.contains("<loc>https://example.com/about</loc>"));
/// ```
pub fn render_sitemap(base_url: &str, table: &SlugTable) -> String {
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    xml.push_str(&url_entry(base, "1.0"));
    for mapping in table.mappings() {
        let loc = format!("{}/{}", base, mapping.slug);
        xml.push_str(&url_entry(&loc, "0.8"));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn url_entry(loc: &str, priority: &str) -> String {
    format!(
        "  <url>\n    <loc>{}</loc>\n    <changefreq>daily</changefreq>\n    <priority>{}</priority>\n  </url>\n",
        escape_xml(loc),
        priority
    )
}
