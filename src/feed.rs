//! RSS 2.0 feed of the latest news.

use std::fmt::Write;

use chrono::Utc;

use crate::models::Post;

pub const FEED_TITLE: &str = "e-cidadania news";
pub const FEED_DESCRIPTION: &str = "Updates on the main e-cidadania site.";
/// Number of posts the feed carries.
pub const FEED_ITEMS: u32 = 10;

/// Render the index entries feed. `posts` must already be newest first.
pub fn render_index_entries(site_url: &str, posts: &[Post]) -> String {
    let link = format!("{}/news/", site_url);
    let last_build = posts
        .first()
        .map(|p| p.pub_date)
        .unwrap_or_else(Utc::now);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<rss version=\"2.0\">\n<channel>\n");
    push_element(&mut out, "title", FEED_TITLE);
    push_element(&mut out, "link", &link);
    push_element(&mut out, "description", FEED_DESCRIPTION);
    push_element(&mut out, "lastBuildDate", &last_build.to_rfc2822());

    for post in posts.iter().take(FEED_ITEMS as usize) {
        let item_link = format!("{}/news/{}", site_url, post.id);
        out.push_str("<item>\n");
        push_element(&mut out, "title", &post.title);
        push_element(&mut out, "link", &item_link);
        push_element(&mut out, "description", &post.message);
        push_element(&mut out, "pubDate", &post.pub_date.to_rfc2822());
        push_element(&mut out, "guid", &item_link);
        out.push_str("</item>\n");
    }

    out.push_str("</channel>\n</rss>\n");
    out
}

fn push_element(out: &mut String, name: &str, text: &str) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "<{name}>{}</{name}>", escape(text));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn post(id: i64, title: &str, message: &str) -> Post {
        let date = Utc.with_ymd_and_hms(2011, 3, 1, 12, 0, 0).unwrap() + Duration::days(id);
        Post {
            id,
            space_id: None,
            title: title.to_string(),
            message: message.to_string(),
            author: "admin".to_string(),
            pub_index: true,
            pub_date: date,
            last_update: date,
        }
    }

    #[test]
    fn escapes_markup_in_titles_and_bodies() {
        let xml = render_index_entries(
            "http://example.org",
            &[post(1, "Rock & <roll>", "<p>\"quoted\"</p>")],
        );
        assert!(xml.contains("<title>Rock &amp; &lt;roll&gt;</title>"));
        assert!(xml.contains("<description>&lt;p&gt;&quot;quoted&quot;&lt;/p&gt;</description>"));
    }

    #[test]
    fn channel_and_item_links_use_site_url() {
        let xml = render_index_entries("http://example.org", &[post(4, "t", "m")]);
        assert!(xml.contains("<link>http://example.org/news/</link>"));
        assert!(xml.contains("<link>http://example.org/news/4</link>"));
        assert!(xml.contains("<guid>http://example.org/news/4</guid>"));
        assert!(xml.contains("<title>e-cidadania news</title>"));
    }

    #[test]
    fn caps_items_at_window() {
        let posts: Vec<Post> = (1..=12).map(|i| post(i, "t", "m")).collect();
        let xml = render_index_entries("http://example.org", &posts);
        assert_eq!(xml.matches("<item>").count(), 10);
    }

    #[test]
    fn empty_feed_is_well_formed() {
        let xml = render_index_entries("http://example.org", &[]);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.trim_end().ends_with("</rss>"));
        assert_eq!(xml.matches("<item>").count(), 0);
    }
}
