//! RSS 2.0 feed of recent posts.

use std::fmt::Write as _;

use techblog_core::format::rfc2822_gmt;

use crate::models::Post;

/// Number of posts in the feed.
pub const FEED_SIZE: u32 = 20;

pub const FEED_TITLE: &str = "Tech Blog";
pub const FEED_DESCRIPTION: &str = "공부 기록과 개발 경험을 공유합니다.";

/// Content type for the feed response.
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Build the feed document for `posts`, newest first.
#[must_use]
pub fn render_feed(site_url: &str, posts: &[Post]) -> String {
    let site = escape_xml(site_url);
    let mut xml = String::with_capacity(1024 + posts.len() * 512);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#);
    xml.push_str("\n  <channel>\n");
    let _ = writeln!(xml, "    <title>{FEED_TITLE}</title>");
    let _ = writeln!(xml, "    <link>{site}</link>");
    let _ = writeln!(xml, "    <description>{FEED_DESCRIPTION}</description>");
    xml.push_str("    <language>ko</language>\n");
    let _ = writeln!(
        xml,
        r#"    <atom:link href="{site}/feed.xml" rel="self" type="application/rss+xml"/>"#
    );

    for post in posts {
        let link = format!("{site}/posts/{}", escape_xml(&urlencoding::encode(&post.slug)));
        let description = post
            .excerpt
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(&post.title);

        xml.push_str("    <item>\n");
        let _ = writeln!(xml, "      <title>{}</title>", cdata(&post.title));
        let _ = writeln!(xml, "      <link>{link}</link>");
        let _ = writeln!(xml, r#"      <guid isPermaLink="true">{link}</guid>"#);
        let _ = writeln!(xml, "      <description>{}</description>", cdata(description));
        if let Some(category) = &post.category {
            let _ = writeln!(xml, "      <category>{}</category>", escape_xml(&category.name));
        }
        let _ = writeln!(xml, "      <pubDate>{}</pubDate>", rfc2822_gmt(post.created_at));
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n</rss>\n");
    xml
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
