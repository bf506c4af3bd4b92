//! HTML for the admin pages.
//!
//! Every value interpolated into markup goes through [`html_escape`].

use pagehost_core::{AssetKind, Site, Slug};

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a slug for use inside a URL path
fn url_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Admin edit page URL for a slug
pub fn edit_url(slug: &str) -> String {
    format!("/admin/edit/{}", url_segment(slug))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} | pagehost</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            line-height: 1.5;
            color: #333;
            background: #f5f5f5;
            padding: 2rem;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 2rem;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        nav a {{ margin-right: 1rem; }}
        .error {{ color: #b00020; }}
        table {{ width: 100%; border-collapse: collapse; }}
        td {{ padding: 0.4rem; border-bottom: 1px solid #eee; }}
        textarea {{ width: 100%; min-height: 24rem; font-family: monospace; }}
        form.inline {{ display: inline; }}
    </style>
</head>
<body>
    <div class="container">
{}
    </div>
</body>
</html>"#,
        html_escape(title),
        body
    )
}

fn admin_nav() -> &'static str {
    r#"        <nav><a href="/admin">Pages</a><a href="/upload">Upload</a><a href="/admin/logout">Log out</a></nav>"#
}

pub fn login_page(failed: bool) -> String {
    let error = if failed {
        r#"<p class="error">Wrong password.</p>"#
    } else {
        ""
    };
    layout(
        "Admin login",
        &format!(
            r#"        <h1>Admin login</h1>
        {error}
        <form method="post" action="/admin/login">
            <input type="password" name="password" placeholder="Password" autofocus required>
            <button type="submit">Log in</button>
        </form>"#
        ),
    )
}

pub fn dashboard(slugs: &[Slug]) -> String {
    let rows: String = if slugs.is_empty() {
        "<tr><td>No pages yet.</td></tr>".to_string()
    } else {
        slugs
            .iter()
            .map(|slug| {
                let text = html_escape(slug.as_str());
                let url = url_segment(slug.as_str());
                format!(
                    r#"<tr>
                <td><a href="/p/{url}">{text}</a></td>
                <td><a href="/admin/edit/{url}">Edit</a></td>
                <td><form class="inline" method="post" action="/admin/delete_page/{url}"
                          onsubmit="return confirm('Delete this page?')">
                    <button type="submit">Delete</button></form></td>
            </tr>"#
                )
            })
            .collect()
    };

    layout(
        "Pages",
        &format!(
            r#"{}
        <h1>Pages</h1>
        <table>
            {rows}
        </table>"#,
            admin_nav()
        ),
    )
}

pub fn upload_form() -> String {
    layout(
        "Upload page",
        &format!(
            r#"{}
        <h1>Upload page</h1>
        <form method="post" action="/upload" enctype="multipart/form-data">
            <p><label>Slug (optional) <input type="text" name="custom_slug"></label></p>
            <p><label>index.html <input type="file" name="html_file" accept=".html,.htm" required></label></p>
            <p><label>CSS files <input type="file" name="css_files" accept=".css" multiple></label></p>
            <p><label>Images <input type="file" name="img_files" accept="image/*" multiple></label></p>
            <button type="submit">Upload</button>
        </form>"#,
            admin_nav()
        ),
    )
}

pub fn upload_success(slug: &Slug) -> String {
    let text = html_escape(slug.as_str());
    let url = url_segment(slug.as_str());
    layout(
        "Uploaded",
        &format!(
            r#"{}
        <h1>Published</h1>
        <p>Your page is live at <a href="/p/{url}">/p/{text}</a>.</p>
        <p><a href="/admin/edit/{url}">Edit it</a></p>"#,
            admin_nav()
        ),
    )
}

fn asset_rows(slug_url: &str, kind: AssetKind, files: &[String]) -> String {
    if files.is_empty() {
        return "<li>None</li>".to_string();
    }
    files
        .iter()
        .map(|name| {
            let name = html_escape(name);
            format!(
                r#"<li>{name}
                <form class="inline" method="post" action="/admin/delete_asset/{slug_url}">
                    <input type="hidden" name="file_type" value="{kind}">
                    <input type="hidden" name="filename" value="{name}">
                    <button type="submit">Delete</button>
                </form></li>"#
            )
        })
        .collect()
}

pub fn edit_page(site: &Site) -> String {
    let text = html_escape(site.slug.as_str());
    let url = url_segment(site.slug.as_str());
    let updated = site
        .updated
        .map(|t| format!("<p>Last updated {}</p>", t.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();

    layout(
        &format!("Edit {}", site.slug),
        &format!(
            r#"{nav}
        <h1>Edit <a href="/p/{url}">{text}</a></h1>
        {updated}
        <form method="post" action="/admin/edit/{url}">
            <textarea name="html_content">{content}</textarea>
            <button type="submit">Save</button>
        </form>

        <h2>CSS</h2>
        <ul>{css}</ul>
        <h2>Images</h2>
        <ul>{imgs}</ul>

        <h2>Add assets</h2>
        <form method="post" action="/admin/upload_assets/{url}" enctype="multipart/form-data">
            <p><label>CSS files <input type="file" name="css_files" accept=".css" multiple></label></p>
            <p><label>Images <input type="file" name="img_files" accept="image/*" multiple></label></p>
            <button type="submit">Upload</button>
        </form>"#,
            nav = admin_nav(),
            content = html_escape(&site.index_content),
            css = asset_rows(&url, AssetKind::Css, &site.css_assets),
            imgs = asset_rows(&url, AssetKind::Img, &site.img_assets),
        ),
    )
}
