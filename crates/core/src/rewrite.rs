//! Asset URL rewriting for served pages.
//!
//! Pages are authored with relative references such as `href="css/site.css"`
//! and `src="imgs/logo.png"`. At serve time those are pointed at the
//! public static prefix of the owning site, so the page works no matter
//! which URL it is mounted under.

use crate::types::AssetKind;

/// Attribute that may reference each asset kind
fn attribute_for(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Css => "href",
        AssetKind::Img => "src",
    }
}

/// Rewrite `href="css/...` and `src="imgs/...` (either quote style) to
/// `{public_prefix}/{slug}/css/...` and `{public_prefix}/{slug}/imgs/...`.
///
/// Plain substring replacement: attribute names and quotes must match
/// exactly, `HREF=` or `href = "` are left alone, and so are bare file
/// names without the `css/`/`imgs/` folder. Applying it twice is not a
/// no-op when the output still holds relative references, so run it once
/// on stored markup only.
pub fn rewrite(html: &str, slug: &str, public_prefix: &str) -> String {
    let prefix = public_prefix.trim_end_matches('/');
    let mut out = html.to_string();

    for kind in AssetKind::ALL {
        let attr = attribute_for(kind);
        let dir = kind.dir_name();
        for quote in ['"', '\''] {
            let needle = format!("{attr}={quote}{dir}/");
            if out.contains(&needle) {
                let replacement = format!("{attr}={quote}{prefix}/{slug}/{dir}/");
                out = out.replace(&needle, &replacement);
            }
        }
    }

    out
}
