use reqwest::blocking::Client;
use reqwest::StatusCode;
use select::document::Document;
use select::predicate::Name;
use thiserror::Error;
use url::Url;

use crate::downloader;

/// The top-level page fetch either fails on the wire or with a non-200 status;
/// both abort the run before any output directory is created.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("server answered {status} ({reason}) for {url}")]
    Status { url: Url, status: u16, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Js,
    Img,
    Font,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Css,
        AssetKind::Js,
        AssetKind::Img,
        AssetKind::Font,
    ];

    /// Subdirectory of the output root this kind is saved under.
    pub fn subdir(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Img => "imgs",
            AssetKind::Font => "fonts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Css => "CSS",
            AssetKind::Js => "JS",
            AssetKind::Img => "IMG",
            AssetKind::Font => "FONT",
        }
    }

    /// The URL-bearing attribute on the owning element.
    pub fn attr(self) -> &'static str {
        match self {
            AssetKind::Css | AssetKind::Font => "href",
            AssetKind::Js | AssetKind::Img => "src",
        }
    }
}

/// One URL-bearing reference discovered in the document, holding the attribute
/// value exactly as it appeared in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub original: String,
}

/// Counts gathered during the rewrite pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    pub css: usize,
    pub js: usize,
    pub images: usize,
    pub fonts: usize,
    pub failed: usize,
}

impl MirrorReport {
    pub fn record(&mut self, kind: AssetKind) {
        match kind {
            AssetKind::Css => self.css += 1,
            AssetKind::Js => self.js += 1,
            AssetKind::Img => self.images += 1,
            AssetKind::Font => self.fonts += 1,
        }
    }

    pub fn count_for(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Css => self.css,
            AssetKind::Js => self.js,
            AssetKind::Img => self.images,
            AssetKind::Font => self.fonts,
        }
    }

    pub fn total(&self) -> usize {
        self.css + self.js + self.images + self.fonts
    }
}

const FONT_EXTENSIONS: [&str; 4] = ["woff", "woff2", "ttf", "otf"];

/// A stylesheet link whose query-stripped path ends in a font extension is
/// treated as a font and saved under `fonts/` instead of `css/`.
fn is_font_reference(reference: &str) -> bool {
    let path = reference
        .split(&['?', '#'][..])
        .next()
        .unwrap_or(reference)
        .to_ascii_lowercase();
    FONT_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

/// Local relative reference an asset is rewritten to: `<subdir>/<basename>`.
/// A URL whose path has no final segment still rewrites, to `"<subdir>/"`,
/// matching the download failure that reference will also produce.
pub fn local_reference(kind: AssetKind, url: &Url) -> String {
    let name = downloader::remote_file_name(url).unwrap_or_default();
    format!("{}/{}", kind.subdir(), name)
}

/// The fetched page: its final URL plus the (mutable) HTML source that gets
/// rewritten in place and serialized to `index.html`.
pub struct PageDocument {
    base_url: Url,
    html: String,
}

impl PageDocument {
    pub fn fetch(client: &Client, url: &Url) -> Result<Self, FetchError> {
        let response = client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown reason")
                    .to_string(),
            });
        }

        let html = response.text().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        Ok(Self {
            base_url: url.clone(),
            html,
        })
    }

    pub fn from_html(base_url: Url, html: impl Into<String>) -> Self {
        Self {
            base_url,
            html: html.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Single traversal collecting every `<link rel=stylesheet>`,
    /// `<script src>`, and `<img src>` reference. Attribute presence is the
    /// sole selection criterion; nothing is sniffed from content types.
    pub fn asset_refs(&self) -> Vec<AssetRef> {
        let document = Document::from(self.html.as_str());
        let mut refs = Vec::new();

        for link in document.find(Name("link")) {
            let (Some(rel), Some(href)) = (link.attr("rel"), link.attr("href")) else {
                continue;
            };
            if !rel.contains("stylesheet") {
                continue;
            }
            let kind = if is_font_reference(href) {
                AssetKind::Font
            } else {
                AssetKind::Css
            };
            refs.push(AssetRef {
                kind,
                original: href.to_string(),
            });
        }

        for script in document.find(Name("script")) {
            if let Some(src) = script.attr("src") {
                refs.push(AssetRef {
                    kind: AssetKind::Js,
                    original: src.to_string(),
                });
            }
        }

        for img in document.find(Name("img")) {
            if let Some(src) = img.attr("src") {
                refs.push(AssetRef {
                    kind: AssetKind::Img,
                    original: src.to_string(),
                });
            }
        }

        refs
    }

    /// Resolves a reference against the page URL. Protocol-relative references
    /// take the page's scheme; everything else goes through a standard join.
    pub fn resolve(&self, reference: &str) -> Result<Url, url::ParseError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Url::parse(reference)
        } else if reference.starts_with("//") {
            Url::parse(&format!("{}:{}", self.base_url.scheme(), reference))
        } else {
            self.base_url.join(reference)
        }
    }

    /// Rewrites the attribute value in the HTML source. The parser hands back
    /// decoded values, so the needle is built in every source form the markup
    /// can carry it in: both quote styles, the unquoted form, and with `&`
    /// entity-encoded as `&amp;`. Every occurrence of the same attribute/value
    /// pair is rewritten, which keeps duplicate references consistent.
    pub fn rewrite_attr(&mut self, attr: &str, original: &str, local: &str) {
        let mut source_forms = vec![original.to_string()];
        if original.contains('&') {
            source_forms.push(original.replace('&', "&amp;"));
        }

        for form in &source_forms {
            for quote in ['"', '\''] {
                let needle = format!("{attr}={quote}{form}{quote}");
                let replacement = format!("{attr}={quote}{local}{quote}");
                self.html = self.html.replace(&needle, &replacement);
            }
            // An unquoted value ends at whitespace, tag close, or self-close.
            for terminator in ['>', '/', ' ', '\t', '\r', '\n'] {
                let needle = format!("{attr}={form}{terminator}");
                let replacement = format!("{attr}={local}{terminator}");
                self.html = self.html.replace(&needle, &replacement);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> PageDocument {
        PageDocument::from_html(Url::parse("https://example.com/subdir/").unwrap(), html)
    }

    #[test]
    fn extracts_assets_by_attribute_presence() {
        let doc = page(
            r#"<html><head>
                <link rel="stylesheet" href="/style.css">
                <link rel="icon" href="/favicon.ico">
                <script src="/app.js"></script>
                <script>inline();</script>
            </head><body>
                <img src="/logo.png" alt="logo">
                <img alt="no src">
            </body></html>"#,
        );

        let refs = doc.asset_refs();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].kind, AssetKind::Css);
        assert_eq!(refs[0].original, "/style.css");
        assert_eq!(refs[1].kind, AssetKind::Js);
        assert_eq!(refs[2].kind, AssetKind::Img);
    }

    #[test]
    fn stylesheet_links_with_font_extensions_are_fonts() {
        let doc = page(
            r#"<link rel="stylesheet" href="/fonts/icons.woff2?v=9">
               <link rel="stylesheet" href="/main.css">"#,
        );

        let refs = doc.asset_refs();
        assert_eq!(refs[0].kind, AssetKind::Font);
        assert_eq!(refs[1].kind, AssetKind::Css);
    }

    #[test]
    fn resolves_relative_absolute_and_protocol_relative() {
        let doc = page("");
        let cases = [
            ("../style.css", "https://example.com/style.css"),
            ("./script.js", "https://example.com/subdir/script.js"),
            ("imgs/photo.jpg", "https://example.com/subdir/imgs/photo.jpg"),
            ("/root.css", "https://example.com/root.css"),
            ("https://cdn.example.com/style.css", "https://cdn.example.com/style.css"),
            ("//cdn.example.com/script.js", "https://cdn.example.com/script.js"),
        ];

        for (input, expected) in cases {
            assert_eq!(doc.resolve(input).unwrap().as_str(), expected, "for {input}");
        }
    }

    #[test]
    fn local_reference_strips_query() {
        let url = Url::parse("https://example.com/assets/a.png?x=1&y=2").unwrap();
        assert_eq!(local_reference(AssetKind::Img, &url), "imgs/a.png");
    }

    #[test]
    fn local_reference_for_trailing_slash_path() {
        let url = Url::parse("https://example.com/assets/").unwrap();
        assert_eq!(local_reference(AssetKind::Css, &url), "css/");
    }

    #[test]
    fn rewrites_both_quote_styles() {
        let mut doc = page(
            r#"<link rel="stylesheet" href="/style.css"><img src='/logo.png'>"#,
        );
        doc.rewrite_attr("href", "/style.css", "css/style.css");
        doc.rewrite_attr("src", "/logo.png", "imgs/logo.png");

        assert!(doc.html().contains(r#"href="css/style.css""#));
        assert!(doc.html().contains("src='imgs/logo.png'"));
        assert!(!doc.html().contains(r#"href="/style.css""#));
        assert!(!doc.html().contains("src='/logo.png'"));
    }

    #[test]
    fn rewrites_entity_encoded_query_separators() {
        let mut doc = page(r#"<html><head><script src="/a.js?x=1&amp;y=2"></script></head></html>"#);

        // Discovery hands back the decoded value; the rewrite must still land
        // on the encoded source form.
        let refs = doc.asset_refs();
        assert_eq!(refs[0].original, "/a.js?x=1&y=2");

        doc.rewrite_attr(refs[0].kind.attr(), &refs[0].original, "js/a.js");
        assert!(doc.html().contains(r#"src="js/a.js""#), "html: {}", doc.html());
        assert!(!doc.html().contains("&amp;"));
    }

    #[test]
    fn rewrites_unquoted_attributes() {
        let mut doc = page("<html><body><img src=/logo.png alt=x><img src=/logo.png></body></html>");

        let refs = doc.asset_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].original, "/logo.png");

        doc.rewrite_attr("src", "/logo.png", "imgs/logo.png");
        assert!(doc.html().contains("src=imgs/logo.png alt=x"), "html: {}", doc.html());
        assert!(doc.html().contains("src=imgs/logo.png>"));
        assert!(!doc.html().contains("src=/logo.png"));
    }

    #[test]
    fn report_records_per_kind() {
        let mut report = MirrorReport::default();
        report.record(AssetKind::Css);
        report.record(AssetKind::Css);
        report.record(AssetKind::Js);
        report.record(AssetKind::Img);
        report.record(AssetKind::Font);

        assert_eq!(report.css, 2);
        assert_eq!(report.js, 1);
        assert_eq!(report.images, 1);
        assert_eq!(report.fonts, 1);
        assert_eq!(report.total(), 5);
        assert_eq!(report.count_for(AssetKind::Css), 2);
    }
}
