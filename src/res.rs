use axum::response::Html;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};

const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes user text for HTML body and attribute positions.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    pulldown_cmark::html::push_html(&mut out, std::iter::once(Event::Text(text.into())));
    out.replace('"', "&quot;").replace('\'', "&#39;")
}

/// Relative URLs and http(s)/mailto pass; any other scheme becomes `#`.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = match url.find([':', '/', '?', '#']) {
        Some(end) if url[end..].starts_with(':') => url[..end].to_ascii_lowercase(),
        _ => return url,
    };

    if LINK_SCHEMES.contains(&scheme.as_str()) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Renders Markdown with raw HTML demoted to plain text and unsafe link targets dropped.
pub fn markdown(src: &str) -> String {
    let parser = Parser::new_ext(src, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}

pub fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!(r#"<p class="error">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

pub fn sorry(what: &str) -> Html<String> {
    Html(include_res!(str, "/pages/sorry.html").replace("{what}", &escape(what)))
}
