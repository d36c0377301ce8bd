use std::borrow::Cow;

use axum::{http::StatusCode, response::{Html, IntoResponse, Response}};
use pulldown_cmark::{html, Event, Parser};
use url::Url;
use validator::{ValidationError, ValidationErrors};

use crate::AppResult;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes markup, plus `{`/`}` so user text can't fill template placeholders.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if s.contains(['&', '<', '>', '"', '\'', '{', '}']) {
        let mut escaped = String::with_capacity(s.len() + 8);
        for c in s.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#x27;"),
                '{' => escaped.push_str("&#123;"),
                '}' => escaped.push_str("&#125;"),
                _ => escaped.push(c),
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(s)
    }
}

/// Markdown to HTML. Raw HTML in the source is shown as text.
pub fn markdown(src: &str) -> String {
    let parser = Parser::new(src).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        _ => event,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    // the generated markup has no braces of its own
    out.replace('{', "&#123;").replace('}', "&#125;")
}

/// Wraps a body in the shared layout.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &html_escape(title))
            .replace("{body}", body),
    )
}

pub fn sorry(what: &str) -> AppResult<Response> {
    Ok((
        StatusCode::NOT_FOUND,
        page(
            "Not found",
            &format!("<h1>Sorry!</h1><p>That {} doesn't exist, or it isn't yours to see.</p><a href=\"/\">go home</a>", html_escape(what)),
        ),
    )
        .into_response())
}

/// A 400 page listing what was wrong with a submitted form.
pub fn invalid(errors: &ValidationErrors) -> Response {
    let mut items = String::new();
    for (field, errs) in errors.field_errors() {
        for err in errs {
            let message = err
                .message
                .as_deref()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{field} is invalid"));
            items += &format!("<li>{}</li>", html_escape(&message));
        }
    }
    rejected(&items)
}

/// A 400 page with a single message.
pub fn refuse(message: &str) -> Response {
    rejected(&format!("<li>{}</li>", html_escape(message)))
}

fn rejected(items: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        page(
            "Please fix the form",
            &format!("<h1>Please fix the form</h1><ul class=\"errors\">{items}</ul><a href=\"javascript:history.back()\">go back</a>"),
        ),
    )
        .into_response()
}

/// Links users paste in are rendered as `href`/`src`, so only web schemes pass.
pub fn http_link(link: &str) -> Result<(), ValidationError> {
    match Url::parse(link.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::new("http_link").with_message("Enter a full link, starting with https://".into())),
    }
}

/// Comma-separated text as chips.
pub fn chips(raw: &str) -> String {
    crate::matching::parse_tags(Some(raw), crate::matching::Delimiter::Comma)
        .display()
        .map(|tag| format!("<span class=\"chip\">{}</span>", html_escape(tag)))
        .collect()
}
