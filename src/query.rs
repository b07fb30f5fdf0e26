//! One-shot searches for `devldap query`, rendered as LDIF-like text.

use anyhow::Context as _;
use devldap_core::{
    Config, Context, Directory, Filter, Message, Request, Response, Router, SearchRequest,
    Session,
};
use std::fmt::Write as _;
use tokio_util::sync::CancellationToken;

/// Run one search through the standard router and return its responses.
pub fn search(
    directory: &Directory,
    base: &str,
    filter: &str,
    attributes: &[String],
) -> anyhow::Result<Vec<Response>> {
    let filter = Filter::parse(filter).with_context(|| format!("invalid filter {filter:?}"))?;
    let message = Message::new(
        1,
        Request::Search(SearchRequest::new(base, filter).attributes(attributes.iter().cloned())),
    );

    let router = Router::standard(&Config::defaults());
    let session = Session::detached();
    let cancel = CancellationToken::new();
    let ctx = Context {
        id: message.id,
        controls: &message.controls,
        directory,
        session: &session,
        cancel: &cancel,
    };
    let mut out = Vec::new();
    router.dispatch(&ctx, &message.request, &mut out);
    Ok(out)
}

/// Render responses as LDIF-like text: one block per entry, then the result.
///
/// Values that are not valid UTF-8 are written as `name:: {hex}<hex>`.
pub fn render(responses: &[Response]) -> String {
    let mut out = String::new();
    for response in responses {
        match response {
            Response::SearchEntry(entry) => {
                let _ = writeln!(out, "dn: {}", entry.dn);
                for attr in &entry.attributes {
                    for value in &attr.values {
                        match std::str::from_utf8(value) {
                            Ok(text) => {
                                let _ = writeln!(out, "{}: {text}", attr.name);
                            }
                            Err(_) => {
                                let _ = writeln!(out, "{}:: {{hex}}{}", attr.name, hex::encode(value));
                            }
                        }
                    }
                }
                out.push('\n');
            }
            other => {
                if let Some(result) = other.result() {
                    let _ = write!(out, "# result: {}", result.code);
                    if !result.message.is_empty() {
                        let _ = write!(out, " ({})", result.message);
                    }
                    out.push('\n');
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
