// HTML rendering for the single question page

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use url::Url;

use crate::documents::DocumentStatus;

pub const TITLE: &str = "📘 RAG Legal Assistant";
pub const INTRO: &str =
    "Ajukan pertanyaan terkait <strong>UUD 1945</strong> atau <strong>UU Indonesia</strong> (dokumen di bawah).";
pub const DOCUMENTS_HEADING: &str = "📄 Dokumen yang Dimuat";
pub const QUESTION_LABEL: &str = "Masukkan pertanyaan Anda:";
pub const SUBMIT_LABEL: &str = "Cari Jawaban";
pub const BUSY_TEXT: &str = "🔎 Sedang mencari jawaban...";
pub const ANSWER_HEADING: &str = "Jawaban:";
pub const MISSING_FILE_HINT: &str = "Pastikan semua file PDF ada di folder data/";
pub const BUSY_NOTICE: &str =
    "Pertanyaan sebelumnya masih diproses. Silakan tunggu hingga jawaban muncul.";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
details{margin:1rem 0}ul.docs{list-style:none;padding-left:0}\
form{display:flex;flex-direction:column;gap:.5rem}input[type=text]{padding:.5rem;font-size:1rem}\
button{align-self:flex-start;padding:.5rem 1rem}.error{background:#fdecea;color:#611a15;padding:.75rem;border-radius:4px;margin:.5rem 0}\
.notice{background:#fff4e5;padding:.75rem;border-radius:4px}#busy{margin:1rem 0}";

const SUBMIT_SCRIPT: &str = "document.getElementById('busy').hidden=false;this.querySelector('button').disabled=true;";

/// What the page shows below the question form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing asked yet, or a blank question
    Idle,
    /// Rendered answer HTML
    Answer(String),
    Error {
        message: String,
        hint: Option<&'static str>,
    },
    /// Another question was still being answered
    Busy,
}

#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub documents: &'a [DocumentStatus],
    pub question: &'a str,
    pub outcome: Outcome,
}

/// Render markdown to HTML, showing any raw HTML in it as text.
///
/// Link and image targets other than http(s) URLs are dropped.
#[inline]
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_web_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_web_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

fn is_web_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[inline]
pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    // Writing into a String cannot fail
    let _ = write_page(&mut html, view);
    html
}

fn write_page(out: &mut String, view: &PageView<'_>) -> std::fmt::Result {
    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{TITLE}</h1>\n<p>{INTRO}</p>\n"
    )?;

    writeln!(out, "<details open>\n<summary>{DOCUMENTS_HEADING}</summary>\n<ul class=\"docs\">")?;
    for document in view.documents {
        let mark = if document.present { "✅" } else { "❌" };
        writeln!(
            out,
            "<li>{} <code>{}</code></li>",
            mark,
            encode_text(&document.name)
        )?;
    }
    writeln!(out, "</ul>\n</details>")?;

    writeln!(
        out,
        "<form method=\"post\" action=\"/\" onsubmit=\"{SUBMIT_SCRIPT}\">\n\
         <label for=\"question\">{QUESTION_LABEL}</label>\n\
         <input type=\"text\" id=\"question\" name=\"question\" value=\"{}\" autocomplete=\"off\">\n\
         <button type=\"submit\">{SUBMIT_LABEL}</button>\n</form>\n\
         <div id=\"busy\" hidden>{BUSY_TEXT}</div>",
        encode_double_quoted_attribute(view.question)
    )?;

    match &view.outcome {
        Outcome::Idle => {}
        Outcome::Answer(answer_html) => {
            writeln!(
                out,
                "<section class=\"answer\">\n<h2>{ANSWER_HEADING}</h2>\n{answer_html}</section>"
            )?;
        }
        Outcome::Error { message, hint } => {
            writeln!(out, "<div class=\"error\">Error: {}</div>", encode_text(message))?;
            if let Some(hint) = hint {
                writeln!(out, "<div class=\"error\">{}</div>", encode_text(hint))?;
            }
        }
        Outcome::Busy => {
            writeln!(out, "<div class=\"notice\">{BUSY_NOTICE}</div>")?;
        }
    }

    writeln!(out, "</body>\n</html>")
}
