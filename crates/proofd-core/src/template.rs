//! Message templates: `{placeholder}` substitution followed by inline markup
//! (`*bold*`, `_italic_`, `~underline~`).

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Bold,
    Italic,
    Underline,
}

impl SpanStyle {
    fn from_marker(c: char) -> Option<Self> {
        match c {
            '*' => Some(SpanStyle::Bold),
            '_' => Some(SpanStyle::Italic),
            '~' => Some(SpanStyle::Underline),
            _ => None,
        }
    }

    fn html_tag(self) -> Option<&'static str> {
        match self {
            SpanStyle::Plain => None,
            SpanStyle::Bold => Some("strong"),
            SpanStyle::Italic => Some("em"),
            SpanStyle::Underline => Some("u"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub style: SpanStyle,
    pub text: &'a str,
}

impl<'a> Span<'a> {
    pub fn plain(text: &'a str) -> Self {
        Self { style: SpanStyle::Plain, text }
    }
}

/// Values for the four supported placeholders. `price` is already formatted.
#[derive(Debug, Clone, Default)]
pub struct Substitutions<'a> {
    pub customer: &'a str,
    pub location: &'a str,
    pub product: &'a str,
    pub price: &'a str,
}

impl<'a> Substitutions<'a> {
    fn pairs(&self) -> [(&'static str, &'a str); 4] {
        [
            ("{customer}", self.customer),
            ("{location}", self.location),
            ("{product}", self.product),
            ("{price}", self.price),
        ]
    }
}

/// A template after substitution. Spans are produced on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    text: String,
}

impl Markup {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Substituted source text, markers included.
    pub fn source(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> Spans<'_> {
        Spans { rest: &self.text }
    }

    /// Text with all recognised markers removed.
    pub fn plain_text(&self) -> String {
        self.spans().map(|s| s.text).collect()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for span in self.spans() {
            match span.style.html_tag() {
                Some(tag) => {
                    let _ = write!(out, "<{tag}>{}</{tag}>", escape_html(span.text));
                }
                None => out.push_str(&escape_html(span.text)),
            }
        }
        out
    }
}

/// Substitute placeholders. Only the first occurrence of each placeholder is
/// replaced; placeholders missing from the template are skipped.
pub fn render_template(template: &str, subs: &Substitutions<'_>) -> Markup {
    let mut text = template.to_string();
    for (token, value) in subs.pairs() {
        if let Some(at) = text.find(token) {
            text.replace_range(at..at + token.len(), value);
        }
    }
    Markup { text }
}

/// Single left-to-right scan over marked-up text. A marker opens a span only
/// when the same marker closes it later on the same line; otherwise it is
/// literal. `Markup::spans` starts a fresh scan each call.
#[derive(Debug, Clone)]
pub struct Spans<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Spans<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Span<'a>> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let mut open = None;
            for (i, c) in self.rest.char_indices() {
                let Some(style) = SpanStyle::from_marker(c) else {
                    continue;
                };
                let body_start = i + c.len_utf8();
                let line_end = self.rest[body_start..]
                    .find('\n')
                    .map_or(self.rest.len(), |n| body_start + n);
                if let Some(len) = self.rest[body_start..line_end].find(c) {
                    open = Some((i, style, body_start, body_start + len));
                    break;
                }
            }

            let Some((start, style, body_start, body_end)) = open else {
                let text = std::mem::take(&mut self.rest);
                return Some(Span::plain(text));
            };

            if start > 0 {
                let text = &self.rest[..start];
                self.rest = &self.rest[start..];
                return Some(Span::plain(text));
            }

            let text = &self.rest[body_start..body_end];
            // body_end points at the closing marker, which is one byte wide
            self.rest = &self.rest[body_end + 1..];
            if !text.is_empty() {
                return Some(Span { style, text });
            }
        }
    }
}

impl std::iter::FusedIterator for Spans<'_> {}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
