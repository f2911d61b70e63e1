//! Slug normalization for folder and file names
//!
//! Slugs are lowercase ASCII, hyphen-delimited, without leading or trailing
//! hyphens. Latin diacritics are folded through NFKD decomposition; letters
//! that do not decompose (`ß`, `ø`, `ł`, ...) go through a small
//! transliteration table. Alphanumerics from other scripts are kept
//! distinguishable as `u<hex>` tokens instead of vanishing.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::transform::BLOCK_REF;

/// Slug used when the input contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "untitled";

/// Extension of every published document, regardless of source extension.
pub const DOCUMENT_EXTENSION: &str = "md";

fn transliterate(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ø' | 'Ø' => "o",
        'ł' | 'Ł' => "l",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        'ħ' | 'Ħ' => "h",
        'ı' => "i",
        _ => return None,
    };
    Some(folded)
}

fn push_token(slug: &mut String, token: &str, pending_separator: &mut bool) {
    if *pending_separator && !slug.is_empty() {
        slug.push('-');
    }
    *pending_separator = false;
    slug.push_str(token);
}

/// Convert an arbitrary name into a URL-safe slug.
///
/// Total and deterministic: every input maps to a non-empty slug.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.nfkd() {
        if is_combining_mark(c) || c == '\'' || c == '\u{2019}' {
            continue;
        }

        if c.is_ascii_alphanumeric() {
            let mut buf = [0u8; 4];
            let lower = c.to_ascii_lowercase().encode_utf8(&mut buf);
            push_token(&mut slug, lower, &mut pending_separator);
        } else if let Some(folded) = transliterate(c) {
            push_token(&mut slug, folded, &mut pending_separator);
        } else if c.is_alphanumeric() {
            // Other scripts: one token per character
            pending_separator = true;
            push_token(&mut slug, &format!("u{:x}", c as u32), &mut pending_separator);
            pending_separator = true;
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Convert a source file name into a published file name.
///
/// The extension is dropped, block-reference tags are stripped from the
/// stem, and the fixed document extension is appended.
pub fn slugify_file_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };
    let stem = BLOCK_REF.replace_all(stem, "");
    format!("{}.{}", slugify(&stem), DOCUMENT_EXTENSION)
}

/// Slugify every segment of a folder path independently.
pub fn slugify_segments<'a, I>(segments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    segments.into_iter().map(slugify).collect()
}
