use std::sync::LazyLock;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;

use crate::error::DecodeError;

/// RFC 2047 encoded-word: `=?charset?encoding?text?=`.
static ENCODED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").unwrap());

static FOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n[ \t]*").unwrap());

// Mailers are sloppy with base64 padding in headers.
const LENIENT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const MARKER_CHAR: char = '%';
pub const MAX_MARKER_LEN: usize = 100;

/// Decode a raw header value into a display string.
///
/// Encoded-words are decoded, whitespace between two encoded-words is
/// dropped and folded lines are joined. Anything else passes through.
/// Encoded-words written back to back (`=?..?==?..?=`) are first split
/// apart with a separator made of `%` repeated until it no longer occurs
/// in the input; the separator is removed again after decoding.
pub fn decode_header(raw: &str) -> Result<String, DecodeError> {
    let unfolded = unfold(raw);
    if !ENCODED_WORD.is_match(&unfolded) {
        return Ok(unfolded);
    }

    let marker = pick_marker(&unfolded)?;
    let separator = format!(" {marker} ");
    let separated = separate_adjacent_words(&unfolded, &separator);

    let mut out = String::with_capacity(separated.len());
    let mut last = 0;
    let mut after_word = false;
    for caps in ENCODED_WORD.captures_iter(&separated) {
        let Some(word) = caps.get(0) else { continue };
        let gap = &separated[last..word.start()];
        if !(after_word && gap.trim().is_empty()) {
            out.push_str(&gap.replace(&separator, ""));
        }
        out.push_str(&decode_word(word.as_str(), &caps[1], &caps[2], &caps[3]));
        after_word = true;
        last = word.end();
    }
    out.push_str(&separated[last..].replace(&separator, ""));

    Ok(out)
}

/// Join folded header lines and trim the result.
pub(crate) fn unfold(raw: &str) -> String {
    FOLD.replace_all(raw, " ").trim().to_string()
}

/// Shortest run of `%` that does not occur in `s`.
pub(crate) fn pick_marker(s: &str) -> Result<String, DecodeError> {
    (1..=MAX_MARKER_LEN)
        .map(|len| MARKER_CHAR.to_string().repeat(len))
        .find(|marker| !s.contains(marker.as_str()))
        .ok_or(DecodeError::MarkerExhausted {
            attempts: MAX_MARKER_LEN,
        })
}

fn separate_adjacent_words(s: &str, separator: &str) -> String {
    let mut out = String::with_capacity(s.len() + separator.len());
    let mut last = 0;
    for word in ENCODED_WORD.find_iter(s) {
        out.push_str(&s[last..word.end()]);
        last = word.end();
        if s[last..].chars().next().is_some_and(|c| !c.is_whitespace()) {
            out.push_str(separator);
        }
    }
    out.push_str(&s[last..]);
    out
}

fn decode_word(token: &str, charset: &str, encoding: &str, text: &str) -> String {
    // RFC 2231 allows `charset*language`
    let charset = charset.split_once('*').map_or(charset, |(c, _)| c);

    let bytes = if encoding.eq_ignore_ascii_case("b") {
        match LENIENT_B64.decode(text) {
            Ok(b) => b,
            Err(_) => return token.to_string(),
        }
    } else {
        decode_q(text)
    };

    let is_utf8 = ["utf-8", "utf8", "us-ascii"]
        .iter()
        .any(|c| charset.eq_ignore_ascii_case(c));
    if !is_utf8 {
        // mailparse knows the legacy charsets; it leaves the token alone
        // when it does not recognise the label.
        let line = format!("X: {token}");
        if let Ok((header, _)) = mailparse::parse_header(line.as_bytes()) {
            let value = header.get_value();
            if value != token {
                return value;
            }
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// The "Q" encoding: quoted-printable with `_` standing for a space.
fn decode_q(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
                i += 3;
                continue;
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit.to_ascii_uppercase() - b'A' + 10,
    }
}
