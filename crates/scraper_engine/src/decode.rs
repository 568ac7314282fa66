use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use engine_logging::engine_warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub text: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown encoding label {0:?}")]
    UnknownEncoding(String),
}

/// Decode raw bytes into UTF-8 using: explicit override -> BOM -> Content-Type charset -> chardetng fallback.
///
/// Malformed sequences are replaced, not fatal.
pub fn decode_page(
    bytes: &[u8],
    content_type: Option<&str>,
    encoding_override: Option<&str>,
) -> Result<DecodedPage, DecodeError> {
    // 1) Script-declared encoding wins
    if let Some(label) = encoding_override.map(str::trim).filter(|l| !l.is_empty()) {
        let enc = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))?;
        return Ok(decode_with(bytes, enc));
    }

    // 2) BOM aware decode using encoding_rs helper
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok(decode_with(bytes, encoding));
    }

    // 3) Content-Type header charset
    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return Ok(decode_with(bytes, enc));
        }
    }

    // 4) chardetng detection over the whole body
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    Ok(decode_with(bytes, enc))
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedPage {
    let (text, used, had_errors) = enc.decode(bytes);
    if had_errors {
        engine_warn!("Replaced malformed {} sequences while decoding page", used.name());
    }
    DecodedPage {
        text: text.into_owned(),
        encoding_label: used.name().to_string(),
    }
}
