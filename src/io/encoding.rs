//! Charset detection and decoding for uploads of unknown encoding.
//!
//! Detection never fails: when the statistical guess is weak or falls on an
//! encoding known to misfire on tabular exports, we decode as windows-1252,
//! which maps every byte to a character.

use chardetng::EncodingDetector;
use encoding_rs::{EUC_KR, Encoding, UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

/// Encoding used whenever detection is inconclusive.
///
/// This is what the `ISO-8859-1` / `latin1` labels resolve to in the WHATWG
/// Encoding Standard.
pub fn fallback_encoding() -> &'static Encoding {
    WINDOWS_1252
}

/// Multi-byte legacy encodings the detector proposes too eagerly for
/// Western-language CSV exports (the Korean family that Johab belongs to).
fn is_unreliable(encoding: &'static Encoding) -> bool {
    encoding == EUC_KR
}

/// Outcome of charset detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    /// Whether the detector (or a BOM) was confident about the guess.
    pub confident: bool,
    /// True when the guess was replaced by [`fallback_encoding`].
    pub fallback: bool,
}

impl DetectedEncoding {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Infer the text encoding of `bytes`.
pub fn detect_encoding(bytes: &[u8]) -> DetectedEncoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        debug!(encoding = encoding.name(), "byte order mark found");
        return DetectedEncoding {
            encoding,
            confident: true,
            fallback: false,
        };
    }

    // Well-formed UTF-8 (which includes pure ASCII) is taken at face value.
    if std::str::from_utf8(bytes).is_ok() {
        return DetectedEncoding {
            encoding: UTF_8,
            confident: true,
            fallback: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, confident) = detector.guess_assess(None, true);

    let unreliable = is_unreliable(guess);
    if !confident || unreliable {
        debug!(
            guess = guess.name(),
            confident,
            unreliable,
            "falling back to {}",
            fallback_encoding().name()
        );
        return DetectedEncoding {
            encoding: fallback_encoding(),
            confident,
            fallback: guess != fallback_encoding(),
        };
    }

    debug!(encoding = guess.name(), "detected encoding");
    DetectedEncoding {
        encoding: guess,
        confident,
        fallback: false,
    }
}

/// Decode `bytes` with the detected encoding.
///
/// A leading BOM overrides `detected` and is stripped. Malformed sequences are
/// replaced with U+FFFD rather than rejected.
pub fn decode(bytes: &[u8], detected: &DetectedEncoding) -> String {
    let (text, used, had_errors) = detected.encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = used.name(),
            "upload contains byte sequences invalid for its encoding; replaced with U+FFFD"
        );
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_16LE;

    #[test]
    fn plain_ascii_decodes_unchanged() {
        let bytes = b"ORDERDATE,SALES\n2023-01-05,100\n";
        let detected = detect_encoding(bytes);
        assert_eq!(decode(bytes, &detected), "ORDERDATE,SALES\n2023-01-05,100\n");
    }

    #[test]
    fn utf8_bom_is_trusted_and_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("ORDERDATE,SALES\n".as_bytes());
        let detected = detect_encoding(&bytes);
        assert_eq!(detected.encoding, UTF_8);
        assert!(detected.confident);
        assert_eq!(decode(&bytes, &detected), "ORDERDATE,SALES\n");
    }

    #[test]
    fn utf16_bom_is_honoured() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "SALES".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let detected = detect_encoding(&bytes);
        assert_eq!(detected.encoding, UTF_16LE);
        assert_eq!(decode(&bytes, &detected), "SALES");
    }

    #[test]
    fn utf8_text_round_trips() {
        let text = "CUSTOMER,ORDERDATE,SALES\nSociété Générale,2023-01-05,100\nMüller GmbH,2023-02-01,50\n";
        let detected = detect_encoding(text.as_bytes());
        assert_eq!(decode(text.as_bytes(), &detected), text);
    }

    #[test]
    fn latin1_bytes_decode_without_error() {
        // "Café" in ISO-8859-1.
        let bytes = b"NAME,ORDERDATE,SALES\nCaf\xE9,2023-01-05,100\n";
        let detected = detect_encoding(bytes);
        let text = decode(bytes, &detected);
        assert!(text.starts_with("NAME,ORDERDATE,SALES"));
        assert!(text.contains("2023-01-05,100"));
    }

    #[test]
    fn arbitrary_bytes_never_fail() {
        let bytes: Vec<u8> = (0u8..=255).cycle().take(2048).collect();
        let detected = detect_encoding(&bytes);
        let text = decode(&bytes, &detected);
        assert!(!text.is_empty());
    }

    #[test]
    fn empty_input_has_an_encoding() {
        let detected = detect_encoding(&[]);
        assert_eq!(decode(&[], &detected), "");
    }

    #[test]
    fn korean_legacy_guess_is_replaced_by_fallback() {
        let mut text = String::from("ORDERDATE,SALES,CUSTOMERNAME\n");
        for i in 0..30 {
            let day = i % 28 + 1;
            let amount = 100 + i;
            text.push_str(&format!(
                "2023-01-{day:02},{amount},서울특별시 강남구 테헤란로 주식회사 한국상사\n"
            ));
        }
        let (bytes, _, had_errors) = EUC_KR.encode(&text);
        assert!(!had_errors);

        let detected = detect_encoding(&bytes);
        assert_eq!(detected.encoding, WINDOWS_1252);
        assert!(detected.fallback);

        let decoded = decode(&bytes, &detected);
        assert!(decoded.starts_with("ORDERDATE,SALES,CUSTOMERNAME\n2023-01-01,100,"));
    }

    #[test]
    fn fallback_encoding_is_single_byte_total() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let (_, _, had_errors) = fallback_encoding().decode(&bytes);
        assert!(!had_errors);
    }
}
