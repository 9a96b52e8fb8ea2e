// Integration tests for the DEFLATE codec: round trips over realistic
// payloads and the framing properties of the zlib envelope.

use draftcore::compression::{adler32, CodecError, Deflater, Inflater};
use proptest::prelude::*;

const POEM: &str = "Hat der alte Hexenmeister\n\
Sich doch einmal wegbegeben!\n\
Und nun sollen seine Geister\n\
Auch nach meinem Willen leben.\n\
Seine Wort und Werke\n\
Merkt ich und den Brauch,\n\
Und mit Geistesstaerke\n\
Tu ich Wunder auch.\n\
Walle! walle\n\
Manche Strecke,\n\
Dass, zum Zwecke,\n\
Wasser fliesse\n\
Und mit reichem, vollem Schwalle\n\
Zu dem Bade sich ergiesse.\n\
Und nun komm, du alter Besen,\n\
Nimm die schlechten Lumpenhuellen!\n\
Bist schon lange Knecht gewesen:\n\
Nun erfuelle meinen Willen!\n\
Auf zwei Beinen stehe,\n\
Oben sei ein Kopf,\n\
Eile nun und gehe\n\
Mit dem Wassertopf!\n\
Walle! walle\n\
Manche Strecke,\n\
Dass, zum Zwecke,\n\
Wasser fliesse\n\
Und mit reichem, vollem Schwalle\n\
Zu dem Bade sich ergiesse.";

fn compress(data: &[u8]) -> Vec<u8> {
    let mut deflater = Deflater::new();
    deflater.set_input(data);
    deflater.deflate().expect("deflate succeeds")
}

fn decompress(data: &[u8]) -> Vec<u8> {
    let mut inflater = Inflater::new();
    inflater.set_input(data);
    inflater.inflate().expect("inflate succeeds")
}

#[test]
fn poem_round_trips() {
    let data = POEM.as_bytes();
    let compressed = compress(data);
    assert!(compressed.len() < data.len());
    assert_eq!(decompress(&compressed), data);
}

#[test]
fn pdf_content_stream_round_trips() {
    // A ~10 KB text stream in the style of a generated PDF page.
    let mut content = String::new();
    for line in 0..160 {
        let y = 785.0 - 14.2 * f64::from(line);
        content.push_str(&format!(
            "BT /Helvetica 10 Tf 56.6929 {y:.4} Td (Zeile {line} des Teststroms) Tj ET\r\n"
        ));
    }
    let data = content.into_bytes();
    assert!(data.len() > 10_000);

    let compressed = compress(&data);
    assert!(compressed.len() < data.len() / 3);
    assert_eq!(decompress(&compressed), data);
}

#[test]
fn million_zero_bytes_round_trip_under_1500_bytes() {
    let zeros = vec![0u8; 1_000_000];
    let compressed = compress(&zeros);
    assert!(
        compressed.len() < 1_500,
        "compressed form is {} bytes",
        compressed.len()
    );
    let restored = decompress(&compressed);
    assert_eq!(restored.len(), 1_000_000);
    assert!(restored.iter().all(|&b| b == 0));
}

#[test]
fn zlib_envelope_is_well_formed() {
    let compressed = compress(POEM.as_bytes());

    // CMF: deflate method, window size within 32 KiB.
    let cmf = compressed[0];
    assert_eq!(cmf & 0x0F, 8);
    assert!((cmf >> 4) <= 7);
    // FLG: header check passes, no preset dictionary.
    let flg = compressed[1];
    assert_eq!((u16::from(cmf) * 256 + u16::from(flg)) % 31, 0);
    assert_eq!((flg >> 5) & 1, 0);

    // The trailer is the Adler-32 of the payload, big-endian.
    let trailer = &compressed[compressed.len() - 4..];
    assert_eq!(
        u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]),
        adler32(POEM.as_bytes())
    );
}

#[test]
fn raw_and_wrapped_bodies_agree() {
    let data = POEM.as_bytes();
    let mut raw = Deflater::raw();
    raw.set_input(data);
    let raw_body = raw.deflate().unwrap();

    let wrapped = compress(data);
    assert_eq!(&wrapped[2..wrapped.len() - 4], &raw_body[..]);

    let mut inflater = Inflater::raw();
    inflater.set_input(&raw_body);
    assert_eq!(inflater.inflate().unwrap(), data);
}

#[test]
fn wrapped_inflater_rejects_raw_body() {
    let mut raw = Deflater::raw();
    raw.set_input(b"payload");
    let body = raw.deflate().unwrap();

    let mut inflater = Inflater::new();
    inflater.set_input(&body);
    assert!(inflater.inflate().is_err());
}

#[test]
fn truncated_stream_is_an_error_not_a_panic() {
    let compressed = compress(POEM.as_bytes());
    let mut inflater = Inflater::new();
    inflater.set_input(&compressed[..compressed.len() / 2]);
    assert!(matches!(
        inflater.inflate(),
        Err(CodecError::Bits(_)) | Err(CodecError::ChecksumMismatch { .. })
    ));
}

#[test]
fn counters_report_stream_totals() {
    let data = POEM.as_bytes();
    let mut deflater = Deflater::new();
    deflater.set_input(data);
    let compressed = deflater.deflate().unwrap();
    assert_eq!(deflater.total_in(), data.len() as u64);
    assert_eq!(deflater.total_out(), compressed.len() as u64);

    let mut inflater = Inflater::new();
    inflater.set_input(&compressed);
    let restored = inflater.inflate().unwrap();
    assert!(inflater.finished());
    assert!(!inflater.needs_input());
    assert_eq!(inflater.remaining(), 0);
    assert_eq!(inflater.total_in(), compressed.len() as u64);
    assert_eq!(inflater.total_out(), restored.len() as u64);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_bytes_round_trip(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let compressed = compress(&data);
        prop_assert_eq!(decompress(&compressed), data);
    }

    #[test]
    fn repetitive_bytes_round_trip(byte in any::<u8>(), len in 0usize..20_000) {
        let data = vec![byte; len];
        let compressed = compress(&data);
        prop_assert_eq!(decompress(&compressed), data);
    }
}
