use ido::{Codec, Decoder, Encoder, Error, Extension, Options, Result};
use std::io::{self, Read, Write};

ido::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }
}

/// Hands out at most `chunk` bytes per read and fails every third call with
/// `Interrupted`.
struct Trickle<'a> {
    data: &'a [u8],
    chunk: usize,
    calls: usize,
}

impl<'a> Trickle<'a> {
    fn new(data: &'a [u8], chunk: usize) -> Self {
        Trickle {
            data,
            chunk,
            calls: 0,
        }
    }
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls += 1;
        if self.calls % 3 == 0 {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "try again"));
        }
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
    }
}

fn points() -> Vec<Point> {
    vec![
        Point {
            x: 1,
            y: -2,
            label: "a,b".to_string(),
        },
        Point::default(),
        Point {
            x: 300,
            y: 0,
            label: "line\nbreak {x}".to_string(),
        },
    ]
}

#[test]
fn test_encoder_writes_one_record_per_line() {
    let mut encoder = Encoder::new(Vec::new());
    for point in points() {
        encoder.encode(&point).unwrap();
    }
    encoder.flush().unwrap();
    let out = String::from_utf8(encoder.into_inner()).unwrap();
    assert_eq!(
        out,
        "{1,-2,\"a,b\"}\n{,,}\n{300,,\"line\nbreak {x}\"}\n"
    );
}

#[test]
fn test_chunked_reads_with_interruptions() {
    let mut encoder = Encoder::new(Vec::new());
    for point in points() {
        encoder.encode(&point).unwrap();
    }
    let bytes = encoder.into_inner();

    for chunk in 1..=3 {
        let codec = Codec::with_options(Options::new().with_read_capacity(4));
        let mut decoder = codec.decoder(Trickle::new(&bytes, chunk));
        let decoded: Vec<Point> = decoder.iter::<Point>().collect::<Result<_>>().unwrap();
        assert_eq!(decoded, points(), "chunk size {chunk}");
    }
}

#[test]
fn test_truncated_record() {
    let mut decoder = Decoder::new(&b"{1,2"[..]);
    let err = decoder.decode::<Point>().unwrap_err();
    assert!(err.is_truncated());
    assert!(matches!(err, Error::Truncated { buffered: 4 }));

    let mut decoder = Decoder::new(&b"{1,2,\"x\"}\n[3,"[..]);
    assert!(decoder.decode::<Point>().unwrap().is_some());
    assert!(decoder.decode::<Vec<u8>>().unwrap_err().is_truncated());
}

#[test]
fn test_unbalanced_record_is_malformed_and_stream_continues() {
    let mut decoder = Decoder::new(&b"{1]}\n{2}\n{3}\n"[..]);
    let err = decoder.decode::<Point>().unwrap_err();
    assert!(err.is_malformed());
    assert!(!err.is_truncated());
    assert_eq!(decoder.decode::<Point>().unwrap().map(|p| p.x), Some(2));
    assert_eq!(decoder.decode::<Point>().unwrap().map(|p| p.x), Some(3));
    assert_eq!(decoder.decode::<Point>().unwrap(), None);
}

#[test]
fn test_unbalanced_last_record_is_malformed() {
    let codec = Codec::with_options(Options::new().with_read_capacity(2));
    let mut decoder = codec.decoder(&b"{4}\n[1}]"[..]);
    assert_eq!(decoder.decode::<Point>().unwrap().map(|p| p.x), Some(4));
    assert!(decoder.decode::<Vec<u8>>().unwrap_err().is_malformed());
    assert_eq!(decoder.decode::<Vec<u8>>().unwrap(), None);
}

#[test]
fn test_empty_encodings_vanish_from_streams() {
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode(&true).unwrap();
    encoder.encode(&false).unwrap();
    encoder.encode(&true).unwrap();
    let bytes = encoder.into_inner();
    assert_eq!(bytes, b"+\n\n+\n");

    let mut decoder = Decoder::new(&bytes[..]);
    let flags: Vec<bool> = decoder.iter::<bool>().collect::<Result<_>>().unwrap();
    assert_eq!(flags, vec![true, true]);
}

#[test]
fn test_clean_end_of_input() {
    let mut decoder = Decoder::new(&b"{1}\n"[..]);
    assert_eq!(decoder.decode::<Point>().unwrap().map(|p| p.x), Some(1));
    assert_eq!(decoder.decode::<Point>().unwrap(), None);

    let mut decoder = Decoder::new(&b""[..]);
    assert_eq!(decoder.decode::<Point>().unwrap(), None);

    let mut decoder = Decoder::new(&b"{1}\n  \n\t"[..]);
    assert!(decoder.decode::<Point>().unwrap().is_some());
    assert_eq!(decoder.decode::<Point>().unwrap(), None);
}

#[test]
fn test_last_record_without_separator() {
    let mut decoder = Decoder::new(&b"{5,6}"[..]);
    let point = decoder.decode::<Point>().unwrap().unwrap();
    assert_eq!((point.x, point.y), (5, 6));
    assert_eq!(decoder.decode::<Point>().unwrap(), None);
}

#[test]
fn test_bare_scalars() {
    let mut decoder = Decoder::new(&b"1\n22\n333"[..]);
    let numbers: Vec<u32> = decoder.iter::<u32>().collect::<Result<_>>().unwrap();
    assert_eq!(numbers, vec![1, 22, 333]);

    let mut decoder = Decoder::new(&b"\"two\nlines\"\nplain\n"[..]);
    assert_eq!(
        decoder.decode::<String>().unwrap().as_deref(),
        Some("two\nlines")
    );
    assert_eq!(decoder.decode::<String>().unwrap().as_deref(), Some("plain"));
    assert_eq!(decoder.decode::<String>().unwrap(), None);
}

#[test]
fn test_whitespace_between_records() {
    let input = b"  {1}\n\n\t{2}\r\n   {3}   ";
    let mut decoder = Decoder::new(&input[..]);
    let xs: Vec<i32> = decoder
        .iter::<Point>()
        .map(|p| p.map(|p| p.x))
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(xs, vec![1, 2, 3]);
}

#[test]
fn test_decode_into_reports_end() {
    let mut decoder = Decoder::new(&b"{1,2,\"p\"}\n{,9}\n"[..]);
    let mut point = Point::default();

    assert!(decoder.decode_into(&mut point).unwrap());
    assert_eq!(point.label, "p");

    // the second record only touches `y`
    assert!(decoder.decode_into(&mut point).unwrap());
    assert_eq!((point.x, point.y, point.label.as_str()), (1, 9, "p"));

    assert!(!decoder.decode_into(&mut point).unwrap());
}

#[test]
fn test_iterator_stops_after_error() {
    let mut decoder = Decoder::new(&b"{1}\n{oops}\n{3}\n"[..]);
    let mut iter = decoder.iter::<Point>();
    assert_eq!(iter.next().unwrap().unwrap().x, 1);
    assert!(iter.next().unwrap().unwrap_err().is_malformed());
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}

#[test]
fn test_read_errors_surface() {
    let mut decoder = Decoder::new(Broken);
    let err = decoder.decode::<Point>().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_records_larger_than_the_read_buffer() {
    let long = Point {
        x: 1,
        y: 2,
        label: "x".repeat(5000),
    };
    let codec = Codec::with_options(Options::new().with_read_capacity(8));
    let mut encoder = codec.encoder(Vec::new());
    encoder.encode(&long).unwrap();
    encoder.encode(&long).unwrap();
    let bytes = encoder.into_inner();

    let mut decoder = codec.decoder(&bytes[..]);
    assert_eq!(decoder.decode::<Point>().unwrap(), Some(long.clone()));
    assert_eq!(decoder.decode::<Point>().unwrap(), Some(long));
    assert_eq!(decoder.decode::<Point>().unwrap(), None);
}

#[derive(Debug, Default)]
struct Faulty(bool);

impl Extension for Faulty {
    fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.0 {
            return Err(Error::custom("refusing to encode"));
        }
        out.push(b'F');
        Ok(())
    }

    fn decode_ido(&mut self, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

ido::extension!(Faulty);

ido::record! {
    #[derive(Debug, Default)]
    struct Carrier {
        id: u8,
        payload: Faulty,
    }
}

#[test]
fn test_failed_encode_returns_buffer_and_writes_nothing() {
    let codec = Codec::new();
    let mut encoder = codec.encoder(Vec::new());

    let bad = Carrier {
        id: 1,
        payload: Faulty(true),
    };
    let err = encoder.encode(&bad).unwrap_err();
    assert!(matches!(err, Error::Custom(_)));
    assert!(encoder.get_ref().is_empty());
    assert_eq!(codec.pool().leased(), 0);
    assert_eq!(codec.pool().available(), 1);

    let good = Carrier {
        id: 2,
        payload: Faulty(false),
    };
    encoder.encode(&good).unwrap();
    assert_eq!(encoder.get_ref(), b"{2,F}\n");
    assert_eq!(codec.pool().available(), 1);
}

#[test]
fn test_custom_codec_shares_registry() {
    let codec = Codec::with_options(
        Options::new()
            .with_read_capacity(2)
            .with_max_pooled_buffers(0),
    );
    let mut encoder = codec.encoder(Vec::new());
    encoder.encode(&Point::default()).unwrap();
    assert_eq!(codec.pool().available(), 0);
    assert!(codec.registry().contains::<Point>());

    let bytes = encoder.into_inner();
    let mut decoder = codec.decoder(&bytes[..]);
    assert_eq!(decoder.decode::<Point>().unwrap(), Some(Point::default()));
    assert_eq!(decoder.decode::<Point>().unwrap(), None);
    assert!(decoder.get_ref().is_empty());
}

#[test]
fn test_encoder_write_errors_surface() {
    struct Full;

    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut encoder = Encoder::new(Full);
    let err = encoder.encode(&7_u8).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
