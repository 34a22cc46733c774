//! 探测头解析测试

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, HeaderValue};

use crate::downloader::capability_probe::{accepts_byte_ranges, content_length};

fn headers(pairs: &[(reqwest::header::HeaderName, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(name.clone(), HeaderValue::from_static(*value));
    }
    map
}

#[test]
fn content_length_parsing() {
    assert_eq!(content_length(&headers(&[(CONTENT_LENGTH, "10485760")])), Some(10_485_760));
    assert_eq!(content_length(&headers(&[(CONTENT_LENGTH, " 42 ")])), Some(42));
    assert_eq!(content_length(&headers(&[(CONTENT_LENGTH, "abc")])), None);
    assert_eq!(content_length(&headers(&[(CONTENT_LENGTH, "-1")])), None);
    assert_eq!(content_length(&HeaderMap::new()), None);
}

#[test]
fn accept_ranges_requires_bytes_unit() {
    assert!(accepts_byte_ranges(&headers(&[(ACCEPT_RANGES, "bytes")])));
    assert!(accepts_byte_ranges(&headers(&[(ACCEPT_RANGES, "Bytes")])));
    assert!(accepts_byte_ranges(&headers(&[(ACCEPT_RANGES, "none, bytes")])));
    assert!(accepts_byte_ranges(&headers(&[
        (ACCEPT_RANGES, "none"),
        (ACCEPT_RANGES, "bytes"),
    ])));

    assert!(!accepts_byte_ranges(&headers(&[(ACCEPT_RANGES, "none")])));
    assert!(!accepts_byte_ranges(&headers(&[(ACCEPT_RANGES, "bytesx")])));
    assert!(!accepts_byte_ranges(&HeaderMap::new()));
}
