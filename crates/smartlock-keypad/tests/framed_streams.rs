//! Integration tests decoding keypad and scanner streams through `FramedRead`.
//!
//! Run with: cargo test --package smartlock-keypad --test framed_streams

use futures::StreamExt;
use smartlock_keypad::{BarcodeCodec, Key, KeyStreamCodec, ScanKey, ScannerFilter};
use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;

#[tokio::test]
async fn test_keypad_stream_over_duplex() {
    let (mut tx, rx) = tokio::io::duplex(64);
    let mut keys = FramedRead::new(rx, KeyStreamCodec::new());

    tx.write_all(b"12").await.unwrap();
    tx.write_all(b"C3O").await.unwrap();
    drop(tx);

    let received: Vec<Key> = keys.by_ref().map(|k| k.unwrap()).collect().await;
    assert_eq!(
        received,
        vec![
            Key::Digit(1),
            Key::Digit(2),
            Key::Clear,
            Key::Digit(3),
            Key::Enter
        ]
    );
}

#[tokio::test]
async fn test_scanner_stream_survives_noise() {
    let (mut tx, rx) = tokio::io::duplex(256);
    let mut lines = FramedRead::new(rx, BarcodeCodec::with_max_length(16));

    tx.write_all(b"\r\n").await.unwrap();
    tx.write_all(&[b'9'; 40]).await.unwrap();
    tx.write_all(b"\r\nAC:3D:FF:A0\r\n").await.unwrap();
    drop(tx);

    assert_eq!(lines.next().await.unwrap().unwrap(), "AC:3D:FF:A0");
    assert!(lines.next().await.is_none());
}

#[tokio::test]
async fn test_listener_output_feeds_host_decoder() {
    let mut filter = ScannerFilter::new();
    let mut wire = BytesMut::new();
    filter.feed_all("de:ad:be:ef".chars().map(ScanKey::Char), &mut wire);

    let (mut tx, rx) = tokio::io::duplex(64);
    tx.write_all(&wire).await.unwrap();
    drop(tx);

    let mut lines = FramedRead::new(rx, BarcodeCodec::new());
    assert_eq!(lines.next().await.unwrap().unwrap(), "de:ad:be:ef");
}
