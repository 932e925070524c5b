#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use httpws_core::protocol::envelope::{self, Envelope, Request};
use httpws_core::protocol::frame::encode_frame;
use httpws_gateway::transport::memory::pair;
use httpws_gateway::transport::{read_frame, BufferedReader, LinkMessage};

fn two_frames() -> Vec<u8> {
    let mut wire = Vec::new();
    for id in [1u64, 2] {
        let req = Request::new(id, "GET", "/ping").with_body(vec![0xAB; 40]);
        let body = envelope::encode(Envelope::Request(req)).unwrap();
        wire.extend_from_slice(&encode_frame(&body).unwrap());
    }
    wire
}

#[tokio::test]
async fn frames_reassemble_across_any_chunking() {
    let wire = two_frames();
    for chunk in [1usize, 3, 7, wire.len()] {
        let (reader, _writer, peer) = pair(wire.len());
        for part in wire.chunks(chunk) {
            peer.send_binary(part.to_vec()).await.unwrap();
        }

        let mut reader = BufferedReader::new(reader);
        for id in [1u64, 2] {
            let frame = read_frame(&mut reader).await.unwrap();
            let env = envelope::decode(&frame.body).unwrap().into_envelope().unwrap();
            assert_eq!(env.id(), id, "chunk size {chunk}");
        }
        assert_eq!(reader.cached(), 0);
    }
}

#[tokio::test]
async fn control_messages_are_skipped() {
    let wire = two_frames();
    let (reader, _writer, peer) = pair(8);
    peer.send(LinkMessage::Ping(vec![1])).await.unwrap();
    peer.send_binary(wire[..5].to_vec()).await.unwrap();
    peer.send(LinkMessage::Pong(vec![])).await.unwrap();
    peer.send_binary(wire[5..].to_vec()).await.unwrap();

    let mut reader = BufferedReader::new(reader);
    assert_eq!(read_frame(&mut reader).await.unwrap().header.protocol_id, 1);
    assert_eq!(read_frame(&mut reader).await.unwrap().header.protocol_id, 1);
}

#[tokio::test]
async fn text_message_is_a_protocol_error() {
    let (reader, _writer, peer) = pair(1);
    peer.send(LinkMessage::Text("hello".into())).await.unwrap();

    let mut reader = BufferedReader::new(reader);
    let err = read_frame(&mut reader).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "PROTOCOL");
}

#[tokio::test]
async fn close_mid_frame_is_a_transport_error() {
    let wire = two_frames();
    let (reader, _writer, peer) = pair(4);
    peer.send_binary(wire[..10].to_vec()).await.unwrap();
    peer.send(LinkMessage::Close).await.unwrap();

    let mut reader = BufferedReader::new(reader);
    let err = read_frame(&mut reader).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "TRANSPORT");
}

#[tokio::test]
async fn oversize_header_does_not_read_the_body() {
    let (reader, _writer, peer) = pair(1);
    peer.send_binary(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01]).await.unwrap();

    let mut reader = BufferedReader::new(reader);
    let err = read_frame(&mut reader).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "PROTOCOL");
    assert_eq!(reader.cached(), 0);
}
