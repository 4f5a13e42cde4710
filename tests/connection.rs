use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};

use typedis::codec::FrameCodec;
use typedis::connection::Connection;
use typedis::frame::Frame;

/// Returns a channel feeding raw bytes to the returned stream. Dropping the sender closes the
/// peer's side of the socket.
async fn create_tcp_connection() -> Result<(UnboundedSender<Vec<u8>>, TcpStream), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            while let Some(data) = rx.recv().await {
                if socket.write_all(&data).await.is_err() {
                    break;
                }
            }
        }
    });

    let stream = TcpStream::connect(local_addr).await?;

    Ok((tx, stream))
}

fn command(parts: &[&'static str]) -> Frame {
    Frame::Array(parts.iter().map(|p| Frame::Bulk(Bytes::from(*p))).collect())
}

#[tokio::test]
async fn reads_a_command() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    tx.send(b"*3\r\n$4\r\nSADD\r\n$3\r\nfoo\r\n$3\r\nbar\r\n".to_vec())
        .unwrap();

    let actual = connection.read_frame().await.unwrap();

    assert_eq!(actual, Some(command(&["SADD", "foo", "bar"])));
}

#[tokio::test]
async fn bulk_strings_are_binary_safe() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    tx.send(b"*3\r\n$5\r\nRPUSH\r\n$4\r\nlist\r\n$8\r\nfoo\r\nbar\r\n".to_vec())
        .unwrap();

    let actual = connection.read_frame().await.unwrap();

    assert_eq!(
        actual,
        Some(Frame::Array(vec![
            Frame::Bulk(Bytes::from("RPUSH")),
            Frame::Bulk(Bytes::from("list")),
            Frame::Bulk(Bytes::from("foo\r\nbar")),
        ]))
    );
}

#[tokio::test]
async fn reads_every_frame_type() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    tx.send(b"+OK\r\n".to_vec()).unwrap();
    tx.send(b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_vec())
        .unwrap();
    tx.send(b":-42\r\n".to_vec()).unwrap();
    tx.send(b"$-1\r\n".to_vec()).unwrap();
    tx.send(b"*-1\r\n".to_vec()).unwrap();
    tx.send(b"*0\r\n".to_vec()).unwrap();

    let expected = [
        Frame::Simple("OK".to_string()),
        Frame::Error(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        ),
        Frame::Integer(-42),
        Frame::Null,
        Frame::NullArray,
        Frame::Array(vec![]),
    ];

    for frame in expected {
        assert_eq!(connection.read_frame().await.unwrap(), Some(frame));
    }
}

#[tokio::test]
async fn reassembles_split_frames() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    let parts = [
        b"*3\r\n$6\r\nGET".to_vec(),
        b"BIT\r\n$3\r\nfo".to_vec(),
        b"o\r\n$1\r\n7\r\n".to_vec(),
    ];

    tokio::spawn(async move {
        for part in parts {
            tx.send(part).unwrap();
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    });

    let actual = connection.read_frame().await.unwrap();

    assert_eq!(actual, Some(command(&["GETBIT", "foo", "7"])));
}

#[tokio::test]
async fn clean_close() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    tx.send(b"*1\r\n$4\r\nPING\r\n".to_vec()).unwrap();
    drop(tx);

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(command(&["PING"]))
    );
    assert_eq!(connection.read_frame().await.unwrap(), None);
}

#[tokio::test]
async fn rejects_oversized_frames() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::new(16));

    tx.send(b"*2\r\n$3\r\nGET\r\n$32\r\n".to_vec()).unwrap();
    tx.send(vec![b'a'; 32]).unwrap();

    assert!(connection.read_frame().await.is_err());
}

#[tokio::test]
async fn rejects_malformed_frames() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    tx.send(b"?oops\r\n".to_vec()).unwrap();

    assert!(connection.read_frame().await.is_err());
}

#[tokio::test]
async fn rejects_deeply_nested_arrays() {
    let (tx, stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::with_codec(stream, FrameCodec::default());

    let mut data = b"*1\r\n".repeat(2_000_000);
    data.extend_from_slice(b":1\r\n");
    tx.send(data).unwrap();

    let err = connection.read_frame().await.unwrap_err();

    assert_eq!(err.to_string(), "arrays nested deeper than 32 levels");
}

#[tokio::test]
async fn writes_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap())
        .await
        .unwrap();
    let (server, _) = listener.accept().await.unwrap();

    let mut connection = Connection::with_codec(server, FrameCodec::default());
    connection
        .write_frame(Frame::Array(vec![
            Frame::Bulk(Bytes::from("a")),
            Frame::Null,
            Frame::Integer(3),
        ]))
        .await
        .unwrap();
    drop(connection);

    let mut client = client;
    let mut written = Vec::new();
    client.read_to_end(&mut written).await.unwrap();

    assert_eq!(written, b"*3\r\n$1\r\na\r\n$-1\r\n:3\r\n");
}
