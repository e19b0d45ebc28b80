use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Duration};

use redkv::server::serve;
use redkv::store::Store;

async fn start_server(max_frame_size: usize) -> TcpStream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local_addr = listener.local_addr().unwrap();

    tokio::spawn(serve(listener, Store::new(), max_frame_size));

    TcpStream::connect(local_addr).await.unwrap()
}

/// Reads exactly `len` bytes from the stream.
async fn read_exact(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0; len];
    timeout(Duration::from_secs(1), stream.read_exact(&mut buf))
        .await
        .expect("timed out waiting for a response")
        .unwrap();
    buf
}

async fn exchange(stream: &mut TcpStream, request: &[u8], expected: &[u8]) {
    stream.write_all(request).await.unwrap();

    let actual = read_exact(stream, expected.len()).await;

    assert_eq!(
        String::from_utf8_lossy(&actual),
        String::from_utf8_lossy(expected),
        "request: {:?}",
        String::from_utf8_lossy(request)
    );
}

#[tokio::test]
async fn test_conversation() {
    let mut stream = start_server(1024).await;

    let cases: &[(&[u8], &[u8])] = &[
        (b"*3\r\n$3\r\nSET\r\n$5\r\nhello\r\n$5\r\nworld\r\n", b"+OK\r\n"),
        (b"*2\r\n$3\r\nGET\r\n$5\r\nworld\r\n", b"$-1\r\n"),
        (b"*2\r\n$3\r\nGET\r\n$5\r\nhello\r\n", b"$5\r\nworld\r\n"),
        (
            b"*5\r\n$5\r\nLPUSH\r\n$5\r\nlist1\r\n$2\r\nk1\r\n$2\r\nk2\r\n$2\r\nk3\r\n",
            b":3\r\n",
        ),
        (b"*2\r\n$3\r\nGET\r\n$5\r\nlist1\r\n", b"$8\r\nk3\tk2\tk1\r\n"),
        (b"*2\r\n$4\r\nINCR\r\n$4\r\nctr1\r\n", b":1\r\n"),
        (b"*2\r\n$4\r\nDECR\r\n$4\r\nctr1\r\n", b":0\r\n"),
        (b"*2\r\n$6\r\nEXISTS\r\n$4\r\nctr1\r\n", b":1\r\n"),
        (b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n"),
        (b"*2\r\n$4\r\nPING\r\n$2\r\nhi\r\n", b"$2\r\nhi\r\n"),
        (b"*2\r\n$5\r\nHELLO\r\n$1\r\n2\r\n", b"+OK\r\n"),
        (
            b"*3\r\n$6\r\nCONFIG\r\n$3\r\nSET\r\n$4\r\nsave\r\n",
            b"-unsupported subcommand SET for CONFIG\r\n",
        ),
    ];

    for (request, expected) in cases {
        exchange(&mut stream, request, expected).await;
    }
}

#[tokio::test]
async fn test_pipelined_requests() {
    let mut stream = start_server(1024).await;

    exchange(
        &mut stream,
        b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$3\r\nfoo\r\n",
        b"+PONG\r\n+PONG\r\n$3\r\nfoo\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let mut stream = start_server(1024).await;

    stream.write_all(b"*2\r\n$4\r\nECHO\r\n$5\r\nhel").await.unwrap();
    stream.flush().await.unwrap();
    sleep(Duration::from_millis(20)).await;

    exchange(&mut stream, b"lo\r\n", b"$5\r\nhello\r\n").await;
}

#[tokio::test]
async fn test_command_errors_keep_connection_open() {
    let mut stream = start_server(1024).await;

    exchange(
        &mut stream,
        b"*2\r\n$3\r\nSET\r\n$1\r\nk\r\n",
        b"-wrong number of arguments for 'set' command\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*2\r\n$3\r\nGET\r\n:1\r\n",
        b"-invalid format for command\r\n",
    )
    .await;
    exchange(&mut stream, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_malformed_input() {
    let mut stream = start_server(1024).await;

    exchange(
        &mut stream,
        b"*1\r\n$4\r\nPING\r\n?garbage\r\n*1\r\n$4\r\nPING\r\n",
        b"+PONG\r\n-unsupported message discriminator\r\n",
    )
    .await;

    // Only the rest of that input was discarded.
    exchange(&mut stream, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_frame_size_limit_closes_connection() {
    let mut stream = start_server(16).await;

    stream
        .write_all(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$100\r\n")
        .await
        .unwrap();

    let mut buf = Vec::new();
    let read = timeout(Duration::from_secs(1), stream.read_to_end(&mut buf))
        .await
        .expect("timed out waiting for the connection to close");

    // The server drops the connection, possibly resetting it.
    if let Ok(n) = read {
        assert_eq!(n, 0);
    }
}
