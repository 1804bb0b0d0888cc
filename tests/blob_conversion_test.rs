use std::io::{Read, Write};
use std::net::TcpListener;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use image_blob_url::blob_handler::{
    BlobConfig, BlobConverter, BlobError, BlobRegistry, ConversionSession, HandleKind,
    InMemoryBlobRegistry, LocalFile, SessionOutcome, SessionState,
};
use tokio::io::{AsyncRead, ReadBuf};

static PNG_SIGNATURE: [u8; 16] = [
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82,
];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup() -> (Arc<InMemoryBlobRegistry>, Arc<BlobConverter>) {
    init_logger();
    let registry = Arc::new(InMemoryBlobRegistry::default());
    let converter = BlobConverter::new(registry.clone()).expect("converter init failed");
    (registry, Arc::new(converter))
}

fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {}\r\n", status_line);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    let mut response = head.into_bytes();
    response.extend_from_slice(body);
    response
}

/// 依次处理每个连接，每个连接返回一条预设响应。
fn spawn_server(responses: Vec<Vec<u8>>) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    let server = thread::spawn(move || {
        for response in responses {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            stream.write_all(&response).expect("write response failed");
            stream.flush().expect("flush failed");
        }
    });

    (port, server)
}

/// 对每个连接都返回指向自身的 302，直到客户端放弃。
fn spawn_redirect_loop() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let response = http_response("302 Found", &[("Location", "/loop.png")], b"");
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
    });

    port
}

fn fake_jpeg(size: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    bytes.extend((0..size - bytes.len() - 2).map(|i| (i % 251) as u8));
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "device unplugged",
        )))
    }
}

#[tokio::test]
async fn local_jpeg_becomes_inline_handle_with_original_bytes() {
    let (registry, converter) = setup();
    let jpeg = fake_jpeg(10 * 1024);

    let mut file = tempfile::NamedTempFile::new().expect("create temp file failed");
    file.write_all(&jpeg).expect("write temp file failed");

    let handle = converter
        .file_to_blob(LocalFile::from_path(file.path()))
        .await
        .expect("local conversion should succeed");

    assert!(handle.starts_with("data:image/jpeg;base64,"));
    assert_eq!(HandleKind::of(&handle), Some(HandleKind::Inline));

    let (media_type, decoded) = BlobConverter::parse_data_url(&handle).expect("decode failed");
    assert_eq!(media_type, "image/jpeg");
    assert_eq!(decoded, jpeg);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn declared_media_type_wins_over_signature() {
    let (_registry, converter) = setup();

    let handle = converter
        .file_to_blob(LocalFile::from_reader(&PNG_SIGNATURE[..], "image/x-custom"))
        .await
        .expect("local conversion should succeed");

    assert!(handle.starts_with("data:image/x-custom;base64,"));
}

#[tokio::test]
async fn unreadable_local_file_rejects_with_read_error() {
    let (_registry, converter) = setup();

    let missing = converter
        .file_to_blob(LocalFile::from_path("/definitely/not/here/cat.png"))
        .await;
    let broken = converter
        .file_to_blob(LocalFile::from_reader(FailingReader, "image/png"))
        .await;

    assert!(matches!(missing, Err(BlobError::Read(_))));
    assert!(matches!(broken, Err(BlobError::Read(_))));
}

#[tokio::test]
async fn remote_404_rejects_with_http_error_and_registers_nothing() {
    let (registry, converter) = setup();
    let (port, server) = spawn_server(vec![http_response(
        "404 Not Found",
        &[("Content-Type", "text/html")],
        b"<html>missing</html>",
    )]);

    let url = format!("http://127.0.0.1:{}/missing.png", port);
    let result = converter.url_to_blob(&url).await;

    server.join().expect("server thread failed");

    match result {
        Err(BlobError::Http { status, reason }) => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("expected HttpError(404), got {:?}", other),
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn remote_200_registers_blob_and_release_invalidates_it() {
    let (registry, converter) = setup();
    let (port, server) = spawn_server(vec![http_response(
        "200 OK",
        &[("Content-Type", "image/png; charset=binary")],
        &PNG_SIGNATURE,
    )]);

    let url = format!("http://127.0.0.1:{}/a.png?token=secret", port);
    let handle = converter
        .url_to_blob(&url)
        .await
        .expect("remote conversion should succeed");

    server.join().expect("server thread failed");

    assert!(handle.starts_with("blob:http://localhost/"));
    assert_eq!(HandleKind::of(&handle), Some(HandleKind::Registry));

    let blob = registry.resolve(&handle).expect("handle should be live");
    assert_eq!(blob.bytes.as_ref(), &PNG_SIGNATURE[..]);
    assert_eq!(blob.content_type, "image/png");

    converter.revoke_blob(&handle);
    assert!(registry.resolve(&handle).is_none());

    converter.revoke_blob(&handle);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn missing_content_type_is_sniffed_from_body() {
    let (registry, converter) = setup();
    let (port, server) = spawn_server(vec![http_response("200 OK", &[], &PNG_SIGNATURE)]);

    let url = format!("http://127.0.0.1:{}/no-type", port);
    let handle = converter
        .url_to_blob(&url)
        .await
        .expect("remote conversion should succeed");

    server.join().expect("server thread failed");

    let blob = registry.resolve(&handle).expect("handle should be live");
    assert_eq!(blob.content_type, "image/png");
}

#[tokio::test]
async fn redirect_is_followed_to_final_resource() {
    let (registry, converter) = setup();
    let (port, server) = spawn_server(vec![
        http_response("302 Found", &[("Location", "/final.png")], b""),
        http_response("200 OK", &[("Content-Type", "image/png")], &PNG_SIGNATURE),
    ]);

    let url = format!("http://127.0.0.1:{}/start.png", port);
    let handle = converter
        .url_to_blob(&url)
        .await
        .expect("redirected conversion should succeed");

    server.join().expect("server thread failed");

    assert_eq!(registry.len(), 1);
    assert!(registry.resolve(&handle).is_some());
}

#[tokio::test]
async fn remote_error_keeps_standard_reason_phrase() {
    let (_registry, converter) = setup();
    let (port, server) = spawn_server(vec![http_response("404 Image Gone", &[], b"")]);

    let url = format!("http://127.0.0.1:{}/gone.png", port);
    let result = converter.url_to_blob(&url).await;

    server.join().expect("server thread failed");

    match result {
        Err(BlobError::Http { status, reason }) => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("expected HttpError(404), got {:?}", other),
    }
}

#[tokio::test]
async fn redirect_loop_past_limit_rejects_with_network_error() {
    init_logger();
    let registry = Arc::new(InMemoryBlobRegistry::default());
    let mut config = BlobConfig::default();
    config.max_redirects = 2;
    let converter =
        BlobConverter::with_config(registry.clone(), config).expect("converter init failed");
    let port = spawn_redirect_loop();

    let url = format!("http://127.0.0.1:{}/loop.png", port);
    let result = converter.url_to_blob(&url).await;

    assert!(matches!(result, Err(BlobError::Network(_))), "got {:?}", result);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn truncated_body_rejects_with_network_error() {
    let (registry, converter) = setup();
    let mut response = b"HTTP/1.1 200 OK\r\n\
        Content-Type: image/png\r\n\
        Content-Length: 100\r\n\
        Connection: close\r\n\r\n"
        .to_vec();
    response.extend_from_slice(&PNG_SIGNATURE[..3]);
    let (port, server) = spawn_server(vec![response]);

    let url = format!("http://127.0.0.1:{}/short.png", port);
    let result = converter.url_to_blob(&url).await;

    server.join().expect("server thread failed");

    assert!(matches!(result, Err(BlobError::Network(_))), "got {:?}", result);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn connection_refused_rejects_with_network_error() {
    let (registry, converter) = setup();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let port = listener.local_addr().expect("read local addr failed").port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/a.png", port);
    let result = converter.url_to_blob(&url).await;

    assert!(matches!(result, Err(BlobError::Network(_))));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn session_replaces_remote_handle_with_local_one() {
    let (registry, converter) = setup();
    let session = ConversionSession::new(converter);
    let (port, server) = spawn_server(vec![http_response(
        "200 OK",
        &[("Content-Type", "image/png")],
        &PNG_SIGNATURE,
    )]);

    let url = format!("http://127.0.0.1:{}/a.png", port);
    let remote = match session.submit_url(&url).await.expect("submit should succeed") {
        SessionOutcome::Applied(handle) => handle,
        SessionOutcome::Superseded => panic!("single request cannot be superseded"),
    };
    server.join().expect("server thread failed");
    assert_eq!(registry.len(), 1);

    let outcome = session
        .convert_file(LocalFile::from_bytes(fake_jpeg(64), "image/jpeg"))
        .await
        .expect("local conversion should succeed");

    assert!(registry.resolve(&remote).is_none());
    assert!(registry.is_empty());
    match (outcome, session.state()) {
        (SessionOutcome::Applied(handle), SessionState::Ready(current)) => {
            assert_eq!(handle, current);
            assert!(current.starts_with("data:image/jpeg;base64,"));
        }
        other => panic!("unexpected session result: {:?}", other),
    }
}

#[tokio::test]
async fn session_failure_surfaces_error_and_resets_to_empty() {
    let (_registry, converter) = setup();
    let session = ConversionSession::new(converter);
    let (port, server) = spawn_server(vec![http_response(
        "500 Internal Server Error",
        &[],
        b"",
    )]);

    let url = format!("http://127.0.0.1:{}/boom.png", port);
    let result = session.convert_url(&url).await;
    server.join().expect("server thread failed");

    assert_eq!(result.err().and_then(|e| e.http_status()), Some(500));
    assert_eq!(session.state(), SessionState::Empty);
}
