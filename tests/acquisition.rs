//! Upload staging, URL validation and download tests.
//!
//! Downloads are served by a one-shot HTTP server on the loopback interface.

use std::{
    io::{Cursor, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

use vidshot::{
    Acquirer, ConverterConfig, ErrorKind, JobToken, Upload, VideoSource, VidshotError,
    validate_filename, validate_url,
};

fn config_in(directory: &std::path::Path) -> ConverterConfig {
    ConverterConfig::new().with_upload_dir(directory.join("uploads"))
}

/// Serve `response` to the first connection and hand back the raw request.
fn serve_once(response: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let address = listener.local_addr().expect("Failed to read listener address");

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Failed to accept connection");
        let mut request = Vec::new();
        let mut buffer = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buffer).expect("Failed to read request");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
        }
        // The client may hang up early, e.g. once a size ceiling is hit.
        let _ = stream.write_all(&response);
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{address}"), handle)
}

fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

// ── URL validation ─────────────────────────────────────────────────

#[test]
fn url_without_scheme_or_host_is_invalid() {
    for raw in ["not a url", "example.com/video.mp4", "http://", "mailto:someone@example.com"] {
        let error = validate_url(raw).unwrap_err();
        assert!(
            matches!(error, VidshotError::InvalidUrl { .. }),
            "{raw}: expected InvalidUrl, got {error}"
        );
        assert_eq!(error.kind(), ErrorKind::Validation);
    }
}

#[test]
fn non_http_scheme_is_rejected() {
    let error = validate_url("ftp://bad").unwrap_err();
    match &error {
        VidshotError::UnsupportedScheme { scheme } => assert_eq!(scheme, "ftp"),
        other => panic!("Expected UnsupportedScheme, got: {other}"),
    }
    assert!(error.to_string().contains("Invalid URL"));
}

#[test]
fn http_and_https_urls_are_accepted() {
    let url = validate_url("  https://cdn.example.com/clips/talk.mp4?t=3 ").unwrap();
    assert_eq!(url.host_str(), Some("cdn.example.com"));
    assert!(validate_url("http://127.0.0.1:8080/a.mkv").is_ok());
}

// ── Filename validation ────────────────────────────────────────────

#[test]
fn allowed_extensions_are_case_insensitive() {
    let config = ConverterConfig::new();
    assert_eq!(validate_filename("clip.MP4", &config).unwrap(), "mp4");
    assert_eq!(validate_filename("my.holiday.mov", &config).unwrap(), "mov");
    assert_eq!(validate_filename("a.Mkv", &config).unwrap(), "mkv");
    assert_eq!(validate_filename("b.avi", &config).unwrap(), "avi");
}

#[test]
fn disallowed_extension_is_rejected() {
    let config = ConverterConfig::new();
    for name in ["clip.txt", "clip", "clip.", "mp4"] {
        let error = validate_filename(name, &config).unwrap_err();
        assert!(
            matches!(error, VidshotError::InvalidFileType { .. }),
            "{name}: expected InvalidFileType, got {error}"
        );
    }
}

#[test]
fn empty_filename_is_rejected() {
    let config = ConverterConfig::new();
    assert!(matches!(
        validate_filename("  ", &config),
        Err(VidshotError::EmptyFilename)
    ));
}

// ── Upload staging ─────────────────────────────────────────────────

#[test]
fn staged_upload_is_removed_on_release() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());
    let token = JobToken::generate();

    let upload = Upload::new("Lecture.MP4", Cursor::new(vec![7_u8; 4096]));
    let video = Acquirer::new(&config)
        .stage_upload(upload, &token)
        .expect("Failed to stage upload");

    let path = video.path().to_path_buf();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        token.upload_file_name("mp4")
    );
    assert_eq!(std::fs::read(&path).unwrap().len(), 4096);
    assert!(matches!(video.source(), VideoSource::Local(_)));

    video.release().expect("Failed to release upload");
    assert!(!path.exists());
}

#[test]
fn staged_upload_is_removed_on_drop() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());

    let video = Acquirer::new(&config)
        .stage_upload(Upload::new("a.mkv", Cursor::new(b"data".to_vec())), &JobToken::generate())
        .expect("Failed to stage upload");
    let path = video.path().to_path_buf();
    drop(video);

    assert!(!path.exists());
}

#[test]
fn oversized_upload_is_rejected_and_removed() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path()).with_max_upload_size(1024);

    let upload = Upload::new("big.mp4", Cursor::new(vec![0_u8; 1025]));
    let result = Acquirer::new(&config).stage_upload(upload, &JobToken::generate());

    match result {
        Err(VidshotError::UploadTooLarge { limit }) => assert_eq!(limit, 1024),
        other => panic!("Expected UploadTooLarge, got: {other:?}"),
    }
    let leftovers = std::fs::read_dir(directory.path().join("uploads"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn upload_at_exact_limit_is_accepted() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path()).with_max_upload_size(1024);

    let upload = Upload::new("edge.mp4", Cursor::new(vec![0_u8; 1024]));
    assert!(
        Acquirer::new(&config)
            .stage_upload(upload, &JobToken::generate())
            .is_ok()
    );
}

#[test]
fn disallowed_upload_never_touches_disk() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());

    let upload = Upload::new("clip.txt", Cursor::new(b"hello".to_vec()));
    let result = Acquirer::new(&config).stage_upload(upload, &JobToken::generate());

    assert!(matches!(result, Err(VidshotError::InvalidFileType { .. })));
    assert!(!directory.path().join("uploads").exists());
}

// ── Downloads ──────────────────────────────────────────────────────

#[test]
fn invalid_url_fails_before_any_network_call() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());

    let result = Acquirer::new(&config).fetch("not a url", &JobToken::generate());
    assert!(matches!(result, Err(VidshotError::InvalidUrl { .. })));
    assert!(!directory.path().join("uploads").exists());
}

#[test]
fn download_streams_body_to_temporary_file() {
    let body: Vec<u8> = (0..50_000_u32).map(|value| (value % 251) as u8).collect();
    let (base, server) = serve_once(http_response("200 OK", &body));

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path()).with_user_agent("vidshot-test/1.0");
    let token = JobToken::generate();

    let video = Acquirer::new(&config)
        .fetch(&format!("{base}/videos/talk.mp4"), &token)
        .expect("Failed to download");

    assert_eq!(std::fs::read(video.path()).unwrap(), body);
    assert!(
        video
            .path()
            .extension()
            .is_some_and(|extension| extension == "mp4")
    );
    assert!(matches!(video.source(), VideoSource::Remote(_)));

    let request = server.join().expect("Server thread panicked");
    assert!(request.starts_with("GET /videos/talk.mp4 "));
    assert!(request.to_ascii_lowercase().contains("user-agent: vidshot-test/1.0"));

    let path = video.path().to_path_buf();
    video.release().expect("Failed to release download");
    assert!(!path.exists());
}

#[test]
fn non_success_status_is_a_download_failure() {
    let (base, server) = serve_once(http_response("404 Not Found", b"missing"));

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());

    let error = Acquirer::new(&config)
        .fetch(&format!("{base}/gone.mp4"), &JobToken::generate())
        .unwrap_err();
    server.join().expect("Server thread panicked");

    assert_eq!(error.kind(), ErrorKind::Acquisition);
    assert!(error.to_string().contains("404"), "{error}");
}

#[test]
fn download_over_configured_ceiling_fails() {
    let (base, server) = serve_once(http_response("200 OK", &vec![1_u8; 20_000]));

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path()).with_max_download_size(Some(10_000));

    let error = Acquirer::new(&config)
        .fetch(&format!("{base}/large.mp4"), &JobToken::generate())
        .unwrap_err();
    server.join().expect("Server thread panicked");

    assert!(matches!(error, VidshotError::DownloadFailed { .. }));
    let leftovers = std::fs::read_dir(directory.path().join("uploads"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn unreachable_host_is_a_download_failure() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(directory.path());

    let error = Acquirer::new(&config)
        .fetch(&format!("http://127.0.0.1:{port}/a.mp4"), &JobToken::generate())
        .unwrap_err();
    assert!(matches!(error, VidshotError::DownloadFailed { .. }), "{error}");
}
