use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use component_migrate::remote::Directory;
use component_migrate::remote::http::HttpDirectory;

/// Request as seen by the stub server.
#[derive(Debug)]
struct Seen {
    request_line: String,
    authorization: Option<String>,
    body: String,
}

/// Serve one canned response per queued entry, in order, then stop.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut authorization = None;
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    let value = value.trim().to_string();
                    match name.to_ascii_lowercase().as_str() {
                        "authorization" => authorization = Some(value),
                        "content-length" => content_length = value.parse().unwrap(),
                        _ => {}
                    }
                }
            }
            let mut buf = vec![0u8; content_length];
            reader.read_exact(&mut buf).unwrap();

            tx.send(Seen {
                request_line: request_line.trim_end().to_string(),
                authorization,
                body: String::from_utf8(buf).unwrap(),
            })
            .unwrap();

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (format!("http://{addr}/rest/api/2"), rx)
}

fn client(base: &str) -> HttpDirectory {
    HttpDirectory::new(base, "secret-token", Duration::from_secs(5)).unwrap()
}

#[test]
fn list_sends_bearer_token_and_parses_items() {
    let (base, seen) = serve(vec![(
        200,
        r#"[{"id":"10000","name":"API","description":"rest"},{"id":10001,"name":"UI"}]"#,
    )]);

    let items = client(&base).list("SRC").unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.request_line, "GET /rest/api/2/project/SRC/components HTTP/1.1");
    assert_eq!(request.authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "10000");
    assert_eq!(items[1].id, "10001");
    assert_eq!(items[1].description, None);
}

#[test]
fn create_posts_component_payload() {
    let (base, seen) = serve(vec![(201, r#"{"id":"20000","name":"UI"}"#)]);

    let item = client(&base).create("DST", "UI", Some("front end")).unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.request_line, "POST /rest/api/2/component HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "name": "UI",
            "description": "front end",
            "project": "DST",
            "assigneeType": "PROJECT_DEFAULT",
            "isAssigneeTypeValid": true
        })
    );
    assert_eq!(item.id, "20000");
}

#[test]
fn error_statuses_map_to_typed_errors() {
    let (base, _seen) = serve(vec![
        (400, r#"{"errorMessages":["name already exists"]}"#),
        (401, ""),
        (404, r#"{"errorMessages":["No project could be found with key 'NOPE'."]}"#),
        (503, "unavailable"),
    ]);
    let dir = client(&base);

    let err = dir.create("DST", "UI", None).unwrap_err();
    assert_eq!(err.code(), "validation");
    assert_eq!(err.remote_message(), "name already exists");

    let err = dir.list("SRC").unwrap_err();
    assert_eq!(err.code(), "auth");
    assert_eq!(err.status(), Some(401));

    let err = dir.project_exists("NOPE").unwrap_err();
    assert_eq!(err.code(), "not_found");

    let err = dir.list("SRC").unwrap_err();
    assert_eq!(err.code(), "transport");
    assert_eq!(err.remote_message(), "HTTP 503");
}

#[test]
fn malformed_listing_is_an_invalid_response() {
    let (base, _seen) = serve(vec![(200, r#"{"not":"an array"}"#)]);
    let err = client(&base).list("SRC").unwrap_err();
    assert_eq!(err.code(), "invalid_response");
}

#[test]
fn connection_failure_is_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .project_exists("SRC")
        .unwrap_err();
    assert_eq!(err.code(), "transport");
    assert_eq!(err.status(), None);
}

#[test]
fn unreadable_create_response_says_the_component_was_created() {
    let (base, _seen) = serve(vec![(201, "<html>ok</html>")]);
    let err = client(&base).create("DST", "UI", None).unwrap_err();
    assert_eq!(err.code(), "invalid_response");
    // This text becomes the outcome detail, so it must not read as a plain rejection.
    assert!(
        err.remote_message()
            .starts_with("created (HTTP 201), but response unreadable"),
        "{}",
        err.remote_message()
    );
}
