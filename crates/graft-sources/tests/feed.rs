use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use graft_core::framework::Framework;
use graft_core::library::LibraryRange;
use graft_resolver::context::RemoteWalkContext;
use graft_resolver::provider::{RemoteDependencyProvider, RemoteMatch};
use graft_resolver::remote::RemoteDependencyWalker;
use graft_sources::feed::{FeedOptions, HttpFeed};

type Routes = HashMap<String, (u16, String)>;

/// Serve canned responses; returns the base URL and a log of requested paths.
async fn serve(routes: Routes) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let requests = log.clone();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                requests.lock().unwrap().push(path.clone());

                let (status, body) = routes.get(&path).cloned().unwrap_or((404, String::new()));
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    _ => "Internal Server Error",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), log)
}

fn options() -> FeedOptions {
    FeedOptions {
        timeout: Duration::from_secs(5),
        retries: 1,
        ..FeedOptions::default()
    }
}

fn foo_routes() -> Routes {
    let mut routes = Routes::new();
    routes.insert(
        "/foo/index.json".into(),
        (200, r#"{"versions": ["1.0.0", "1.2.0", "1.5.0", "bogus"]}"#.into()),
    );
    routes.insert(
        "/foo/1.2.0/graft.toml".into(),
        (
            200,
            "[package]\nname = \"Foo\"\nversion = \"1.2.0\"\n\n[dependencies]\nBar = \"2.0.0\"\n".into(),
        ),
    );
    routes
}

fn count(log: &Mutex<Vec<String>>, path: &str) -> usize {
    log.lock().unwrap().iter().filter(|p| *p == path).count()
}

#[tokio::test]
async fn finds_lowest_satisfying_version() {
    let (base, _) = serve(foo_routes()).await;
    let feed = HttpFeed::new(&base, options()).unwrap();

    let found = feed
        .find_library(&LibraryRange::package("Foo", "1.1.0").unwrap(), &Framework::any())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.library.to_string(), "Foo 1.2.0");
    assert_eq!(found.path.as_deref(), Some(format!("{base}/foo/1.2.0/graft.toml").as_str()));

    let deps = feed.get_dependencies(&found, &Framework::any()).await.unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].to_string(), "Bar 2.0.0");
}

#[tokio::test]
async fn listings_are_memoized() {
    let (base, log) = serve(foo_routes()).await;
    let feed = HttpFeed::new(&base, options()).unwrap();

    for range in ["1.0.0", "1.*"] {
        feed.find_library(&LibraryRange::package("foo", range).unwrap(), &Framework::any())
            .await
            .unwrap();
    }
    assert_eq!(count(&log, "/foo/index.json"), 1);
}

#[tokio::test]
async fn no_cache_refetches_listings() {
    let (base, log) = serve(foo_routes()).await;
    let feed = HttpFeed::new(
        &base,
        FeedOptions {
            no_cache: true,
            ..options()
        },
    )
    .unwrap();

    for _ in 0..2 {
        feed.find_library(&LibraryRange::package("Foo", "1.0.0").unwrap(), &Framework::any())
            .await
            .unwrap();
    }
    assert_eq!(count(&log, "/foo/index.json"), 2);
}

#[tokio::test]
async fn unknown_package_is_no_match() {
    let (base, _) = serve(Routes::new()).await;
    let feed = HttpFeed::new(&base, options()).unwrap();
    let found = feed
        .find_library(&LibraryRange::package("Missing", "1.0.0").unwrap(), &Framework::any())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn server_errors_fail_unless_ignored() {
    let mut routes = Routes::new();
    routes.insert("/foo/index.json".into(), (500, "boom".into()));
    let (base, _) = serve(routes).await;

    let strict = HttpFeed::new(&base, options()).unwrap();
    let err = strict
        .find_library(&LibraryRange::package("Foo", "1.0.0").unwrap(), &Framework::any())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Network error"), "got: {err}");

    let lenient = HttpFeed::new(
        &base,
        FeedOptions {
            ignore_failed: true,
            ..options()
        },
    )
    .unwrap();
    let found = lenient
        .find_library(&LibraryRange::package("Foo", "1.0.0").unwrap(), &Framework::any())
        .await
        .unwrap();
    assert!(found.is_none());

    let deps = lenient
        .get_dependencies(
            &RemoteMatch::new(graft_core::library::Library::new(
                "Foo",
                graft_core::version::PackageVersion::new(9, 9, 9),
            )),
            &Framework::any(),
        )
        .await
        .unwrap();
    assert!(deps.is_empty());
}

#[tokio::test]
async fn remote_walk_over_feed() {
    let mut routes = foo_routes();
    routes.insert("/bar/index.json".into(), (200, r#"{"versions": ["2.0.0"]}"#.into()));
    routes.insert(
        "/bar/2.0.0/graft.toml".into(),
        (200, "[package]\nname = \"Bar\"\nversion = \"2.0.0\"\n".into()),
    );
    let (base, log) = serve(routes).await;

    let feed = Arc::new(HttpFeed::new(&base, options()).unwrap());
    let walker = RemoteDependencyWalker::new(Arc::new(
        RemoteWalkContext::new().with_remote_provider(feed),
    ));
    let graph = walker
        .walk_range(LibraryRange::package("Foo", "1.2.0").unwrap(), &Framework::any())
        .await
        .unwrap();

    assert_eq!(graph.print_tree(None), "Foo 1.2.0\n└── Bar 2.0.0\n");
    assert_eq!(count(&log, "/foo/1.2.0/graft.toml"), 1);
}
