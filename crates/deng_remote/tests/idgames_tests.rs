//! idgames link over gzipped listing fixtures

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

use deng_remote::*;
use flate2::write::GzEncoder;
use flate2::Compression;

const LISTING: &str = "\
.:
total 24
drwxr-xr-x   4 ftp ftp     4096 Feb  1  2020 levels
drwxr-xr-x   2 ftp ftp     4096 Feb  1  2020 utils
-rw-r--r--   1 ftp ftp     8000 Oct  2 09:15 ls-laR.gz

./levels:
drwxr-xr-x   4 ftp ftp     4096 Feb  1  2020 doom
drwxr-xr-x   4 ftp ftp     4096 Feb  1  2020 doom2

./levels/doom/a-c:
-rw-r--r--   1 ftp ftp   183421 Jun 14  1999 av.zip
-rw-r--r--   1 ftp ftp     4410 Jun 14  1999 av.txt
-rw-r--r--   1 ftp ftp    99120 Jan  3  2001 Chex-Quest.wad

./levels/doom2/0-9:
-rw-r--r--   1 ftp ftp   512000 Aug 21 17:02 1monster.pk3

./utils:
-rw-r--r--   1 ftp ftp    24000 Mar  9  1996 deutex.zip
";

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn ready_link() -> IdgamesLink {
    let mut link = IdgamesLink::new(LinkConfig {
        reference_year: Some(2023),
        ..LinkConfig::default()
    });
    assert_eq!(link.load_listing(&gzip(LISTING)).unwrap(), 4);
    link
}

#[test]
fn test_listing_tree_from_gzip() {
    let listing = Listing::from_gzip(&gzip(LISTING), 2023).unwrap();
    assert_eq!(listing.len(), 6);

    let folders: Vec<&str> = listing.root().folders().map(|(name, _)| name).collect();
    assert_eq!(folders, vec!["levels", "utils"]);

    let monster = listing.file("levels/doom2/0-9/1monster.pk3").unwrap();
    assert_eq!(monster.size, 512_000);
    assert_eq!(monster.modified.version(), "2023.08.21");
}

#[test]
fn test_load_listing_makes_link_ready() {
    let mut link = ready_link();
    assert_eq!(link.status(), LinkStatus::Ready);

    let events = link.poll();
    assert_eq!(
        events,
        vec![
            LinkEvent::PackagesAvailable(4),
            LinkEvent::StatusChanged(LinkStatus::Ready),
        ]
    );

    let ids: Vec<&str> = link.packages().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "idgames.levels.doom.av",
            "idgames.levels.doom.chex_quest",
            "idgames.levels.doom2.1monster",
            "idgames.utils.deutex",
        ]
    );
}

#[test]
fn test_find_packages() {
    let link = ready_link();

    let doom: Vec<String> = link
        .find_packages(r"\.levels\.doom\.")
        .unwrap()
        .into_iter()
        .map(|p| p.versioned_id())
        .collect();
    assert_eq!(
        doom,
        vec![
            "idgames.levels.doom.av_1999.06.14",
            "idgames.levels.doom.chex_quest_2001.01.03",
        ]
    );

    assert_eq!(link.find_packages("DEUTEX").unwrap().len(), 1);
    assert!(link.find_packages("nothing-like-this").unwrap().is_empty());
    assert!(matches!(link.find_packages("(unclosed"), Err(LinkError::Pattern(_))));
}

#[test]
fn test_package_metadata_round_trip() {
    let link = ready_link();
    let meta = link.metadata("idgames.levels.doom.av").unwrap();
    assert_eq!(meta.title, "av.zip");
    assert_eq!(meta.version, "1999.06.14");
    assert_eq!(meta.tags, vec!["idgames", "levels", "doom"]);
    assert_eq!(meta.data_files, vec!["levels/doom/a-c/av.zip"]);

    let text = meta.to_info();
    assert_eq!(PackageMetadata::from_info(&text).unwrap(), meta);
    assert!(link.metadata("idgames.unknown").is_none());
}

#[test]
fn test_handle_error_disconnects() {
    let mut link = ready_link();
    link.poll();

    link.handle_error("mirror went away");
    assert_eq!(link.status(), LinkStatus::Disconnected);
    assert_eq!(link.last_error().as_deref(), Some("mirror went away"));
    assert_eq!(link.packages().count(), 0);
    assert_eq!(
        link.poll(),
        vec![
            LinkEvent::Failed("mirror went away".into()),
            LinkEvent::StatusChanged(LinkStatus::Disconnected),
        ]
    );
}

#[test]
fn test_unreachable_mirror_reports_failure() {
    // Nothing listens on the discard port
    let mut link = IdgamesLink::new(LinkConfig {
        listing_url: "http://127.0.0.1:9/ls-laR.gz".into(),
        timeout: Duration::from_secs(5),
        ..LinkConfig::default()
    });
    link.connect().unwrap();
    assert_eq!(link.status(), LinkStatus::Loading);
    assert!(matches!(link.connect(), Err(LinkError::AlreadyLoading)));

    let deadline = Instant::now() + Duration::from_secs(15);
    let mut events = Vec::new();
    while link.status() == LinkStatus::Loading && Instant::now() < deadline {
        events.extend(link.poll());
        std::thread::sleep(Duration::from_millis(20));
    }
    events.extend(link.poll());

    assert_eq!(link.status(), LinkStatus::Disconnected);
    assert!(events.iter().any(|e| matches!(e, LinkEvent::Failed(_))));
    assert!(link.last_error().is_some());
}

/// Serve `body` once over plain HTTP; the receiver fires after the response
/// has been written
fn serve_once(body: Vec<u8>) -> (String, crossbeam_channel::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/ls-laR.gz", listener.local_addr().unwrap());
    let (served_tx, served) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/gzip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(header.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();
        let _ = served_tx.send(());
    });
    (url, served)
}

fn http_link(url: String) -> IdgamesLink {
    IdgamesLink::new(LinkConfig {
        listing_url: url,
        reference_year: Some(2023),
        timeout: Duration::from_secs(5),
    })
}

#[test]
fn test_listing_fetched_over_http() {
    let (url, _served) = serve_once(gzip(LISTING));
    let mut link = http_link(url);
    link.connect().unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while link.status() == LinkStatus::Loading && Instant::now() < deadline {
        events.extend(link.poll());
        std::thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(link.status(), LinkStatus::Ready);
    assert!(events.contains(&LinkEvent::PackagesAvailable(4)));
    assert_eq!(link.bytes_received(), gzip(LISTING).len() as u64);
}

#[test]
fn test_disconnect_wins_over_finished_fetch() {
    let (url, served) = serve_once(gzip(LISTING));
    let mut link = http_link(url);
    link.connect().unwrap();

    served.recv_timeout(Duration::from_secs(10)).unwrap();
    // Give the fetch task time to parse and report
    std::thread::sleep(Duration::from_millis(500));

    link.disconnect();
    let mut events = link.poll();
    std::thread::sleep(Duration::from_millis(100));
    events.extend(link.poll());

    assert_eq!(link.status(), LinkStatus::Disconnected);
    assert_eq!(link.packages().count(), 0);
    assert!(!events
        .iter()
        .any(|e| matches!(e, LinkEvent::PackagesAvailable(_))));
    assert_eq!(events.last(), Some(&LinkEvent::StatusChanged(LinkStatus::Disconnected)));
}
