//! End-to-end pipeline tests against a mocked listing site and registry

use std::fs;
use std::io::Write;
use std::path::Path;

use sha1::{Digest, Sha1};
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vetch_config::Config;
use vetch_core::error::VetchError;
use vetch_harvest::Harvester;

fn listing_page(names: &[&str]) -> String {
    let anchors: String = names
        .iter()
        .map(|name| {
            format!(
                r#"<li><a class="name" href="/package/{name}">{name}</a></li>"#,
                name = name
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", anchors)
}

fn gz_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        for (file_path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(file_path).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, contents.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }

    let mut gz_bytes = Vec::new();
    {
        let mut encoder =
            flate2::write::GzEncoder::new(&mut gz_bytes, flate2::Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap();
    }
    gz_bytes
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn tarball_slug(name: &str) -> String {
    name.replace('@', "").replace('/', "-")
}

/// Mount a packument and its tarball for one package
async fn mount_package(server: &MockServer, name: &str, version: &str, shasum: Option<&str>) {
    let tarball = gz_tarball(&[
        (
            "package/package.json",
            &format!(r#"{{"name":"{}","version":"{}"}}"#, name, version),
        ),
        ("package/index.js", "module.exports = {};"),
    ]);

    let tarball_path = format!("/tarballs/{}.tgz", tarball_slug(name));
    let shasum_value = match shasum {
        Some(explicit) => serde_json::json!(explicit),
        None => serde_json::json!(sha1_hex(&tarball)),
    };

    let packument = serde_json::json!({
        "name": name,
        "dist-tags": { "latest": version },
        "versions": {
            version: {
                "version": version,
                "dist": {
                    "tarball": format!("{}{}", server.uri(), tarball_path),
                    "shasum": shasum_value
                }
            }
        }
    });

    // Scoped names hit the registry with the slash percent-encoded; mount
    // both spellings so the test does not depend on the mock server's
    // decoding behavior.
    let encoded = format!("/{}", name.replace('/', "%2f"));
    Mock::given(method("GET"))
        .and(path(encoded))
        .respond_with(ResponseTemplate::new(200).set_body_json(packument.clone()))
        .mount(server)
        .await;
    if name.contains('/') {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(packument))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(tarball_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tarball))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer, target: &Path) -> Config {
    Config {
        package_url: format!("{}/browse/depended?offset=", server.uri()),
        registry_url: server.uri(),
        target_directory: target.to_path_buf(),
        async_limit: 4,
        scrape_limit: 1,
        verbosity: 0,
    }
}

/// Count downloaded packages the way the target layout defines them:
/// top-level directories, with `@scope` directories counted as their
/// nested entries.
fn count_packages(target: &Path) -> usize {
    let mut count = 0;
    for entry in fs::read_dir(target).unwrap() {
        let entry = entry.unwrap();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if name.starts_with('@') {
            count += fs::read_dir(entry.path()).unwrap().count();
        } else {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_run_downloads_exactly_count_packages() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .and(query_param("offset", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["lodash", "@scope/pkg"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .and(query_param("offset", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["express", "minimist"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_package(&server, "lodash", "4.17.21", None).await;
    mount_package(&server, "@scope/pkg", "1.2.3", None).await;
    mount_package(&server, "express", "4.18.2", None).await;

    let config = test_config(&server, target.path());
    let harvester = Harvester::new(&config).unwrap();
    let summary = harvester.run(3).await.unwrap();

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.downloaded, 3);
    assert_eq!(count_packages(target.path()), 3);

    // Unscoped and scoped layouts
    assert!(target.path().join("lodash/index.js").exists());
    assert!(target.path().join("express/package.json").exists());
    assert!(target.path().join("@scope/pkg/index.js").exists());
}

#[tokio::test]
async fn test_run_with_count_zero_touches_nothing() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();
    let target_dir = target.path().join("packages");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["a"])))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &target_dir);
    let harvester = Harvester::new(&config).unwrap();
    let summary = harvester.run(0).await.unwrap();

    assert_eq!(summary.downloaded, 0);
    assert!(!target_dir.exists());
}

#[tokio::test]
async fn test_resolution_failure_propagates_first_error() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["alpha", "ghost"])))
        .mount(&server)
        .await;

    mount_package(&server, "alpha", "1.0.0", None).await;
    Mock::given(method("GET"))
        .and(path("/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server, target.path());
    let harvester = Harvester::new(&config).unwrap();
    let result = harvester.run(2).await;

    match result.unwrap_err() {
        VetchError::PackageNotFound { name } => assert_eq!(name, "ghost"),
        other => panic!("Expected PackageNotFound, got {:?}", other),
    }
    // The download stage never ran
    assert!(!target.path().join("alpha").exists());
}

#[tokio::test]
async fn test_download_failure_propagates() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["broken"])))
        .mount(&server)
        .await;

    let packument = serde_json::json!({
        "name": "broken",
        "dist-tags": { "latest": "1.0.0" },
        "versions": {
            "1.0.0": {
                "version": "1.0.0",
                "dist": {
                    "tarball": format!("{}/tarballs/broken.tgz", server.uri()),
                    "shasum": null
                }
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(packument))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tarballs/broken.tgz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server, target.path());
    let harvester = Harvester::new(&config).unwrap();
    let result = harvester.run(1).await;

    assert!(matches!(result.unwrap_err(), VetchError::Network { .. }));
}

#[tokio::test]
async fn test_corrupted_tarball_fails_checksum() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["tainted"])))
        .mount(&server)
        .await;

    // Shasum that cannot match the served bytes
    mount_package(
        &server,
        "tainted",
        "1.0.0",
        Some("0000000000000000000000000000000000000000"),
    )
    .await;

    let config = test_config(&server, target.path());
    let harvester = Harvester::new(&config).unwrap();
    let result = harvester.run(1).await;

    match result.unwrap_err() {
        VetchError::ChecksumMismatch { package, .. } => assert_eq!(package, "tainted"),
        other => panic!("Expected ChecksumMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_discover_lists_without_downloading() {
    let server = MockServer::start().await;
    let target = tempdir().unwrap();
    let target_dir = target.path().join("packages");

    Mock::given(method("GET"))
        .and(path("/browse/depended"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["a", "b", "c"])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, &target_dir);
    let harvester = Harvester::new(&config).unwrap();
    let names = harvester.discover(2).await.unwrap();

    assert_eq!(names, vec!["a", "b"]);
    assert!(!target_dir.exists());
}
