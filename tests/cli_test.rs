mod common;

use chaincat::crypto::TAG_LEN;
use common::{flat_chain, sample, sharded_chain};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

const BLOCK: usize = 128;

fn run(bin: &str, args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let mut pipe = child.stdin.take().unwrap();
    let input = stdin.to_vec();
    let writer = std::thread::spawn(move || {
        // The tool may exit before reading everything.
        let _ = pipe.write_all(&input);
    });
    let output = child.wait_with_output().unwrap();
    writer.join().unwrap();
    output
}

fn path_arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

fn write_key(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("key");
    std::fs::write(&path, [0x5a; 48]).unwrap();
    path
}

#[test]
fn version_flag_exits_zero() {
    for (bin, name) in [
        (env!("CARGO_BIN_EXE_chain-cat"), "chain-cat"),
        (env!("CARGO_BIN_EXE_shard-cat"), "shard-cat"),
        (env!("CARGO_BIN_EXE_chain-decrypt"), "chain-decrypt"),
        (env!("CARGO_BIN_EXE_chain-encrypt"), "chain-encrypt"),
    ] {
        let out = run(bin, &["--version"], b"");
        assert!(out.status.success());
        let stdout = String::from_utf8(out.stdout).unwrap();
        assert!(stdout.starts_with(name), "{stdout}");
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn missing_or_extra_arguments_fail_with_usage() {
    let out = run(env!("CARGO_BIN_EXE_chain-cat"), &[], b"");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));

    let out = run(env!("CARGO_BIN_EXE_chain-decrypt"), &["a", "b"], b"");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
}

#[test]
fn chain_cat_streams_and_reports() {
    let dir = tempdir().unwrap();
    let data = sample(3 * BLOCK + 11);
    let chain = flat_chain(dir.path(), &data, BLOCK);

    let out = run(
        env!("CARGO_BIN_EXE_chain-cat"),
        &[path_arg(dir.path()), "--block-len", "128", "--summary"],
        chain.to_string().as_bytes(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(out.stdout, data);

    let report: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(report["framing"], "exact");
    assert_eq!(report["bytes"], data.len() as u64);
    assert_eq!(report["digest"], chain.trailer.digest.to_hex());
}

#[test]
fn chain_cat_failure_is_diagnosed() {
    let dir = tempdir().unwrap();
    let mut chain = flat_chain(dir.path(), &sample(BLOCK), BLOCK);
    chain.trailer.digest = chaincat::Digest::of(b"something else");

    let out = run(
        env!("CARGO_BIN_EXE_chain-cat"),
        &[path_arg(dir.path()), "--block-len", "128"],
        chain.to_string().as_bytes(),
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("chain-cat: hash mismatch"), "{stderr}");
}

#[test]
fn missing_store_directory_fails() {
    let dir = tempdir().unwrap();
    let absent = dir.path().join("absent");
    let out = run(env!("CARGO_BIN_EXE_shard-cat"), &[path_arg(&absent)], b"");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a directory"));
}

#[test]
fn sharded_store_into_decrypt_pipeline() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("store");
    std::fs::create_dir(&store).unwrap();
    let key = write_key(dir.path());
    let plain = sample(5 * (BLOCK - TAG_LEN) + 7);

    let sealed = run(
        env!("CARGO_BIN_EXE_chain-encrypt"),
        &[path_arg(&key), "--block-len", "128"],
        &plain,
    );
    assert!(sealed.status.success());
    assert_eq!(sealed.stdout.len(), plain.len() + 6 * TAG_LEN);

    let chain = sharded_chain(&store, &sealed.stdout, BLOCK);
    let cat = run(
        env!("CARGO_BIN_EXE_shard-cat"),
        &[path_arg(&store), "--block-len", "128"],
        chain.to_string().as_bytes(),
    );
    assert!(cat.status.success(), "{}", String::from_utf8_lossy(&cat.stderr));
    assert_eq!(cat.stdout, sealed.stdout);

    let opened = run(
        env!("CARGO_BIN_EXE_chain-decrypt"),
        &[path_arg(&key), "--block-len", "128", "--summary"],
        &cat.stdout,
    );
    assert!(opened.status.success(), "{}", String::from_utf8_lossy(&opened.stderr));
    assert_eq!(opened.stdout, plain);
    let report: serde_json::Value = serde_json::from_slice(&opened.stderr).unwrap();
    assert_eq!(report["chunks"], 6);
    assert_eq!(report["cipher"], "chacha20-poly1305");
}

#[test]
fn decrypt_rejects_tampering_and_short_keys() {
    let dir = tempdir().unwrap();
    let key = write_key(dir.path());
    let sealed = run(env!("CARGO_BIN_EXE_chain-encrypt"), &[path_arg(&key)], b"attack at dawn");
    let mut bad = sealed.stdout.clone();
    bad[0] ^= 0x01;

    let out = run(env!("CARGO_BIN_EXE_chain-decrypt"), &[path_arg(&key)], &bad);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("chunk 0"));

    let short = dir.path().join("short");
    std::fs::write(&short, [1u8; 8]).unwrap();
    let out = run(env!("CARGO_BIN_EXE_chain-decrypt"), &[path_arg(&short)], &sealed.stdout);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("keyfile"));
}
