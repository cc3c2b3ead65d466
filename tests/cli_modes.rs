//! CLI surface tests for the three modes.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn enc_dir_cmd() -> Command {
    Command::cargo_bin("enc-dir").expect("binary built")
}

#[test]
fn cli_encrypt_decrypt_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let td = assert_fs::TempDir::new()?;
    let source = td.child("src");
    source.child("a.txt").write_str("hello cli")?;
    source.child("sub/b.bin").write_binary(&[5u8; 2048])?;
    let artifacts = td.child("enc");
    let restored = td.child("restored");

    enc_dir_cmd()
        .args(["encrypt", "-s"])
        .arg(source.path())
        .args(["-o"])
        .arg(artifacts.path())
        .args(["-p", "pw"])
        .assert()
        .success();

    artifacts
        .child("00000000000000000000000000000001.data")
        .assert(predicate::path::is_file());

    enc_dir_cmd()
        .args(["decrypt", "-s"])
        .arg(artifacts.path())
        .args(["-o"])
        .arg(restored.path())
        .args(["-p", "pw"])
        .assert()
        .success();

    restored.child("a.txt").assert("hello cli");
    assert_eq!(fs::read(restored.child("sub/b.bin").path())?, [5u8; 2048]);
    td.close()?;
    Ok(())
}

#[test]
fn cli_wrong_password_fails() -> Result<(), Box<dyn std::error::Error>> {
    let td = assert_fs::TempDir::new()?;
    let source = td.child("src");
    source.child("a.txt").write_str("secret")?;
    let artifacts = td.child("enc");

    enc_dir_cmd()
        .args(["encrypt", "-s"])
        .arg(source.path())
        .args(["-o"])
        .arg(artifacts.path())
        .args(["-p", "pw"])
        .assert()
        .success();

    enc_dir_cmd()
        .args(["decrypt", "-s"])
        .arg(artifacts.path())
        .args(["-o"])
        .arg(td.child("restored").path())
        .args(["-p", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decrypt data"));

    td.close()?;
    Ok(())
}

#[test]
fn cli_validate_reports_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let td = assert_fs::TempDir::new()?;
    let source = td.child("src");
    source.child("a.txt").write_str("validate me")?;
    let artifacts = td.child("enc");
    let restored = td.child("restored");

    enc_dir_cmd()
        .args(["encrypt", "-s"])
        .arg(source.path())
        .args(["-o"])
        .arg(artifacts.path())
        .args(["-p", "pw"])
        .assert()
        .success();
    enc_dir_cmd()
        .args(["decrypt", "-s"])
        .arg(artifacts.path())
        .args(["-o"])
        .arg(restored.path())
        .args(["-p", "pw"])
        .assert()
        .success();

    // Intact tree validates cleanly.
    enc_dir_cmd()
        .args(["validate", "-s"])
        .arg(artifacts.path())
        .args(["-o"])
        .arg(restored.path())
        .args(["-p", "pw"])
        .assert()
        .success();

    // One flipped byte must be reported.
    restored.child("a.txt").write_str("validate mE")?;
    enc_dir_cmd()
        .args(["validate", "-s"])
        .arg(artifacts.path())
        .args(["-o"])
        .arg(restored.path())
        .args(["-p", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("filedata doesn't match"));

    td.close()?;
    Ok(())
}

#[test]
fn cli_missing_source_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let td = assert_fs::TempDir::new()?;

    enc_dir_cmd()
        .args(["encrypt", "-s"])
        .arg(td.child("does-not-exist").path())
        .args(["-o"])
        .arg(td.child("enc").path())
        .args(["-p", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("doesn't exist"));

    td.close()?;
    Ok(())
}

#[test]
fn cli_raw_key_rejects_bad_length() -> Result<(), Box<dyn std::error::Error>> {
    let td = assert_fs::TempDir::new()?;
    let source = td.child("src");
    source.child("a.txt").write_str("x")?;

    enc_dir_cmd()
        .args(["encrypt", "-s"])
        .arg(source.path())
        .args(["-o"])
        .arg(td.child("enc").path())
        .args(["-k", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32 bytes"));

    td.close()?;
    Ok(())
}
