use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile;

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn write_fixture(dir: &std::path::Path,name: &str,contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path,contents).unwrap();
    path
}

fn pack_and_unpack(method: &str) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let a = write_fixture(temp_dir.path(),"a.txt",b"the quick brown fox jumps over the lazy dog");
    let b = write_fixture(temp_dir.path(),"b.bin",&[]);
    let c = write_fixture(temp_dir.path(),"c.dat",&vec![0x42;500]);
    let archive_path = temp_dir.path().join("out.box");

    Command::cargo_bin("retrobox")?
        .arg("pack")
        .arg("-m").arg(method)
        .arg("-a").arg(&archive_path)
        .arg(&a).arg(&b).arg(&c)
        .assert()
        .success();

    assert!(archive_path.exists());

    let restore_dir = temp_dir.path().join("restored");
    Command::cargo_bin("retrobox")?
        .arg("unpack")
        .arg("-a").arg(&archive_path)
        .arg("-o").arg(&restore_dir)
        .assert()
        .success();

    assert_eq!(std::fs::read(restore_dir.join("a.txt"))?,std::fs::read(a)?);
    assert_eq!(std::fs::read(restore_dir.join("b.bin"))?,std::fs::read(b)?);
    assert_eq!(std::fs::read(restore_dir.join("c.dat"))?,std::fs::read(c)?);
    Ok(())
}

#[test]
fn round_trips_static_huffman() -> STDRESULT {
    pack_and_unpack("static-huffman")
}

#[test]
fn round_trips_adaptive_huffman() -> STDRESULT {
    pack_and_unpack("adaptive-huffman")
}

#[test]
fn round_trips_lz77() -> STDRESULT {
    pack_and_unpack("lz77")
}

#[test]
fn round_trips_lz78() -> STDRESULT {
    pack_and_unpack("lz78")
}

#[test]
fn rejects_unknown_method() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let a = write_fixture(temp_dir.path(),"a.txt",b"hello");
    let archive_path = temp_dir.path().join("out.box");

    Command::cargo_bin("retrobox")?
        .arg("pack")
        .arg("-m").arg("not-a-real-method")
        .arg("-a").arg(&archive_path)
        .arg(&a)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn no_overwrite_refuses_to_clobber_existing_output() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let a = write_fixture(temp_dir.path(),"a.txt",b"hello");
    let archive_path = temp_dir.path().join("out.box");
    let restore_dir = temp_dir.path().join("restored");

    Command::cargo_bin("retrobox")?
        .arg("pack")
        .arg("-m").arg("lz78")
        .arg("-a").arg(&archive_path)
        .arg(&a)
        .assert()
        .success();

    std::fs::create_dir_all(&restore_dir)?;
    write_fixture(&restore_dir,"a.txt",b"already here");

    Command::cargo_bin("retrobox")?
        .arg("unpack")
        .arg("-a").arg(&archive_path)
        .arg("-o").arg(&restore_dir)
        .arg("--no-overwrite")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OutputExists"));

    assert_eq!(std::fs::read(restore_dir.join("a.txt"))?,b"already here");
    Ok(())
}

#[test]
fn rejects_unpacking_a_corrupt_archive() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let archive_path = write_fixture(temp_dir.path(),"bad.box",b"not an archive at all");
    let restore_dir = temp_dir.path().join("restored");

    Command::cargo_bin("retrobox")?
        .arg("unpack")
        .arg("-a").arg(&archive_path)
        .arg("-o").arg(&restore_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("archive"));
    Ok(())
}
