use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const FASTA: &str = ">seq1 first\nACGT\nAC\n\n>seq2\nGGGG\n";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gb_limit_size"))
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Could not start gb_limit_size");
    // The child may exit before reading its input (e.g. on a usage error)
    let _ = child.stdin.take().unwrap().write_all(input.as_bytes());
    child.wait_with_output().unwrap()
}

#[test]
fn test_truncates_stdin() {
    let out = run_with_stdin(&["5"], FASTA);
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), ">seq1 first\nACGT\nAC\n");
}

#[test]
fn test_large_limit_copies_everything_but_blank_lines() {
    let out = run_with_stdin(&["1000000"], FASTA);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        ">seq1 first\nACGT\nAC\n>seq2\nGGGG\n"
    );
}

#[test]
fn test_file_input_and_output() -> std::io::Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("genome.fa");
    let output = dir.path().join("limited.fa");
    std::fs::write(&input, FASTA)?;

    let out = Command::new(bin())
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("4")
        .output()?;
    assert!(out.status.success());
    assert_eq!(
        std::fs::read_to_string(&output)?,
        ">seq1 first\nACGT\nAC\n"
    );
    Ok(())
}

#[test]
fn test_bad_limit_fails() {
    let out = run_with_stdin(&["many"], FASTA);
    assert!(!out.status.success());
}

#[test]
fn test_header_without_name_copied() {
    let out = run_with_stdin(&["100"], ">\nACGT\n> \nGG\n");
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), ">\nACGT\n>\nGG\n");
}
