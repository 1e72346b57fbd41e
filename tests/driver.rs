#![cfg(feature = "driver")]

use std::io::Write;

use ostat::driver::{DriverError, open_input, run_probe_set, run_ranked_avl};
use ostat::{OSAvlTree, ProbeHashSet};
use pretty_assertions::assert_eq;

fn probe_transcript(input: impl AsRef<[u8]>) -> String {
    let mut output = Vec::new();
    let mut set = ProbeHashSet::new();
    run_probe_set(input.as_ref(), &mut output, &mut set).unwrap();
    String::from_utf8(output).unwrap()
}

fn ranked_transcript(input: &str) -> Result<String, DriverError> {
    let mut output = Vec::new();
    let mut tree = OSAvlTree::new();
    run_ranked_avl(input.as_bytes(), &mut output, &mut tree)?;
    Ok(String::from_utf8(output).unwrap())
}

// ─── probe-set ───────────────────────────────────────────────────────────────

#[test]
fn probe_set_reference_session() {
    let input = "+ abc\n+ abc\n? abc\n- abc\n? abc\n- abc\n";
    assert_eq!(probe_transcript(input), "OK\nFAIL\nOK\nOK\nFAIL\nFAIL\n");
}

#[test]
fn probe_set_commands_may_share_lines() {
    assert_eq!(probe_transcript("+ x + y ? x\n? z"), "OK\nOK\nOK\nFAIL\n");
}

#[test]
fn probe_set_unknown_operation_fails() {
    assert_eq!(probe_transcript("* abc\n? abc\n"), "FAIL\nFAIL\n");
}

#[test]
fn probe_set_dangling_operation_ends_session() {
    let mut output = Vec::new();
    let mut set = ProbeHashSet::new();
    let answered = run_probe_set("+ a\n+".as_bytes(), &mut output, &mut set).unwrap();
    assert_eq!(answered, 1);
    assert_eq!(output, b"OK\n");
    assert!(set.contains(&b"a"[..]));
}

#[test]
fn probe_set_accepts_non_utf8_values() {
    let input = b"+ a\xff\n? b\n? a\xff\n? a\n- a\xff\n? a\xff\n";
    assert_eq!(probe_transcript(input), "OK\nFAIL\nOK\nFAIL\nOK\nFAIL\n");
}

#[test]
fn probe_set_non_utf8_operation_fails() {
    assert_eq!(probe_transcript(b"\xfe abc\n+ abc\n"), "FAIL\nOK\n");
}

#[test]
fn probe_set_survives_growth() {
    let mut input = String::new();
    for i in 0..100 {
        input.push_str(&format!("+ v{i}\n"));
    }
    for i in 0..100 {
        input.push_str(&format!("? v{i}\n"));
    }
    let transcript = probe_transcript(&input);
    assert_eq!(transcript.lines().filter(|line| *line == "OK").count(), 200);
}

// ─── ranked-avl ──────────────────────────────────────────────────────────────

#[test]
fn ranked_avl_reference_session() {
    assert_eq!(ranked_transcript("3\n1 10\n1 5\n1 20\n").unwrap(), "0\n1\n0\n");
}

#[test]
fn ranked_avl_removal_prints_nothing() {
    let input = "6\n1 10\n1 5\n1 20\n2 0\n1 15\n2 9\n";
    // After removing 20 the tree holds 10 and 5; 15 goes on top.
    assert_eq!(ranked_transcript(input).unwrap(), "0\n1\n0\n0\n");
}

#[test]
fn ranked_avl_negative_keys() {
    assert_eq!(ranked_transcript("3 1 -4 1 -9 1 0").unwrap(), "0\n1\n0\n");
}

#[test]
fn ranked_avl_ignores_trailing_input() {
    assert_eq!(ranked_transcript("1\n1 7\n1 8\n").unwrap(), "0\n");
}

#[test]
fn ranked_avl_missing_count() {
    let error = ranked_transcript("").unwrap_err();
    assert!(matches!(error, DriverError::MissingToken { expected: "command count", .. }));
}

#[test]
fn ranked_avl_truncated_input() {
    let error = ranked_transcript("2\n1 4\n1").unwrap_err();
    assert!(matches!(error, DriverError::MissingToken { line: 3, expected: "key" }));
}

#[test]
fn ranked_avl_invalid_number() {
    let error = ranked_transcript("1\n1 ten\n").unwrap_err();
    assert_eq!(error.to_string(), "line 2: invalid key `ten`");
}

#[test]
fn ranked_avl_non_utf8_number() {
    let mut output = Vec::new();
    let mut tree = OSAvlTree::new();
    let error = run_ranked_avl(&b"1\n1 4\xff\n"[..], &mut output, &mut tree).unwrap_err();
    assert!(matches!(error, DriverError::InvalidNumber { line: 2, expected: "key", .. }));
}

#[test]
fn ranked_avl_unknown_command() {
    let error = ranked_transcript("1\n3 4\n").unwrap_err();
    assert_eq!(error.to_string(), "line 2: unknown command `3`");
}

// ─── Input ───────────────────────────────────────────────────────────────────

#[test]
fn open_input_reads_file() {
    let path = std::env::temp_dir().join(format!("ostat-driver-{}.txt", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"2\n1 3\n1 1\n").unwrap();
    drop(file);

    let reader = open_input(Some(path.as_path())).unwrap();
    let mut output = Vec::new();
    let mut tree = OSAvlTree::new();
    run_ranked_avl(reader, &mut output, &mut tree).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), "0\n1\n");
}

#[test]
fn open_input_missing_file() {
    let path = std::env::temp_dir().join("ostat-driver-does-not-exist.txt");
    assert!(open_input(Some(path.as_path())).is_err());
}
