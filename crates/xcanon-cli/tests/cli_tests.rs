use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const FILE_A: &str = r#"<?xml version="1.0"?>
<complaintsRoot>
  <complaint id="30" status="Open">
    <submitted via="Web"/>
    <response timely="Yes" consumerDisputed="no"/>
  </complaint>
  <complaint id="2">
    <response consumerDisputed="N" timely="y"/>
  </complaint>
</complaintsRoot>
"#;

const FILE_B: &str = r#"<complaintsRoot><complaint id="2"><response timely="Y" consumerDisputed="N"/></complaint><complaint status="Open" id="30"><response consumerDisputed="NO" timely="YES"/><submitted via="Web"/></complaint></complaintsRoot>"#;

#[test]
fn equivalent_inputs_report_match_and_write_canonical_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file_a = dir.path().join("a.xml");
    let file_b = dir.path().join("b.xml");
    let output = dir.path().join("canonical.xml");
    fs::write(&file_a, FILE_A)?;
    fs::write(&file_b, FILE_B)?;

    Command::cargo_bin("xcanon")?
        .arg(&file_a)
        .arg(&file_b)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("checksum equal: true"))
        .stdout(predicate::str::contains("binary equal  : true"));

    let written = fs::read_to_string(&output)?;
    assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(written.contains("submissionType=\"Web\""));
    Ok(())
}

#[test]
fn differing_inputs_fail_without_writing_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file_a = dir.path().join("a.xml");
    let file_b = dir.path().join("b.xml");
    let output = dir.path().join("canonical.xml");
    fs::write(&file_a, FILE_A)?;
    fs::write(
        &file_b,
        "<complaintsRoot><complaint id=\"2\"><response timely=\"N\"/></complaint></complaintsRoot>",
    )?;

    Command::cargo_bin("xcanon")?
        .arg(&file_a)
        .arg(&file_b)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("binary equal  : false"))
        .stderr(predicate::str::contains("documents differ"));

    assert!(!output.exists());
    Ok(())
}

#[test]
fn malformed_input_names_the_offending_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file_a = dir.path().join("broken.xml");
    let file_b = dir.path().join("b.xml");
    fs::write(&file_a, "<complaintsRoot><complaint id=")?;
    fs::write(&file_b, FILE_B)?;

    Command::cargo_bin("xcanon")?
        .arg(&file_a)
        .arg(&file_b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.xml"));
    Ok(())
}

#[test]
fn missing_file_fails_with_context() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file_b = dir.path().join("b.xml");
    fs::write(&file_b, FILE_B)?;

    Command::cargo_bin("xcanon")?
        .arg(dir.path().join("nope.xml"))
        .arg(&file_b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.xml"));
    Ok(())
}
