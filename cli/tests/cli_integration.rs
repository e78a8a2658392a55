use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn ntto_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ntto"))
}

fn tmp_dir(name: &str) -> PathBuf {
    let mut base = std::env::temp_dir();
    base.push(format!("ntto-cli-{}-{}", name, std::process::id()));
    if base.exists() {
        let _ = fs::remove_dir_all(&base);
    }
    fs::create_dir_all(&base).unwrap();
    base
}

fn write_nt(dir: &PathBuf, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write nt");
    path
}

fn ntto(args: &[&str]) -> Output {
    Command::new(ntto_bin())
        .env_remove("NTTO_LOG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run ntto")
}

const SAMPLE: &str = "\
<http://dbpedia.org/resource/Berlin> <http://dbpedia.org/ontology/country> <http://dbpedia.org/resource/Germany> .
<http://dbpedia.org/resource/Berlin> <http://xmlns.com/foaf/0.1/name> \"Berlin\" .
";

#[test]
fn json_output_is_abbreviated() {
    let root = tmp_dir("json");
    let input = write_nt(&root, "in.nt", SAMPLE);
    let out = ntto(&["-a", "-j", "-w", "2", "--ordered", input.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["s"], "dbp:Berlin");
    assert_eq!(records[0]["p"], "dbpo:country");
    assert_eq!(records[1]["o"], "Berlin");
}

#[test]
fn writes_to_output_file() {
    let root = tmp_dir("outfile");
    let input = write_nt(&root, "in.nt", SAMPLE);
    let output = root.join("out.nt");
    let out = ntto(&[
        "-a",
        "-o",
        output.to_str().unwrap(),
        "-w",
        "1",
        input.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "<dbp:Berlin> <dbpo:country> <dbp:Germany> .\n<dbp:Berlin> <foaf:name> \"Berlin\" .\n"
    );
}

#[test]
fn broken_line_fails_with_its_own_exit_code() {
    let root = tmp_dir("strict");
    let input = write_nt(&root, "in.nt", &format!("{}broken line\n", SAMPLE));
    let out = ntto(&["-j", input.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 3"), "stderr: {}", stderr);
}

#[test]
fn ignore_mode_skips_broken_line() {
    let root = tmp_dir("ignore");
    let input = write_nt(&root, "in.nt", &format!("broken\n{}", SAMPLE));
    let out = ntto(&["-i", "-f", "tsv", input.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn unknown_format_exits_before_reading() {
    let out = ntto(&["-f", "yaml", "does-not-matter.nt"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&out.stderr).contains("yaml"));
}

#[test]
fn missing_input_is_an_io_error() {
    let root = tmp_dir("missing");
    let missing = root.join("nope.nt");
    let out = ntto(&[missing.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&out.stderr).contains("nope.nt"));
}

#[test]
fn malformed_rules_file_exits_with_rule_code() {
    let root = tmp_dir("badrules");
    let rules = root.join("rules.txt");
    fs::write(&rules, "gnd http://d-nb.info/gnd/\nlonely\n").unwrap();
    let out = ntto(&["-r", rules.to_str().unwrap(), "-d"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn dump_rules_prints_sorted_table() {
    let root = tmp_dir("dump");
    let rules = root.join("rules.txt");
    fs::write(&rules, "# custom\nviaf http://viaf.org/viaf/\ngnd http://d-nb.info/gnd/\n").unwrap();
    let out = ntto(&["-d", "-r", rules.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "gnd\thttp://d-nb.info/gnd/\nviaf\thttp://viaf.org/viaf/\n"
    );
}

#[test]
fn reads_standard_input() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(ntto_bin())
        .args(["-a", "-f", "tsv", "-w", "1", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn ntto");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(SAMPLE.as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "dbp:Berlin\tdbpo:country\tdbp:Germany\ndbp:Berlin\tfoaf:name\tBerlin\n"
    );
}

#[test]
fn version_flag() {
    let out = ntto(&["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn dump_command_prints_substitution_pipeline() {
    let root = tmp_dir("dumpcmd");
    let rules = root.join("rules.txt");
    fs::write(&rules, "gnd http://d-nb.info/gnd/\n").unwrap();
    let input = write_nt(&root, "in.nt", SAMPLE);
    let output = root.join("out.nt");
    let out = ntto(&[
        "-a",
        "--external",
        "-c",
        "-r",
        rules.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    match ntto::Executive::detect() {
        Some(executive) => {
            assert!(out.status.success());
            let stdout = String::from_utf8(out.stdout).unwrap();
            let expected = match executive {
                ntto::Executive::Perl => format!(
                    "LANG=C perl -lnpe 's@\\Qhttp://d-nb.info/gnd/\\E@gnd:@g' < '{}' > '{}'\n",
                    input.display(),
                    output.display()
                ),
                ntto::Executive::Replace => format!(
                    "replace 'http://d-nb.info/gnd/' 'gnd:' < '{}' > '{}'\n",
                    input.display(),
                    output.display()
                ),
            };
            assert_eq!(stdout, expected);
            // printing the command must not run it
            assert!(!output.exists());
        }
        None => assert_eq!(out.status.code(), Some(7)),
    }
}

#[test]
fn external_rejects_structured_output() {
    let root = tmp_dir("extjson");
    let input = write_nt(&root, "in.nt", SAMPLE);
    let out = ntto(&["--external", "-j", input.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(7));
}

#[test]
fn unknown_format_in_config_file() {
    let root = tmp_dir("cfgformat");
    let config = root.join("ntto.json");
    fs::write(&config, r#"{"format": "yaml"}"#).unwrap();
    let input = write_nt(&root, "in.nt", SAMPLE);
    let out = ntto(&["--config", config.to_str().unwrap(), input.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(4));
}
