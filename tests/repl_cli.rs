use assert_cmd::Command;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const PROMPT: &str = "triplesh> ";
const CONTINUATION_PROMPT: &str = "      ... ";

struct Shell {
    dir: TempDir,
}

impl Shell {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Shell { dir }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("triplesh").unwrap();
        cmd.arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .env("RUST_LOG", "off");
        cmd
    }

    fn run(&self, args: &[&str], input: &str) -> (i32, String, String) {
        let output = self.command().args(args).write_stdin(input).output().unwrap();
        (
            output.status.code().unwrap_or(-1),
            String::from_utf8(output.stdout).unwrap(),
            String::from_utf8(output.stderr).unwrap(),
        )
    }
}

fn quads_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_immediate_eof_prints_single_prompt() {
    let shell = Shell::new("");
    let (code, stdout, _) = shell.run(&[], "");
    assert_eq!(code, 0);
    assert_eq!(stdout, PROMPT);
}

#[test]
fn test_added_quads_are_queryable() {
    let shell = Shell::new("");
    let input = concat!(
        ":a <alice> <follows> <bob> .\n",
        ":a <alice> <follows> <charlie> .\n",
        "g.V(\"alice\").Out(\"follows\").All()\n",
    );
    let (code, stdout, _) = shell.run(&[], input);
    assert_eq!(code, 0);

    let expected_head = format!(
        "{p}{p}{p}id : bob\nid : charlie\n-----------\n2 Results\nElapsed time: ",
        p = PROMPT
    );
    assert!(stdout.starts_with(&expected_head), "unexpected output: {}", stdout);
    assert!(stdout.ends_with(&format!(" ms\n\n{}", PROMPT)));
}

#[test]
fn test_deleted_quad_no_longer_matches() {
    let shell = Shell::new("");
    let input = concat!(
        ":a <alice> <follows> <bob> .\n",
        ":d <alice> <follows> <bob> .\n",
        "g.V(\"alice\").Out(\"follows\").All()\n",
    );
    let (_, stdout, _) = shell.run(&[], input);
    assert_eq!(stdout, PROMPT.repeat(4));
}

#[test]
fn test_commands_and_invalid_quads() {
    let shell = Shell::new("");
    let (code, stdout, _) = shell.run(&[], ":debug\n:a garbage\n:debug\n");
    assert_eq!(code, 0);

    let transcript = stdout.replace(PROMPT, "[prompt]\n");
    insta::assert_snapshot!(transcript, @r"
    [prompt]
    Debug toggled: on
    [prompt]
    Not a valid quad.
    [prompt]
    Debug toggled: off
    [prompt]
    ");
}

#[test]
fn test_multi_line_query_uses_continuation_prompt() {
    let shell = Shell::new("");
    let input = ":a <alice> <follows> <bob> .\ng.V(\"alice\").\nOut(\"follows\").All()\n";
    let (_, stdout, _) = shell.run(&[], input);
    assert!(stdout.starts_with(&format!(
        "{p}{p}{c}id : bob\n-----------\n1 Results\n",
        p = PROMPT,
        c = CONTINUATION_PROMPT
    )));
}

#[test]
fn test_syntax_error_is_reported_and_loop_continues() {
    let shell = Shell::new("");
    let (code, stdout, _) = shell.run(&[], "h.V()\n:debug\n");
    assert_eq!(code, 0);
    assert!(stdout.starts_with(&format!("{}Error: ", PROMPT)));
    assert!(stdout.ends_with(&format!("{p}Debug toggled: on\n{p}", p = PROMPT)));
}

#[test]
fn test_prompts_are_aligned() {
    assert_eq!(PROMPT.len(), CONTINUATION_PROMPT.len());
    assert!(PROMPT.ends_with("> ") && CONTINUATION_PROMPT.ends_with("... "));
}

#[test]
fn test_blank_input_and_missing_vertex_stay_quiet() {
    let shell = Shell::new("");
    let (code, stdout, _) = shell.run(&[], " \ng.V(\"nobody\").All()\ng.V(\"nobody\").Count()\n");
    assert_eq!(code, 0);
    assert!(stdout.starts_with(&format!(
        "{p}{p}{p}=> 0\n-----------\n1 Results\nElapsed time: ",
        p = PROMPT
    )));
    assert!(stdout.ends_with(&format!(" ms\n\n{}", PROMPT)));
    assert!(!stdout.contains(CONTINUATION_PROMPT));
    assert!(!stdout.contains("nobody"));
}

#[test]
fn test_incomplete_statement_at_eof_is_discarded() {
    let shell = Shell::new("");
    let (code, stdout, _) = shell.run(&[], "g.V(\"alice\"\n");
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        format!(
            "{}{}\nDiscarding incomplete statement.\n{}",
            PROMPT, CONTINUATION_PROMPT, PROMPT
        )
    );
}

#[test]
fn test_overlong_line_is_fatal() {
    let shell = Shell::new("");
    let input = format!("{}\n", "x".repeat(10_000));
    let (code, stdout, stderr) = shell.run(&[], &input);
    assert_eq!(code, 1);
    assert_eq!(stdout, PROMPT);
    assert!(stderr.contains("Line too long"));
}

#[test]
fn test_load_file_and_sexp_language() {
    let shell = Shell::new("");
    let quads = quads_file(&[
        "# people",
        "<alice> <follows> <bob> .",
        "<bob> <status> \"cool person\" .",
        "",
    ]);
    let path = quads.path().to_str().unwrap();
    let input = "(match (?who <follows> ?x)\n(?x <status> ?s))\n";
    let (code, stdout, _) = shell.run(&["--lang", "sexp", "--load", path], input);
    assert_eq!(code, 0);
    assert!(stdout.starts_with(&format!(
        "{}{}?who = alice, ?x = bob, ?s = cool person\n-----------\n1 Results\n",
        PROMPT, CONTINUATION_PROMPT
    )));
}

#[test]
fn test_language_from_config_file() {
    let shell = Shell::new("[session]\nlanguage = \"mql\"\n");
    let input = ":a <alice> <follows> <bob> .\n{\"id\": null, \"follows\": \"bob\"}\n";
    let (_, stdout, _) = shell.run(&[], input);
    assert!(stdout.starts_with(&format!(
        "{p}{p}{{\"id\":\"alice\",\"follows\":\"bob\"}}\n-----------\n1 Results\n",
        p = PROMPT
    )));
}

#[test]
fn test_command_line_overrides_config_language() {
    let shell = Shell::new("[session]\nlanguage = \"mql\"\n");
    let input = ":a <alice> <follows> <bob> .\ng.V(\"alice\").Out(\"follows\").Count()\n";
    let (_, stdout, _) = shell.run(&["--lang", "gremlin"], input);
    assert!(stdout.contains("=> 1\n-----------\n1 Results\n"));
}

#[test]
fn test_unknown_language_falls_back_to_gremlin() {
    let shell = Shell::new("");
    let input = ":a <alice> <follows> <bob> .\ng.V(\"alice\").Out(\"follows\").All()\n";
    let (code, stdout, _) = shell.run(&["--lang", "Gremlin"], input);
    assert_eq!(code, 0);
    assert!(stdout.contains("id : bob\n"));
}

#[test]
fn test_missing_load_file_exits_before_prompt() {
    let shell = Shell::new("");
    let missing = shell.dir.path().join("missing.nq");
    let (code, stdout, stderr) = shell.run(&["--load", missing.to_str().unwrap()], "");
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Failed to load"));
}
