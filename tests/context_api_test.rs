//! Integration tests for running commands through contexts.
#![cfg(unix)]

use pshell::{
    Capture, Captured, Context, EnvValue, FailureKind, Normalize, Options, ShellError, Signal,
    StdioMode,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

/// Quiet context that captures stdout.
fn quiet() -> Context {
    Context::new().context(
        Options::new()
            .with_echo_command(false)
            .with_capture_output(true),
    )
}

#[tokio::test]
async fn runs_a_command_without_capture() {
    let outcome = Context::new()
        .shell("echo 'echo test'", Options::new().with_echo_command(false))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.code, Some(0));
    assert!(outcome.success());
    assert!(outcome.stdout.is_none());
    assert!(outcome.stderr.is_none());
}

#[tokio::test]
async fn captures_stdout() {
    let outcome = quiet()
        .shell("echo 'stdout test'", Options::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("stdout test\n"));
}

#[tokio::test]
async fn transforms_stdout_as_json() {
    let outcome = quiet()
        .shell(
            r#"echo '{"name": "pshell", "tags": [1, 2]}'"#,
            Options::new().with_capture_output(Capture::json()),
        )
        .await
        .unwrap()
        .unwrap();

    let json = outcome.stdout.as_ref().and_then(Captured::as_json).unwrap();
    assert_eq!(json["name"], "pshell");
    assert_eq!(json["tags"][1], 2);
}

#[tokio::test]
async fn bad_json_is_a_capture_failure() {
    let err = quiet()
        .shell(
            "echo not-json",
            Options::new().with_capture_output(Capture::json()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Capture);
}

#[tokio::test]
async fn feeds_input_content() {
    let outcome = quiet()
        .shell("cat", Options::new().with_input("input test"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("input test"));
}

#[tokio::test]
async fn captures_stderr_separately() {
    let outcome = quiet()
        .shell(
            "cat; echo 'stderr test' >&2",
            Options::new()
                .with_input("stdout test\n")
                .with_capture_error(true),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("stdout test\n"));
    assert_eq!(outcome.stderr_text(), Some("stderr test\n"));
}

#[tokio::test]
async fn failing_command_rejects() {
    let err = quiet().shell("exit 2", Options::new()).await.unwrap_err();

    assert!(matches!(
        err,
        ShellError::ExitFailure {
            code: Some(2),
            ..
        }
    ));
    assert_eq!(err.exit_code(), Some(2));
}

#[tokio::test]
async fn ignore_error_resolves_with_code() {
    let outcome = quiet()
        .shell(
            "echo partial; exit 3",
            Options::new().with_ignore_error(true),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.code, Some(3));
    assert!(!outcome.success());
    assert_eq!(outcome.stdout_text(), Some("partial\n"));
}

#[tokio::test]
async fn missing_program_is_a_transport_failure() {
    let live = quiet().spawn(
        "pshell-test-no-such-program",
        Vec::<String>::new(),
        Options::new(),
    );
    assert!(live.process.is_none());

    let err = live.outcome.await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn spawn_passes_arguments_verbatim() {
    let outcome = quiet()
        .spawn("printf", ["%s|", "a b", "$HOME"], Options::new())
        .outcome
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("a b|$HOME|"));
}

#[tokio::test]
async fn exec_exposes_the_process_handle() {
    let live = quiet().exec("echo 'exec test'", Options::new());
    let pid = live.pid().unwrap();
    assert!(pid > 0);

    let outcome = live.outcome.await.unwrap().unwrap();
    assert_eq!(outcome.stdout_text(), Some("exec test\n"));
}

#[tokio::test]
async fn terminated_process_reports_the_signal() {
    let live = quiet().spawn("sleep", ["30"], Options::new().with_ignore_error(true));
    let process = live.process.clone().unwrap();
    process.signal(Signal::Terminate).unwrap();

    let outcome = live.outcome.await.unwrap().unwrap();
    assert_eq!(outcome.code, None);
    assert_eq!(outcome.signal.as_deref(), Some("SIGTERM"));
    assert!(!outcome.success());
}

#[tokio::test]
async fn signalling_after_exit_is_an_error() {
    let live = quiet().spawn("true", Vec::<String>::new(), Options::new());
    let process = live.process.clone().unwrap();
    live.outcome.await.unwrap();

    let err = process.signal(Signal::Terminate).unwrap_err();
    assert!(matches!(err, ShellError::NotRunning { .. }));
}

#[tokio::test]
async fn derived_contexts_inherit_defaults() {
    let root = Context::new();
    let quiet = root.context(Options::new().with_echo_command(false));
    let capturing = quiet.context(Options::new().with_capture_output(true));

    let outcome = capturing
        .shell("echo inherited", Options::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.stdout_text(), Some("inherited\n"));

    // Per-call overrides win over inherited defaults.
    let outcome = capturing
        .shell("echo plain", Options::new().with_capture_output(false))
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.stdout.is_none());
}

#[tokio::test]
async fn live_defaults_apply_to_later_calls() {
    let ctx = quiet();
    ctx.options().update(|o| o.ignore_error = Some(true));

    let outcome = ctx.shell("exit 4", Options::new()).await.unwrap().unwrap();
    assert_eq!(outcome.code, Some(4));
}

const MIXED_ENDINGS: &str = r"printf 'Hello\r\nWonderful\rWorld\n'";

#[tokio::test]
async fn normalizes_line_endings_by_default() {
    let outcome = quiet()
        .shell(MIXED_ENDINGS, Options::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.stdout_text(), Some("Hello\nWonderful\nWorld\n"));
}

#[tokio::test]
async fn normalization_can_be_disabled() {
    let outcome = quiet()
        .shell(MIXED_ENDINGS, Options::new().with_normalize_text(false))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.stdout_text(), Some("Hello\r\nWonderful\rWorld\n"));
}

#[tokio::test]
async fn normalization_can_be_replaced() {
    let outcome = quiet()
        .shell(
            MIXED_ENDINGS,
            Options::new().with_normalize_text(Normalize::custom(|text| text.to_uppercase())),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.stdout_text(), Some("HELLO\r\nWONDERFUL\rWORLD\n"));
}

#[tokio::test]
async fn transform_sees_raw_bytes() {
    let outcome = quiet()
        .shell(
            MIXED_ENDINGS,
            Options::new().with_capture_output(Capture::bytes()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome.stdout.as_ref().and_then(Captured::as_bytes),
        Some(&b"Hello\r\nWonderful\rWorld\n"[..])
    );
}

#[tokio::test]
async fn stdio_override_disables_capture_and_input() {
    let outcome = quiet()
        .shell(
            "echo hidden; echo hidden >&2",
            Options::new()
                .with_capture_error(true)
                .with_input("ignored")
                .with_stdio(StdioMode::Ignore, StdioMode::Ignore, StdioMode::Ignore),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.code, Some(0));
    assert!(outcome.stdout.is_none());
    assert!(outcome.stderr.is_none());
}

#[tokio::test]
async fn stdio_override_pipes_are_handed_to_the_caller() {
    let live = quiet().exec(
        "echo piped",
        Options::new().with_stdio(StdioMode::Inherit, StdioMode::Pipe, StdioMode::Inherit),
    );
    let process = live.process.clone().unwrap();
    let mut stdout = process.take_stdout().unwrap();
    assert!(process.take_stdout().is_none());

    let mut text = String::new();
    stdout.read_to_string(&mut text).await.unwrap();
    assert_eq!(text, "piped\n");

    let outcome = live.outcome.await.unwrap().unwrap();
    assert!(outcome.stdout.is_none());
}

#[tokio::test]
async fn env_extends_the_inherited_environment() {
    let outcome = quiet()
        .shell(
            r#"printf '%s|%s' "$PSHELL_TEST_VALUE" "${HOME:+home}""#,
            Options::new().with_env_var("PSHELL_TEST_VALUE", "hello"),
        )
        .await
        .unwrap()
        .unwrap();

    let home = if std::env::var_os("HOME").is_some() {
        "home"
    } else {
        ""
    };
    assert_eq!(outcome.stdout_text(), Some(format!("hello|{home}").as_str()));
}

#[tokio::test]
async fn list_values_compose_path() {
    let path = std::env::var("PATH").unwrap();
    let outcome = quiet()
        .shell(
            r#"printf %s "$PATH""#,
            Options::new().with_env_var("PATH", EnvValue::list(["/opt/pshell-test/bin", "PATH"])),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        outcome.stdout_text(),
        Some(format!("/opt/pshell-test/bin:{path}").as_str())
    );
}

#[tokio::test]
async fn raw_env_replaces_the_environment() {
    let mut env = BTreeMap::new();
    env.insert("ONLY".to_string(), EnvValue::from("this"));

    let outcome = quiet()
        .shell(
            r#"printf '%s|%s' "$ONLY" "${HOME:-unset}""#,
            Options::new().with_raw_env(env),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("this|unset"));
}

#[tokio::test]
async fn runs_in_the_requested_directory() {
    let temp = TempDir::new().unwrap();
    let expected = temp.path().canonicalize().unwrap();

    let outcome = quiet()
        .shell("pwd -P", Options::new().with_cwd(temp.path()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        outcome.stdout_text().map(str::trim_end),
        expected.to_str()
    );
}

#[tokio::test]
async fn echo_predicate_sees_the_command_and_can_veto() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let ctx = quiet().context(Options::new().with_echo_command(pshell::Echo::custom(
        move |program, args| {
            record
                .lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            !args.iter().any(|a| a.contains("forbidden"))
        },
    )));

    let outcome = ctx.shell("echo allowed", Options::new()).await.unwrap();
    assert_eq!(outcome.unwrap().stdout_text(), Some("allowed\n"));

    let live = ctx.exec("echo forbidden", Options::new());
    assert!(live.process.is_none());
    assert!(live.outcome.await.unwrap().is_none());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], "/bin/sh -c echo allowed");
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let ctx = quiet();
    let pending: Vec<_> = (0..8)
        .map(|i| ctx.shell(&format!("echo {i}"), Options::new()))
        .collect();

    let results = futures::future::join_all(pending).await;
    for (i, result) in results.into_iter().enumerate() {
        let outcome = result.unwrap().unwrap();
        assert_eq!(outcome.stdout_text(), Some(format!("{i}\n").as_str()));
    }
}

#[tokio::test]
async fn custom_shell_and_switches() {
    let outcome = quiet()
        .shell(
            "echo $0",
            Options::new()
                .with_shell_name("/bin/sh")
                .with_shell_switch(["-e", "-c"]),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.stdout_text(), Some("/bin/sh\n"));
}

#[tokio::test]
async fn global_functions_use_the_root_defaults() {
    let outcome = pshell::shell(
        "echo global",
        Options::new()
            .with_echo_command(false)
            .with_capture_output(true),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(outcome.stdout_text(), Some("global\n"));

    let derived = pshell::context(Options::new().with_echo_command(false));
    let err = derived.shell("exit 1", Options::new()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Exit);
}

#[tokio::test]
async fn non_unicode_parent_variables_do_not_break_invocations() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    std::env::set_var("PSHELL_TEST_NON_UNICODE", OsStr::from_bytes(b"\xff\xfe"));

    let outcome = quiet()
        .shell("echo ok", Options::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.stdout_text(), Some("ok\n"));

    // Extending still inherits the variable untouched.
    let outcome = quiet()
        .shell(
            r#"printf %s "$PSHELL_TEST_NON_UNICODE" | od -An -tx1 | tr -d ' \n'; printf '|%s' "$EXTRA""#,
            Options::new()
                .with_env_var("EXTRA", EnvValue::list(["a", "PSHELL_TEST_NON_UNICODE"])),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome.stdout_text(),
        Some("fffe|a:PSHELL_TEST_NON_UNICODE")
    );

    std::env::remove_var("PSHELL_TEST_NON_UNICODE");
}
