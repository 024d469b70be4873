use ipylua::{Session, Status};

use crate::common::{eval, plain, session};

#[test]
fn test_arithmetic() {
    let result = eval("eval-arith", "6 * 7");
    assert_eq!(result.status(), Status::Ok);
    assert_eq!(plain(&result), "42");
}

#[test]
fn test_error_result_shape() {
    let result = eval("eval-error", "error('kaput')");
    assert_eq!(result.status(), Status::Error);
    assert_eq!(result.data_text("ename"), Some("ERROR"));
    assert!(result.data_text("evalue").unwrap().contains("kaput"));
    assert_eq!(result.data_text("status"), Some("error"));
    assert_eq!(result.traceback.first().map(String::as_str), Some("evalString"));

    let json = result.to_json();
    assert_eq!(json["status"], "error");
    assert_eq!(json["data"]["ename"], "ERROR");
}

#[test]
fn test_error_does_not_break_session() {
    let result = eval("eval-undefined", "undefined_function_xyz()");
    assert!(result.is_error());
    assert_eq!(plain(&eval("eval-after-error", "1 + 2")), "3");
}

#[test]
fn test_cells_share_globals() {
    eval("eval-define", "eval_shared = { 'a', 'b' }");
    assert_eq!(plain(&eval("eval-read", "eval_shared")), "{\"a\", \"b\"}");
}

#[test]
fn test_statement_cell_is_empty_ok() {
    let result = eval("eval-statement", "local unused = 1");
    assert_eq!(result.status(), Status::Ok);
    assert!(result.data.is_empty());
}

#[test]
fn test_global_session_is_singleton() {
    let first = Session::global() as *const Session;
    let second = session() as *const Session;
    assert_eq!(first, second);
    assert_eq!(session().runtime_version(), "Lua 5.4");
}

#[test]
fn test_kernel_info() {
    let info = session().kernel_info();
    assert_eq!(info.implementation, "ipylua");
    assert_eq!(info.language_info.name, "lua");
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["protocol_version"], "5.3");
}
