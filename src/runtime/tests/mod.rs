//! Runtime unit tests
//!
//! Each test builds its own [`Session`] over a private store, so lifecycle
//! can be exercised freely without touching the process-wide singleton.

use std::sync::Arc;

use crate::runtime::errors::BridgeError;
use crate::runtime::evaluator::{split_error, LoadOutcome, ENTRY_POINT_PHASE, EVAL_PHASE};
use crate::runtime::session::{Session, StopStatus, BOOTSTRAP_FRAGMENT};
use crate::store::{MemoryStore, ObjectId, ObjectStore, ResultObject, Status};
use crate::util::config::RuntimeConfig;

fn session_with(config: RuntimeConfig) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Session::new(config, store.clone()), store)
}

fn started() -> (Session, Arc<MemoryStore>) {
    let (session, store) = session_with(RuntimeConfig::default());
    session.start().unwrap();
    (session, store)
}

fn eval(
    session: &Session,
    source: &str,
) -> ResultObject {
    let id = session.eval_string("cell", source).unwrap();
    session.result(id).unwrap()
}

fn text(result: &ResultObject) -> &str {
    result.data_text("text/plain").unwrap()
}

mod value_tests {
    use mlua::{Lua, Value};

    use crate::runtime::value::{Number, ScriptValue, MAX_ENTRIES};

    fn translate(
        source: &str,
        max_depth: usize,
    ) -> ScriptValue {
        let lua = Lua::new();
        let value: Value = lua.load(source).eval().unwrap();
        ScriptValue::from_lua(&value, max_depth)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(translate("nil", 4), ScriptValue::Nil);
        assert_eq!(translate("true", 4), ScriptValue::Boolean(true));
        assert_eq!(translate("7", 4), ScriptValue::Number(Number::Integer(7)));
        assert_eq!(translate("0.5", 4), ScriptValue::Number(Number::Float(0.5)));
        assert_eq!(translate("'hi'", 4), ScriptValue::Text("hi".to_string()));
        assert_eq!(translate(r"'\255\0'", 4), ScriptValue::Bytes(vec![0xff, 0]));
        assert_eq!(translate("print", 4), ScriptValue::Other("function".to_string()));
    }

    #[test]
    fn test_tables_are_sorted() {
        let value = translate("{ b = 2, a = 1, [2] = 'y', [1] = 'x' }", 4);
        let keys: Vec<String> = value
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["1", "2", "\"a\"", "\"b\""]);
    }

    #[test]
    fn test_depth_limit() {
        let value = translate("{ a = { b = 1 } }", 1);
        assert_eq!(value.get("a"), Some(&ScriptValue::Other("table".to_string())));
        assert_eq!(translate("{}", 0), ScriptValue::Other("table".to_string()));
    }

    fn count_entries(value: &ScriptValue) -> usize {
        value.as_mapping().map_or(0, |entries| {
            entries.len()
                + entries
                    .iter()
                    .map(|(k, v)| count_entries(k) + count_entries(v))
                    .sum::<usize>()
        })
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let value = translate("local t = {} t.self = t return t", 16);
        assert_eq!(value.to_string(), "{self = <cycle>}");
    }

    #[test]
    fn test_fan_out_cycle_stays_small() {
        let value = translate("local t = {} for i = 1, 3 do t[i] = t end return t", 16);
        assert_eq!(value.to_string(), "{<cycle>, <cycle>, <cycle>}");
    }

    #[test]
    fn test_shared_table_is_not_a_cycle() {
        let value = translate("local x = { 1 } return { a = x, b = x }", 16);
        assert_eq!(value.to_string(), "{a = {1}, b = {1}}");
    }

    #[test]
    fn test_entry_budget_bounds_wide_graphs() {
        let value = translate(
            "local t = {} for d = 1, 30 do t = { t, t, t } end return t",
            40,
        );
        assert_eq!(count_entries(&value), MAX_ENTRIES);
    }

    #[test]
    fn test_to_json() {
        let value = translate("{ 1, 2.5, 'x', { a = true, b = false } }", 8);
        assert_eq!(
            value.to_json().unwrap(),
            serde_json::json!([1, 2.5, "x", { "a": true, "b": false }])
        );
        assert_eq!(translate("{}", 8).to_json().unwrap(), serde_json::json!([]));
        assert_eq!(
            translate("{ [2] = 'b' }", 8).to_json().unwrap(),
            serde_json::json!({ "2": "b" })
        );
        assert_eq!(
            translate(r"'\255'", 8).to_json().unwrap(),
            serde_json::json!("\u{fffd}")
        );
        assert!(translate("{ print }", 8).to_json().is_err());
    }

    #[test]
    fn test_pretty_printer() {
        let cases = [
            ("nil", "nil"),
            ("false", "false"),
            ("-3", "-3"),
            ("1.0", "1.0"),
            ("10 / 4", "2.5"),
            ("1/0", "inf"),
            ("'a\"b\\n'", "\"a\\\"b\\n\""),
            ("'\\1'", "\"\\1\""),
            ("{}", "{}"),
            ("{ 1, 2, 3 }", "{1, 2, 3}"),
            ("{ 'x', n = 1 }", "{[1] = \"x\", n = 1}"),
            ("{ ['end'] = 1, ['a b'] = 2 }", "{[\"a b\"] = 2, [\"end\"] = 1}"),
            ("{ [2] = 'b' }", "{[2] = \"b\"}"),
            ("{ list = { true } }", "{list = {true}}"),
            ("coroutine.create(print)", "<thread>"),
        ];
        for (source, expected) in cases {
            assert_eq!(translate(source, 8).to_string(), expected, "rendering `{}`", source);
        }
    }

    #[test]
    fn test_payloads() {
        assert_eq!(ScriptValue::Text("a\0b".to_string()).to_payload(), b"a\0b");
        assert_eq!(ScriptValue::Bytes(vec![0xff]).to_payload(), vec![0xff]);
        assert_eq!(ScriptValue::Number(Number::Integer(64)).to_payload(), b"64");
        assert_eq!(ScriptValue::from_bytes(b"ok"), ScriptValue::Text("ok".to_string()));
    }
}

mod marshal_tests {
    use std::sync::Arc;

    use crate::runtime::marshal::ResultMarshaller;
    use crate::runtime::value::{Number, ScriptValue};
    use crate::store::{MemoryStore, MimeTypes, ObjectStore};

    fn text(s: &str) -> ScriptValue {
        ScriptValue::Text(s.to_string())
    }

    fn marshaller() -> (ResultMarshaller, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let marshaller = ResultMarshaller::new(
            store.clone(),
            MimeTypes::with_extra(["application/vnd.custom"]),
        );
        (marshaller, store)
    }

    #[test]
    fn test_mime_map_detection() {
        let (m, _) = marshaller();
        let html = ScriptValue::Mapping(vec![(text("text/html"), text("<p/>"))]);
        let custom = ScriptValue::Mapping(vec![(text("application/vnd.custom"), text("x"))]);
        let mixed = ScriptValue::Mapping(vec![
            (text("text/html"), text("<p/>")),
            (text("colour"), text("red")),
        ]);
        assert!(m.is_mime_map(&html));
        assert!(m.is_mime_map(&custom));
        assert!(!m.is_mime_map(&mixed));
        assert!(!m.is_mime_map(&ScriptValue::Mapping(Vec::new())));
        assert!(!m.is_mime_map(&text("text/html")));
    }

    #[test]
    fn test_publish_mime_map_copies_bytes() {
        let (m, store) = marshaller();
        let png = vec![0x89, b'P', b'N', b'G', 0, 0, 1];
        let value = ScriptValue::Mapping(vec![
            (text("image/png"), ScriptValue::Bytes(png.clone())),
            (text("text/plain"), text("image")),
        ]);
        let id = m.publish(&value);
        let result = store.get(id).unwrap();
        assert_eq!(result.data_bytes("image/png"), Some(png.as_slice()));
        assert_eq!(result.data_text("text/plain"), Some("image"));
    }

    #[test]
    fn test_publish_other_values_as_text() {
        let (m, store) = marshaller();
        let id = m.publish(&ScriptValue::Number(Number::Integer(2)));
        assert_eq!(store.get(id).unwrap().data_text("text/plain"), Some("2"));

        let record = ScriptValue::Mapping(vec![(text("colour"), text("red"))]);
        let id = m.publish(&record);
        assert_eq!(
            store.get(id).unwrap().data_text("text/plain"),
            Some("{colour = \"red\"}")
        );

        let id = m.publish(&ScriptValue::Nil);
        assert!(store.get(id).unwrap().data.is_empty());
    }

    #[test]
    fn test_display_shape_with_metadata() {
        let (m, store) = marshaller();
        let value = ScriptValue::Mapping(vec![
            (
                text("data"),
                ScriptValue::Mapping(vec![(text("image/png"), text("png"))]),
            ),
            (
                text("metadata"),
                ScriptValue::Mapping(vec![(
                    text("image/png"),
                    ScriptValue::Mapping(vec![(
                        text("width"),
                        ScriptValue::Number(Number::Integer(64)),
                    )]),
                )]),
            ),
        ]);
        let id = m.publish(&value);
        let result = store.get(id).unwrap();
        assert_eq!(result.data_text("image/png"), Some("png"));
        assert_eq!(result.metadata_bytes("image/png", "width"), Some(&b"64"[..]));
        assert!(result.data_text("text/plain").is_none());
    }

    #[test]
    fn test_data_key_without_mime_map_is_rendered() {
        let (m, store) = marshaller();
        let value = ScriptValue::Mapping(vec![(text("data"), text("plain"))]);
        let id = m.publish(&value);
        assert_eq!(
            store.get(id).unwrap().data_text("text/plain"),
            Some("{data = \"plain\"}")
        );
    }

    #[test]
    fn test_publish_error() {
        let (m, store) = marshaller();
        let id = m.publish_error("bad things", "evalString");
        let result = store.get(id).unwrap();
        assert!(result.is_error());
        assert_eq!(result.data_text("ename"), Some("ERROR"));
        assert_eq!(result.data_text("evalue"), Some("bad things"));
        assert_eq!(result.traceback, vec!["evalString".to_string()]);
    }

    #[test]
    fn test_rollback() {
        let (m, store) = marshaller();
        let kept = store.new_object();
        let dropped = [store.new_object(), store.new_object()];
        m.rollback(&dropped);
        assert!(store.contains(kept));
        assert!(dropped.iter().all(|id| !store.contains(*id)));
    }
}

mod registry_tests {
    use crate::runtime::registry::CodeRegistry;

    #[test]
    fn test_mark_once() {
        let mut registry = CodeRegistry::new();
        assert!(registry.mark_loaded("a"));
        assert!(!registry.mark_loaded("a"));
        assert!(registry.mark_loaded("b"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn quickcheck_marking_is_idempotent() {
        fn prop(names: Vec<String>) -> bool {
            let mut registry = CodeRegistry::new();
            let first: Vec<bool> = names.iter().map(|n| registry.mark_loaded(n)).collect();
            let again = names.iter().all(|n| !registry.mark_loaded(n));
            let mut unique = names.clone();
            unique.sort();
            unique.dedup();
            again
                && registry.len() == unique.len()
                && first.iter().filter(|fresh| **fresh).count() == unique.len()
                && names.iter().all(|n| registry.is_loaded(n))
        }
        quickcheck::quickcheck(prop as fn(Vec<String>) -> bool);
    }
}

#[test]
fn test_split_error() {
    let (summary, trace) =
        split_error("cell:1: boom\nstack traceback:\n\t[C]: in ?\n\tcell:1: in main chunk\n");
    assert_eq!(summary, "cell:1: boom");
    assert_eq!(trace, vec!["[C]: in ?", "cell:1: in main chunk"]);

    let (summary, trace) = split_error("plain message\n");
    assert_eq!(summary, "plain message");
    assert!(trace.is_empty());
}

#[test]
fn test_lifecycle() {
    let (session, _) = session_with(RuntimeConfig::default());
    assert!(!session.is_running());
    assert_eq!(session.stop(), StopStatus::NotRunning);

    session.start().unwrap();
    session.start().unwrap();
    assert!(session.is_running());
    assert!(session.is_code_loaded(BOOTSTRAP_FRAGMENT));

    session.load_code("extra", "extra_loaded = true").unwrap();
    assert_eq!(session.stop(), StopStatus::Stopped);
    assert_eq!(session.stop().as_code(), 1);
    assert!(!session.is_running());
    assert!(session.loaded_fragments().is_empty());

    session.start().unwrap();
    assert_eq!(session.loaded_fragments(), vec![BOOTSTRAP_FRAGMENT.to_string()]);
    assert!(eval(&session, "extra_loaded").data.is_empty());
}

#[test]
fn test_eval_requires_start() {
    let (session, _) = session_with(RuntimeConfig::default());
    assert!(matches!(session.eval_string("cell", "1"), Err(BridgeError::NotStarted)));
}

#[test]
fn test_eval_requires_bootstrap() {
    let config = RuntimeConfig {
        autoload_bootstrap: false,
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    session.start().unwrap();
    let err = session.eval_string("cell", "1").unwrap_err();
    assert!(matches!(err, BridgeError::BootstrapMissing(_)));
    assert!(!err.is_fatal());

    assert_eq!(session.load_bootstrap().unwrap(), LoadOutcome::Loaded(None));
    assert_eq!(text(&eval(&session, "1 + 1")), "2");
}

#[test]
fn test_missing_bootstrap_file_is_fatal() {
    let config = RuntimeConfig {
        bootstrap: Some("/nonexistent/ipylua/bootstrap.lua".into()),
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    let err = session.start().unwrap_err();
    assert!(err.is_fatal());
    assert!(!session.is_running());
}

#[test]
fn test_custom_bootstrap_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("boot.lua");
    std::fs::write(
        &path,
        "function IPyLuaEval(name, code) return ipylua.publish({['text/plain'] = 'custom ' .. name}) end",
    )
    .unwrap();
    let config = RuntimeConfig {
        bootstrap: Some(path),
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    session.start().unwrap();
    assert_eq!(text(&eval(&session, "ignored")), "custom cell");
}

#[test]
fn test_load_code_once() {
    let (session, _) = started();
    let source = "hits = (hits or 0) + 1";
    assert_eq!(session.load_code("counter", source).unwrap(), LoadOutcome::Loaded(None));
    assert_eq!(session.load_code("counter", source).unwrap(), LoadOutcome::AlreadyLoaded);
    assert!(session.is_code_loaded("counter"));
    assert_eq!(text(&eval(&session, "hits")), "1");
}

#[test]
fn test_load_code_starts_runtime() {
    let (session, _) = session_with(RuntimeConfig::default());
    let outcome = session.load_code("early", "return 'early'").unwrap();
    assert!(session.is_running());
    let id = outcome.object_id().unwrap();
    assert_eq!(text(&session.result(id).unwrap()), "\"early\"");
}

#[test]
fn test_failed_load_is_not_registered() {
    let (session, store) = started();
    let before = store.len();

    let outcome = session.load_code("broken", "this is not valid code").unwrap();
    let message = outcome.error_message().unwrap();
    assert!(message.contains("broken"), "{}", message);
    assert!(!session.is_code_loaded("broken"));

    let outcome = session
        .load_code("raising", "ipylua.new_object() error('nope')")
        .unwrap();
    assert!(outcome.error_message().unwrap().contains("nope"));
    assert_eq!(store.len(), before);

    assert!(session.load_code("broken", "fixed = true").unwrap().is_ok());
    assert!(session.is_code_loaded("broken"));
}

#[test]
fn test_load_binary_source() {
    let (session, _) = started();
    let source = b"blob = 'a\0b'".to_vec();
    assert!(session.load_code("nul", source).unwrap().is_ok());
    assert_eq!(text(&eval(&session, "#blob")), "3");
}

#[test]
fn test_eval_values() {
    let (session, _) = started();
    assert_eq!(text(&eval(&session, "1 + 1")), "2");
    assert_eq!(text(&eval(&session, "10 / 4")), "2.5");
    assert_eq!(text(&eval(&session, "'hi'")), "\"hi\"");
    assert_eq!(text(&eval(&session, "{1, 2, 3}")), "{1, 2, 3}");
    assert_eq!(text(&eval(&session, "print")), "<function>");
    assert_eq!(text(&eval(&session, "ipylua.version()")), "\"Lua 5.4\"");
}

#[test]
fn test_eval_statement_yields_empty_result() {
    let (session, _) = started();
    let result = eval(&session, "x = 5");
    assert_eq!(result.status(), Status::Ok);
    assert!(result.data.is_empty());
    assert_eq!(text(&eval(&session, "x")), "5");
}

#[test]
fn test_eval_mime_map() {
    let (session, _) = started();
    let result = eval(&session, r#"{["text/html"] = "<b>hi</b>", ["text/plain"] = "hi"}"#);
    assert_eq!(result.data_text("text/html"), Some("<b>hi</b>"));
    assert_eq!(result.data_text("text/plain"), Some("hi"));
    assert_eq!(result.status(), Status::Ok);
}

#[test]
fn test_eval_extra_mime_type() {
    let config = RuntimeConfig {
        extra_mime_types: vec!["application/vnd.custom".to_string()],
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    session.start().unwrap();
    let result = eval(&session, r#"{["application/vnd.custom"] = "x"}"#);
    assert_eq!(result.data_text("application/vnd.custom"), Some("x"));
}

#[test]
fn test_eval_error_result() {
    let (session, store) = started();
    let before = store.len();
    let result = eval(&session, "error('boom')");
    assert!(result.is_error());
    assert_eq!(result.data_text("ename"), Some("ERROR"));
    assert!(result.data_text("evalue").unwrap().contains("boom"));
    assert_eq!(result.traceback[0], EVAL_PHASE);
    assert_eq!(store.len(), before + 1);
}

#[test]
fn test_eval_syntax_error() {
    let (session, _) = started();
    let result = eval(&session, "this is not valid code");
    assert!(result.is_error());
    assert!(result.data_text("evalue").unwrap().contains("cell"));
}

#[test]
fn test_eval_rolls_back_objects_on_error() {
    let (session, store) = started();
    let before = store.len();
    let id = session
        .eval_string("cell", "ipylua.new_object() ipylua.new_object() error('boom')")
        .unwrap();
    assert_eq!(store.len(), before + 1);
    assert!(store.get(id).unwrap().is_error());
    assert!(!store.contains(ObjectId(id.value() - 1)));
    assert!(!store.contains(ObjectId(id.value() - 2)));
}

#[test]
fn test_entry_point_without_result_object() {
    let config = RuntimeConfig {
        entry_point: "NoResult".to_string(),
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    session.start().unwrap();
    session
        .load_code("no-result", "function NoResult(name, code) return 'nope' end")
        .unwrap();

    let result = eval(&session, "1");
    assert!(result.is_error());
    assert_eq!(
        result.data_text("evalue"),
        Some("no result object returned from NoResult")
    );
    assert_eq!(result.traceback, vec![ENTRY_POINT_PHASE.to_string()]);
}

#[test]
fn test_entry_point_returning_non_id_rolls_back() {
    let config = RuntimeConfig {
        entry_point: "Leaky".to_string(),
        ..RuntimeConfig::default()
    };
    let (session, store) = session_with(config);
    session.start().unwrap();
    session
        .load_code(
            "leaky",
            "function Leaky(name, code) ipylua.new_object() ipylua.publish('x') return 'nope' end",
        )
        .unwrap();

    let before = store.len();
    let id = session.eval_string("cell", "1").unwrap();
    assert_eq!(store.len(), before + 1);
    assert!(store.get(id).unwrap().is_error());
    assert!(!store.contains(ObjectId(id.value() - 1)));
    assert!(!store.contains(ObjectId(id.value() - 2)));
}

#[test]
fn test_eval_globals_table() {
    let (session, _) = started();
    let result = eval(&session, "_G");
    assert!(!result.is_error());
    assert!(text(&result).contains("_G = <cycle>"));
}

#[test]
fn test_eval_wide_shared_graph_is_bounded() {
    let (session, _) = started();
    let result = eval(
        &session,
        "(function() local t = {} for d = 1, 30 do t = { t, t, t } end return t end)()",
    );
    assert!(!result.is_error());
    assert!(text(&result).starts_with('{'));
}

#[test]
fn test_missing_entry_point() {
    let config = RuntimeConfig {
        entry_point: "Undefined".to_string(),
        ..RuntimeConfig::default()
    };
    let (session, _) = session_with(config);
    session.start().unwrap();
    let result = eval(&session, "1");
    assert!(result.is_error());
    assert_eq!(result.traceback[0], EVAL_PHASE);
}

#[test]
fn test_primitives_write_store() {
    let (session, store) = started();
    let source = r"
        manual = ipylua.new_object()
        ipylua.add_data(manual, 'text/plain', 'x\0y')
        ipylua.add_metadata(manual, 'text/plain', 'lines', 1)
        ipylua.append_traceback(manual, 'first')
        ipylua.append_traceback(manual, 'second')
        gone = ipylua.new_object()
        ipylua.delete(gone)
        ipylua.delete(gone)
        ipylua.add_data(0, 'text/plain', 'ignored')
    ";
    assert!(session.load_code("primitives", source).unwrap().is_ok());

    let gone = store.last_id();
    assert!(!store.contains(gone));
    let manual = store.get(ObjectId(gone.value() - 1)).unwrap();
    assert_eq!(manual.data_bytes("text/plain"), Some(&b"x\0y"[..]));
    assert_eq!(manual.metadata_bytes("text/plain", "lines"), Some(&b"1"[..]));
    assert_eq!(manual.traceback, vec!["first".to_string(), "second".to_string()]);
}

mod display_tests {
    use super::*;

    #[test]
    fn test_png_is_exact_with_base64_text() {
        let (session, _) = started();
        let result = eval(&session, r#"display.png("\137PNG\0\0data")"#);
        assert_eq!(
            result.data_bytes("image/png"),
            Some(&[0x89, b'P', b'N', b'G', 0, 0, b'd', b'a', b't', b'a'][..])
        );
        assert_eq!(result.data_text("text/plain"), Some("iVBORwAAZGF0YQ=="));
    }

    #[test]
    fn test_latex_and_math() {
        let (session, _) = started();
        let result = eval(&session, "display.latex('x^2')");
        assert_eq!(result.data_text("text/latex"), Some("$x^2$"));
        assert_eq!(result.data_text("text/plain"), Some("x^2"));

        let result = eval(&session, "display.math('x^2')");
        assert_eq!(result.data_text("text/latex"), Some("$$x^2$$"));
    }

    #[test]
    fn test_html_and_markdown() {
        let (session, _) = started();
        let result = eval(&session, "display.html('<i>a</i>')");
        assert_eq!(result.data_text("text/html"), Some("<i>a</i>"));
        let result = eval(&session, "display.markdown('# T')");
        assert_eq!(result.data_text("text/markdown"), Some("# T"));
    }

    #[test]
    fn test_json() {
        let (session, _) = started();
        let result = eval(&session, "display.json({1, 2})");
        assert_eq!(result.data_text("application/json"), Some("[1,2]"));
        let result = eval(&session, "display.json({b = true, a = 'x'})");
        assert_eq!(result.data_text("application/json"), Some(r#"{"a":"x","b":true}"#));

        let result = eval(&session, r#"display.json({"\255"})"#);
        let encoded = result.data_text("application/json").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(parsed, serde_json::json!(["\u{fffd}"]));

        let result = eval(&session, "display.json({ print })");
        assert!(result.is_error());
    }

    #[test]
    fn test_with_metadata() {
        let (session, _) = started();
        let result = eval(
            &session,
            r#"display.with_metadata(display.png("abc"), {["image/png"] = {width = 64}})"#,
        );
        assert_eq!(result.data_bytes("image/png"), Some(&b"abc"[..]));
        assert_eq!(result.data_text("text/plain"), Some("YWJj"));
        assert_eq!(result.metadata_bytes("image/png", "width"), Some(&b"64"[..]));
    }

    #[test]
    fn test_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pic.svg");
        std::fs::write(&path, "<svg/>").unwrap();

        let (session, _) = started();
        let source = format!("display.file('image/svg+xml', {:?})", path.display().to_string());
        let result = eval(&session, &source);
        assert_eq!(result.data_text("image/svg+xml"), Some("<svg/>"));

        let result = eval(&session, "display.file('image/png', '/nonexistent/pic.png')");
        assert!(result.is_error());
    }
}

#[test]
fn test_kernel_info() {
    let (session, _) = session_with(RuntimeConfig::default());
    let info = session.kernel_info();
    assert_eq!(info.language_info.name, "lua");
    assert_eq!(info.language_info.file_extension, ".lua");
    assert_eq!(info.implementation_version, crate::VERSION);
    assert_eq!(session.runtime_version(), "Lua 5.4");

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["language_info"]["version"], "5.4");
}
