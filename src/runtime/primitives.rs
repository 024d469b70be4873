//! Callable surface installed into the interpreter
//!
//! One global table (`ipylua`) gives Lua code access to the result store.
//! Every primitive works on the store only and never touches the session
//! gate, so calling them from inside an evaluation cannot re-enter it.
//!
//! | Lua                                   | Store call          |
//! |---------------------------------------|---------------------|
//! | `ipylua.new_object()`                 | allocate            |
//! | `ipylua.add_data(id, mime, v)`        | upsert data         |
//! | `ipylua.add_metadata(id, mime, k, v)` | upsert metadata     |
//! | `ipylua.append_traceback(id, line)`   | append traceback    |
//! | `ipylua.delete(id)`                   | delete              |
//! | `ipylua.publish(value)`               | allocate + marshal  |
//! | `ipylua.base64(bytes)`                | -                   |
//! | `ipylua.to_json(value)`               | -                   |
//! | `ipylua.version()`                    | -                   |

use base64::Engine;
use mlua::{Lua, Value};

use crate::runtime::marshal::ResultMarshaller;
use crate::runtime::value::ScriptValue;
use crate::runtime::RUNTIME_VERSION;
use crate::store::ObjectId;

/// Name of the global table holding the primitives.
pub const PRIMITIVES_TABLE: &str = "ipylua";

/// Objects allocated during the current protected call.
///
/// Stored as interpreter app data for the duration of one call; the
/// evaluator deletes them all if the call raises.
#[derive(Debug, Default)]
pub(crate) struct PendingObjects(pub(crate) Vec<ObjectId>);

fn track(
    lua: &Lua,
    id: ObjectId,
) {
    if let Some(mut pending) = lua.app_data_mut::<PendingObjects>() {
        pending.0.push(id);
    }
}

fn to_lua_id(id: ObjectId) -> i64 {
    i64::try_from(id.value()).unwrap_or(0)
}

/// Install the primitives table into the globals of `lua`.
pub(crate) fn install(
    lua: &Lua,
    marshaller: &ResultMarshaller,
    max_depth: usize,
) -> mlua::Result<()> {
    let table = lua.create_table()?;

    let m = marshaller.clone();
    table.set(
        "new_object",
        lua.create_function(move |lua, ()| {
            let id = m.store().new_object();
            track(lua, id);
            Ok(to_lua_id(id))
        })?,
    )?;

    let m = marshaller.clone();
    table.set(
        "add_data",
        lua.create_function(move |_, (id, mime, payload): (i64, mlua::String, Value)| {
            if let Some(id) = ObjectId::from_raw(id) {
                let mime = mime.to_string_lossy();
                let payload = ScriptValue::from_lua(&payload, max_depth).to_payload();
                m.store().add_data(id, &mime, &payload);
            }
            Ok(())
        })?,
    )?;

    let m = marshaller.clone();
    table.set(
        "add_metadata",
        lua.create_function(
            move |_, (id, mime, key, payload): (i64, mlua::String, mlua::String, Value)| {
                if let Some(id) = ObjectId::from_raw(id) {
                    let (mime, key) = (mime.to_string_lossy(), key.to_string_lossy());
                    let payload = ScriptValue::from_lua(&payload, max_depth);
                    m.add_metadata(id, &mime, &key, &payload);
                }
                Ok(())
            },
        )?,
    )?;

    let m = marshaller.clone();
    table.set(
        "append_traceback",
        lua.create_function(move |_, (id, line): (i64, mlua::String)| {
            if let Some(id) = ObjectId::from_raw(id) {
                m.store().append_traceback(id, &line.to_string_lossy());
            }
            Ok(())
        })?,
    )?;

    let m = marshaller.clone();
    table.set(
        "delete",
        lua.create_function(move |_, id: i64| {
            if let Some(id) = ObjectId::from_raw(id) {
                m.store().delete(id);
            }
            Ok(())
        })?,
    )?;

    let m = marshaller.clone();
    table.set(
        "publish",
        lua.create_function(move |lua, value: Value| {
            let id = m.publish(&ScriptValue::from_lua(&value, max_depth));
            track(lua, id);
            Ok(to_lua_id(id))
        })?,
    )?;

    table.set(
        "base64",
        lua.create_function(|_, bytes: mlua::String| {
            let b64 = base64::engine::general_purpose::STANDARD;
            Ok(b64.encode(&*bytes.as_bytes()))
        })?,
    )?;

    table.set(
        "to_json",
        lua.create_function(move |_, value: Value| {
            let json = ScriptValue::from_lua(&value, max_depth)
                .to_json()
                .map_err(mlua::Error::RuntimeError)?;
            Ok(json.to_string())
        })?,
    )?;

    table.set(
        "version",
        lua.create_function(|_, ()| Ok(RUNTIME_VERSION))?,
    )?;

    lua.globals().set(PRIMITIVES_TABLE, table)
}
