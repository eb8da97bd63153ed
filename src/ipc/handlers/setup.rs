use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "config": state.config }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    match state.config.patched(patch_obj) {
        Ok(next) => {
            tracing::info!(
                overdue_status = ?next.overdue_status,
                count_missing_as_zero = next.count_missing_as_zero,
                "derivation settings updated"
            );
            state.config = next;
            ok(&req.id, json!({ "config": state.config }))
        }
        Err(msg) => err(&req.id, "bad_params", msg, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
