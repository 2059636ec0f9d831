//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_generator;
pub mod prompt_describer;

use std::sync::{Arc, Mutex, PoisonError};

use crate::cassette::replayer::CassetteReplayer;
use crate::error::ServiceError;

/// Retrieve the next recorded output for a given port and method.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, ServiceError> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).map(|i| i.output.clone()).map_err(ServiceError::Replay)
}

/// Deserialize a replayed output as `Result<T, ServiceError>`.
///
/// A recorded `Err` is replayed as [`ServiceError::Replay`] carrying the
/// recorded message.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, ServiceError> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        let msg = err_val.as_str().unwrap_or("replayed error").to_string();
        return Err(ServiceError::Replay(msg));
    }
    let value = match output.get("Ok").or_else(|| output.get("ok")) {
        Some(ok_val) => ok_val.clone(),
        None => output,
    };
    serde_json::from_value(value)
        .map_err(|e| ServiceError::Replay(format!("Failed to decode recorded output: {e}")))
}
