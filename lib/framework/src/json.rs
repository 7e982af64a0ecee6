use std::fs::read_to_string;
use std::path::Path;

use serde::de::Deserialize;
use serde::de::DeserializeOwned;

use crate::exception::CoreRsResult;
use crate::exception::error_code::INVALID_CONFIG;

pub fn load_file<T>(path: &Path) -> CoreRsResult<T>
where
    T: DeserializeOwned,
{
    let json = read_to_string(path).map_err(|err| {
        exception!(
            message = format!("failed to read file, path={}", path.to_string_lossy()),
            source = err
        )
    })?;
    from_json(&json)
}

pub fn from_json<'a, T>(json: &'a str) -> CoreRsResult<T>
where
    T: Deserialize<'a>,
{
    serde_json::from_str(json).map_err(|err| {
        exception!(
            code = INVALID_CONFIG,
            message = format!("failed to deserialize, json={json}"),
            source = err
        )
    })
}
