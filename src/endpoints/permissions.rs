use chrono::Local;
use serde_json::{json, Value};

use super::RPC_PERMISSIONS;
use crate::constants::PermissionGroup;
use crate::extract::resolve;
use crate::models::{PermissionItem, PermissionsResult};
use crate::options::PermissionsOptions;
use crate::{info_time, path, Client, Result};

const PERMISSIONS_TAG: &str = "1";

pub(crate) fn permissions_request(app_id: &str) -> Value {
    json!([[null, [app_id, 7], []]])
}

fn group(payload: &Value, group: PermissionGroup) -> &[Value] {
    resolve(payload, &path![group as i64])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Names of the common permissions, each entry's first element.
pub(crate) fn short_listing(payload: &Value) -> Vec<String> {
    group(payload, PermissionGroup::Common)
        .iter()
        .filter_map(|entry| non_empty(resolve(entry, &path![0])))
        .collect()
}

/// Every permission of both groups, labelled with the section it's listed under.
pub(crate) fn full_listing(payload: &Value) -> Vec<PermissionItem> {
    let mut items = Vec::new();
    for kind in [PermissionGroup::Common, PermissionGroup::Other] {
        for section in group(payload, kind) {
            let label = resolve(section, &path![0]).and_then(Value::as_str).unwrap_or_default();
            let Some(perms) = resolve(section, &path![2]).and_then(Value::as_array) else {
                continue;
            };
            items.extend(perms.iter().filter_map(|perm| {
                non_empty(resolve(perm, &path![1])).map(|permission| PermissionItem {
                    permission,
                    kind: label.to_string(),
                })
            }));
        }
    }
    items
}

impl Client {
    /// Permissions an app requests.
    pub async fn permissions(&self, options: PermissionsOptions) -> Result<PermissionsResult> {
        let options = options.normalized()?;
        self.memoized("permissions", &options, || self.fetch_permissions(&options))
            .await
    }

    async fn fetch_permissions(&self, options: &PermissionsOptions) -> Result<PermissionsResult> {
        let start_time = Local::now();
        let payload = self
            .rpc(
                RPC_PERMISSIONS,
                &permissions_request(&options.app_id),
                Some(PERMISSIONS_TAG),
                &options.lang,
                &options.country,
                &options.call,
            )
            .await?;

        let mut result = PermissionsResult {
            short: options.short,
            ..Default::default()
        };
        if let Some(payload) = payload {
            if options.short {
                result.names = short_listing(&payload);
            } else {
                result.items = full_listing(&payload);
            }
        }
        info_time!(
            start_time,
            "Fetched {} permissions of {}",
            result.items.len() + result.names.len(),
            options.app_id
        );
        Ok(result)
    }
}
