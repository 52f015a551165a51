//! container environment helpers

use k8s_openapi::api::core::v1::EnvVar;

/// Looks up `key` in a container environment.
///
/// Returns `None` when the variable is not declared. A variable declared
/// through `valueFrom` has no literal value and is reported as `Some("")`.
/// When a key is declared twice the last entry wins, as in the kubelet.
pub fn lookup_env_var<'a>(env: &'a [EnvVar], key: &str) -> Option<&'a str> {
    env.iter()
        .rev()
        .find(|var| var.name == key)
        .map(|var| var.value.as_deref().unwrap_or_default())
}
