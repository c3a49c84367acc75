//! # Resource Naming
//!
//! Every cloud resource in a stack is named `{stack}-{suffix}`. GCP caps most
//! resource names at 63 characters, so long stack names are trimmed while the
//! suffix (the resource *kind*) stays legible.
//!
//! When trimming is needed a short digest of the untruncated name is inserted
//! between the stack fragment and the suffix. Two long stack names that share
//! a 63-character prefix therefore still map to distinct resource names.

use sha2::{Digest, Sha256};

/// Maximum resource name length for GCP compute, run and gateway resources.
pub const GCP_MAX_NAME_LENGTH: usize = 63;

/// Maximum length of a service account id (the part before `@`).
pub const SERVICE_ACCOUNT_ID_MAX_LENGTH: usize = 30;

/// Separator between the stack name and the suffix.
pub const SEPARATOR: char = '-';

const DIGEST_LEN: usize = 6;

pub const SUFFIX_BACKEND: &str = "backend";
pub const SUFFIX_FRONTEND: &str = "frontend";
pub const SUFFIX_GATEWAY: &str = "gateway";
pub const SUFFIX_LB: &str = "lb";
pub const SUFFIX_SECRETS: &str = "secrets";
pub const SUFFIX_ARMOR: &str = "armor";
/// Prefix for firewall-style resources (`fw-allowlist`, `fw-redirect`, ...).
pub const SUFFIX_FIREWALL_PREFIX: &str = "fw-";

/// Build a firewall-family suffix such as `fw-allowlist`.
pub fn firewall_suffix(kind: &str) -> String {
    format!("{SUFFIX_FIREWALL_PREFIX}{kind}")
}

/// Name a resource with the default GCP length limit.
pub fn resource_name(stack: &str, suffix: &str) -> String {
    resource_name_with_limit(stack, suffix, GCP_MAX_NAME_LENGTH)
}

/// Name a resource, truncating to `limit` bytes at a character boundary.
///
/// The stack portion is trimmed first. The result never ends with a
/// separator and, when truncation happens, still ends with the suffix (or
/// with a prefix of the suffix if the suffix alone exceeds `limit`).
pub fn resource_name_with_limit(stack: &str, suffix: &str, limit: usize) -> String {
    let stack = stack.trim_matches(SEPARATOR);
    let suffix = suffix.trim_matches(SEPARATOR);

    if suffix.is_empty() {
        return trim_to(stack, limit);
    }
    if stack.is_empty() {
        return trim_to(suffix, limit);
    }

    let full = format!("{stack}{SEPARATOR}{suffix}");
    if full.len() <= limit {
        return full;
    }

    // `x-{digest}-{suffix}` is the shortest shape that keeps a stack fragment.
    let reserved = suffix.len() + DIGEST_LEN + 2;
    if reserved + 1 > limit {
        return trim_to(suffix, limit);
    }

    let digest = short_digest(&full);
    let stack_part = trim_to(stack, limit - reserved);
    if stack_part.is_empty() {
        return format!("{digest}{SEPARATOR}{suffix}");
    }
    format!("{stack_part}{SEPARATOR}{digest}{SEPARATOR}{suffix}")
}

/// Service account ids are limited to 30 characters.
pub fn service_account_id(stack: &str, suffix: &str) -> String {
    resource_name_with_limit(stack, suffix, SERVICE_ACCOUNT_ID_MAX_LENGTH)
}

fn trim_to(value: &str, limit: usize) -> String {
    let mut end = value.len().min(limit);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].trim_end_matches(SEPARATOR).to_string()
}

/// First six hex digits of the SHA-256 of `value`
pub fn short_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest)[..DIGEST_LEN].to_string()
}
