//! Write-path access gate.
//!
//! A capability consistency check, not authentication: the client's
//! "identity" is a previously self-asserted locality token, and the gate
//! only checks that the token matches the locality the request is addressed
//! to. A spoofed token passes; that is an accepted limit of the trust model
//! (best-effort geofencing), not something this gate tries to solve.

use crate::locality::RequestContext;

/// Whether this request may create a post in its target locality.
///
/// Local/developer operation always may. Otherwise the request host must
/// carry a locality subdomain and the client's token must equal it.
pub fn can_write(ctx: &RequestContext) -> bool {
    if ctx.dev_mode {
        return true;
    }
    match (&ctx.subdomain, &ctx.claimed_locality) {
        (Some(target), Some(claimed)) => target == claimed,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(host: &str, token: Option<&str>, dev: bool) -> RequestContext {
        RequestContext::resolve(host, token, "lamppost", dev)
    }

    #[test]
    fn matching_token_writes() {
        assert!(can_write(&ctx(
            "springfield.lamppost.city",
            Some("springfield"),
            false
        )));
    }

    #[test]
    fn mismatched_token_is_denied() {
        assert!(!can_write(&ctx(
            "shelbyville.lamppost.city",
            Some("springfield"),
            false
        )));
    }

    #[test]
    fn missing_token_is_denied() {
        assert!(!can_write(&ctx("springfield.lamppost.city", None, false)));
    }

    #[test]
    fn unresolvable_target_is_denied() {
        assert!(!can_write(&ctx("lamppost.city", Some("springfield"), false)));
        assert!(!can_write(&ctx("example.com", Some("springfield"), false)));
    }

    #[test]
    fn token_is_normalized_before_comparison() {
        assert!(can_write(&ctx(
            "springfield.lamppost.city",
            Some("  Springfield "),
            false
        )));
    }

    #[test]
    fn dev_mode_bypasses_everything() {
        assert!(can_write(&ctx("example.com", None, true)));
        assert!(can_write(&ctx("localhost:3000", None, false)));
    }
}
