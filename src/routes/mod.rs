/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers
/// and handler-side role gates), so a protected endpoint can never be exposed
/// by accident.
///
/// The three modules map directly to the access tiers of the API.

/// Routes accessible to any client, anonymous included (catalog reads, login,
/// health). Visitor-specific field reduction happens inside the handlers.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. Requires a valid
/// bearer token; per-record authorization (self-or-admin, curso ownership)
/// happens in the handlers.
pub mod authenticated;

/// Routes restricted to the 'admin' role. Every handler performs the
/// mandatory role check itself after the extractor resolves the identity.
pub mod admin;
