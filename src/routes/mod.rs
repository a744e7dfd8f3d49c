/// Router Module Index
///
/// Routing is split by access class. The split here is for readability only: whether a
/// request needs a credential is decided by `policy::RoutePolicy`, which the gate
/// middleware consults for every request, so a route added anywhere under the API root
/// is protected unless its prefix is explicitly public.

/// Login and registration. Mounted under the public prefix.
pub mod public;

/// Routes that expect a `Principal` attached by the gate.
pub mod authenticated;

/// Path classification (public vs protected).
pub mod policy;
