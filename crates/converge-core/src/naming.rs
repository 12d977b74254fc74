//! Default naming-convention transform between local and wire field names.
//!
//! Local state uses `lower_snake` names, the control-plane wire format uses
//! `UpperCamel`. Fields without an explicit rule fall back to this pure,
//! reversible pair of functions.

/// Converts a `lower_snake` local field name to its `UpperCamel` wire name.
///
/// # Examples
///
/// ```
/// use converge_core::naming::to_wire_name;
///
/// assert_eq!(to_wire_name("ip_address"), "IpAddress");
/// assert_eq!(to_wire_name("name"), "Name");
/// ```
pub fn to_wire_name(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    for segment in local.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Converts an `UpperCamel` wire name back to its `lower_snake` local name.
///
/// Inverse of [`to_wire_name`] for well-formed names (no consecutive
/// underscores, no leading digits in a segment).
///
/// # Examples
///
/// ```
/// use converge_core::naming::to_local_name;
///
/// assert_eq!(to_local_name("IpAddress"), "ip_address");
/// ```
pub fn to_local_name(wire: &str) -> String {
    let mut out = String::with_capacity(wire.len() + 4);
    for (i, c) in wire.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
