//! Protocol number to release name lookup
//!
//! Used to label synthesized status responses. Several releases share a
//! protocol number; the table names the range.

/// Release name for a protocol number, or `None` if unknown
pub fn version_name(protocol: i32) -> Option<&'static str> {
    let name = match protocol {
        4 => "1.7.2",
        5 => "1.7.10",
        47 => "1.8.x",
        107 => "1.9",
        110 => "1.9.4",
        210 => "1.10.x",
        316 => "1.11.2",
        335 => "1.12",
        340 => "1.12.2",
        404 => "1.13.2",
        498 => "1.14.4",
        578 => "1.15.2",
        754 => "1.16.5",
        755 => "1.17",
        756 => "1.17.1",
        758 => "1.18.2",
        759 => "1.19",
        760 => "1.19.2",
        761 => "1.19.3",
        762 => "1.19.4",
        763 => "1.20.1",
        764 => "1.20.2",
        765 => "1.20.4",
        766 => "1.20.6",
        767 => "1.21.1",
        768 => "1.21.3",
        769 => "1.21.4",
        770 => "1.21.5",
        771 => "1.21.6",
        772 => "1.21.8",
        _ => return None,
    };
    Some(name)
}

/// Display label for a protocol number, falling back to the raw number
pub fn version_label(protocol: i32) -> String {
    match version_name(protocol) {
        Some(name) => name.to_string(),
        None => format!("protocol {}", protocol),
    }
}
