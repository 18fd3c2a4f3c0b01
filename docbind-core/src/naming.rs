//! Default collection naming.

/// Derives the default collection name for a record type name.
///
/// Every uppercase character except the first is preceded by an underscore and all
/// characters are lowercased. Input that is already lowercase or snake cased comes back
/// unchanged, so applying the function to its own output is a no-op.
///
/// ```ignore
/// assert_eq!(derive_name("TrueCamelCased"), "true_camel_cased");
/// assert_eq!(derive_name("ExplicitID"), "explicit_i_d");
/// ```
pub fn derive_name(identifier: &str) -> String {
    let mut name = String::with_capacity(identifier.len() + identifier.len() / 2);

    for (index, ch) in identifier.chars().enumerate() {
        if ch.is_uppercase() && index != 0 {
            name.push('_');
        }
        name.extend(ch.to_lowercase());
    }

    name
}
