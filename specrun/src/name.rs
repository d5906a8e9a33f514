//! Best-effort suite names derived from function types.

/// Placeholder when no usable name can be derived.
pub const UNNAMED_SUITE: &str = "<unnamed suite>";

/// Derive a display name for a suite from its function type.
///
/// Function items keep their last two path segments ("math::addition");
/// closures and fn pointers have no usable path and fall back to
/// [`UNNAMED_SUITE`]. An explicit name given to `add_named_spec` always
/// wins over this.
pub fn suite_name<F>() -> String {
    let full = std::any::type_name::<F>();
    // Usable names are bare `::` paths. Closures carry a `{{closure}}`
    // marker, and fn-pointer types are signatures, not paths.
    if full.contains("{{closure}}") || full.contains('(') || full.contains(char::is_whitespace) {
        return UNNAMED_SUITE.to_string();
    }
    let mut segments: Vec<&str> = full.rsplit("::").take(2).collect();
    segments.reverse();
    segments.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of<F>(_body: F) -> String {
        suite_name::<F>()
    }

    fn addition_suite() {}

    #[test]
    fn function_items_keep_module_and_name() {
        assert_eq!(name_of(addition_suite), "tests::addition_suite");
    }

    #[test]
    fn closures_fall_back_to_the_placeholder() {
        assert_eq!(name_of(|| {}), UNNAMED_SUITE);
    }

    fn logging_suite(_log: String) {}

    #[test]
    fn fn_pointers_fall_back_to_the_placeholder() {
        assert_eq!(name_of(logging_suite as fn(String)), UNNAMED_SUITE);
    }
}
